/// Normalized upload failure codes shared by both file models.
///
/// The values mirror the conventional web-server upload error numbering so
/// that codes survive a round trip through either model unchanged. `5` is
/// unassigned in that numbering and is skipped here too.
pub mod upload_error {
    /// The upload completed without error.
    pub const OK: i32 = 0;
    /// The file exceeds the server-wide upload size limit.
    pub const SIZE_EXCEEDED: i32 = 1;
    /// The file exceeds the limit declared by the submitting form.
    pub const FORM_SIZE_EXCEEDED: i32 = 2;
    /// The file was only partially received.
    pub const PARTIAL: i32 = 3;
    /// No file was submitted in the field.
    pub const MISSING: i32 = 4;
    /// No temporary directory was available to store the upload.
    pub const NO_TMP_DIR: i32 = 6;
    /// The upload could not be written to disk.
    pub const WRITE_FAILED: i32 = 7;
    /// An extension rejected the upload.
    pub const BLOCKED_BY_EXTENSION: i32 = 8;
}

// ---------------------------------------------------------------------------
// NativeFile
// ---------------------------------------------------------------------------

/// Upload metadata attached to a [`NativeFile`] that arrived via a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeUpload {
    /// The filename reported by the client.
    pub client_name: String,
    /// One of the [`upload_error`] codes.
    pub error: i32,
}

/// A file value in the framework-native model.
///
/// A native file is primarily a filesystem path; files that arrived as
/// uploads additionally carry [`NativeUpload`] metadata. A file constructed
/// with [`NativeFile::local`] is a plain local file and never reports an
/// upload error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFile {
    /// Path to the file on disk.
    pub path: String,
    /// Present when the file arrived as an upload.
    pub upload: Option<NativeUpload>,
}

impl NativeFile {
    /// A plain local file (not an upload).
    pub fn local(path: impl Into<String>) -> Self {
        Self { path: path.into(), upload: None }
    }

    /// An uploaded file with the given client filename and error code.
    pub fn uploaded(path: impl Into<String>, client_name: impl Into<String>, error: i32) -> Self {
        Self {
            path: path.into(),
            upload: Some(NativeUpload { client_name: client_name.into(), error }),
        }
    }

    /// Whether this file arrived as an upload.
    pub fn is_uploaded(&self) -> bool {
        self.upload.is_some()
    }

    /// Whether this is an upload that completed without error.
    pub fn is_valid(&self) -> bool {
        self.upload.as_ref().is_some_and(|u| u.error == upload_error::OK)
    }
}

// ---------------------------------------------------------------------------
// MessageFile
// ---------------------------------------------------------------------------

/// A file value in the standards-based message model.
///
/// Message files are fully buffered: the contents live in memory alongside
/// the error code and the optional client-supplied metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFile {
    /// Buffered file contents.
    pub contents: String,
    /// Size in bytes as reported by the client, if any.
    pub size: Option<u64>,
    /// One of the [`upload_error`] codes.
    pub error: i32,
    /// The filename reported by the client.
    pub client_filename: Option<String>,
    /// The media type reported by the client.
    pub client_media_type: Option<String>,
}

impl MessageFile {
    /// A successfully uploaded file with the given contents.
    pub fn new(contents: impl Into<String>) -> Self {
        let contents = contents.into();
        Self {
            size: Some(contents.len() as u64),
            contents,
            error: upload_error::OK,
            client_filename: None,
            client_media_type: None,
        }
    }

    /// A failed upload carrying the given error code and no contents.
    pub fn failed(error: i32) -> Self {
        Self {
            contents: String::new(),
            size: None,
            error,
            client_filename: None,
            client_media_type: None,
        }
    }

    pub fn with_client_filename(mut self, filename: impl Into<String>) -> Self {
        self.client_filename = Some(filename.into());
        self
    }

    pub fn with_client_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.client_media_type = Some(media_type.into());
        self
    }
}

// ---------------------------------------------------------------------------
// UploadedFile
// ---------------------------------------------------------------------------

/// A file value from either request model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadedFile {
    Native(NativeFile),
    Message(MessageFile),
}

impl From<NativeFile> for UploadedFile {
    fn from(file: NativeFile) -> Self {
        Self::Native(file)
    }
}

impl From<MessageFile> for UploadedFile {
    fn from(file: MessageFile) -> Self {
        Self::Message(file)
    }
}

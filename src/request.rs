use crate::error::AdapterError;
use crate::file::{UploadedFile, upload_error};
use crate::model::{MessageRequest, NativeRequest, NativeResponse, ResponseFactory};
use crate::response::{MessageResponseAdapter, NativeResponseAdapter, ResponseAdapter};
use crate::value::{ParamMap, ParamValue};

/// The content type assumed when a request carries no Content-Type header.
pub const DEFAULT_REQUEST_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// ---------------------------------------------------------------------------
// RequestAdapter
// ---------------------------------------------------------------------------

/// A uniform, read-only view over either request model.
///
/// Adapters are created per request by the [`AdapterFactory`] and hold a
/// single immutable borrow of the wrapped request; they never mutate it.
///
/// [`AdapterFactory`]: crate::factory::AdapterFactory
#[derive(Debug)]
pub enum RequestAdapter<'a> {
    Native(NativeRequestAdapter<'a>),
    Message(MessageRequestAdapter<'a>),
}

impl<'a> RequestAdapter<'a> {
    /// First Content-Type value, or the form-urlencoded default when absent.
    pub fn content_type(&self) -> String {
        self.header("Content-Type")
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_REQUEST_CONTENT_TYPE.to_string())
    }

    /// All values for a header name, case-insensitive. Empty when absent.
    pub fn header(&self, name: &str) -> Vec<String> {
        match self {
            Self::Native(adapter) => adapter
                .request
                .headers
                .get(&name.to_ascii_lowercase())
                .cloned()
                .unwrap_or_default(),
            Self::Message(adapter) => adapter.request.header_values(name),
        }
    }

    pub fn request_method(&self) -> &str {
        match self {
            Self::Native(adapter) => &adapter.request.method,
            Self::Message(adapter) => &adapter.request.method,
        }
    }

    /// Parsed body parameters.
    ///
    /// The native model exposes its body bag directly. The message model
    /// stores an optional JSON value: an object is flattened into a map,
    /// anything else (or nothing) yields an empty map.
    pub fn request_params(&self) -> ParamMap {
        match self {
            Self::Native(adapter) => adapter.request.request.clone(),
            Self::Message(adapter) => match &adapter.request.parsed_body {
                Some(serde_json::Value::Object(entries)) => entries
                    .iter()
                    .map(|(k, v)| (k.clone(), ParamValue::from_json(v.clone())))
                    .collect(),
                _ => ParamMap::new(),
            },
        }
    }

    pub fn has_request_param(&self, name: &str) -> bool {
        match self {
            Self::Native(adapter) => adapter.request.request.contains_key(name),
            Self::Message(_) => self.request_params().contains_key(name),
        }
    }

    pub fn query_params(&self) -> ParamMap {
        match self {
            Self::Native(adapter) => adapter.request.query.clone(),
            Self::Message(adapter) => adapter.request.query.clone(),
        }
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        match self {
            Self::Native(adapter) => adapter.request.query.contains_key(name),
            Self::Message(adapter) => adapter.request.query.contains_key(name),
        }
    }

    /// The query value under `name`.
    ///
    /// # Errors
    ///
    /// [`AdapterError::NonExistentParameter`] when the parameter is absent.
    pub fn query_param(&self, name: &str) -> Result<ParamValue, AdapterError> {
        let params = match self {
            Self::Native(adapter) => &adapter.request.query,
            Self::Message(adapter) => &adapter.request.query,
        };
        params
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::NonExistentParameter(name.to_string()))
    }

    /// All uploaded files, keyed by field name. Values may be single files
    /// or nested maps/lists of files.
    pub fn all_files(&self) -> ParamMap {
        match self {
            Self::Native(adapter) => adapter.request.files.clone(),
            Self::Message(adapter) => adapter.request.uploaded_files.clone(),
        }
    }

    pub fn has_file(&self, name: &str) -> bool {
        match self {
            Self::Native(adapter) => adapter.request.files.contains_key(name),
            Self::Message(adapter) => adapter.request.uploaded_files.contains_key(name),
        }
    }

    /// The file value under `name`.
    ///
    /// # Errors
    ///
    /// [`AdapterError::NonExistentFile`] when no file was uploaded under
    /// that name.
    pub fn file(&self, name: &str) -> Result<ParamValue, AdapterError> {
        let files = match self {
            Self::Native(adapter) => &adapter.request.files,
            Self::Message(adapter) => &adapter.request.uploaded_files,
        };
        files
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::NonExistentFile(name.to_string()))
    }

    /// The full raw request body.
    pub fn request_content(&self) -> &str {
        match self {
            Self::Native(adapter) => &adapter.request.content,
            Self::Message(adapter) => &adapter.request.body,
        }
    }

    /// The declared content length from the `CONTENT_LENGTH` server
    /// variable, defaulting to 0.
    pub fn request_content_length(&self) -> u64 {
        let server = match self {
            Self::Native(adapter) => &adapter.request.server,
            Self::Message(adapter) => &adapter.request.server,
        };
        server
            .get("CONTENT_LENGTH")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Build an empty response adapter matching this request's model.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidArgument`] for the message variant when no
    /// response factory was supplied to the adapter factory.
    pub fn create_response(&self) -> Result<ResponseAdapter, AdapterError> {
        match self {
            Self::Native(_) => Ok(ResponseAdapter::Native(NativeResponseAdapter::new(
                NativeResponse::new(),
            ))),
            Self::Message(adapter) => {
                let factory = adapter.response_factory.ok_or_else(|| {
                    AdapterError::InvalidArgument(
                        "could not find a response factory, response object cannot be created; \
                         inject a response factory into the adapter factory"
                            .to_string(),
                    )
                })?;
                Ok(ResponseAdapter::Message(MessageResponseAdapter::new(
                    factory.create_response(),
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Variant adapters
// ---------------------------------------------------------------------------

/// The [`RequestAdapter`] variant wrapping a [`NativeRequest`].
#[derive(Debug)]
pub struct NativeRequestAdapter<'a> {
    pub(crate) request: &'a NativeRequest,
}

impl<'a> NativeRequestAdapter<'a> {
    pub fn new(request: &'a NativeRequest) -> Self {
        Self { request }
    }

    /// Normalize a native file value to an upload failure code.
    ///
    /// Returns `None` for plain local files and for uploads that completed
    /// successfully; otherwise the stored error code.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidArgument`] when the value is not a native
    /// file at all.
    pub fn upload_file_error(data: &ParamValue) -> Result<Option<i32>, AdapterError> {
        let ParamValue::File(UploadedFile::Native(file)) = data else {
            return Err(AdapterError::InvalidArgument(format!(
                "invalid uploaded file value: expected a native file, {} given",
                data.kind()
            )));
        };

        if !file.is_uploaded() || file.is_valid() {
            return Ok(None);
        }

        Ok(file.upload.as_ref().map(|u| u.error))
    }
}

/// The [`RequestAdapter`] variant wrapping a [`MessageRequest`].
pub struct MessageRequestAdapter<'a> {
    pub(crate) request: &'a MessageRequest,
    pub(crate) response_factory: Option<&'a dyn ResponseFactory>,
}

impl<'a> MessageRequestAdapter<'a> {
    pub fn new(request: &'a MessageRequest, response_factory: Option<&'a dyn ResponseFactory>) -> Self {
        Self { request, response_factory }
    }

    /// Normalize a message file value to an upload failure code.
    ///
    /// Returns `None` when the stored code is [`upload_error::OK`],
    /// otherwise the code itself.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidArgument`] when the value is not a message
    /// file at all.
    pub fn upload_file_error(data: &ParamValue) -> Result<Option<i32>, AdapterError> {
        let ParamValue::File(UploadedFile::Message(file)) = data else {
            return Err(AdapterError::InvalidArgument(format!(
                "invalid uploaded file value: expected a message file, {} given",
                data.kind()
            )));
        };

        Ok((file.error != upload_error::OK).then_some(file.error))
    }
}

impl std::fmt::Debug for MessageRequestAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRequestAdapter")
            .field("request", &self.request)
            .field("response_factory", &self.response_factory.map(|_| "<factory>"))
            .finish()
    }
}

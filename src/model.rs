use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::value::{ParamMap, ParamValue};

/// A header multimap keyed by header name.
pub type HeaderMap = BTreeMap<String, Vec<String>>;

// ---------------------------------------------------------------------------
// NativeRequest
// ---------------------------------------------------------------------------

/// The framework-native request model: a bundle of mutable parameter bags.
///
/// Header names are stored lowercase; query and body parameters live in
/// separate maps, uploaded files in a third whose leaves are
/// [`ParamValue::File`] values. Server variables (notably `CONTENT_LENGTH`)
/// are a plain string map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeRequest {
    pub method: String,
    pub headers: HeaderMap,
    pub query: ParamMap,
    pub request: ParamMap,
    pub files: ParamMap,
    pub content: String,
    pub server: BTreeMap<String, String>,
}

impl NativeRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into(), ..Self::default() }
    }

    /// Append a header value. The name is lowercased on insertion.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_request_param(
        mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        self.request.insert(name.into(), value.into());
        self
    }

    /// Register an uploaded file (or a map/list of files) under a field name.
    pub fn with_file(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.files.insert(name.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_content_length(mut self, length: u64) -> Self {
        self.server.insert("CONTENT_LENGTH".to_string(), length.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// MessageRequest
// ---------------------------------------------------------------------------

/// The standards-based request model: immutable, copy-on-write.
///
/// Headers preserve the casing they were given but are looked up
/// case-insensitively. The parsed body is an optional JSON value: decoding
/// middleware typically stores an object here, and a structured type can be
/// serialized into one with [`MessageRequest::with_parsed_body_of`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageRequest {
    pub method: String,
    pub headers: Vec<(String, Vec<String>)>,
    pub query: ParamMap,
    pub parsed_body: Option<serde_json::Value>,
    pub uploaded_files: ParamMap,
    pub body: String,
    pub server: BTreeMap<String, String>,
}

impl MessageRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into(), ..Self::default() }
    }

    /// Return a copy with the given header value appended.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, values)) => values.push(value.into()),
            None => self.headers.push((name.to_string(), vec![value.into()])),
        }
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Return a copy with the given parsed body.
    pub fn with_parsed_body(mut self, body: serde_json::Value) -> Self {
        self.parsed_body = Some(body);
        self
    }

    /// Serialize a structured value and store it as the parsed body.
    pub fn with_parsed_body_of<T: serde::Serialize>(
        self,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(body)?;
        Ok(self.with_parsed_body(value))
    }

    pub fn with_uploaded_file(
        mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        self.uploaded_files.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_server_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.server.insert(name.into(), value.into());
        self
    }

    /// All values for a header name, case-insensitive. Empty when absent.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.clone())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// NativeResponse
// ---------------------------------------------------------------------------

/// A streamed body callback: writes the body bytes into the given sink.
pub type StreamedBody = Box<dyn Fn(&mut dyn Write) -> io::Result<()> + Send + Sync>;

/// The body of a [`NativeResponse`].
///
/// `Full` holds the content in memory. `Streamed` defers to a callback that
/// writes into an arbitrary sink; the response adapter captures it into an
/// in-memory buffer on first read.
pub enum NativeBody {
    Full(String),
    Streamed(StreamedBody),
}

impl fmt::Debug for NativeBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(content) => f.debug_tuple("Full").field(content).finish(),
            Self::Streamed(_) => f.debug_tuple("Streamed").field(&"<callback>").finish(),
        }
    }
}

impl Default for NativeBody {
    fn default() -> Self {
        Self::Full(String::new())
    }
}

/// The framework-native response model.
#[derive(Debug, Default)]
pub struct NativeResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: NativeBody,
}

impl NativeResponse {
    /// An empty 200 response with no headers.
    pub fn new() -> Self {
        Self { status: 200, headers: HeaderMap::new(), body: NativeBody::default() }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Append a header value. The name is lowercased on insertion.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = NativeBody::Full(body.into());
        self
    }

    /// A response whose body is produced by a streaming callback.
    pub fn streamed(
        callback: impl Fn(&mut dyn Write) -> io::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self { status: 200, headers: HeaderMap::new(), body: NativeBody::Streamed(Box::new(callback)) }
    }

    /// A response that proxies a file from disk through the streamed path.
    pub fn file_proxy(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::streamed(move |sink| {
            let mut file = std::fs::File::open(&path)?;
            io::copy(&mut file, sink)?;
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// MessageResponse
// ---------------------------------------------------------------------------

/// The standards-based response model: immutable, copy-on-write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageResponse {
    pub status: u16,
    pub headers: Vec<(String, Vec<String>)>,
    pub body: String,
}

impl MessageResponse {
    /// An empty 200 response with no headers.
    pub fn new() -> Self {
        Self { status: 200, headers: Vec::new(), body: String::new() }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Return a copy with all values for `name` replaced.
    pub fn with_header(mut self, name: &str, values: Vec<String>) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), values));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// All values for a header name, case-insensitive. Empty when absent.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.clone())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// ResponseFactory
// ---------------------------------------------------------------------------

/// Builds empty standards-based responses on behalf of a request adapter.
///
/// The message request model has no way to construct a response by itself,
/// so its adapter needs one of these injected to honor `create_response`.
pub trait ResponseFactory {
    fn create_response(&self) -> MessageResponse;
}

/// The default [`ResponseFactory`]: produces plain empty responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageResponseFactory;

impl ResponseFactory for MessageResponseFactory {
    fn create_response(&self) -> MessageResponse {
        MessageResponse::new()
    }
}

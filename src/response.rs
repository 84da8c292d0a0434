use std::collections::BTreeMap;

use crate::error::AdapterError;
use crate::model::{HeaderMap, MessageResponse, NativeBody, NativeResponse};

/// The content type assumed when a response carries no Content-Type header.
pub const DEFAULT_RESPONSE_CONTENT_TYPE: &str = "application/octet-stream";

/// A response taken back out of an adapter.
#[derive(Debug)]
pub enum AnyResponse {
    Native(NativeResponse),
    Message(MessageResponse),
}

// ---------------------------------------------------------------------------
// ResponseAdapter
// ---------------------------------------------------------------------------

/// A uniform read/write view over either response model.
///
/// Unlike the request adapter, a response adapter owns its response:
/// `set_headers` is the single mutating operation, and [`into_inner`]
/// releases the (possibly modified) response when adaptation is done.
///
/// [`into_inner`]: ResponseAdapter::into_inner
#[derive(Debug)]
pub enum ResponseAdapter {
    Native(NativeResponseAdapter),
    Message(MessageResponseAdapter),
}

impl ResponseAdapter {
    /// Release the wrapped response object.
    pub fn into_inner(self) -> AnyResponse {
        match self {
            Self::Native(adapter) => AnyResponse::Native(adapter.response),
            Self::Message(adapter) => AnyResponse::Message(adapter.response),
        }
    }

    /// First Content-Type value, or the octet-stream default when absent.
    pub fn content_type(&self) -> String {
        self.header("Content-Type")
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_RESPONSE_CONTENT_TYPE.to_string())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Native(adapter) => adapter.response.status,
            Self::Message(adapter) => adapter.response.status,
        }
    }

    /// All headers, keys normalized to lowercase.
    pub fn headers(&self) -> HeaderMap {
        match self {
            Self::Native(adapter) => adapter.response.headers.clone(),
            Self::Message(adapter) => {
                let mut normalized = BTreeMap::new();
                for (name, values) in &adapter.response.headers {
                    normalized
                        .entry(name.to_ascii_lowercase())
                        .or_insert_with(Vec::new)
                        .extend(values.iter().cloned());
                }
                normalized
            }
        }
    }

    /// All values for a header name, case-insensitive. Empty when absent.
    pub fn header(&self, name: &str) -> Vec<String> {
        match self {
            Self::Native(adapter) => adapter
                .response
                .headers
                .get(&name.to_ascii_lowercase())
                .cloned()
                .unwrap_or_default(),
            Self::Message(adapter) => adapter.response.header_values(name),
        }
    }

    /// Set each given header on the response, returning `self` for chaining.
    ///
    /// Every name in `headers` has its values replaced; names not mentioned
    /// keep their current values.
    pub fn set_headers<I>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        match self {
            Self::Native(adapter) => {
                for (name, values) in headers {
                    adapter
                        .response
                        .headers
                        .insert(name.to_ascii_lowercase(), values);
                }
            }
            Self::Message(adapter) => {
                for (name, values) in headers {
                    let response = std::mem::take(&mut adapter.response);
                    adapter.response = response.with_header(&name, values);
                }
            }
        }
        self
    }

    /// The full response body.
    ///
    /// A streamed native body is captured once into an in-memory sink and
    /// the result cached for subsequent calls.
    ///
    /// # Errors
    ///
    /// [`AdapterError::Io`] when the streaming callback fails.
    pub fn content(&mut self) -> Result<String, AdapterError> {
        match self {
            Self::Native(adapter) => adapter.content(),
            Self::Message(adapter) => Ok(adapter.response.body.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Variant adapters
// ---------------------------------------------------------------------------

/// The [`ResponseAdapter`] variant wrapping a [`NativeResponse`].
#[derive(Debug)]
pub struct NativeResponseAdapter {
    pub(crate) response: NativeResponse,
    captured: Option<String>,
}

impl NativeResponseAdapter {
    pub fn new(response: NativeResponse) -> Self {
        Self { response, captured: None }
    }

    fn content(&mut self) -> Result<String, AdapterError> {
        match &self.response.body {
            NativeBody::Full(content) => Ok(content.clone()),
            NativeBody::Streamed(callback) => {
                if self.captured.is_none() {
                    let mut sink = Vec::new();
                    callback(&mut sink).map_err(|e| AdapterError::Io(e.to_string()))?;
                    self.captured = Some(String::from_utf8_lossy(&sink).into_owned());
                }
                Ok(self.captured.clone().unwrap_or_default())
            }
        }
    }
}

/// The [`ResponseAdapter`] variant wrapping a [`MessageResponse`].
#[derive(Debug)]
pub struct MessageResponseAdapter {
    pub(crate) response: MessageResponse,
}

impl MessageResponseAdapter {
    pub fn new(response: MessageResponse) -> Self {
        Self { response }
    }
}

use std::any::Any;
use std::collections::BTreeMap;

use crate::decode::{BodyDecoder, StandardBodyDecoder};
use crate::error::AdapterError;
use crate::factory::AdapterFactory;
use crate::model::MessageResponseFactory;
use crate::request::RequestAdapter;
use crate::value::{ParamMap, ParamValue, replace_recursive};

/// Request methods that carry no body; their data lives in the query string.
const BODYLESS_METHODS: [&str; 3] = ["GET", "HEAD", "TRACE"];

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// The form contract consumed by the auto-submit handler.
///
/// The field tree, validation, and error rendering live behind this trait;
/// the handler only reads the form's identity and pushes data into it.
pub trait Form {
    /// The form's field name. An empty name means the form spans the whole
    /// request payload.
    fn name(&self) -> &str;

    /// The request method this form is configured to accept.
    fn method(&self) -> &str;

    /// Whether the form is composed of named child fields. Compound forms
    /// default missing submission data to an empty map instead of nothing.
    fn is_compound(&self) -> bool;

    /// Submit data into the form. `clear_missing` asks the form to reset
    /// fields absent from `data`.
    fn submit(&mut self, data: Option<ParamValue>, clear_missing: bool);

    /// Attach an error to the form. `params` carries message placeholders
    /// such as `{{ max }}`.
    fn add_error(&mut self, message: &str, params: BTreeMap<String, String>);

    /// The message used when an upload exceeds the post size limit.
    fn upload_max_size_message(&self) -> String {
        "The uploaded file was too large. Please try to upload a smaller file.".to_string()
    }
}

// ---------------------------------------------------------------------------
// ServerParams
// ---------------------------------------------------------------------------

/// Reports the server-wide post size limit for a request.
pub trait ServerParams {
    /// Whether the request's declared content length exceeds the limit.
    fn has_post_max_size_been_exceeded(&self, request: &RequestAdapter<'_>) -> bool;

    /// The configured limit in its human form (for error messages), or
    /// `None` when unlimited.
    fn normalized_max_size(&self) -> Option<String>;
}

/// A [`ServerParams`] backed by an explicit limit string such as `"10M"`.
#[derive(Debug, Clone, Default)]
pub struct PostMaxSize {
    limit: Option<u64>,
    normalized: Option<String>,
}

impl PostMaxSize {
    /// No limit: `has_post_max_size_been_exceeded` is always false.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// A limit parsed from a human size string (`"8192"`, `"256K"`, `"10M"`,
    /// `"1G"`, case-insensitive). An unparseable string means unlimited.
    pub fn new(limit: &str) -> Self {
        match parse_size(limit) {
            Some(bytes) => Self {
                limit: Some(bytes),
                normalized: Some(limit.trim().to_ascii_uppercase()),
            },
            None => Self::unlimited(),
        }
    }
}

impl ServerParams for PostMaxSize {
    fn has_post_max_size_been_exceeded(&self, request: &RequestAdapter<'_>) -> bool {
        match self.limit {
            Some(max) if max > 0 => request.request_content_length() > max,
            _ => false,
        }
    }

    fn normalized_max_size(&self) -> Option<String> {
        self.normalized.clone()
    }
}

/// Parse `"10M"`-style size strings into bytes.
fn parse_size(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (digits, multiplier) = match value.chars().next_back() {
        Some('k') | Some('K') => (&value[..value.len() - 1], 1024),
        Some('m') | Some('M') => (&value[..value.len() - 1], 1024 * 1024),
        Some('g') | Some('G') => (&value[..value.len() - 1], 1024 * 1024 * 1024),
        _ => (value, 1),
    };

    digits.trim().parse::<u64>().ok().map(|n| n * multiplier)
}

// ---------------------------------------------------------------------------
// AutoSubmitRequestHandler
// ---------------------------------------------------------------------------

/// Decides whether and what to submit into a form for a given request.
///
/// The handler is driven once per request. Every "this request does not
/// target this form" outcome is a silent `Ok(())`: a method mismatch or a
/// missing field name is normal, not an error.
pub struct AutoSubmitRequestHandler {
    adapter_factory: AdapterFactory,
    server_params: Box<dyn ServerParams>,
    body_decoder: Option<Box<dyn BodyDecoder>>,
}

impl AutoSubmitRequestHandler {
    /// A handler with the default collaborators: an adapter factory that can
    /// build message responses, no post size limit, and the standard body
    /// decoder.
    pub fn new() -> Self {
        Self {
            adapter_factory: AdapterFactory::with_response_factory(MessageResponseFactory),
            server_params: Box::new(PostMaxSize::unlimited()),
            body_decoder: Some(Box::new(StandardBodyDecoder)),
        }
    }

    pub fn with_adapter_factory(mut self, factory: AdapterFactory) -> Self {
        self.adapter_factory = factory;
        self
    }

    pub fn with_server_params(mut self, server_params: impl ServerParams + 'static) -> Self {
        self.server_params = Box::new(server_params);
        self
    }

    pub fn with_body_decoder(mut self, decoder: impl BodyDecoder + 'static) -> Self {
        self.body_decoder = Some(Box::new(decoder));
        self
    }

    /// Disable body decoding; body parameters come from the adapter alone.
    pub fn without_body_decoder(mut self) -> Self {
        self.body_decoder = None;
        self
    }

    /// Inspect `request` and, when it targets `form`, submit its data.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidArgument`] when `request` is not one of the
    /// recognized request models; decoder failures propagate unchanged.
    pub fn handle_request<F, R>(&self, form: &mut F, request: &R) -> Result<(), AdapterError>
    where
        F: Form + ?Sized,
        R: Any,
    {
        let adapter = match self.adapter_factory.create_request_adapter(request) {
            Ok(adapter) => adapter,
            Err(AdapterError::UnsupportedRequestObject(ty)) => {
                return Err(AdapterError::InvalidArgument(format!(
                    "expected argument of type \"NativeRequest\" or \"MessageRequest\", \
                     \"{ty}\" given"
                )));
            }
            Err(e) => return Err(e),
        };

        let name = form.name().to_string();
        let method = form.method().to_string();

        if adapter.request_method() != method {
            return Ok(());
        }

        let data = if BODYLESS_METHODS.contains(&method.as_str()) {
            if name.is_empty() {
                Some(ParamValue::Map(adapter.query_params()))
            } else {
                // Don't submit if the form's name is absent from the query.
                if !adapter.has_query_param(&name) {
                    return Ok(());
                }
                Some(adapter.query_param(&name)?)
            }
        } else {
            // The size check must run before any body access: an oversized
            // body is unreadable, so the form would otherwise never learn
            // about the failure.
            if self
                .server_params
                .has_post_max_size_been_exceeded(&adapter)
            {
                let message = form.upload_max_size_message();
                form.submit(None, false);

                let mut params = BTreeMap::new();
                params.insert(
                    "{{ max }}".to_string(),
                    self.server_params.normalized_max_size().unwrap_or_default(),
                );
                form.add_error(&message, params);

                return Ok(());
            }

            let decoded: ParamMap = match &self.body_decoder {
                Some(decoder) => decoder.decode(&adapter)?,
                None => adapter.request_params(),
            };

            let (params, files) = if name.is_empty() {
                (
                    Some(ParamValue::Map(decoded)),
                    Some(ParamValue::Map(adapter.all_files())),
                )
            } else if adapter.has_request_param(&name) || adapter.has_file(&name) {
                let default = form
                    .is_compound()
                    .then(|| ParamValue::Map(ParamMap::new()));

                let params = decoded.get(&name).cloned().or_else(|| default.clone());
                let files = match adapter.file(&name) {
                    Ok(value) => Some(value),
                    Err(AdapterError::NonExistentFile(_)) => default,
                    Err(e) => return Err(e),
                };

                (params, files)
            } else {
                // The form is simply not present in this request.
                return Ok(());
            };

            match (params, files) {
                (Some(ParamValue::Map(params)), Some(ParamValue::Map(files))) => {
                    Some(ParamValue::Map(replace_recursive(params, files)))
                }
                (params, files) => params.or(files),
            }
        };

        // PATCH keeps fields absent from the data (partial update).
        form.submit(data, method != "PATCH");
        Ok(())
    }

    /// Whether `data` is a file value from either model.
    pub fn is_file_upload(&self, data: &ParamValue) -> bool {
        self.adapter_factory.is_file_upload(data)
    }

    /// Normalize a file value to an upload failure code.
    pub fn upload_file_error(&self, data: &ParamValue) -> Result<Option<i32>, AdapterError> {
        self.adapter_factory.upload_file_error(data)
    }
}

impl Default for AutoSubmitRequestHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests (unit)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_suffixes() {
        assert_eq!(parse_size("8192"), Some(8192));
        assert_eq!(parse_size("256K"), Some(256 * 1024));
        assert_eq!(parse_size("10m"), Some(10 * 1024 * 1024));
        assert_eq!(parse_size("1G"), Some(1024 * 1024 * 1024));
    }

    #[test]
    fn unparseable_sizes() {
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("lots"), None);
        assert_eq!(parse_size("M"), None);
    }

    #[test]
    fn normalized_limit_is_uppercased() {
        let limit = PostMaxSize::new("10m");
        assert_eq!(limit.normalized_max_size(), Some("10M".to_string()));
    }
}

use std::any::{Any, type_name};

use crate::error::AdapterError;
use crate::file::UploadedFile;
use crate::model::{MessageRequest, MessageResponse, NativeRequest, NativeResponse, ResponseFactory};
use crate::request::{MessageRequestAdapter, NativeRequestAdapter, RequestAdapter};
use crate::response::{MessageResponseAdapter, NativeResponseAdapter, ResponseAdapter};
use crate::value::ParamValue;

// ---------------------------------------------------------------------------
// AdapterFactory
// ---------------------------------------------------------------------------

/// Builds request and response adapters from concrete model objects.
///
/// The set of recognized models is closed: the native model is checked
/// first, then the standards-based message model; anything else is rejected
/// with an error naming the offending type. An optional [`ResponseFactory`]
/// is forwarded to message request adapters so they can honor
/// `create_response`.
#[derive(Default)]
pub struct AdapterFactory {
    response_factory: Option<Box<dyn ResponseFactory>>,
}

impl AdapterFactory {
    /// A factory without a response factory. Message request adapters built
    /// by this factory cannot create responses.
    pub fn new() -> Self {
        Self { response_factory: None }
    }

    /// A factory forwarding the given response factory to message adapters.
    pub fn with_response_factory(factory: impl ResponseFactory + 'static) -> Self {
        Self { response_factory: Some(Box::new(factory)) }
    }

    /// Wrap a request object in the matching adapter variant.
    ///
    /// # Errors
    ///
    /// [`AdapterError::UnsupportedRequestObject`] naming the actual type
    /// when `request` is neither a [`NativeRequest`] nor a
    /// [`MessageRequest`].
    pub fn create_request_adapter<'a, R: Any>(
        &'a self,
        request: &'a R,
    ) -> Result<RequestAdapter<'a>, AdapterError> {
        let any = request as &dyn Any;

        if let Some(native) = any.downcast_ref::<NativeRequest>() {
            return Ok(RequestAdapter::Native(NativeRequestAdapter::new(native)));
        }

        if let Some(message) = any.downcast_ref::<MessageRequest>() {
            return Ok(RequestAdapter::Message(MessageRequestAdapter::new(
                message,
                self.response_factory.as_deref(),
            )));
        }

        Err(AdapterError::UnsupportedRequestObject(
            type_name::<R>().to_string(),
        ))
    }

    /// Take ownership of a response object and wrap it in the matching
    /// adapter variant.
    ///
    /// # Errors
    ///
    /// [`AdapterError::UnsupportedResponseObject`] naming the actual type
    /// when `response` is neither a [`NativeResponse`] nor a
    /// [`MessageResponse`].
    pub fn create_response_adapter<R: Any>(
        &self,
        response: R,
    ) -> Result<ResponseAdapter, AdapterError> {
        let any: Box<dyn Any> = Box::new(response);

        let any = match any.downcast::<NativeResponse>() {
            Ok(native) => {
                return Ok(ResponseAdapter::Native(NativeResponseAdapter::new(*native)));
            }
            Err(any) => any,
        };

        match any.downcast::<MessageResponse>() {
            Ok(message) => Ok(ResponseAdapter::Message(MessageResponseAdapter::new(
                *message,
            ))),
            Err(_) => Err(AdapterError::UnsupportedResponseObject(
                type_name::<R>().to_string(),
            )),
        }
    }

    /// Whether `data` is a file value from either model.
    pub fn is_file_upload(&self, data: &ParamValue) -> bool {
        matches!(data, ParamValue::File(_))
    }

    /// Normalize a file value to an upload failure code via the matching
    /// variant, or `Ok(None)` when `data` is not a file value at all.
    pub fn upload_file_error(&self, data: &ParamValue) -> Result<Option<i32>, AdapterError> {
        match data {
            ParamValue::File(UploadedFile::Native(_)) => {
                NativeRequestAdapter::upload_file_error(data)
            }
            ParamValue::File(UploadedFile::Message(_)) => {
                MessageRequestAdapter::upload_file_error(data)
            }
            _ => Ok(None),
        }
    }
}

impl std::fmt::Debug for AdapterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterFactory")
            .field("response_factory", &self.response_factory.as_ref().map(|_| "<factory>"))
            .finish()
    }
}

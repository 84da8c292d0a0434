//! # Bridgework
//!
//! A **uniform abstraction over two incompatible HTTP request/response
//! models** — a framework-native mutable model and a standards-based
//! immutable message model — plus the form auto-submission handler built on
//! top of it, and a URN (structured resource name) subsystem with pluggable
//! object resolution.
//!
//! Downstream code reads query parameters, body parameters, headers, and
//! uploaded files through one adapter contract without knowing which model
//! is underneath.
//!
//! ## Quick start — adapting a request
//!
//! ```rust
//! use bridgework::{AdapterFactory, NativeRequest};
//!
//! let request = NativeRequest::new("GET").with_query_param("page", 2);
//!
//! let factory = AdapterFactory::new();
//! let adapter = factory.create_request_adapter(&request).expect("supported request");
//! assert_eq!(adapter.request_method(), "GET");
//! assert!(adapter.has_query_param("page"));
//! ```
//!
//! ## Quick start — URNs
//!
//! ```rust
//! use bridgework::Urn;
//!
//! let urn: Urn = "urn:library:::admin:book:42".parse().expect("valid urn");
//! assert_eq!(urn.class, "book");
//! assert_eq!(urn.id, "42");
//! assert_eq!(urn.to_string(), "urn:library:::admin:book:42");
//! ```

mod converter;
mod decode;
mod error;
mod factory;
mod file;
mod form;
mod model;
mod request;
mod response;
mod urn;
mod value;

// Re-export public API.
pub use converter::{ClassMap, ManagerRegistry, ObjectManager, TypeMetadata, UrnConverter};
pub use decode::{BodyDecoder, StandardBodyDecoder, decode_form_urlencoded};
pub use error::{AdapterError, UrnError};
pub use factory::AdapterFactory;
pub use file::{MessageFile, NativeFile, NativeUpload, UploadedFile, upload_error};
pub use form::{AutoSubmitRequestHandler, Form, PostMaxSize, ServerParams};
pub use model::{
    HeaderMap, MessageRequest, MessageResponse, MessageResponseFactory, NativeBody, NativeRequest,
    NativeResponse, ResponseFactory, StreamedBody,
};
pub use request::{
    DEFAULT_REQUEST_CONTENT_TYPE, MessageRequestAdapter, NativeRequestAdapter, RequestAdapter,
};
pub use response::{
    AnyResponse, DEFAULT_RESPONSE_CONTENT_TYPE, MessageResponseAdapter, NativeResponseAdapter,
    ResponseAdapter,
};
pub use urn::{Urn, UrnGenerator, derive_urn_class};
pub use value::{ParamMap, ParamValue, replace_recursive};

use std::fmt;

/// Errors raised by the adapter layer and the form request handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The factory was handed a request object of an unrecognized type.
    /// Carries the full type name of the rejected object.
    UnsupportedRequestObject(String),
    /// The factory was handed a response object of an unrecognized type.
    UnsupportedResponseObject(String),
    /// A caller violated a stated precondition (wrong request kind, wrong
    /// file value kind, missing response factory).
    InvalidArgument(String),
    /// A query parameter lookup named a parameter that is absent.
    NonExistentParameter(String),
    /// A file lookup named an upload that is absent.
    NonExistentFile(String),
    /// An I/O failure while capturing streamed response content.
    Io(String),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedRequestObject(ty) => {
                write!(f, "cannot create an adapter for the request type \"{ty}\"")
            }
            Self::UnsupportedResponseObject(ty) => {
                write!(f, "cannot create an adapter for the response type \"{ty}\"")
            }
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::NonExistentParameter(name) => {
                write!(f, "you have requested non-existent parameter \"{name}\"")
            }
            Self::NonExistentFile(name) => {
                write!(f, "you have requested non-existent file \"{name}\"")
            }
            Self::Io(msg) => write!(f, "i/o error while reading response content: {msg}"),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Errors raised by the URN value type, class-map builder, and resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrnError {
    /// The input does not match the six-segment URN grammar.
    InvalidUrn(String),
    /// A URN was constructed or parsed without a class segment.
    MissingClass,
    /// A URN was constructed or parsed without an identifier segment.
    MissingId,
    /// Two registered types declared the same URN class name.
    InvalidConfiguration(String),
    /// A URN could not be resolved to an object (unknown domain or class,
    /// missing or type-mismatched item).
    ResourceNotFound(String),
    /// The class-map cache file could not be read or written.
    Cache(String),
}

impl fmt::Display for UrnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrn(value) => write!(f, "not a valid urn: \"{value}\""),
            Self::MissingClass => write!(f, "urn class must not be empty"),
            Self::MissingId => write!(f, "urn identifier must not be empty"),
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            Self::ResourceNotFound(msg) => write!(f, "{msg}"),
            Self::Cache(msg) => write!(f, "class map cache error: {msg}"),
        }
    }
}

impl std::error::Error for UrnError {}

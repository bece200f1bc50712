//! The raised value before classification

use crate::code::{CodedError, ErrorCode, NetworkErrorCode};
use crate::error::StructuredError;
use std::sync::Arc;

/// A raised value of unknown shape.
///
/// Rust errors travel as `anyhow::Error` (shared so the original can be
/// retained as the cause of every structured error derived from it),
/// loosely shaped values such as decoded JSON payloads travel as
/// `serde_json::Value`, and values that were already classified keep their
/// structure.
#[derive(Debug, Clone)]
pub enum Raw {
    Error(Arc<anyhow::Error>),
    Value(serde_json::Value),
    Structured(Box<StructuredError>),
}

impl Raw {
    /// Wrap any Rust error. A `StructuredError` is kept as such.
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Raw::from(anyhow::Error::new(err))
    }

    /// The already-classified error, if this is one
    pub fn as_structured(&self) -> Option<&StructuredError> {
        match self {
            Raw::Structured(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Human-readable message. Never fails: values without a message field
    /// are rendered as text.
    pub fn message(&self) -> String {
        match self {
            Raw::Error(err) => err.to_string(),
            Raw::Structured(err) => err.message().to_string(),
            Raw::Value(value) => value_message(value),
        }
    }

    /// The recognised error code, if the value exposes one.
    ///
    /// JSON objects are checked for a `code` field. Rust errors are checked
    /// along their whole source chain for a [`CodedError`], an embedded
    /// [`StructuredError`] with a code, or a connection-level
    /// `std::io::Error`.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Raw::Structured(err) => err.code(),
            Raw::Value(value) => value
                .get("code")
                .and_then(|code| code.as_str())
                .and_then(ErrorCode::parse),
            Raw::Error(err) => err.chain().find_map(|cause| {
                if let Some(coded) = cause.downcast_ref::<CodedError>() {
                    return coded.error_code();
                }
                if let Some(structured) = cause.downcast_ref::<StructuredError>() {
                    return structured.code();
                }
                cause.downcast_ref::<std::io::Error>().and_then(io_error_code)
            }),
        }
    }

    /// JSON rendering used in reports
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Raw::Error(err) => serde_json::Value::String(format!("{:#}", err)),
            Raw::Value(value) => value.clone(),
            Raw::Structured(err) => {
                serde_json::to_value(err.report()).unwrap_or(serde_json::Value::Null)
            }
        }
    }
}

fn value_message(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => match map.get("message") {
            Some(serde_json::Value::String(message)) => message.clone(),
            Some(message) => message.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

fn io_error_code(err: &std::io::Error) -> Option<ErrorCode> {
    let code = match err.kind() {
        std::io::ErrorKind::TimedOut => NetworkErrorCode::RequestTimeout,
        std::io::ErrorKind::ConnectionRefused => NetworkErrorCode::ConnectionRefused,
        std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
            NetworkErrorCode::ConnectionReset
        }
        std::io::ErrorKind::AddrNotAvailable => NetworkErrorCode::HostUnreachable,
        _ => return None,
    };
    Some(ErrorCode::Network(code))
}

/// Identity for Rust errors (same shared allocation), structural equality
/// for everything else.
impl PartialEq for Raw {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Raw::Error(a), Raw::Error(b)) => Arc::ptr_eq(a, b),
            (Raw::Value(a), Raw::Value(b)) => a == b,
            (Raw::Structured(a), Raw::Structured(b)) => a == b,
            _ => false,
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// A bare `StructuredError` is unwrapped. One with `.context(..)` layered on
/// top stays a Rust error, so the added context is not lost.
impl From<anyhow::Error> for Raw {
    fn from(err: anyhow::Error) -> Self {
        let bare = err
            .chain()
            .next()
            .is_some_and(|outer| outer.is::<StructuredError>());
        if !bare {
            return Raw::Error(Arc::new(err));
        }
        match err.downcast::<StructuredError>() {
            Ok(structured) => Raw::Structured(Box::new(structured)),
            Err(err) => Raw::Error(Arc::new(err)),
        }
    }
}

impl From<StructuredError> for Raw {
    fn from(err: StructuredError) -> Self {
        Raw::Structured(Box::new(err))
    }
}

impl From<std::io::Error> for Raw {
    fn from(err: std::io::Error) -> Self {
        Raw::error(err)
    }
}

impl From<CodedError> for Raw {
    fn from(err: CodedError) -> Self {
        Raw::error(err)
    }
}

impl From<serde_json::Value> for Raw {
    fn from(value: serde_json::Value) -> Self {
        Raw::Value(value)
    }
}

impl From<String> for Raw {
    fn from(message: String) -> Self {
        Raw::Value(serde_json::Value::String(message))
    }
}

impl From<&str> for Raw {
    fn from(message: &str) -> Self {
        Raw::from(message.to_string())
    }
}

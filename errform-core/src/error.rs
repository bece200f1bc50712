//! Errform error types
//!
//! Re-exports errform-error and provides pipeline-specific constructors.

pub use errform_error::{
    CodedError, DatabaseErrorCode, ErrorCategory, ErrorCode, ErrorContext, ErrorKind,
    ErrorLayer, ErrorReport, NetworkErrorCode, ParseEnumError, Raw, Result, StructuredError,
};

// =============================================================================
// Configuration error constructors
// =============================================================================

/// Create a BadConfig error for a value that could not be parsed
pub fn invalid_setting(key: impl Into<String>, value: impl Into<String>) -> StructuredError {
    let key = key.into();
    let value = value.into();
    StructuredError::bad_config(format!("invalid value '{}' for '{}'", value, key))
        .with_context(
            ErrorContext::new()
                .with_module_name("config")
                .with_extra("key", key)
                .with_extra("value", value),
        )
}

/// Create a BadConfig error for a configuration document that failed to load
pub fn config_unreadable(
    source: impl std::error::Error + Send + Sync + 'static,
    origin: impl Into<String>,
) -> StructuredError {
    let origin = origin.into();
    StructuredError::bad_config(format!("cannot load configuration from {}: {}", origin, source))
        .with_context(
            ErrorContext::new()
                .with_module_name("config")
                .with_extra("origin", origin),
        )
        .with_cause(Raw::error(source))
}

//! # errform-error
//!
//! The error taxonomy and the structured error type of errform.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Which shape the error takes (e.g., Validation, Database)
//! - **ErrorCategory**: The broad class consumers match on
//! - **ErrorLayer**: The architectural layer that raised it
//! - **ErrorCode**: Fine-grained network/database codes
//! - **ErrorContext**: Where it was raised, supplied by the caller
//! - **Raw**: The raised value before classification, kept as the cause
//!
//! ## Usage
//!
//! ```rust
//! use errform_error::{ErrorContext, ErrorLayer, StructuredError};
//!
//! fn example() -> errform_error::Result<()> {
//!     Err(StructuredError::not_found("user:42")
//!         .with_context(ErrorContext::new()
//!             .with_layer(ErrorLayer::Repository)
//!             .with_class_name("UserRepository")
//!             .with_method_name("find_by_id")))
//! }
//! ```
//!
//! ## Stability
//!
//! Every enumeration serializes to a stable string identifier
//! (`"not_found"`, `"ExternalService"`, `"DATABASE_TIMEOUT_ERROR"`). These
//! end up in logs and API responses and are never renamed.

mod code;
mod context;
mod error;
mod kind;
mod raw;

pub use code::{CodedError, DatabaseErrorCode, ErrorCode, NetworkErrorCode};
pub use context::ErrorContext;
pub use error::{ErrorReport, StructuredError};
pub use kind::{ErrorCategory, ErrorKind, ErrorLayer, ParseEnumError};
pub use raw::Raw;

/// Result type alias using the structured error
pub type Result<T> = std::result::Result<T, StructuredError>;

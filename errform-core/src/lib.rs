//! # Errform
//!
//! Turns raised errors into classified, structured errors.
//!
//! ## Core Concepts
//! - **Stack normalization**: Capture the call stack, relabel its header,
//!   strip the working directory and drop noise lines
//! - **Classification**: Map a raised value of any shape onto one
//!   [`StructuredError`], keeping the original as its cause
//! - **Transformation**: Both of the above, driven by a [`TransformerConfig`]
//! - **Wrapping**: Run work and transform whatever error it fails with

pub mod classify;
pub mod config;
pub mod error;
pub mod stack;
pub mod transform;
pub mod wrap;

pub use classify::classify;
pub use config::TransformerConfig;
pub use error::{
    CodedError, DatabaseErrorCode, ErrorCategory, ErrorCode, ErrorContext, ErrorKind,
    ErrorLayer, ErrorReport, NetworkErrorCode, Raw, Result, StructuredError,
};
pub use stack::{
    filter_lines, generate_normalized_stack, normalize_trace, remove_working_directory_prefix,
    BacktraceSource, FixedStack, StackOptions, StackSource,
};
pub use transform::{transform, ErrorTransformer, TransformOptions};
pub use wrap::{
    run_catching_unwind, run_with_transform, transform_future, wrap_with_transform,
    AutoTransform, ResultExt,
};

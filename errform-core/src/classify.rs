//! # Error classification
//!
//! Maps a raised value of any shape onto exactly one [`StructuredError`].
//! Classification is total: whatever comes in, a structured error comes out
//! and the original value is kept as its cause.

use crate::error::{ErrorContext, ErrorKind, Raw, StructuredError};
use tracing::debug;

/// Classify a raised value.
///
/// - An already-classified error is returned as is, except that context
///   fields it does not have yet are filled from `context`. A kind that was
///   only the Internal fallback, or a category that only followed the kind,
///   is derived again from the merged context.
/// - Otherwise the kind comes from a recognised error code (Network or
///   Database), then from the kind requested in `context`, and falls back to
///   Internal. The category is the one in `context`, or the kind's default.
///
/// # Example
///
/// ```rust
/// use errform_core::{classify, ErrorCategory, ErrorContext, ErrorKind, ErrorLayer};
/// use serde_json::json;
///
/// let ctx = ErrorContext::new().with_layer(ErrorLayer::Service);
/// let err = classify(json!({"code": "REQUEST_TIMEOUT", "message": "timed out"}), &ctx);
///
/// assert_eq!(err.kind(), ErrorKind::Network);
/// assert_eq!(err.category(), ErrorCategory::Network);
/// assert_eq!(err.message(), "timed out");
/// ```
pub fn classify(raw: impl Into<Raw>, context: &ErrorContext) -> StructuredError {
    let raw = raw.into();

    if let Raw::Structured(existing) = raw {
        debug!(kind = %existing.kind(), "error already classified, merging context");
        return reclassify(*existing, context);
    }

    let message = raw.message();
    let code = raw.error_code();
    let hinted = code.map(|code| code.kind()).or(context.kind());
    let kind = hinted.unwrap_or(ErrorKind::Internal);

    debug!(
        %kind,
        category = %context.category().unwrap_or_else(|| kind.default_category()),
        code = code.map(|code| code.as_str()),
        layer = context.layer().map(|layer| layer.as_str()),
        "classified error"
    );

    let mut err = StructuredError::new(kind, message)
        .with_context(context.clone())
        .with_cause(raw);
    if hinted.is_none() {
        err = err.with_fallback_kind();
    }
    if let Some(category) = context.category() {
        err = err.with_category(category);
    }
    match code {
        Some(code) => err.with_code(code),
        None => err,
    }
}

fn reclassify(existing: StructuredError, context: &ErrorContext) -> StructuredError {
    let mut err = existing.merge_context(context);
    if err.has_fallback_kind() {
        if let Some(kind) = err.context().kind() {
            err = err.with_kind(kind);
        }
    }
    if !err.has_explicit_category() {
        if let Some(category) = err.context().category() {
            err = err.with_category(category);
        }
    }
    err
}

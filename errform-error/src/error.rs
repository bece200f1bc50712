//! The structured error type produced by classification

use crate::{ErrorCategory, ErrorCode, ErrorContext, ErrorKind, Raw};
use serde::Serialize;
use std::fmt;

/// The canonical, classified form of a raised error.
///
/// This error type provides:
/// - `kind`: Which structured shape the error takes
/// - `category`: The broad class, matched on by consumers
/// - `code`: A fine-grained network or database code (if recognised)
/// - `message`: Human-readable description
/// - `cleaned_stack`: The normalized call stack (if one was captured)
/// - `context`: Where the error was raised
/// - `cause`: The original raised value, never discarded
///
/// # Example
///
/// ```rust
/// use errform_error::{ErrorCategory, ErrorContext, ErrorKind, ErrorLayer, StructuredError};
///
/// let err = StructuredError::new(ErrorKind::NotFound, "user 42 not found")
///     .with_context(ErrorContext::new().with_layer(ErrorLayer::Repository));
///
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// assert!(err.cleaned_stack().is_none());
/// ```
#[derive(Clone, PartialEq)]
pub struct StructuredError {
    kind: ErrorKind,
    /// Set when the kind was picked for lack of a code or kind hint
    fallback_kind: bool,
    /// `None` follows the kind's default category
    category: Option<ErrorCategory>,
    code: Option<ErrorCode>,
    message: String,
    cleaned_stack: Option<String>,
    context: ErrorContext,
    cause: Option<Raw>,
}

impl StructuredError {
    /// Create a new error with the given kind and message. The category is
    /// the kind's default.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            fallback_kind: false,
            category: None,
            code: None,
            message: message.into(),
            cleaned_stack: None,
            context: ErrorContext::default(),
            cause: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        self.category.unwrap_or_else(|| self.kind.default_category())
    }

    /// Whether the kind is only the Internal fallback, so a later kind hint
    /// may still replace it
    pub fn has_fallback_kind(&self) -> bool {
        self.fallback_kind
    }

    /// Whether the category was set explicitly rather than taken from the
    /// kind
    pub fn has_explicit_category(&self) -> bool {
        self.category.is_some()
    }

    /// Get the fine-grained code
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the normalized stack trace. `None` means no trace was available.
    pub fn cleaned_stack(&self) -> Option<&str> {
        self.cleaned_stack.as_deref()
    }

    /// Get the context the error was raised in
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Get the original raised value
    pub fn cause(&self) -> Option<&Raw> {
        self.cause.as_ref()
    }

    /// HTTP status matching the kind
    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    /// Set the kind. A category that follows the kind's default follows the
    /// new kind.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self.fallback_kind = false;
        self
    }

    /// Mark the kind as a fallback, replaceable by a kind hint when the error
    /// is classified again
    pub fn with_fallback_kind(mut self) -> Self {
        self.fallback_kind = true;
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the fine-grained code
    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Replace the context
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    /// Fill context fields that are not set yet. Fields already present are
    /// kept.
    pub fn merge_context(mut self, context: &ErrorContext) -> Self {
        self.context = self.context.merged_with(context);
        self
    }

    /// Set the normalized stack trace
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.cleaned_stack = Some(stack.into());
        self
    }

    /// Set the stack trace unless one is already present
    pub fn with_stack_if_absent(mut self, stack: Option<String>) -> Self {
        if self.cleaned_stack.is_none() {
            self.cleaned_stack = stack;
        }
        self
    }

    /// Set the original raised value.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if a cause was already set.
    pub fn with_cause(mut self, cause: impl Into<Raw>) -> Self {
        debug_assert!(self.cause.is_none(), "cause already set");
        self.cause = Some(cause.into());
        self
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    /// Serializable snapshot for logs and API responses
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind,
            category: self.category(),
            code: self.code,
            message: self.message.clone(),
            http_status: self.http_status(),
            stack: self.cleaned_stack.clone(),
            context: self.context.clone(),
            cause: self.cause.as_ref().map(Raw::to_json),
        }
    }
}

/// Serializable view of a [`StructuredError`].
///
/// Identifiers are the stable strings of the enumerations, e.g.
/// `"not_found"` or `"DATABASE_TIMEOUT_ERROR"`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    pub message: String,
    pub http_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "ErrorContext::is_empty")]
    pub context: ErrorContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<serde_json::Value>,
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, " ({})", self.category())?;

        if let Some(operation) = self.context.operation() {
            write!(f, " at {}", operation)?;
        }

        if !self.context.is_empty() {
            write!(f, ", context {}", self.context)?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.category())?;
        if let Some(code) = self.code {
            write!(f, " [{}]", code)?;
        }
        writeln!(f)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context: {}", self.context)?;
        }

        if let Some(stack) = &self.cleaned_stack {
            writeln!(f)?;
            writeln!(f, "    Stack:")?;
            for line in stack.lines() {
                writeln!(f, "        {}", line)?;
            }
        }

        if let Some(cause) = &self.cause {
            writeln!(f)?;
            writeln!(f, "    Cause: {:?}", cause)?;
        }

        Ok(())
    }
}

// =============================================================================
// std::error::Error implementation
// =============================================================================

impl std::error::Error for StructuredError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.cause.as_ref()? {
            Raw::Error(err) => Some(&***err),
            Raw::Structured(err) => Some(&**err),
            Raw::Value(_) => None,
        }
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl StructuredError {
    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an ExternalService error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        let service = service.into();
        Self::new(ErrorKind::ExternalService, message)
            .with_context(ErrorContext::new().with_extra("service", service))
    }

    /// Create a Database error carrying a code
    pub fn database(code: crate::DatabaseErrorCode, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message).with_code(code)
    }

    /// Create a Network error carrying a code
    pub fn network(code: crate::NetworkErrorCode, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message).with_code(code)
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::new(ErrorKind::NotFound, format!("'{}' not found", resource))
            .with_context(ErrorContext::new().with_extra("resource", resource))
    }

    /// Create an Authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create an Authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create a BadConfig error
    pub fn bad_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadConfig, message)
    }

    /// Create a Transformation error
    pub fn transformation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transformation, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabaseErrorCode, ErrorLayer, NetworkErrorCode};
    use std::error::Error as _;

    #[test]
    fn test_error_creation() {
        let err = StructuredError::new(ErrorKind::Validation, "email is required");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.message(), "email is required");
        assert!(err.cause().is_none());
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_merge_context_keeps_existing_fields() {
        let err = StructuredError::internal("boom")
            .with_context(ErrorContext::new().with_layer(ErrorLayer::Service))
            .merge_context(
                &ErrorContext::new()
                    .with_layer(ErrorLayer::Controller)
                    .with_method_name("create"),
            );

        assert_eq!(err.context().layer(), Some(ErrorLayer::Service));
        assert_eq!(err.context().method_name(), Some("create"));
    }

    #[test]
    fn test_default_category_follows_kind() {
        let err = StructuredError::internal("boom").with_fallback_kind();
        assert!(err.has_fallback_kind());
        assert!(!err.has_explicit_category());

        let err = err.with_kind(ErrorKind::Validation);
        assert!(!err.has_fallback_kind());
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = err.with_category(ErrorCategory::Conflict).with_kind(ErrorKind::NotFound);
        assert!(err.has_explicit_category());
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_stack_if_absent() {
        let err = StructuredError::internal("boom").with_stack_if_absent(Some("first".into()));
        let err = err.with_stack_if_absent(Some("second".into()));
        assert_eq!(err.cleaned_stack(), Some("first"));
    }

    #[test]
    fn test_display() {
        let err = StructuredError::network(NetworkErrorCode::RequestTimeout, "timed out")
            .with_context(
                ErrorContext::new()
                    .with_layer(ErrorLayer::Service)
                    .with_class_name("PaymentClient")
                    .with_method_name("charge"),
            );

        let display = err.to_string();
        assert!(display.starts_with("Network[REQUEST_TIMEOUT] (network) at PaymentClient.charge"));
        assert!(display.contains("layer: service"));
        assert!(display.ends_with("=> timed out"));
    }

    #[test]
    fn test_source_exposes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StructuredError::internal("could not open").with_cause(io);
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "denied");

        let err = StructuredError::internal("plain").with_cause("just text");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_report() {
        let err = StructuredError::database(DatabaseErrorCode::DatabaseTimeoutError, "slow query")
            .with_cause(serde_json::json!({"code": "DATABASE_TIMEOUT_ERROR"}));

        let json = serde_json::to_value(err.report()).unwrap();
        assert_eq!(json["kind"], "Database");
        assert_eq!(json["category"], "database");
        assert_eq!(json["code"], "DATABASE_TIMEOUT_ERROR");
        assert_eq!(json["httpStatus"], 500);
        assert_eq!(json["cause"]["code"], "DATABASE_TIMEOUT_ERROR");
        assert!(json.get("stack").is_none());
        assert!(json.get("context").is_none());
    }

    #[test]
    fn test_convenience_constructors() {
        let err = StructuredError::not_found("user:42");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.message().contains("user:42"));
        assert_eq!(err.context().extra("resource"), Some("user:42"));

        let err = StructuredError::bad_config("missing DATABASE_URL");
        assert_eq!(err.category(), ErrorCategory::BadConfig);

        let err = StructuredError::external_service("stripe", "502 from upstream");
        assert_eq!(err.kind(), ErrorKind::ExternalService);
    }
}

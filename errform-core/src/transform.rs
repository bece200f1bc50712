//! # Error transformation
//!
//! The entry point for calling code: take a raised value and the context it
//! was raised in, capture and normalize the current stack, classify the
//! value and hand back a single [`StructuredError`]. Whether that error is
//! returned or propagated with `?` is up to the caller.

use crate::classify::classify;
use crate::config::TransformerConfig;
use crate::error::{ErrorContext, Raw, StructuredError};
use crate::stack::{normalize_captured, BacktraceSource, StackSource};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Per-call options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Whether the error came out of a synchronous call (as opposed to an
    /// awaited future)
    pub synchronous: bool,
}

impl TransformOptions {
    pub fn sync() -> Self {
        Self { synchronous: true }
    }

    pub fn asynchronous() -> Self {
        Self { synchronous: false }
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::sync()
    }
}

/// Turns raised values into structured errors.
///
/// Holds no mutable state; one transformer can be shared freely. The only
/// ambient inputs are the current call stack and working directory, read at
/// call time.
#[derive(Clone)]
pub struct ErrorTransformer {
    config: TransformerConfig,
    source: Arc<dyn StackSource>,
}

impl ErrorTransformer {
    /// Create a transformer capturing real backtraces
    pub fn new(config: TransformerConfig) -> Self {
        Self {
            config,
            source: Arc::new(BacktraceSource),
        }
    }

    /// Replace where traces come from
    pub fn with_stack_source(mut self, source: impl StackSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Normalized stack for an error raised in `context`, labelled after the
    /// context's layer
    pub fn capture_stack(&self, context: &ErrorContext) -> Option<String> {
        if !self.config.capture_stack {
            return None;
        }
        let label = context.layer().map(|layer| layer.error_label());
        normalize_captured(self.source.as_ref(), &self.config.stack_options(label))
    }

    /// Transform a raised value.
    ///
    /// An error that was already classified keeps the stack it was given
    /// first.
    pub fn transform(
        &self,
        raw: impl Into<Raw>,
        context: &ErrorContext,
        options: TransformOptions,
    ) -> StructuredError {
        let stack = self.capture_stack(context);
        let err = classify(raw, context).with_stack_if_absent(stack);

        let operation = context.operation();
        debug!(
            kind = %err.kind(),
            category = %err.category(),
            synchronous = options.synchronous,
            operation = operation.as_deref(),
            has_stack = err.cleaned_stack().is_some(),
            "transformed error"
        );
        err
    }
}

impl Default for ErrorTransformer {
    fn default() -> Self {
        Self::new(TransformerConfig::default())
    }
}

impl fmt::Debug for ErrorTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTransformer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Transform with the default configuration
pub fn transform(
    raw: impl Into<Raw>,
    context: &ErrorContext,
    options: TransformOptions,
) -> StructuredError {
    ErrorTransformer::default().transform(raw, context, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, ErrorKind, ErrorLayer};
    use crate::stack::{working_directory, FixedStack};
    use serde_json::json;

    fn fixed_trace() -> String {
        let cwd = working_directory().unwrap();
        format!(
            "Error: \n    at find ({cwd}/src/repo.rs:4:9)\n    at poll ({cwd}/vendor/runtime/task.rs:80:1)\n    at main ({cwd}/src/main.rs:1:1)"
        )
    }

    fn transformer() -> ErrorTransformer {
        let config = TransformerConfig {
            exclusions: vec!["vendor".to_string()],
            ..TransformerConfig::default()
        };
        ErrorTransformer::new(config).with_stack_source(FixedStack::new(fixed_trace()))
    }

    #[test]
    fn test_transform_generic_error() {
        let ctx = ErrorContext::new().with_layer(ErrorLayer::Repository);
        let raw = Raw::from(anyhow::anyhow!("User not found"));

        let err = transformer().transform(raw.clone(), &ctx, TransformOptions::sync());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert_eq!(err.message(), "User not found");
        assert_eq!(err.cause(), Some(&raw));
        assert_eq!(
            err.cleaned_stack(),
            Some("RepositoryError:\n    at find (/src/repo.rs:4:9)\n    at main (/src/main.rs:1:1)")
        );
    }

    #[test]
    fn test_transform_without_layer_keeps_header() {
        let err = transformer().transform("boom", &ErrorContext::new(), TransformOptions::sync());
        let stack = err.cleaned_stack().unwrap();
        assert!(stack.starts_with("Error: \n"));
    }

    #[test]
    fn test_transform_network_object() {
        let ctx = ErrorContext::new().with_layer(ErrorLayer::Service);
        let err = transformer().transform(
            json!({"code": "REQUEST_TIMEOUT", "message": "timed out"}),
            &ctx,
            TransformOptions::asynchronous(),
        );
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.message(), "timed out");
        assert!(err.cleaned_stack().unwrap().starts_with("ServiceError:\n"));
    }

    #[test]
    fn test_no_stack_available() {
        let transformer = ErrorTransformer::default().with_stack_source(FixedStack::unavailable());
        let err = transformer.transform("boom", &ErrorContext::new(), TransformOptions::sync());
        assert_eq!(err.cleaned_stack(), None);
    }

    #[test]
    fn test_capture_disabled() {
        let config = TransformerConfig {
            capture_stack: false,
            ..TransformerConfig::default()
        };
        let transformer = ErrorTransformer::new(config).with_stack_source(FixedStack::new(fixed_trace()));
        let err = transformer.transform("boom", &ErrorContext::new(), TransformOptions::sync());
        assert_eq!(err.cleaned_stack(), None);
    }

    #[test]
    fn test_retransform_keeps_first_stack_and_context() {
        let inner = ErrorContext::new().with_layer(ErrorLayer::Repository);
        let outer = ErrorContext::new()
            .with_layer(ErrorLayer::Controller)
            .with_method_name("show");

        let first = transformer().transform("gone", &inner, TransformOptions::sync());
        let second = transformer().transform(first.clone(), &outer, TransformOptions::sync());

        assert_eq!(second.cleaned_stack(), first.cleaned_stack());
        assert_eq!(second.context().layer(), Some(ErrorLayer::Repository));
        assert_eq!(second.context().method_name(), Some("show"));
    }

    #[test]
    fn test_real_backtrace() {
        let ctx = ErrorContext::new().with_layer(ErrorLayer::Utility);
        let err = transform("boom", &ctx, TransformOptions::sync());
        let stack = err.cleaned_stack().expect("backtraces are supported here");
        assert_eq!(stack.lines().next(), Some("UtilityError:"));
    }
}

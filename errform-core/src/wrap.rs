//! # Wrapping adapters
//!
//! Catch, classify, propagate: these helpers run a unit of work and hand
//! any error it fails with to the [`ErrorTransformer`], so the caller sees a
//! [`StructuredError`] instead of the original.
//!
//! [`AutoTransform`] is the per-type registration record: it holds the layer,
//! type name and shared context once, and says which operations are wrapped.

use crate::error::{ErrorContext, ErrorLayer, Raw, StructuredError};
use crate::transform::{ErrorTransformer, TransformOptions};
use futures_util::FutureExt;
use std::any::Any;
use std::collections::BTreeSet;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

// =============================================================================
// Transformer-bound adapters
// =============================================================================

impl ErrorTransformer {
    /// Wrap `f` so that every error it returns is transformed in `context`.
    ///
    /// Multiple arguments are passed as a tuple.
    pub fn wrap<A, T, E, F>(
        &self,
        f: F,
        context: ErrorContext,
    ) -> impl Fn(A) -> Result<T, StructuredError>
    where
        F: Fn(A) -> Result<T, E>,
        E: Into<Raw>,
    {
        let transformer = self.clone();
        move |args| {
            f(args).map_err(|err| transformer.transform(err, &context, TransformOptions::sync()))
        }
    }

    /// Run `f` once, transforming its error
    pub fn run<T, E>(
        &self,
        context: &ErrorContext,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, StructuredError>
    where
        E: Into<Raw>,
    {
        f().map_err(|err| self.transform(err, context, TransformOptions::sync()))
    }

    /// Run `f` once, transforming its error or its panic.
    ///
    /// A panic becomes an error carrying the panic message, with
    /// `panicked: true` in its context.
    pub fn run_catching_unwind<T, E>(
        &self,
        context: &ErrorContext,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, StructuredError>
    where
        E: Into<Raw>,
    {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => result.map_err(|err| self.transform(err, context, TransformOptions::sync())),
            Err(payload) => Err(self.transform_panic(payload, context, TransformOptions::sync())),
        }
    }

    /// Await `future`, transforming the error it completes with.
    ///
    /// Dropping the returned future drops `future` with it; cancellation is
    /// never turned into an error.
    pub async fn transform_future<T, E, Fut>(
        &self,
        context: &ErrorContext,
        future: Fut,
    ) -> Result<T, StructuredError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<Raw>,
    {
        future
            .await
            .map_err(|err| self.transform(err, context, TransformOptions::asynchronous()))
    }

    /// Like [`ErrorTransformer::transform_future`], but a panic while polling
    /// is transformed as well
    pub async fn transform_future_catching_unwind<T, E, Fut>(
        &self,
        context: &ErrorContext,
        future: Fut,
    ) -> Result<T, StructuredError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<Raw>,
    {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result
                .map_err(|err| self.transform(err, context, TransformOptions::asynchronous())),
            Err(payload) => {
                Err(self.transform_panic(payload, context, TransformOptions::asynchronous()))
            }
        }
    }

    fn transform_panic(
        &self,
        payload: Box<dyn Any + Send>,
        context: &ErrorContext,
        options: TransformOptions,
    ) -> StructuredError {
        let message = panic_message(payload.as_ref());
        let operation = context.operation().unwrap_or_default();
        warn!(%message, %operation, "wrapped call panicked");
        let context = context.clone().with_extra("panicked", "true");
        self.transform(message, &context, options)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return message.to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "panic with a non-string payload".to_string()
}

// =============================================================================
// Free functions using the default transformer
// =============================================================================

/// Wrap `f` so its errors are transformed with the default configuration.
///
/// # Example
///
/// ```rust
/// use errform_core::{wrap_with_transform, ErrorContext, ErrorKind, ErrorLayer};
///
/// let parse_port = wrap_with_transform(
///     |raw: &str| raw.parse::<u16>().map_err(|e| e.to_string()),
///     ErrorContext::new().with_layer(ErrorLayer::Utility).with_method_name("parse_port"),
/// );
///
/// assert_eq!(parse_port("8080").unwrap(), 8080);
/// let err = parse_port("http").unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::Internal);
/// assert_eq!(err.context().method_name(), Some("parse_port"));
/// ```
pub fn wrap_with_transform<A, T, E, F>(
    f: F,
    context: ErrorContext,
) -> impl Fn(A) -> Result<T, StructuredError>
where
    F: Fn(A) -> Result<T, E>,
    E: Into<Raw>,
{
    ErrorTransformer::default().wrap(f, context)
}

/// Run `f` once with the default transformer
pub fn run_with_transform<T, E>(
    context: &ErrorContext,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, StructuredError>
where
    E: Into<Raw>,
{
    ErrorTransformer::default().run(context, f)
}

/// Run `f` once with the default transformer, catching panics
pub fn run_catching_unwind<T, E>(
    context: &ErrorContext,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, StructuredError>
where
    E: Into<Raw>,
{
    ErrorTransformer::default().run_catching_unwind(context, f)
}

/// Await `future` with the default transformer
pub async fn transform_future<T, E, Fut>(
    context: &ErrorContext,
    future: Fut,
) -> Result<T, StructuredError>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<Raw>,
{
    ErrorTransformer::default()
        .transform_future(context, future)
        .await
}

/// Extension trait for transforming the error of a `Result` in place
pub trait ResultExt<T> {
    /// Transform the error with the default transformer
    fn transform_err(self, context: &ErrorContext) -> Result<T, StructuredError>;

    /// Transform the error with the given transformer
    fn transform_err_with(
        self,
        transformer: &ErrorTransformer,
        context: &ErrorContext,
    ) -> Result<T, StructuredError>;
}

impl<T, E: Into<Raw>> ResultExt<T> for Result<T, E> {
    fn transform_err(self, context: &ErrorContext) -> Result<T, StructuredError> {
        self.transform_err_with(&ErrorTransformer::default(), context)
    }

    fn transform_err_with(
        self,
        transformer: &ErrorTransformer,
        context: &ErrorContext,
    ) -> Result<T, StructuredError> {
        self.map_err(|err| transformer.transform(err, context, TransformOptions::sync()))
    }
}

// =============================================================================
// AutoTransform - explicit per-type registration
// =============================================================================

/// Registration record for the operations of one type.
///
/// Every operation is wrapped unless it is excluded; once any operation is
/// listed with [`AutoTransform::operation`] only listed operations are
/// wrapped. Errors of operations that are not wrapped pass through
/// untouched.
///
/// # Example
///
/// ```rust
/// use errform_core::{AutoTransform, ErrorLayer, StructuredError};
///
/// struct UserRepository {
///     errors: AutoTransform,
/// }
///
/// impl UserRepository {
///     fn new() -> Self {
///         Self {
///             errors: AutoTransform::new(ErrorLayer::Repository, "UserRepository")
///                 .exclude("health_check"),
///         }
///     }
///
///     fn find(&self, id: u64) -> Result<String, StructuredError> {
///         self.errors.run("find", || {
///             Err(StructuredError::not_found(format!("user:{}", id)))
///         })
///     }
/// }
///
/// let err = UserRepository::new().find(7).unwrap_err();
/// assert_eq!(err.context().layer(), Some(ErrorLayer::Repository));
/// assert_eq!(err.context().class_name(), Some("UserRepository"));
/// assert_eq!(err.context().method_name(), Some("find"));
/// ```
#[derive(Debug, Clone)]
pub struct AutoTransform {
    base: ErrorContext,
    operations: BTreeSet<String>,
    excluded: BTreeSet<String>,
    transformer: ErrorTransformer,
}

impl AutoTransform {
    /// Register a type living in `layer`
    pub fn new(layer: ErrorLayer, class_name: impl Into<String>) -> Self {
        Self {
            base: ErrorContext::new()
                .with_layer(layer)
                .with_class_name(class_name),
            operations: BTreeSet::new(),
            excluded: BTreeSet::new(),
            transformer: ErrorTransformer::default(),
        }
    }

    /// Add caller-supplied context shared by every operation. Layer and type
    /// name given to [`AutoTransform::new`] are kept.
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.base = self.base.merged_with(&context);
        self
    }

    /// Use a specific transformer
    pub fn with_transformer(mut self, transformer: ErrorTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    /// List an operation to wrap
    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.operations.insert(name.into());
        self
    }

    /// Never wrap this operation
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.insert(name.into());
        self
    }

    /// Whether errors of `operation` are transformed
    pub fn wraps(&self, operation: &str) -> bool {
        if self.excluded.contains(operation) {
            return false;
        }
        self.operations.is_empty() || self.operations.contains(operation)
    }

    /// Context an error of `operation` is transformed in
    pub fn context_for(&self, operation: &str) -> ErrorContext {
        self.base.clone().with_method_name(operation)
    }

    /// Run `operation`. If it is wrapped, its error is transformed and
    /// converted back into `E`; otherwise the error is returned as is.
    pub fn run<T, E>(&self, operation: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: Into<Raw> + From<StructuredError>,
    {
        let result = f();
        if !self.wraps(operation) {
            return result;
        }
        result.map_err(|err| {
            E::from(self.transformer.transform(
                err,
                &self.context_for(operation),
                TransformOptions::sync(),
            ))
        })
    }

    /// Async counterpart of [`AutoTransform::run`]
    pub async fn run_async<T, E, Fut>(&self, operation: &str, future: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<Raw> + From<StructuredError>,
    {
        let result = future.await;
        if !self.wraps(operation) {
            return result;
        }
        result.map_err(|err| {
            E::from(self.transformer.transform(
                err,
                &self.context_for(operation),
                TransformOptions::asynchronous(),
            ))
        })
    }
}

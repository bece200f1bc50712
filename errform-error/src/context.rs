//! Contextual metadata attached to a structured error

use crate::kind::{ErrorCategory, ErrorKind, ErrorLayer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an error was raised and how the caller wants it classified.
///
/// Every field is optional. A context is assembled with the `with_*`
/// builders and is not changed afterwards; [`ErrorContext::merged_with`]
/// produces a new value instead.
///
/// # Example
///
/// ```rust
/// use errform_error::{ErrorContext, ErrorLayer};
///
/// let ctx = ErrorContext::new()
///     .with_layer(ErrorLayer::Repository)
///     .with_class_name("UserRepository")
///     .with_method_name("find_by_id")
///     .with_extra("user_id", "42");
///
/// assert_eq!(ctx.layer(), Some(ErrorLayer::Repository));
/// assert_eq!(ctx.extra("user_id"), Some("42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layer: Option<ErrorLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    module_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extra: Vec<(String, String)>,
}

impl ErrorContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn layer(&self) -> Option<ErrorLayer> {
        self.layer
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.category
    }

    /// Kind requested by the caller, used when the raw error carries no
    /// recognisable code
    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Look up a caller-supplied value
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All caller-supplied pairs, in insertion order
    pub fn extras(&self) -> &[(String, String)] {
        &self.extra
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// `Class.method`, `Class`, `method` or `None`, depending on what is set
    pub fn operation(&self) -> Option<String> {
        match (self.class_name(), self.method_name()) {
            (Some(class), Some(method)) => Some(format!("{}.{}", class, method)),
            (Some(class), None) => Some(class.to_string()),
            (None, Some(method)) => Some(method.to_string()),
            (None, None) => None,
        }
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    pub fn with_layer(mut self, layer: ErrorLayer) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = Some(module_name.into());
        self
    }

    pub fn with_method_name(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Add a caller-supplied pair. A key that is already present keeps its
    /// first value.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if self.extra(&key).is_none() {
            self.extra.push((key, value.into()));
        }
        self
    }

    // =========================================================================
    // Merging
    // =========================================================================

    /// Combine two contexts. Fields set on `self` win; `other` only fills
    /// the gaps, extra keys included.
    pub fn merged_with(&self, other: &ErrorContext) -> ErrorContext {
        let mut merged = self.clone();
        merged.layer = merged.layer.or(other.layer);
        merged.category = merged.category.or(other.category);
        merged.kind = merged.kind.or(other.kind);
        if merged.module_name.is_none() {
            merged.module_name = other.module_name.clone();
        }
        if merged.method_name.is_none() {
            merged.method_name = other.method_name.clone();
        }
        if merged.class_name.is_none() {
            merged.class_name = other.class_name.clone();
        }
        for (key, value) in &other.extra {
            if merged.extra(key).is_none() {
                merged.extra.push((key.clone(), value.clone()));
            }
        }
        merged
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<(&str, &str)> = Vec::new();
        if let Some(layer) = self.layer {
            fields.push(("layer", layer.as_str()));
        }
        if let Some(category) = self.category {
            fields.push(("category", category.as_str()));
        }
        if let Some(kind) = self.kind {
            fields.push(("kind", kind.as_str()));
        }
        if let Some(module) = self.module_name() {
            fields.push(("module", module));
        }
        if let Some(class) = self.class_name() {
            fields.push(("class", class));
        }
        if let Some(method) = self.method_name() {
            fields.push(("method", method));
        }
        for (key, value) in &self.extra {
            fields.push((key.as_str(), value.as_str()));
        }

        write!(f, "{{ ")?;
        for (i, (key, value)) in fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let ctx = ErrorContext::new()
            .with_layer(ErrorLayer::Service)
            .with_module_name("billing")
            .with_extra("invoice", "inv-7");

        assert_eq!(ctx.layer(), Some(ErrorLayer::Service));
        assert_eq!(ctx.module_name(), Some("billing"));
        assert_eq!(ctx.category(), None);
        assert_eq!(ctx.extra("invoice"), Some("inv-7"));
        assert!(!ctx.is_empty());
        assert!(ErrorContext::new().is_empty());
    }

    #[test]
    fn test_extra_keeps_first_value() {
        let ctx = ErrorContext::new()
            .with_extra("attempt", "1")
            .with_extra("attempt", "2");
        assert_eq!(ctx.extras().len(), 1);
        assert_eq!(ctx.extra("attempt"), Some("1"));
    }

    #[test]
    fn test_merge_never_overwrites() {
        let first = ErrorContext::new()
            .with_layer(ErrorLayer::Repository)
            .with_method_name("find")
            .with_extra("id", "1");
        let second = ErrorContext::new()
            .with_layer(ErrorLayer::Controller)
            .with_class_name("UserController")
            .with_extra("id", "2")
            .with_extra("route", "/users/:id");

        let merged = first.merged_with(&second);
        assert_eq!(merged.layer(), Some(ErrorLayer::Repository));
        assert_eq!(merged.method_name(), Some("find"));
        assert_eq!(merged.class_name(), Some("UserController"));
        assert_eq!(merged.extra("id"), Some("1"));
        assert_eq!(merged.extra("route"), Some("/users/:id"));
    }

    #[test]
    fn test_operation() {
        let ctx = ErrorContext::new().with_class_name("Repo").with_method_name("save");
        assert_eq!(ctx.operation().as_deref(), Some("Repo.save"));
        assert_eq!(ErrorContext::new().operation(), None);
    }

    #[test]
    fn test_serialization_omits_unset_fields() {
        let ctx = ErrorContext::new()
            .with_layer(ErrorLayer::Router)
            .with_method_name("route");
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json, serde_json::json!({"layer": "router", "methodName": "route"}));

        let back: ErrorContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, ctx);
    }

    #[test]
    fn test_display() {
        let ctx = ErrorContext::new()
            .with_layer(ErrorLayer::Model)
            .with_extra("field", "email");
        assert_eq!(ctx.to_string(), "{ layer: model, field: email }");
    }
}

//! # Transformer configuration
//!
//! Loaded from JSON (a file or a string), then optionally overridden by
//! environment variables:
//!
//! - `ERRFORM_STACK_EXCLUDE`: comma-separated exclusion substrings
//! - `ERRFORM_STRIP_CWD`: `true` / `false`
//! - `ERRFORM_CAPTURE_STACK`: `true` / `false`

use crate::error::{self, Result};
use crate::stack::StackOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_STACK_EXCLUDE: &str = "ERRFORM_STACK_EXCLUDE";
pub const ENV_STRIP_CWD: &str = "ERRFORM_STRIP_CWD";
pub const ENV_CAPTURE_STACK: &str = "ERRFORM_CAPTURE_STACK";

/// How the transformer treats captured stacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TransformerConfig {
    /// Lines containing any of these are dropped from captured stacks
    pub exclusions: Vec<String>,
    /// Strip the working directory from every frame
    pub strip_working_directory: bool,
    /// Capture a stack at all; when off, `cleaned_stack` stays `None`
    pub capture_stack: bool,
    /// Relabel the stack header with the layer's error label
    pub relabel: bool,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            exclusions: Vec::new(),
            strip_working_directory: true,
            capture_stack: true,
            relabel: true,
        }
    }
}

impl TransformerConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| error::config_unreadable(e, "json"))
    }

    /// Read and parse a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| error::config_unreadable(e, origin.clone()))?;
        serde_json::from_str(&content).map_err(|e| error::config_unreadable(e, origin))
    }

    /// Apply a JSON document on top of this configuration. Fields the
    /// document leaves out keep their current value.
    pub fn overlay_json(self, json: &str) -> Result<Self> {
        self.overlay(json, "json")
    }

    /// Read a JSON file and apply it on top of this configuration
    pub fn overlay_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| error::config_unreadable(e, origin.clone()))?;
        self.overlay(&content, origin)
    }

    fn overlay(self, json: &str, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let overlay: serde_json::Value =
            serde_json::from_str(json).map_err(|e| error::config_unreadable(e, origin.clone()))?;
        let mut merged =
            serde_json::to_value(&self).map_err(|e| error::config_unreadable(e, origin.clone()))?;
        match (merged.as_object_mut(), overlay) {
            (Some(fields), serde_json::Value::Object(overrides)) => fields.extend(overrides),
            (_, other) => merged = other,
        }
        serde_json::from_value(merged).map_err(|e| error::config_unreadable(e, origin))
    }

    /// Defaults with the process environment applied
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply the process environment on top of this configuration
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Unset keys leave the current
    /// value in place.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(list) = lookup(ENV_STACK_EXCLUDE) {
            self.exclusions = list
                .split(',')
                .map(str::trim)
                .filter(|pattern| !pattern.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(value) = lookup(ENV_STRIP_CWD) {
            self.strip_working_directory = parse_flag(ENV_STRIP_CWD, &value)?;
        }
        if let Some(value) = lookup(ENV_CAPTURE_STACK) {
            self.capture_stack = parse_flag(ENV_CAPTURE_STACK, &value)?;
        }
        Ok(self)
    }

    /// Stack options for one transformation
    pub fn stack_options(&self, label: Option<&str>) -> StackOptions {
        StackOptions {
            exclusions: self.exclusions.clone(),
            strip_working_directory: self.strip_working_directory,
            error_label: if self.relabel {
                label.map(String::from)
            } else {
                None
            },
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(error::invalid_setting(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCategory, ErrorKind};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TransformerConfig::default();
        assert!(config.exclusions.is_empty());
        assert!(config.strip_working_directory);
        assert!(config.capture_stack);
        assert!(config.relabel);
    }

    #[test]
    fn test_from_json_partial() {
        let config = TransformerConfig::from_json(r#"{"exclusions": ["tokio::runtime"]}"#).unwrap();
        assert_eq!(config.exclusions, vec!["tokio::runtime".to_string()]);
        assert!(config.strip_working_directory);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = TransformerConfig::from_json(r#"{"stripWorkingDirectory": "sometimes"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadConfig);
        assert_eq!(err.category(), ErrorCategory::BadConfig);
        assert!(err.cause().is_some());

        let err = TransformerConfig::from_json(r#"{"unknown": 1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadConfig);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"captureStack": false, "relabel": false}}"#).unwrap();

        let config = TransformerConfig::from_file(file.path()).unwrap();
        assert!(!config.capture_stack);
        assert!(!config.relabel);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TransformerConfig::from_file(dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadConfig);
        assert!(err.context().extra("origin").unwrap().ends_with("missing.json"));
    }

    #[test]
    fn test_overlay_keeps_unset_fields() {
        let base = TransformerConfig {
            strip_working_directory: false,
            ..TransformerConfig::default()
        };

        let config = base.clone().overlay_json(r#"{"exclusions": ["std::rt"]}"#).unwrap();
        assert!(!config.strip_working_directory);
        assert_eq!(config.exclusions, vec!["std::rt".to_string()]);

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"stripWorkingDirectory": true}}"#).unwrap();
        let config = base.clone().overlay_file(file.path()).unwrap();
        assert!(config.strip_working_directory);

        let err = base.clone().overlay_json(r#"{"relabel": 3}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadConfig);
        let err = base.overlay_json("[]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadConfig);
    }

    #[test]
    fn test_overrides() {
        let config = TransformerConfig::default()
            .with_overrides(lookup(&[
                (ENV_STACK_EXCLUDE, "std::rt, ,core::ops"),
                (ENV_STRIP_CWD, "off"),
            ]))
            .unwrap();

        assert_eq!(config.exclusions, vec!["std::rt".to_string(), "core::ops".to_string()]);
        assert!(!config.strip_working_directory);
        assert!(config.capture_stack);
    }

    #[test]
    fn test_invalid_override() {
        let err = TransformerConfig::default()
            .with_overrides(lookup(&[(ENV_CAPTURE_STACK, "maybe")]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadConfig);
        assert_eq!(err.context().extra("key"), Some(ENV_CAPTURE_STACK));
        assert_eq!(err.context().extra("value"), Some("maybe"));
    }

    #[test]
    fn test_stack_options() {
        let config = TransformerConfig {
            exclusions: vec!["std::".into()],
            ..TransformerConfig::default()
        };
        let options = config.stack_options(Some("ServiceError"));
        assert_eq!(options.error_label.as_deref(), Some("ServiceError"));
        assert!(options.strip_working_directory);

        let config = TransformerConfig {
            relabel: false,
            ..config
        };
        assert_eq!(config.stack_options(Some("ServiceError")).error_label, None);
    }
}

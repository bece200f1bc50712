//! # Stack normalization
//!
//! Captured call stacks are plain text. Normalization applies a fixed
//! sequence of textual transforms to them:
//!
//! 1. capture
//! 2. relabel the leading `Error:` header
//! 3. strip the working-directory path
//! 4. drop lines matching an exclusion
//!
//! Relabelling needs the untouched header, and filtering after stripping
//! means exclusions never match path fragments that were already removed.

use std::backtrace::{Backtrace, BacktraceStatus};
use tracing::trace;

/// Header a freshly captured trace starts with
pub const ERROR_HEADER: &str = "Error:";

/// What to do with a captured stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackOptions {
    /// Lines containing any of these substrings are dropped
    pub exclusions: Vec<String>,
    /// Remove the working-directory path from every frame
    pub strip_working_directory: bool,
    /// Replaces `Error` in the leading header
    pub error_label: Option<String>,
}

impl StackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclusions.push(pattern.into());
        self
    }

    pub fn strip_working_directory(mut self, strip: bool) -> Self {
        self.strip_working_directory = strip;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.error_label = Some(label.into());
        self
    }
}

/// Where traces come from
pub trait StackSource: Send + Sync {
    /// Capture a trace at the call site. `None` when no trace is available.
    fn capture(&self) -> Option<String>;
}

/// Captures the current call stack with `std::backtrace`
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceSource;

impl StackSource for BacktraceSource {
    fn capture(&self) -> Option<String> {
        let backtrace = Backtrace::force_capture();
        if backtrace.status() != BacktraceStatus::Captured {
            trace!(status = ?backtrace.status(), "no backtrace available");
            return None;
        }
        Some(format!("{} \n{}", ERROR_HEADER, backtrace))
    }
}

/// Hands out a trace that was obtained elsewhere (read from a file, received
/// from another process)
#[derive(Debug, Clone, Default)]
pub struct FixedStack(pub Option<String>);

impl FixedStack {
    pub fn new(trace: impl Into<String>) -> Self {
        Self(Some(trace.into()))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl StackSource for FixedStack {
    fn capture(&self) -> Option<String> {
        self.0.clone()
    }
}

/// The process's working directory as text
pub fn working_directory() -> Option<String> {
    std::env::current_dir()
        .ok()
        .map(|dir| dir.to_string_lossy().into_owned())
}

/// Remove the first occurrence of the working-directory path.
///
/// The path is matched literally; later occurrences are left alone. If the
/// working directory cannot be read the input is returned unchanged.
pub fn remove_working_directory_prefix(stack: &str) -> String {
    match working_directory() {
        Some(cwd) => remove_path_prefix(stack, &cwd),
        None => stack.to_string(),
    }
}

/// Remove the first literal occurrence of `path`
pub fn remove_path_prefix(stack: &str, path: &str) -> String {
    if path.is_empty() {
        return stack.to_string();
    }
    stack.replacen(path, "", 1)
}

/// Keep only the lines that contain none of the exclusions.
///
/// Line order is preserved. Empty exclusion strings are ignored, so an empty
/// (or all-empty) list returns the input unchanged.
pub fn filter_lines<S: AsRef<str>>(stack: &str, exclusions: &[S]) -> String {
    let exclusions: Vec<&str> = exclusions
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|pattern| !pattern.is_empty())
        .collect();
    if exclusions.is_empty() {
        return stack.to_string();
    }

    stack
        .split('\n')
        .filter(|line| !exclusions.iter().any(|pattern| line.contains(pattern)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace a leading `Error:` header with `label:`.
///
/// Only applies when the trace starts with `Error:` followed by optional
/// spaces and a line break. Any other shape is returned unchanged.
pub fn relabel_header(stack: &str, label: &str) -> String {
    let Some(rest) = stack.strip_prefix(ERROR_HEADER) else {
        return stack.to_string();
    };
    let rest = rest.trim_start_matches(|c: char| c == ' ' || c == '\t');
    let body = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"));

    match body {
        Some(body) => format!("{}:\n{}", label, body),
        None => stack.to_string(),
    }
}

/// Run relabel, strip and filter over a trace that was already captured.
///
/// Stripping repeats the first-occurrence removal on each line until the
/// working directory no longer appears in it.
pub fn normalize_trace(
    trace: &str,
    options: &StackOptions,
    working_directory: Option<&str>,
) -> String {
    let mut stack = match options.error_label.as_deref() {
        Some(label) => relabel_header(trace, label),
        None => trace.to_string(),
    };

    if options.strip_working_directory {
        if let Some(cwd) = working_directory {
            stack = stack
                .split('\n')
                .map(|line| strip_every_occurrence(line, cwd))
                .collect::<Vec<_>>()
                .join("\n");
        }
    }

    filter_lines(&stack, options.exclusions.as_slice())
}

fn strip_every_occurrence(line: &str, path: &str) -> String {
    let mut line = line.to_string();
    while !path.is_empty() && line.contains(path) {
        line = remove_path_prefix(&line, path);
    }
    line
}

/// Capture from `source` and normalize.
pub fn normalize_captured(source: &dyn StackSource, options: &StackOptions) -> Option<String> {
    let trace = source.capture()?;
    let cwd = if options.strip_working_directory {
        working_directory()
    } else {
        None
    };
    let stack = normalize_trace(&trace, options, cwd.as_deref());
    trace!(lines = stack.lines().count(), "normalized stack");
    Some(stack)
}

/// Capture the current call stack and normalize it.
///
/// Returns `None` when the platform cannot produce a backtrace; that means
/// "no trace", never an empty trace.
pub fn generate_normalized_stack(options: &StackOptions) -> Option<String> {
    normalize_captured(&BacktraceSource, options)
}

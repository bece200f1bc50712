//! # Errform CLI
//!
//! Command-line front end for the errform pipeline.
//!
//! Usage:
//!   errform normalize [--exclude S]... [--strip-cwd] [--label L] [FILE]
//!   errform classify [--layer L] [--category C] [--kind K] [JSON]
//!   errform taxonomy
//!
//! Examples:
//!   RUST_BACKTRACE=1 cargo run 2>&1 | errform normalize --strip-cwd --exclude std::rt
//!   errform classify --layer service '{"code": "REQUEST_TIMEOUT", "message": "timed out"}'
//!   errform taxonomy

use clap::{Args, Parser, Subcommand};
use errform_core::{
    classify, normalize_trace, stack, DatabaseErrorCode, ErrorCategory, ErrorContext,
    ErrorKind, ErrorLayer, ErrorReport, NetworkErrorCode, Raw, StackOptions, StructuredError,
    TransformerConfig,
};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "errform")]
#[command(author, version, about = "Errform - classify raised errors and clean up stack traces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Load transformer settings from a JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a stack trace read from a file or stdin
    Normalize {
        /// Drop lines containing this substring (repeatable)
        #[arg(short, long = "exclude")]
        exclusions: Vec<String>,

        /// Strip the working directory from every frame
        #[arg(long)]
        strip_cwd: bool,

        /// Replace the leading `Error:` header with this label
        #[arg(short, long)]
        label: Option<String>,

        /// Trace file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Classify a raised value given as JSON (stdin when omitted)
    Classify {
        #[command(flatten)]
        context: ContextArgs,

        /// The raised value; text that is not JSON is taken as a message
        value: Option<String>,
    },
    /// Print every category, layer, kind and code identifier
    Taxonomy,
}

/// Where the classified value was raised
#[derive(Args, Debug, Default)]
struct ContextArgs {
    #[arg(long)]
    layer: Option<ErrorLayer>,

    #[arg(long)]
    category: Option<ErrorCategory>,

    /// Kind to use when the value carries no recognised code
    #[arg(long)]
    kind: Option<ErrorKind>,

    #[arg(long)]
    module: Option<String>,

    #[arg(long)]
    class: Option<String>,

    #[arg(long)]
    method: Option<String>,

    /// Extra context as key=value (repeatable)
    #[arg(long = "context", value_parser = parse_pair)]
    extra: Vec<(String, String)>,
}

impl ContextArgs {
    fn into_context(self) -> ErrorContext {
        let mut context = ErrorContext::new();
        if let Some(layer) = self.layer {
            context = context.with_layer(layer);
        }
        if let Some(category) = self.category {
            context = context.with_category(category);
        }
        if let Some(kind) = self.kind {
            context = context.with_kind(kind);
        }
        if let Some(module) = self.module {
            context = context.with_module_name(module);
        }
        if let Some(class) = self.class {
            context = context.with_class_name(class);
        }
        if let Some(method) = self.method {
            context = context.with_method_name(method);
        }
        for (key, value) in self.extra {
            context = context.with_extra(key, value);
        }
        context
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(file: Option<&PathBuf>) -> errform_core::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            StructuredError::internal(format!("cannot read {}: {}", path.display(), e))
                .with_context(ErrorContext::new().with_module_name("cli").with_method_name("read_input"))
                .with_cause(e)
        }),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input).map_err(|e| {
                StructuredError::internal(format!("cannot read stdin: {}", e))
                    .with_context(ErrorContext::new().with_module_name("cli").with_method_name("read_input"))
                    .with_cause(e)
            })?;
            Ok(input)
        }
    }
}

/// Settings the CLI starts from. Unlike the library, it only strips the
/// working directory when asked to.
fn cli_defaults() -> TransformerConfig {
    TransformerConfig {
        strip_working_directory: false,
        ..TransformerConfig::default()
    }
}

fn load_config(path: Option<&PathBuf>) -> errform_core::Result<TransformerConfig> {
    let config = match path {
        Some(path) => cli_defaults().overlay_file(path)?,
        None => cli_defaults(),
    };
    config.with_env_overrides()
}

fn normalize_input(
    trace: &str,
    config: TransformerConfig,
    exclusions: Vec<String>,
    strip_cwd: bool,
    label: Option<String>,
    working_directory: Option<&str>,
) -> String {
    let mut options = StackOptions {
        exclusions: config.exclusions,
        strip_working_directory: strip_cwd || config.strip_working_directory,
        error_label: label,
    };
    options.exclusions.extend(exclusions);
    debug!(?options, "normalizing trace");

    normalize_trace(trace.trim_end_matches('\n'), &options, working_directory)
}

fn run_normalize(
    config: TransformerConfig,
    exclusions: Vec<String>,
    strip_cwd: bool,
    label: Option<String>,
    file: Option<PathBuf>,
) -> errform_core::Result<()> {
    let trace = read_input(file.as_ref())?;
    let cwd = stack::working_directory();
    let normalized = normalize_input(&trace, config, exclusions, strip_cwd, label, cwd.as_deref());
    println!("{}", normalized);
    Ok(())
}

fn parse_raw(input: &str) -> Raw {
    match serde_json::from_str::<serde_json::Value>(input) {
        Ok(value) => Raw::Value(value),
        Err(_) => Raw::from(input.trim()),
    }
}

fn classify_input(input: &str, context: ContextArgs) -> ErrorReport {
    classify(parse_raw(input), &context.into_context()).report()
}

fn run_classify(context: ContextArgs, value: Option<String>) -> errform_core::Result<()> {
    let input = match value {
        Some(value) => value,
        None => read_input(None)?,
    };
    print_json(&classify_input(&input, context))
}

fn show_taxonomy() -> errform_core::Result<()> {
    let taxonomy = serde_json::json!({
        "categories": ErrorCategory::ALL,
        "layers": ErrorLayer::ALL,
        "kinds": ErrorKind::ALL,
        "networkCodes": NetworkErrorCode::ALL,
        "databaseCodes": DatabaseErrorCode::ALL,
    });
    print_json(&taxonomy)
}

fn print_json(value: &impl serde::Serialize) -> errform_core::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        StructuredError::transformation(format!("cannot render JSON: {}", e)).with_cause(Raw::error(e))
    })?;
    println!("{}", json);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Normalize {
            exclusions,
            strip_cwd,
            label,
            file,
        } => run_normalize(config, exclusions, strip_cwd, label, file),
        Commands::Classify { context, value } => run_classify(context, value),
        Commands::Taxonomy => show_taxonomy(),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("route=/users"), Ok(("route".into(), "/users".into())));
        assert_eq!(parse_pair("a=b=c"), Ok(("a".into(), "b=c".into())));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[test]
    fn test_parse_raw() {
        assert_eq!(parse_raw(r#"{"code": "INVALID_URL"}"#), Raw::Value(serde_json::json!({"code": "INVALID_URL"})));
        assert_eq!(parse_raw("connection dropped\n"), Raw::from("connection dropped"));
    }

    #[test]
    fn test_classify_args() {
        let cli = Cli::try_parse_from([
            "errform",
            "classify",
            "--layer",
            "service",
            "--context",
            "tenant=acme",
            r#"{"message": "x"}"#,
        ])
        .unwrap();

        match cli.command {
            Commands::Classify { context, value } => {
                assert_eq!(context.layer, Some(ErrorLayer::Service));
                assert_eq!(context.extra, vec![("tenant".to_string(), "acme".to_string())]);
                assert_eq!(value.as_deref(), Some(r#"{"message": "x"}"#));
            }
            _ => panic!("expected classify"),
        }
    }

    const CWD: &str = "/srv/app";
    const TRACE: &str = "Error: \n  at f (/srv/app/src/a.rs:1:1)\n  at g (/srv/app/vendor/b.rs:2:1)\n";

    #[test]
    fn test_normalize_keeps_working_directory_by_default() {
        let out = normalize_input(TRACE, cli_defaults(), vec![], false, None, Some(CWD));
        assert_eq!(out, "Error: \n  at f (/srv/app/src/a.rs:1:1)\n  at g (/srv/app/vendor/b.rs:2:1)");
    }

    #[test]
    fn test_normalize_with_flags() {
        let out = normalize_input(
            TRACE,
            cli_defaults(),
            vec!["vendor".into()],
            true,
            Some("ServiceError".into()),
            Some(CWD),
        );
        assert_eq!(out, "ServiceError:\n  at f (/src/a.rs:1:1)");
    }

    #[test]
    fn test_normalize_strip_enabled_by_config() {
        let config = cli_defaults().overlay_json(r#"{"stripWorkingDirectory": true}"#).unwrap();
        let out = normalize_input(TRACE, config, vec![], false, None, Some(CWD));
        assert!(!out.contains(CWD));

        let config = cli_defaults().overlay_json(r#"{"exclusions": ["vendor"]}"#).unwrap();
        let out = normalize_input(TRACE, config, vec![], false, None, Some(CWD));
        assert_eq!(out, "Error: \n  at f (/srv/app/src/a.rs:1:1)");
    }

    #[test]
    fn test_classify_input_report() {
        let cli = Cli::try_parse_from([
            "errform",
            "classify",
            "--layer",
            "service",
            "--method",
            "charge",
        ])
        .unwrap();
        let Commands::Classify { context, .. } = cli.command else {
            panic!("expected classify");
        };

        let report = classify_input(r#"{"code":"REQUEST_TIMEOUT","message":"timed out"}"#, context);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "Network");
        assert_eq!(json["category"], "network");
        assert_eq!(json["code"], "REQUEST_TIMEOUT");
        assert_eq!(json["message"], "timed out");
        assert_eq!(json["httpStatus"], 503);
        assert_eq!(json["context"]["layer"], "service");
        assert_eq!(json["context"]["methodName"], "charge");
        assert_eq!(json["cause"]["code"], "REQUEST_TIMEOUT");
    }

    #[test]
    fn test_classify_plain_text() {
        let report = classify_input("connection dropped\n", ContextArgs::default());
        assert_eq!(report.kind, ErrorKind::Internal);
        assert_eq!(report.category, ErrorCategory::Internal);
        assert_eq!(report.message, "connection dropped");
    }

    #[test]
    fn test_rejects_unknown_layer() {
        assert!(Cli::try_parse_from(["errform", "classify", "--layer", "database"]).is_err());
    }
}

//! Command-line arguments and output rendering.

use crate::tracing::LogLevel;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write;
use std::path::PathBuf;
use vcap_bindings::{Binding, DEFAULT_ENV_VAR};

#[derive(Parser, Debug)]
#[command(name = "vcap-bindings")]
#[command(about = "Materialize VCAP_SERVICES credentials as file-backed service bindings")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Write matching bindings to disk and print where they live")]
    Resolve(ResolveArgs),
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    #[arg(long = "type", short = 't', help = "Service label to select")]
    pub kind: String,

    #[arg(
        long,
        short = 'p',
        help = "Provider to select (empty matches any provider)",
        default_value = ""
    )]
    pub provider: String,

    #[arg(
        long,
        short = 'w',
        env = "VCAP_BINDINGS_WORKING_DIR",
        help = "Directory that receives one sub-directory per binding"
    )]
    pub working_dir: PathBuf,

    #[arg(
        long,
        help = "Environment variable holding the binding document",
        default_value = DEFAULT_ENV_VAR
    )]
    pub env_var: String,

    #[arg(long, help = "Output format", default_value = "text", value_enum)]
    pub format: OutputFormat,
}

/// How resolved bindings are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One block per binding with its entry paths
    Text,
    /// Pretty-printed JSON array
    Json,
}

/// Render bindings for stdout. Only paths are printed, never credential values.
pub fn render(bindings: &[Binding], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(bindings),
        OutputFormat::Text => Ok(render_text(bindings)),
    }
}

fn render_text(bindings: &[Binding]) -> String {
    let mut out = String::new();
    for binding in bindings {
        let _ = write!(out, "{} ({})", binding.path.display(), binding.kind);
        if let Some(provider) = &binding.provider {
            let _ = write!(out, " [{provider}]");
        }
        out.push('\n');
        for (key, entry) in &binding.entries {
            let _ = writeln!(out, "  {key}: {}", entry.path().display());
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vcap_bindings::Entry;

    fn sample() -> Vec<Binding> {
        vec![Binding {
            name: "htpasswd".to_string(),
            kind: "htpasswd".to_string(),
            provider: Some("provider-1".to_string()),
            path: PathBuf::from("/platform/deadbeef"),
            entries: BTreeMap::from([(
                ".htpasswd".to_string(),
                Entry::new("/platform/deadbeef/.htpasswd"),
            )]),
        }]
    }

    #[test]
    fn test_parse_resolve_args() {
        let cli = Cli::try_parse_from([
            "vcap-bindings",
            "resolve",
            "--type",
            "htpasswd",
            "--working-dir",
            "/tmp/platform",
        ])
        .unwrap();

        let Commands::Resolve(args) = cli.command;
        assert_eq!(args.kind, "htpasswd");
        assert_eq!(args.provider, "");
        assert_eq!(args.working_dir, PathBuf::from("/tmp/platform"));
        assert_eq!(args.env_var, "VCAP_SERVICES");
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_type_is_required() {
        let result = Cli::try_parse_from(["vcap-bindings", "resolve", "--working-dir", "/tmp"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_render_text() {
        let text = render(&sample(), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "/platform/deadbeef (htpasswd) [provider-1]\n  .htpasswd: /platform/deadbeef/.htpasswd\n"
        );
    }

    #[test]
    fn test_render_json() {
        let json = render(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["path"], "/platform/deadbeef");
        assert_eq!(value[0]["provider"], "provider-1");
        assert_eq!(
            value[0]["entries"][".htpasswd"],
            "/platform/deadbeef/.htpasswd"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[], OutputFormat::Text).unwrap(), "");
        assert_eq!(render(&[], OutputFormat::Json).unwrap(), "[]");
    }
}

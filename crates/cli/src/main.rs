//! `vcap-bindings` command-line tool.
//!
//! Reads the platform's `VCAP_SERVICES` document, writes the credentials of
//! matching bindings under a working directory and prints where they landed.

// CLI binary needs to output to stdout
#![allow(clippy::print_stdout)]

mod cli;
mod tracing;

use clap::Parser;
use cli::{Cli, Commands, ResolveArgs};
use miette::IntoDiagnostic;
use vcap_bindings::{ResolverConfig, VcapBindingResolver};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    tracing::init_tracing(cli.level)?;

    match cli.command {
        Commands::Resolve(args) => execute_resolve(&args),
    }
}

fn execute_resolve(args: &ResolveArgs) -> miette::Result<()> {
    ::tracing::debug!(
        kind = %args.kind,
        provider = %args.provider,
        working_dir = %args.working_dir.display(),
        env_var = %args.env_var,
        "Resolving service bindings"
    );

    let resolver =
        VcapBindingResolver::with_config(ResolverConfig::with_env_var(args.env_var.clone()));
    let bindings = resolver
        .resolve(&args.kind, &args.provider, &args.working_dir)
        .into_diagnostic()?;

    let output = cli::render(&bindings, args.format).into_diagnostic()?;
    print!("{output}");
    if args.format == cli::OutputFormat::Json {
        println!();
    }
    Ok(())
}

#![deny(missing_docs)]

//! # oasref CLI
//!
//! Command Line Interface for bundling multi-file OpenAPI documents.
//!
//! Supported Commands:
//! - `bundle`: Dereference a document into a single YAML/JSON file.
//! - `generate`: Dereference a document and run a registered generator.
//! - `list-generators`: Show the registered `(language, framework)` pairs.

use clap::{Parser, Subcommand};
use oasref_core::GeneratorRegistry;
use std::process::ExitCode;

use crate::error::CliResult;

mod bundle;
mod error;
mod generate;
mod settings;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI $ref bundler")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dereference a document into a single file.
    Bundle(bundle::BundleArgs),
    /// Dereference a document and run a generator on it.
    Generate(generate::GenerateArgs),
    /// List the registered generators.
    ListGenerators,
}

fn run(cli: Cli) -> CliResult<()> {
    let registry = GeneratorRegistry::with_builtin();

    match &cli.command {
        Commands::Bundle(args) => bundle::execute(args)?,
        Commands::Generate(args) => generate::execute(args, &registry)?,
        Commands::ListGenerators => generate::list(&registry),
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bundle_arguments() {
        let cli = Cli::try_parse_from([
            "oasref",
            "bundle",
            "api/openapi.yaml",
            "--search-path",
            "shared",
            "--search-path",
            "vendor",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Bundle(args) => {
                assert_eq!(args.resolve.search_paths.len(), 2);
                assert_eq!(args.format, Some(bundle::FormatArg::Json));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

#![deny(missing_docs)]

//! # Generate Command
//!
//! Dereferences a document and hands it to a registered generator.

use crate::error::CliResult;
use crate::settings::ResolveArgs;
use oasref_core::generators::write_generated_files;
use oasref_core::{bundle_file, GeneratorConfig, GeneratorRegistry};
use std::path::PathBuf;

/// Arguments for the generate command.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    #[clap(flatten)]
    pub resolve: ResolveArgs,

    /// Target language (see `list-generators`).
    #[clap(long)]
    pub language: String,

    /// Target framework (see `list-generators`).
    #[clap(long)]
    pub framework: String,

    /// Directory the generated files are written to.
    #[clap(long, default_value = "generated")]
    pub output: PathBuf,

    /// Generator option.
    /// Format: `"key=value"`.
    /// Example: `"--option fileName=api.yaml"`
    #[clap(long = "option", value_parser = parse_key_val)]
    pub options: Vec<(String, String)>,
}

/// Helper to parse "key=value" arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Executes the generate command.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `registry` - The generators available for dispatch.
pub fn execute(args: &GenerateArgs, registry: &GeneratorRegistry) -> CliResult<()> {
    let generator = registry.get(&args.language, &args.framework)?;

    let config = args.resolve.resolver_config()?;
    let document = bundle_file(&args.resolve.input, config)?;

    let files = generator.generate(
        &document,
        &GeneratorConfig::from_pairs(args.options.iter().cloned()),
    )?;
    let written = write_generated_files(&args.output, &files)?;

    for path in &written {
        tracing::info!("  -> Wrote {:?}", path);
    }
    tracing::info!(
        "Generated {} file(s) with {}/{}",
        written.len(),
        args.language,
        args.framework
    );
    Ok(())
}

/// Prints the registered generator keys, one per line.
pub fn list(registry: &GeneratorRegistry) {
    for key in registry.keys() {
        println!("{}", key);
    }
}

#![deny(missing_docs)]

//! # Bundle Command
//!
//! Dereferences a multi-file document and writes it as one file.

use crate::error::CliResult;
use crate::settings::ResolveArgs;
use oasref_core::generators::{render_document, BundleFormat};
use oasref_core::bundle_file;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Output format selector.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// YAML output.
    Yaml,
    /// Pretty-printed JSON output.
    Json,
}

impl From<FormatArg> for BundleFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Yaml => BundleFormat::Yaml,
            FormatArg::Json => BundleFormat::Json,
        }
    }
}

/// Arguments for the bundle command.
#[derive(clap::Args, Debug, Clone)]
pub struct BundleArgs {
    #[clap(flatten)]
    pub resolve: ResolveArgs,

    /// Output file. Prints to stdout when omitted.
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Output format. Inferred from the output extension, defaulting to YAML.
    #[clap(long, value_enum)]
    pub format: Option<FormatArg>,
}

impl BundleArgs {
    fn format(&self) -> BundleFormat {
        self.format
            .map(BundleFormat::from)
            .or_else(|| self.output.as_deref().and_then(BundleFormat::from_path))
            .unwrap_or(BundleFormat::Yaml)
    }
}

/// Executes the bundle command.
///
/// # Arguments
///
/// * `args` - Command arguments.
pub fn execute(args: &BundleArgs) -> CliResult<()> {
    let config = args.resolve.resolver_config()?;
    let document = bundle_file(&args.resolve.input, config)?;
    let rendered = render_document(&document, args.format())?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered)?;
            tracing::info!("Bundled {:?} into {:?}", args.resolve.input, path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
        }
    }

    Ok(())
}

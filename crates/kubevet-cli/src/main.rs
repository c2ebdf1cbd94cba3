//! kubevet - validate Kubernetes manifests against their schemas

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use kubevet_openapi::{
    BuiltinSource, ClusterSource, CompositeSource, DirFs, FallbackSource, LocalCrdSource,
    LocalSchemaSource, OverlaySource, PatchLoader, RemoteSource, SchemaSource,
};
use kubevet_validator::{Validator, validate_file_contents};

mod display;
mod error;
mod exit_codes;
mod util;

use display::FileResult;
use error::{CliError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

// no #[command(version)]: --version is the Kubernetes schema version flag
#[derive(Parser)]
#[command(name = "kubevet")]
#[command(about = "Validate Kubernetes manifests against their schemas", long_about = None)]
struct Cli {
    /// Manifest files or directories to validate (directories are walked
    /// recursively for .yaml, .yml and .json files)
    #[arg(required = true)]
    manifests: Vec<PathBuf>,

    /// Kubernetes version to validate native resources against
    #[arg(long, default_value = "1.30")]
    version: String,

    /// Directory with OpenAPI schemas laid out as api/<version>.json and
    /// apis/<group>/<version>.json
    #[arg(long)]
    local_schemas: Option<PathBuf>,

    /// Directories containing CustomResourceDefinition manifests
    /// (repeatable)
    #[arg(long = "local-crds")]
    local_crds: Vec<PathBuf>,

    /// Directory with JSON merge patches applied on top of the final
    /// schema of each group-version
    #[arg(long)]
    schema_patches: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Human)]
    output: OutputFormat,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

/// Compose the schema source chain: user patches overlay everything; local
/// schemas and CRDs take priority over the patched builtin chain; the
/// cluster is consulted before falling back to the embedded bundle and
/// finally the release branch.
fn build_source(cli: &Cli) -> Arc<dyn SchemaSource> {
    let user_patches = cli
        .schema_patches
        .as_ref()
        .map(|dir| PatchLoader::new(Arc::new(DirFs::new(dir)), ""));

    Arc::new(OverlaySource::new(
        user_patches,
        Arc::new(CompositeSource::new(vec![
            Arc::new(LocalSchemaSource::new(cli.local_schemas.clone())),
            Arc::new(LocalCrdSource::new(cli.local_crds.clone())),
            Arc::new(OverlaySource::new(
                Some(PatchLoader::builtin(&cli.version)),
                Arc::new(FallbackSource::new(vec![
                    Arc::new(ClusterSource::new()),
                    Arc::new(FallbackSource::new(vec![
                        Arc::new(BuiltinSource::new(&cli.version)),
                        Arc::new(RemoteSource::new(&cli.version)),
                    ])),
                ])),
            )),
        ])),
    ))
}

fn run(cli: &Cli) -> Result<()> {
    let source = build_source(cli);
    let validator = Validator::new(source.as_ref())
        .map_err(|e| CliError::argument(e.to_string()))?;

    let files = util::find_files(&cli.manifests)?;
    if files.is_empty() {
        return Err(CliError::argument_with_help(
            "no manifest files found",
            "directories are scanned for .yaml, .yml and .json files",
        ));
    }

    let mut results = Vec::new();
    for path in files {
        let contents = std::fs::read(&path)
            .map_err(|e| CliError::argument(format!("{}: {e}", path.display())))?;
        let outcomes = validate_file_contents(&validator, &contents, util::is_yaml(&path));
        results.push(FileResult {
            path: path.display().to_string(),
            outcomes,
        });
    }

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let has_errors = results.iter().any(FileResult::has_errors);

    match cli.output {
        OutputFormat::Human => {
            for result in &results {
                display::display_human(result, &mut stdout, &mut stderr)
                    .map_err(|e| CliError::internal(e.to_string()))?;
            }
        }
        OutputFormat::Json => {
            display::display_json(&results, &mut stdout)
                .map_err(|e| CliError::internal(e.to_string()))?;
        }
    }

    if has_errors {
        return Err(CliError::Validation);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(err) = run(&cli) {
        // the validation verdict was already printed per file
        if !matches!(err, CliError::Validation) {
            eprintln!("{err}");
        }
        std::process::exit(err.exit_code());
    }
}

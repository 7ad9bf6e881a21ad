/// # docbench CLI
///
/// Command parsing and orchestration glue for the `docbench` binary. All ingestion,
/// analysis, fan-out and ranking lives in `docbench-core`; this module only turns
/// arguments into a [`ProjectSource`], wires the reqwest-backed collaborators, and
/// prints the outcome.
///
/// For programmatic or integration use, call [`run`] with a constructed [`Cli`].
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use docbench_core::catalog::{availability, Credentials};
use docbench_core::github::GithubClient;
use docbench_core::ingest::local::collect_directory;
use docbench_core::ingest::{IngestLimits, ProjectSource};
use docbench_core::pipeline::{generate_documentation_comparison, ComparisonSettings};
use docbench_core::providers::OpenAiCompatibleClient;

use crate::load_config::load_or_default;
use crate::report::{render_failure_json, render_json, render_providers, render_summary};

/// CLI for docbench: generate README documentation with many LLM providers and compare them.
#[derive(Parser)]
#[clap(
    name = "docbench",
    version,
    about = "Generate project documentation with multiple LLM providers and rank the results"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a project and fan documentation generation out to every credentialed model
    Generate {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,

        #[clap(flatten)]
        source: SourceArgs,

        /// Only use this provider
        #[clap(long)]
        provider: Option<String>,

        /// Print the full report, documents included, as JSON
        #[clap(long)]
        json: bool,
    },
    /// List catalog providers and whether an API key is configured for each
    Providers {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Exactly one input source.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Local project directory
    #[clap(long)]
    pub dir: Option<PathBuf>,

    /// Zip archive of a project
    #[clap(long)]
    pub zip: Option<PathBuf>,

    /// GitHub repository URL
    #[clap(long)]
    pub repo: Option<String>,
}

impl SourceArgs {
    pub fn into_source(self, limits: &IngestLimits) -> Result<ProjectSource> {
        if let Some(dir) = self.dir {
            let files = collect_directory(&dir, limits)?;
            tracing::info!(dir = ?dir, files = files.len(), "Collected local directory");
            return Ok(ProjectSource::Uploaded(files));
        }
        if let Some(zip) = self.zip {
            let bytes = std::fs::read(&zip)
                .map_err(|e| anyhow::anyhow!("Failed to read archive {:?}: {}", zip, e))?;
            return Ok(ProjectSource::Archive {
                name: archive_name(&zip),
                bytes,
            });
        }
        if let Some(url) = self.repo {
            return Ok(ProjectSource::Repository { url });
        }
        Err(anyhow::anyhow!("One of --dir, --zip or --repo is required"))
    }
}

fn archive_name(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate {
            config,
            source,
            provider,
            json,
        } => {
            tracing::info!(command = "generate", "Starting documentation comparison");
            let result = generate(config.as_deref(), source, provider.as_deref(), json).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "Comparison failed");
                if json {
                    println!("{}", render_failure_json(&e.to_string()));
                }
            }
            result
        }
        Commands::Providers { config } => {
            tracing::info!(command = "providers", "Listing providers");
            let config = load_or_default(config.as_deref())?;
            let catalog = config.catalog();
            let credentials = Credentials::from_env(&catalog);
            print!("{}", render_providers(&availability(&catalog, &credentials)));
            Ok(())
        }
    }
}

async fn generate(
    config: Option<&Path>,
    source: SourceArgs,
    provider: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_or_default(config)?;
    let catalog = config.catalog();
    let credentials = Credentials::from_env(&catalog);
    let fan_out = config.generation.fan_out_config();
    let source = source.into_source(&config.ingest)?;
    tracing::info!(source = source.kind(), "Resolved project source");

    let generator = OpenAiCompatibleClient::new(&catalog, &credentials);
    let repository = GithubClient::from_env();
    let settings = ComparisonSettings {
        ingest: &config.ingest,
        fan_out: &fan_out,
        catalog: &catalog,
        credentials: &credentials,
        provider,
    };

    let report = generate_documentation_comparison(source, settings, &generator, &repository).await?;
    if json {
        println!("{}", render_json(&report)?);
    } else {
        print!("{}", render_summary(&report));
    }
    Ok(())
}

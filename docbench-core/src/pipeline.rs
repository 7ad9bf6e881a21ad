//! End-to-end comparison: source → ingest → analyse → fan-out → rank.
//!
//! # Responsibilities
//! - Plan tasks from the catalog and credentials before touching the network, so a run
//!   with no usable provider fails fast
//! - Ingest the source (analysis happens as part of ingestion)
//! - Fan out one prompt per task, sized to that model's budget
//! - Rank results and compute the derived views
//!
//! # Error Handling
//! Only the fatal classes surface as [`PipelineError`]: no supported files, invalid
//! repository URL, unreadable archive, remote failure with nothing collected, or no
//! credentialed provider. Per-task failures live inside the report's results.
//!
//! # Callable From
//! - The CLI crate, with the reqwest-backed collaborators
//! - Integration tests, with mocks

use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::catalog::{plan_tasks, Credentials, ProviderCatalog};
use crate::contract::{DocumentationResult, Generator, ProjectInfo, RepositoryClient};
use crate::error::PipelineError;
use crate::fanout::{fan_out, FanOutConfig};
use crate::ingest::{ingest, IngestLimits, ProjectSource};
use crate::prompt::{build_prompt, PromptLimits};
use crate::rank::{rank, RankingSummary};

/// Read-only inputs shared by every task of a run.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonSettings<'a> {
    pub ingest: &'a IngestLimits,
    pub fan_out: &'a FanOutConfig,
    pub catalog: &'a ProviderCatalog,
    pub credentials: &'a Credentials,
    /// Restrict the run to a single provider.
    pub provider: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub success: bool,
    pub run_id: String,
    /// Ranked: successes first, fastest first.
    pub results: Vec<DocumentationResult>,
    pub project_info: ProjectInfo,
    pub warnings: Vec<String>,
    pub summary: RankingSummary,
}

pub async fn generate_documentation_comparison(
    source: ProjectSource,
    settings: ComparisonSettings<'_>,
    generator: &dyn Generator,
    repository: &dyn RepositoryClient,
) -> Result<ComparisonReport, PipelineError> {
    let run_id = Uuid::new_v4().to_string();
    let span = info_span!("comparison", run_id = %run_id);
    async move {
        let tasks = plan_tasks(settings.catalog, settings.credentials, settings.provider)?;
        let providers: Vec<&str> = settings
            .catalog
            .providers()
            .iter()
            .filter(|p| settings.credentials.is_available(&p.name))
            .map(|p| p.name.as_str())
            .collect();
        info!(?providers, tasks = tasks.len(), "[PIPELINE] Providers available");

        let ingested = ingest(source, settings.ingest, repository).await?;
        let project = &ingested.project;
        let files = &ingested.files;

        let mut report = fan_out(&tasks, generator, settings.fan_out, |task| {
            build_prompt(project, files, PromptLimits::for_output_budget(task.max_tokens))
        })
        .await;

        rank(&mut report.results);
        let summary = RankingSummary::from_results(&report.results, report.skipped);
        let mut warnings = ingested.warnings;
        if report.deadline_reached {
            warnings.push(format!(
                "Global deadline reached; {} task(s) were not started",
                report.skipped
            ));
        }
        info!(
            succeeded = summary.successful,
            failed = summary.failed,
            skipped = summary.skipped_tasks,
            "[PIPELINE] Comparison complete"
        );

        Ok(ComparisonReport {
            success: true,
            run_id: run_id.clone(),
            results: report.results,
            project_info: ingested.project,
            warnings,
            summary,
        })
    }
    .instrument(span)
    .await
}

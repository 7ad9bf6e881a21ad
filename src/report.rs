//! Rendering of comparison reports and provider listings for the terminal.
//!
//! Rendering returns `String`s; the CLI decides where they go (stdout).

use std::fmt;

use docbench_core::catalog::ProviderAvailability;
use docbench_core::pipeline::ComparisonReport;
use docbench_core::rank::Pick;
use serde_json::json;

const MAX_LISTED_KEY_FILES: usize = 10;

/// Human-readable summary of a run. Generated documents are left out; use `--json` for those.
pub fn render_summary(report: &ComparisonReport) -> String {
    Summary(report).to_string()
}

struct Summary<'a>(&'a ComparisonReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let project = &report.project_info;

        writeln!(f, "Project: {}", project.name)?;
        writeln!(f, "Framework: {}", project.framework)?;
        let languages: Vec<&str> = project.languages.iter().map(String::as_str).collect();
        writeln!(f, "Languages: {}", languages.join(", "))?;
        writeln!(f, "Files analysed: {}", project.file_count)?;

        if !project.structure.key_files.is_empty() {
            writeln!(f, "\nKey files:")?;
            for key_file in project.structure.key_files.iter().take(MAX_LISTED_KEY_FILES) {
                writeln!(f, "  {} ({})", key_file.path, key_file.purpose)?;
            }
        }
        if !project.api_endpoints.is_empty() {
            writeln!(f, "\nAPI endpoints:")?;
            for endpoint in &project.api_endpoints {
                writeln!(f, "  {} {} ({})", endpoint.method, endpoint.path, endpoint.file)?;
            }
        }
        if !report.warnings.is_empty() {
            writeln!(f, "\nWarnings:")?;
            for warning in &report.warnings {
                writeln!(f, "  - {warning}")?;
            }
        }

        writeln!(f, "\nResults:")?;
        writeln!(
            f,
            "{:>4}  {:<48}  {:<7}  {:>9}  {:>7}  {}",
            "#", "provider/model", "status", "time ms", "tokens", "error"
        )?;
        for (index, result) in report.results.iter().enumerate() {
            let label = format!("{}/{}", result.provider_used, result.model_used);
            let status = if result.success { "ok" } else { "failed" };
            let tokens = result
                .token_count
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:>4}  {:<48}  {:<7}  {:>9}  {:>7}  {}",
                index + 1,
                label,
                status,
                result.generation_time_ms,
                tokens,
                result.error.as_deref().unwrap_or("")
            )?;
        }

        let summary = &report.summary;
        writeln!(
            f,
            "\nTasks: {} total, {} succeeded, {} failed, {} skipped",
            summary.total_tasks, summary.successful, summary.failed, summary.skipped_tasks
        )?;
        writeln!(f, "Fastest: {}", describe_pick(summary.fastest.as_ref()))?;
        writeln!(f, "Most detailed: {}", describe_pick(summary.most_detailed.as_ref()))?;
        writeln!(f, "Best balance: {}", describe_pick(summary.best_balance.as_ref()))
    }
}

fn describe_pick(pick: Option<&Pick>) -> String {
    match pick {
        Some(p) => format!(
            "{}/{} ({} ms, {} tokens)",
            p.provider, p.model, p.generation_time_ms, p.token_count
        ),
        None => "no data".to_string(),
    }
}

/// The report as pretty JSON.
pub fn render_json(report: &ComparisonReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// The JSON body printed for a fatal error under `--json`.
pub fn render_failure_json(message: &str) -> String {
    json!({ "success": false, "error": message }).to_string()
}

/// Provider availability table plus the total model count across available providers.
pub fn render_providers(providers: &[ProviderAvailability]) -> String {
    ProviderTable(providers).to_string()
}

struct ProviderTable<'a>(&'a [ProviderAvailability]);

impl fmt::Display for ProviderTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<14}  {:<9}  {:>6}", "provider", "available", "models")?;
        for provider in self.0 {
            let available = if provider.available { "yes" } else { "no" };
            writeln!(
                f,
                "{:<14}  {:<9}  {:>6}",
                provider.name, available, provider.model_count
            )?;
        }
        let available_models: usize = self
            .0
            .iter()
            .filter(|p| p.available)
            .map(|p| p.model_count)
            .sum();
        writeln!(f, "\nTotal models available: {available_models}")
    }
}

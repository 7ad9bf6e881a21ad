//! Ordering and derived views over generation results.

use serde::Serialize;

use crate::contract::DocumentationResult;

/// Sort in place: successes first, then ascending generation time. Stable, so equal
/// entries keep their completion order.
pub fn rank(results: &mut [DocumentationResult]) {
    results.sort_by_key(|r| (!r.success, r.generation_time_ms));
}

fn successes(results: &[DocumentationResult]) -> impl Iterator<Item = &DocumentationResult> {
    results.iter().filter(|r| r.success)
}

/// Successful result with the lowest generation time.
pub fn fastest(results: &[DocumentationResult]) -> Option<&DocumentationResult> {
    successes(results).min_by_key(|r| r.generation_time_ms)
}

/// Successful result with the highest token count.
pub fn most_detailed(results: &[DocumentationResult]) -> Option<&DocumentationResult> {
    successes(results).max_by_key(|r| r.token_count.unwrap_or(0))
}

/// Successful result with the highest tokens per millisecond. A zero time counts as one
/// millisecond.
pub fn best_balance(results: &[DocumentationResult]) -> Option<&DocumentationResult> {
    successes(results).max_by(|a, b| balance(a).total_cmp(&balance(b)))
}

fn balance(result: &DocumentationResult) -> f64 {
    result.token_count.unwrap_or(0) as f64 / result.generation_time_ms.max(1) as f64
}

/// A result reduced to what the summary needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub provider: String,
    pub model: String,
    pub generation_time_ms: u64,
    pub token_count: u64,
}

impl From<&DocumentationResult> for Pick {
    fn from(result: &DocumentationResult) -> Self {
        Self {
            provider: result.provider_used.clone(),
            model: result.model_used.clone(),
            generation_time_ms: result.generation_time_ms,
            token_count: result.token_count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingSummary {
    pub total_tasks: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped_tasks: usize,
    pub fastest: Option<Pick>,
    pub most_detailed: Option<Pick>,
    pub best_balance: Option<Pick>,
}

impl RankingSummary {
    pub fn from_results(results: &[DocumentationResult], skipped_tasks: usize) -> Self {
        let successful = successes(results).count();
        Self {
            total_tasks: results.len() + skipped_tasks,
            successful,
            failed: results.len() - successful,
            skipped_tasks,
            fastest: fastest(results).map(Pick::from),
            most_detailed: most_detailed(results).map(Pick::from),
            best_balance: best_balance(results).map(Pick::from),
        }
    }
}

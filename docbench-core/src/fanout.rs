//! Provider fan-out: drive every `(provider, model)` task through the generator and collect
//! exactly one [`DocumentationResult`] per task that was started.
//!
//! # Policy
//! - Each attempt is bounded by `call_timeout`. An attempt that overruns counts as a
//!   timeout failure.
//! - Retryable failures (see [`GenerationError::is_retryable`]) are retried up to
//!   `max_attempts` total attempts, sleeping `retry_backoff * attempt` in between.
//!   Anything else, notably a missing model, fails on the first attempt.
//! - The whole fan-out has a global deadline. Once it has passed no further task is
//!   started; tasks already running finish under their own timeout and retry budget.
//!   Tasks never started are counted in [`FanOutReport::skipped`] and produce no result.
//!
//! # Modes
//! - [`DispatchMode::Sequential`] runs one task at a time with a small pause between
//!   dispatches.
//! - [`DispatchMode::Parallel`] keeps up to `max_in_flight` tasks running. Workers return
//!   their result and the orchestrating future collects them, so no shared mutable state is
//!   written concurrently.
//!
//! Completion order is not meaningful; callers rank the results afterwards.

use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::catalog::output_token_budget;
use crate::contract::{DocumentationResult, GenerationRequest, GenerationTask, Generator};
use crate::error::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Sequential,
    Parallel { max_in_flight: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutConfig {
    pub call_timeout: Duration,
    /// Total attempts per task, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub global_deadline: Duration,
    pub dispatch_delay: Duration,
    pub mode: DispatchMode,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(60),
            max_attempts: 2,
            retry_backoff: Duration::from_millis(500),
            global_deadline: Duration::from_secs(300),
            dispatch_delay: Duration::from_millis(100),
            mode: DispatchMode::Sequential,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanOutReport {
    /// One entry per started task, in completion order.
    pub results: Vec<DocumentationResult>,
    /// Tasks never started because the global deadline had passed.
    pub skipped: usize,
    pub deadline_reached: bool,
}

impl FanOutReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Run all tasks. `render_prompt` is called once per started task so the prompt can be sized
/// to that model's budget.
pub async fn fan_out<F>(
    tasks: &[GenerationTask],
    generator: &dyn Generator,
    config: &FanOutConfig,
    render_prompt: F,
) -> FanOutReport
where
    F: Fn(&GenerationTask) -> String + Sync,
{
    let total = tasks.len();
    let deadline = Instant::now() + config.global_deadline;
    info!(tasks = total, mode = ?config.mode, deadline_secs = config.global_deadline.as_secs(), "[FANOUT] Dispatching generation tasks");

    let report = match config.mode {
        DispatchMode::Sequential => run_sequential(tasks, generator, config, &render_prompt, deadline).await,
        DispatchMode::Parallel { max_in_flight } => {
            run_parallel(tasks, generator, config, &render_prompt, deadline, max_in_flight.max(1)).await
        }
    };

    if report.deadline_reached {
        warn!(skipped = report.skipped, "[FANOUT] Global deadline reached, remaining tasks were not started");
    }
    info!(
        total,
        succeeded = report.succeeded(),
        failed = report.failed(),
        skipped = report.skipped,
        "[FANOUT] Generation finished"
    );
    report
}

async fn run_sequential<F>(
    tasks: &[GenerationTask],
    generator: &dyn Generator,
    config: &FanOutConfig,
    render_prompt: &F,
    deadline: Instant,
) -> FanOutReport
where
    F: Fn(&GenerationTask) -> String + Sync,
{
    let mut report = FanOutReport::default();
    for (index, task) in tasks.iter().enumerate() {
        if index > 0 && !config.dispatch_delay.is_zero() {
            sleep(config.dispatch_delay).await;
        }
        if Instant::now() >= deadline {
            report.deadline_reached = true;
            report.skipped = tasks.len() - index;
            break;
        }
        let result = run_task(task, generator, config, render_prompt(task)).await;
        report.results.push(result);
        info!(progress = %format!("{}/{}", report.results.len(), tasks.len()), "[FANOUT] Progress");
    }
    report
}

async fn run_parallel<F>(
    tasks: &[GenerationTask],
    generator: &dyn Generator,
    config: &FanOutConfig,
    render_prompt: &F,
    deadline: Instant,
    max_in_flight: usize,
) -> FanOutReport
where
    F: Fn(&GenerationTask) -> String + Sync,
{
    let total = tasks.len();
    let completed = AtomicUsize::new(0);
    let completed = &completed;
    let outcomes: Vec<Option<DocumentationResult>> = stream::iter(tasks)
        .map(|task| async move {
            if Instant::now() >= deadline {
                return None;
            }
            let result = run_task(task, generator, config, render_prompt(task)).await;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            info!(progress = %format!("{done}/{total}"), "[FANOUT] Progress");
            Some(result)
        })
        .buffer_unordered(max_in_flight)
        .collect()
        .await;

    let mut report = FanOutReport::default();
    for outcome in outcomes {
        match outcome {
            Some(result) => report.results.push(result),
            None => report.skipped += 1,
        }
    }
    report.deadline_reached = report.skipped > 0;
    report
}

/// Run one task to completion under the per-call policy.
pub async fn run_task(
    task: &GenerationTask,
    generator: &dyn Generator,
    config: &FanOutConfig,
    prompt: String,
) -> DocumentationResult {
    let span = info_span!("task", provider = %task.provider_name, model = %task.model_name);
    async {
        let started = Instant::now();
        let request = GenerationRequest {
            provider: task.provider_name.clone(),
            model: task.model_name.clone(),
            max_output_tokens: output_token_budget(task.max_tokens),
            timeout: config.call_timeout,
            prompt,
        };
        debug!(prompt_chars = request.prompt.len(), max_output_tokens = request.max_output_tokens, "Prompt rendered");

        let max_attempts = config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = match timeout(config.call_timeout, generator.generate(request.clone())).await {
                Ok(outcome) => outcome,
                Err(_) => Err(GenerationError::timeout(config.call_timeout)),
            };
            match outcome {
                Ok(documentation) => {
                    let elapsed = started.elapsed();
                    info!(attempt, elapsed_ms = elapsed.as_millis() as u64, success = true, "Task completed");
                    return DocumentationResult::succeeded(task, documentation, elapsed);
                }
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let backoff = config.retry_backoff * attempt;
                    warn!(attempt, error = %error, backoff_ms = backoff.as_millis() as u64, "Retry scheduled");
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(error) => {
                    let elapsed = started.elapsed();
                    info!(attempt, elapsed_ms = elapsed.as_millis() as u64, success = false, error = %error, "Task completed");
                    return DocumentationResult::failed(task, &error, elapsed);
                }
            }
        }
    }
    .instrument(span)
    .await
}

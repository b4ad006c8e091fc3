//! Flaky test pipeline orchestration.

use std::time::Instant;

use tracing::info;

use crate::aggregate::{aggregate, aggregate_concurrent, FailureRecord};
use crate::builds::BuildLister;
use crate::client::CircleCiClient;
use crate::error::FlakyResult;
use crate::report::{rank, RankedEntry};
use crate::source::FailureSource;

/// What to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Project slug, e.g. `org/repo`.
    pub project: String,

    /// Branch whose failed builds are scanned.
    pub branch: String,

    /// How many failed builds to scan (at most 100 are fetched).
    pub max_builds: usize,

    /// Builds whose failures are extracted at the same time. 1 is strictly
    /// sequential.
    pub concurrency: usize,
}

impl PipelineOptions {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            branch: "master".to_string(),
            max_builds: 30,
            concurrency: 1,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_max_builds(mut self, max_builds: usize) -> Self {
        self.max_builds = max_builds;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Result of a complete scan.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Number of failed builds inspected.
    pub builds_scanned: usize,

    /// Failures across all scanned builds.
    pub record: FailureRecord,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Ranked failures, at most `top` of them.
    pub fn ranked(&self, top: Option<usize>) -> Vec<RankedEntry> {
        rank(&self.record, top)
    }
}

/// Build listing, failure extraction and aggregation in one pass.
pub struct FlakyPipeline;

impl FlakyPipeline {
    /// Scan the branch's failed builds and aggregate their test failures.
    ///
    /// Any error aborts the whole scan; nothing partial is returned.
    pub async fn run(
        client: &CircleCiClient,
        source: &dyn FailureSource,
        options: &PipelineOptions,
    ) -> FlakyResult<PipelineResult> {
        let start = Instant::now();

        info!(
            project = %options.project,
            branch = %options.branch,
            max_builds = options.max_builds,
            "Scanning failed builds"
        );

        let builds = BuildLister::new(client)
            .list_failed_builds(&options.project, &options.branch, options.max_builds)
            .await?;

        let record = if options.concurrency > 1 {
            aggregate_concurrent(&options.project, &builds, source, options.concurrency).await?
        } else {
            aggregate(&options.project, &builds, source).await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            builds = builds.len(),
            failing_tests = record.len(),
            duration_ms,
            "Scan complete"
        );

        Ok(PipelineResult {
            builds_scanned: builds.len(),
            record,
            duration_ms,
        })
    }
}

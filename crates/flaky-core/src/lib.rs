//! circleci-flaky core - flaky test mining for CircleCI
//!
//! Scans the most recent failed builds of a branch and ranks the tests that
//! failed most often:
//! - Lists failed builds ([`BuildLister`])
//! - Extracts failing tests per build from JUnit artifacts or the
//!   test-results API ([`FailureSource`])
//! - Aggregates failures across builds ([`FailureRecord`])
//! - Ranks and renders the result ([`rank`], [`render_text`])

pub mod aggregate;
pub mod builds;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod telemetry;

// Re-export key types
pub use aggregate::{aggregate, aggregate_concurrent, FailureRecord};
pub use builds::{clamp_limit, BuildLister, MAX_PAGE_SIZE};
pub use client::CircleCiClient;
pub use config::CircleCiConfig;
pub use error::{FlakyError, FlakyResult};
pub use model::{Artifact, Build, TestIdentity, TestResult};
pub use pipeline::{FlakyPipeline, PipelineOptions, PipelineResult};
pub use report::{rank, render_json, render_text, RankedEntry};
pub use source::{
    ArtifactSource, FailureSource, ResultApiSource, SourceKind, DEFAULT_ARTIFACT_PATTERN,
};
pub use telemetry::init_tracing;

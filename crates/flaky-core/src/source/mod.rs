//! Per-build test failure extraction.
//!
//! Two strategies produce the same thing, the failing [`TestIdentity`]s of
//! one build:
//! - [`ArtifactSource`] downloads JUnit XML artifacts and parses them.
//! - [`ResultApiSource`] reads CircleCI's structured test-results endpoint.
//!
//! One strategy is chosen per run through [`SourceKind`]; callers only see
//! `dyn FailureSource`.

mod artifact;
mod results;

pub use artifact::{parse_junit_failures, ArtifactSource, DEFAULT_ARTIFACT_PATTERN};
pub use results::ResultApiSource;

use async_trait::async_trait;

use crate::client::CircleCiClient;
use crate::error::FlakyResult;
use crate::model::{Build, TestIdentity};

/// Extracts the failing tests of a single build.
///
/// Every call redoes its network and parsing work; nothing is cached.
#[async_trait]
pub trait FailureSource: Send + Sync {
    async fn extract_failures(&self, project: &str, build: &Build)
        -> FlakyResult<Vec<TestIdentity>>;
}

/// Which failure source a run uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// JUnit artifacts whose path matches a shell glob.
    Artifacts { pattern: String },
    /// The `/tests` endpoint.
    TestResults,
}

impl Default for SourceKind {
    fn default() -> Self {
        SourceKind::Artifacts {
            pattern: DEFAULT_ARTIFACT_PATTERN.to_string(),
        }
    }
}

impl SourceKind {
    /// Build the selected source over a shared client.
    pub fn build(&self, client: CircleCiClient) -> FlakyResult<Box<dyn FailureSource>> {
        Ok(match self {
            SourceKind::Artifacts { pattern } => Box::new(ArtifactSource::new(client, pattern)?),
            SourceKind::TestResults => Box::new(ResultApiSource::new(client)),
        })
    }
}

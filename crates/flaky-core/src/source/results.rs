//! CircleCI's structured test-results endpoint as a failure source.

use async_trait::async_trait;
use tracing::debug;

use super::FailureSource;
use crate::client::CircleCiClient;
use crate::error::FlakyResult;
use crate::model::{Build, TestIdentity, TestResultsResponse};

/// Reads failures from `GET /project/.../{build_num}/tests`.
pub struct ResultApiSource {
    client: CircleCiClient,
}

impl ResultApiSource {
    pub fn new(client: CircleCiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FailureSource for ResultApiSource {
    async fn extract_failures(
        &self,
        project: &str,
        build: &Build,
    ) -> FlakyResult<Vec<TestIdentity>> {
        let path = format!("{}/{}/tests", self.client.project_path(project), build.number);
        let response: TestResultsResponse = self.client.get_json(&path, &[]).await?;

        let failures: Vec<TestIdentity> = response
            .tests
            .iter()
            .filter(|t| t.is_failure())
            .map(|t| t.identity())
            .collect();

        debug!(
            build = build.number,
            tests = response.tests.len(),
            failures = failures.len(),
            "read test results"
        );
        Ok(failures)
    }
}

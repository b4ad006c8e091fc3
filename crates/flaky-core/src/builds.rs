//! Failed build discovery.

use tracing::{debug, info};

use crate::client::CircleCiClient;
use crate::error::FlakyResult;
use crate::model::Build;

/// Largest page CircleCI serves from the recent-builds endpoint.
pub const MAX_PAGE_SIZE: usize = 100;

/// Clamp a requested build count to what one request can return.
pub fn clamp_limit(max_builds: usize) -> usize {
    max_builds.min(MAX_PAGE_SIZE)
}

/// Lists the most recent failed builds of a branch.
pub struct BuildLister<'a> {
    client: &'a CircleCiClient,
}

impl<'a> BuildLister<'a> {
    pub fn new(client: &'a CircleCiClient) -> Self {
        Self { client }
    }

    /// Fetch up to `min(max_builds, 100)` failed builds, in provider order
    /// (most recent first). No matches is an empty list.
    pub async fn list_failed_builds(
        &self,
        project: &str,
        branch: &str,
        max_builds: usize,
    ) -> FlakyResult<Vec<Build>> {
        let limit = clamp_limit(max_builds);
        if limit < max_builds {
            debug!(requested = max_builds, limit, "clamped build count to page size");
        }

        let path = format!("{}/tree/{}", self.client.project_path(project), branch);
        let mut builds: Vec<Build> = self
            .client
            .get_json(
                &path,
                &[("filter", "failed".to_string()), ("limit", limit.to_string())],
            )
            .await?;
        builds.truncate(limit);

        info!(project, branch, count = builds.len(), "found failed builds");
        Ok(builds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 0);
        assert_eq!(clamp_limit(30), 30);
        assert_eq!(clamp_limit(100), 100);
        assert_eq!(clamp_limit(101), 100);
        assert_eq!(clamp_limit(usize::MAX), 100);
    }
}

//! Cross-build failure aggregation.
//!
//! [`FailureRecord`] maps each failing [`TestIdentity`] to the builds it
//! failed in, remembering the order identities were first seen. That order
//! is the tie-break used when ranking.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};

use crate::error::FlakyResult;
use crate::model::{Build, TestIdentity};
use crate::source::FailureSource;

/// Accumulated failures of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureRecord {
    entries: Vec<(TestIdentity, Vec<Build>)>,
    index: HashMap<TestIdentity, usize>,
}

impl FailureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `build` once per emitted identity. Never removes, merges or
    /// reorders; a test reported twice in one build is recorded twice.
    pub fn record<I>(&mut self, build: &Build, identities: I)
    where
        I: IntoIterator<Item = TestIdentity>,
    {
        for identity in identities {
            match self.index.get(&identity) {
                Some(&slot) => self.entries[slot].1.push(build.clone()),
                None => {
                    self.index.insert(identity.clone(), self.entries.len());
                    self.entries.push((identity, vec![build.clone()]));
                }
            }
        }
    }

    /// Number of distinct failing tests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, identity: &TestIdentity) -> usize {
        self.builds(identity).map_or(0, <[Build]>::len)
    }

    /// Builds an identity failed in, in accumulation order.
    pub fn builds(&self, identity: &TestIdentity) -> Option<&[Build]> {
        self.index
            .get(identity)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&TestIdentity, &[Build])> {
        self.entries
            .iter()
            .map(|(identity, builds)| (identity, builds.as_slice()))
    }
}

/// Fold every build's failures into a fresh record, build by build.
///
/// Each build's failure list is consumed completely before the next build
/// is asked for. The first error aborts and the partial record is dropped.
pub async fn aggregate(
    project: &str,
    builds: &[Build],
    source: &dyn FailureSource,
) -> FlakyResult<FailureRecord> {
    let mut record = FailureRecord::new();
    for build in builds {
        let failures = source.extract_failures(project, build).await?;
        record.record(build, failures);
    }
    Ok(record)
}

/// Like [`aggregate`], but with up to `concurrency` builds extracted at once.
///
/// Results are still folded by a single owner in build order, so counts,
/// build sequences and tie-break order match the sequential fold.
pub async fn aggregate_concurrent(
    project: &str,
    builds: &[Build],
    source: &dyn FailureSource,
    concurrency: usize,
) -> FlakyResult<FailureRecord> {
    let mut extractions = stream::iter(builds)
        .map(move |build| async move { (build, source.extract_failures(project, build).await) })
        .buffered(concurrency.max(1));

    let mut record = FailureRecord::new();
    while let Some((build, failures)) = extractions.next().await {
        record.record(build, failures?);
    }
    Ok(record)
}

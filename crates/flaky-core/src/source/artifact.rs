//! JUnit XML artifacts as a failure source.

use async_trait::async_trait;
use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};

use super::FailureSource;
use crate::client::CircleCiClient;
use crate::error::{FlakyError, FlakyResult};
use crate::model::{Artifact, Build, TestIdentity};

/// Matches any artifact path ending in `junit.xml`.
pub const DEFAULT_ARTIFACT_PATTERN: &str = "*junit.xml";

/// Reads failures out of the JUnit reports a build uploaded as artifacts.
pub struct ArtifactSource {
    client: CircleCiClient,
    pattern: String,
    matcher: GlobMatcher,
}

impl ArtifactSource {
    /// Compile `pattern` as a shell glob. `*` also matches `/`, so
    /// `*junit.xml` finds reports in any directory. Backslash is a literal
    /// character, not an escape.
    pub fn new(client: CircleCiClient, pattern: &str) -> FlakyResult<Self> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(false)
            .backslash_escape(false)
            .build()
            .map_err(|e| FlakyError::Configuration {
                message: format!("invalid artifact pattern '{}': {}", pattern, e),
            })?
            .compile_matcher();

        Ok(Self {
            client,
            pattern: pattern.to_string(),
            matcher,
        })
    }

    /// Whether an artifact path is a report this source reads.
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    async fn list_artifacts(&self, project: &str, build: &Build) -> FlakyResult<Vec<Artifact>> {
        let path = format!(
            "{}/{}/artifacts",
            self.client.project_path(project),
            build.number
        );
        self.client.get_json(&path, &[]).await
    }
}

#[async_trait]
impl FailureSource for ArtifactSource {
    async fn extract_failures(
        &self,
        project: &str,
        build: &Build,
    ) -> FlakyResult<Vec<TestIdentity>> {
        let artifacts = self.list_artifacts(project, build).await?;
        let reports: Vec<&Artifact> = artifacts.iter().filter(|a| self.matches(&a.path)).collect();

        if reports.is_empty() {
            warn!(
                build = build.number,
                pattern = %self.pattern,
                artifacts = artifacts.len(),
                "no artifact matched the report pattern"
            );
        }

        // Each matching report counts on its own; overlaps are not merged.
        let mut failures = Vec::new();
        for report in reports {
            let content = self.client.get_text(&report.url).await?;
            let found = parse_junit_failures(&content).map_err(|message| {
                FlakyError::MalformedReport {
                    artifact: report.path.clone(),
                    message,
                }
            })?;
            debug!(
                build = build.number,
                artifact = %report.path,
                failures = found.len(),
                "parsed test report"
            );
            failures.extend(found);
        }

        Ok(failures)
    }
}

/// Failing test cases of a JUnit XML document, in document order.
///
/// A `testcase` counts when it has at least one direct `failure` child.
/// A missing `classname` or `name` attribute reads as the empty string.
/// Reports with a `<!DOCTYPE>` declaration are accepted.
pub fn parse_junit_failures(content: &str) -> Result<Vec<TestIdentity>, String> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc =
        roxmltree::Document::parse_with_options(content, options).map_err(|e| e.to_string())?;

    Ok(doc
        .descendants()
        .filter(|node| node.has_tag_name("testcase"))
        .filter(|case| case.children().any(|child| child.has_tag_name("failure")))
        .map(|case| {
            TestIdentity::new(
                case.attribute("classname").unwrap_or_default(),
                case.attribute("name").unwrap_or_default(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircleCiConfig;

    fn source(pattern: &str) -> ArtifactSource {
        let client = CircleCiClient::new(CircleCiConfig::default().with_token("t")).unwrap();
        ArtifactSource::new(client, pattern).unwrap()
    }

    #[test]
    fn test_default_pattern_matches_nested_reports() {
        let source = source(DEFAULT_ARTIFACT_PATTERN);
        assert!(source.matches("junit.xml"));
        assert!(source.matches("test-results/pytest/junit.xml"));
        assert!(source.matches("home/circleci/project/frontend-junit.xml"));
        assert!(!source.matches("test-results/junit.xml.gz"));
        assert!(!source.matches("coverage/index.html"));
    }

    #[test]
    fn test_pattern_supports_classes_and_single_char() {
        let source = source("reports/shard-[0-9]/results?.xml");
        assert!(source.matches("reports/shard-3/results1.xml"));
        assert!(!source.matches("reports/shard-x/results1.xml"));
        assert!(!source.matches("reports/shard-3/results12.xml"));
    }

    #[test]
    fn test_pattern_is_case_sensitive() {
        let source = source(DEFAULT_ARTIFACT_PATTERN);
        assert!(!source.matches("reports/JUNIT.XML"));
    }

    #[test]
    fn test_parse_only_failed_cases() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<testsuites>
  <testsuite name="pytest" tests="3" failures="1">
    <testcase classname="tests.test_api" name="test_ok" time="0.01"/>
    <testcase classname="tests.test_api" name="test_flaky" time="0.20">
      <failure message="AssertionError">assert 1 == 2</failure>
    </testcase>
    <testcase classname="tests.test_api" name="test_skipped">
      <skipped/>
    </testcase>
  </testsuite>
</testsuites>"#;

        let failures = parse_junit_failures(xml).unwrap();
        assert_eq!(failures, vec![TestIdentity::new("tests.test_api", "test_flaky")]);
    }

    #[test]
    fn test_parse_keeps_duplicate_cases() {
        let xml = r#"<testsuite>
  <testcase classname="Foo" name="bar"><failure/></testcase>
  <testcase classname="Foo" name="bar"><failure/></testcase>
</testsuite>"#;
        assert_eq!(parse_junit_failures(xml).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_counts_case_once_with_several_failures() {
        let xml = r#"<testsuite>
  <testcase classname="Foo" name="bar"><failure/><failure/></testcase>
</testsuite>"#;
        assert_eq!(parse_junit_failures(xml).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_ignores_errors_and_nested_failures() {
        let xml = r#"<testsuite>
  <testcase classname="Foo" name="errored"><error message="boom"/></testcase>
  <testcase classname="Foo" name="nested"><system-out><failure/></system-out></testcase>
</testsuite>"#;
        assert!(parse_junit_failures(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_missing_classname() {
        let xml = r#"<testsuite><testcase name="lonely"><failure/></testcase></testsuite>"#;
        let failures = parse_junit_failures(xml).unwrap();
        assert_eq!(failures[0].to_string(), ".lonely");
    }

    #[test]
    fn test_parse_report_with_doctype() {
        let xml = "<?xml version=\"1.0\"?>\n<!DOCTYPE testsuite>\n\
<testsuite><testcase classname=\"Foo\" name=\"bar\"><failure/></testcase></testsuite>";
        let failures = parse_junit_failures(xml).unwrap();
        assert_eq!(failures, vec![TestIdentity::new("Foo", "bar")]);
    }

    #[test]
    fn test_backslash_is_literal_in_pattern() {
        let source = source(r"reports\junit.xml");
        assert!(source.matches(r"reports\junit.xml"));
        assert!(!source.matches("reportsjunit.xml"));
    }

    #[test]
    fn test_parse_malformed_xml() {
        assert!(parse_junit_failures("<testsuite><testcase name=\"x\">").is_err());
        assert!(parse_junit_failures("not xml at all").is_err());
    }
}

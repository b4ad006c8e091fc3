//! CircleCI payloads and the test identity key.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A build as listed by `GET /project/.../tree/{branch}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    #[serde(rename = "build_num")]
    pub number: u64,
    #[serde(rename = "build_url")]
    pub url: String,
}

impl Build {
    pub fn new(number: u64, url: impl Into<String>) -> Self {
        Self {
            number,
            url: url.into(),
        }
    }
}

/// Identity of a test case, rendered as `classname.name`.
///
/// Comparison is exact; no whitespace or case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestIdentity {
    pub classname: String,
    pub name: String,
}

impl TestIdentity {
    pub fn new(classname: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.classname, self.name)
    }
}

/// An artifact attached to a build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Artifact {
    pub path: String,
    /// Direct download link.
    pub url: String,
}

/// One record of `GET /project/.../{build_num}/tests`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub classname: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub result: String,
}

impl TestResult {
    pub const FAILURE: &'static str = "failure";

    /// Only the exact status `failure` counts.
    pub fn is_failure(&self) -> bool {
        self.result == Self::FAILURE
    }

    pub fn identity(&self) -> TestIdentity {
        TestIdentity::new(self.classname.clone(), self.name.clone())
    }
}

/// Envelope of the test-results endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TestResultsResponse {
    #[serde(default)]
    pub tests: Vec<TestResult>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_display() {
        let id = TestIdentity::new("tests.test_api.ApiTest", "test_get");
        assert_eq!(id.to_string(), "tests.test_api.ApiTest.test_get");
    }

    #[test]
    fn test_identity_equality_is_exact() {
        assert_ne!(TestIdentity::new("Foo", "bar"), TestIdentity::new("foo", "bar"));
        assert_ne!(TestIdentity::new("Foo", "bar"), TestIdentity::new("Foo", "bar "));
    }

    #[test]
    fn test_build_from_circleci_summary() {
        let build: Build = serde_json::from_value(json!({
            "build_num": 101,
            "build_url": "https://circleci.com/gh/org/repo/101",
            "status": "failed",
            "branch": "master"
        }))
        .unwrap();
        assert_eq!(build, Build::new(101, "https://circleci.com/gh/org/repo/101"));
    }

    #[test]
    fn test_result_with_null_classname() {
        let result: TestResult = serde_json::from_value(json!({
            "classname": null,
            "name": "renders",
            "result": "failure",
            "run_time": 0.4
        }))
        .unwrap();
        assert!(result.is_failure());
        assert_eq!(result.identity().to_string(), ".renders");
    }

    #[test]
    fn test_only_exact_failure_counts() {
        for status in ["success", "skipped", "error", "flaky", "Failure", "failure "] {
            let result = TestResult {
                classname: "Foo".into(),
                name: "bar".into(),
                result: status.into(),
            };
            assert!(!result.is_failure(), "{status} must not count as failure");
        }
    }
}

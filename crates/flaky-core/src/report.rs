//! Ranking and rendering of aggregated failures.

use serde::Serialize;

use crate::aggregate::FailureRecord;
use crate::model::{Build, TestIdentity};

/// One line of the flaky test ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub identity: TestIdentity,
    pub count: usize,
    pub builds: Vec<Build>,
}

/// Rank by descending failure count, ties kept in first-seen order.
/// `top` of `None` keeps every entry.
pub fn rank(record: &FailureRecord, top: Option<usize>) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = record
        .iter()
        .map(|(identity, builds)| RankedEntry {
            identity: identity.clone(),
            count: builds.len(),
            builds: builds.to_vec(),
        })
        .collect();

    // sort_by is stable, so equal counts keep insertion order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));

    if let Some(top) = top {
        ranked.truncate(top);
    }
    ranked
}

/// Plain-text report: a header line per test, its build URLs, then a blank line.
pub fn render_text(entries: &[RankedEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("{} failed {} times\n", entry.identity, entry.count));
        for build in &entry.builds {
            out.push_str(&build.url);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    test: String,
    classname: &'a str,
    name: &'a str,
    count: usize,
    builds: Vec<JsonBuild<'a>>,
}

#[derive(Serialize)]
struct JsonBuild<'a> {
    number: u64,
    url: &'a str,
}

/// Machine-readable report, a JSON array in rank order.
pub fn render_json(entries: &[RankedEntry]) -> serde_json::Result<String> {
    let rows: Vec<JsonEntry<'_>> = entries
        .iter()
        .map(|entry| JsonEntry {
            test: entry.identity.to_string(),
            classname: &entry.identity.classname,
            name: &entry.identity.name,
            count: entry.count,
            builds: entry
                .builds
                .iter()
                .map(|b| JsonBuild {
                    number: b.number,
                    url: &b.url,
                })
                .collect(),
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}

//! circleci-flaky - find flaky tests in a CircleCI project
//!
//! Searches the most recent failed builds of a branch, collects the tests
//! that failed in each one and reports the tests that failed most often,
//! with links to the builds they failed in.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, Level};

use flaky_core::config::{BASE_URL_ENV, DEFAULT_BASE_URL, TOKEN_ENV};
use flaky_core::{
    render_json, render_text, CircleCiClient, CircleCiConfig, FlakyPipeline, PipelineOptions,
    SourceKind, DEFAULT_ARTIFACT_PATTERN,
};

#[derive(Parser, Debug)]
#[command(name = "circleci-flaky")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check a CircleCI project for flaky tests", long_about = None)]
struct Cli {
    /// The project to check (e.g. org/repo)
    project: String,

    /// Branch to check for failures
    #[arg(long, default_value = "master")]
    branch: String,

    /// Number of failed builds to check (at most 100)
    #[arg(long, value_name = "N", default_value_t = 30)]
    builds: usize,

    /// Limit results to the top N (default: all)
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Path of the artifact holding test results; supports wildcards
    #[arg(
        long = "test-artifact-name",
        value_name = "FILE",
        default_value = DEFAULT_ARTIFACT_PATTERN
    )]
    artifact_name: String,

    /// Where test failures are read from
    #[arg(long, value_enum, default_value_t = Source::Artifacts)]
    source: Source,

    /// Builds to inspect at the same time
    #[arg(
        long,
        value_name = "N",
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    concurrency: u16,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// CircleCI API token
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// CircleCI API root
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// VCS provider of the project
    #[arg(long, default_value = "github")]
    vcs: String,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Source {
    /// JUnit XML artifacts matching --test-artifact-name
    Artifacts,
    /// CircleCI's test-results endpoint
    Tests,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Cli {
    fn config(&self) -> CircleCiConfig {
        let config = CircleCiConfig::default()
            .with_base_url(&self.api_url)
            .with_vcs_type(&self.vcs)
            .with_timeout_secs(self.timeout);
        match &self.token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }

    fn source_kind(&self) -> SourceKind {
        match self.source {
            Source::Artifacts => SourceKind::Artifacts {
                pattern: self.artifact_name.clone(),
            },
            Source::Tests => SourceKind::TestResults,
        }
    }

    fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::new(&self.project)
            .with_branch(&self.branch)
            .with_max_builds(self.builds)
            .with_concurrency(usize::from(self.concurrency))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    flaky_core::init_tracing(cli.log_json, level);

    let report = cmd_flaky(&cli).await?;
    print!("{}", report);
    Ok(())
}

/// Run the scan and render the report. Nothing is rendered if any step fails.
async fn cmd_flaky(cli: &Cli) -> Result<String> {
    let client = CircleCiClient::new(cli.config()).context("Cannot talk to CircleCI")?;
    let source = cli
        .source_kind()
        .build(client.clone())
        .context("Invalid test result source")?;

    let options = cli.pipeline_options();
    debug!(?options, "starting scan");

    let result = FlakyPipeline::run(&client, source.as_ref(), &options)
        .await
        .with_context(|| format!("Failed to scan {} on branch {}", cli.project, cli.branch))?;

    let ranked = result.ranked(cli.top);
    match cli.format {
        Format::Text => Ok(render_text(&ranked)),
        Format::Json => {
            let mut json = render_json(&ranked).context("Failed to encode report")?;
            json.push('\n');
            Ok(json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["circleci-flaky"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["org/repo", "--token", "t"]);
        assert_eq!(cli.project, "org/repo");
        assert_eq!(cli.branch, "master");
        assert_eq!(cli.builds, 30);
        assert_eq!(cli.top, None);
        assert_eq!(cli.artifact_name, "*junit.xml");
        assert_eq!(cli.source, Source::Artifacts);
        assert_eq!(cli.concurrency, 1);
        assert_eq!(cli.format, Format::Text);
        assert_eq!(cli.vcs, "github");
    }

    #[test]
    fn test_project_is_required() {
        assert!(Cli::try_parse_from(["circleci-flaky"]).is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(Cli::try_parse_from(["circleci-flaky", "org/repo", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn test_options_are_threaded_through() {
        let cli = parse(&[
            "org/repo",
            "--branch",
            "main",
            "--builds",
            "500",
            "--top",
            "5",
            "--test-artifact-name",
            "reports/*.xml",
            "--concurrency",
            "4",
        ]);

        let options = cli.pipeline_options();
        assert_eq!(options.project, "org/repo");
        assert_eq!(options.branch, "main");
        assert_eq!(options.max_builds, 500);
        assert_eq!(options.concurrency, 4);
        assert_eq!(cli.top, Some(5));
        assert_eq!(
            cli.source_kind(),
            SourceKind::Artifacts {
                pattern: "reports/*.xml".to_string()
            }
        );
    }

    #[test]
    fn test_tests_source_ignores_artifact_pattern() {
        let cli = parse(&["org/repo", "--source", "tests"]);
        assert_eq!(cli.source_kind(), SourceKind::TestResults);
    }

    #[test]
    fn test_config_carries_token_and_endpoint() {
        let cli = parse(&[
            "org/repo",
            "--token",
            "abc",
            "--api-url",
            "http://127.0.0.1:9999/",
            "--vcs",
            "bitbucket",
            "--timeout",
            "5",
        ]);
        let config = cli.config();
        assert_eq!(config.usable_token(), Some("abc"));
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.vcs_type, "bitbucket");
        assert_eq!(config.timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_missing_token_is_reported_before_scanning() {
        let mut cli = parse(&["org/repo"]);
        cli.token = None;

        let err = cmd_flaky(&cli).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("CIRCLECI_TOKEN"), "unexpected error: {msg}");
    }
}

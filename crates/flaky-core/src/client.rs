//! Authenticated HTTP access to the CircleCI v1.1 API.
//!
//! The token is checked once when the client is built and then attached,
//! read-only, to every request as the `circle-token` query parameter.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::CircleCiConfig;
use crate::error::{FlakyError, FlakyResult};

const USER_AGENT_VALUE: &str = concat!("circleci-flaky/", env!("CARGO_PKG_VERSION"));

const TOKEN_PARAM: &str = "circle-token";

/// Longest slice of an error body carried into an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// CircleCI API client.
#[derive(Clone)]
pub struct CircleCiClient {
    http: reqwest::Client,
    base_url: String,
    vcs_type: String,
    token: String,
}

impl std::fmt::Debug for CircleCiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircleCiClient")
            .field("base_url", &self.base_url)
            .field("vcs_type", &self.vcs_type)
            .finish_non_exhaustive()
    }
}

impl CircleCiClient {
    /// Build a client. Fails without issuing any request when no usable
    /// token is configured.
    pub fn new(config: CircleCiConfig) -> FlakyResult<Self> {
        let token = config
            .usable_token()
            .ok_or_else(FlakyError::missing_token)?
            .to_string();

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| FlakyError::Configuration {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            vcs_type: config.vcs_type,
            token,
        })
    }

    /// API path prefix of a project, e.g. `/project/github/org/repo`.
    pub fn project_path(&self, project: &str) -> String {
        format!("/project/{}/{}", self.vcs_type, project)
    }

    /// GET an API path and decode its JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> FlakyResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(endpoint = %path, ?query, "requesting CircleCI API");

        let request = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(query);
        let response = self.send(request, path).await?;
        let status = response.status().as_u16();

        let body = response
            .text()
            .await
            .map_err(|e| FlakyError::remote(path, Some(status), e.without_url().to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            FlakyError::remote(path, Some(status), format!("unexpected response shape: {}", e))
        })
    }

    /// GET an absolute URL (an artifact download link) as text.
    pub async fn get_text(&self, url: &str) -> FlakyResult<String> {
        debug!(url = %url, "downloading artifact");

        let response = self.send(self.http.get(url), url).await?;
        let status = response.status().as_u16();

        response
            .text()
            .await
            .map_err(|e| FlakyError::remote(url, Some(status), e.without_url().to_string()))
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> FlakyResult<Response> {
        let response = request
            .query(&[(TOKEN_PARAM, self.token.as_str())])
            .send()
            .await
            // The request URL carries the token; keep it out of messages.
            .map_err(|e| FlakyError::remote(endpoint, None, e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlakyError::remote(
                endpoint,
                Some(status.as_u16()),
                truncate_body(&body),
            ));
        }

        Ok(response)
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "empty response body".to_string();
    }
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

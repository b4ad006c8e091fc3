//! CircleCI connection settings.

/// Public CircleCI v1.1 API root.
pub const DEFAULT_BASE_URL: &str = "https://circleci.com/api/v1.1";

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "CIRCLECI_TOKEN";

/// Environment variable overriding the API root.
pub const BASE_URL_ENV: &str = "CIRCLECI_API_URL";

/// CircleCI configuration
///
/// Not serializable, so the token cannot end up in a dump.
#[derive(Clone)]
pub struct CircleCiConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Personal API token
    pub token: Option<String>,
    /// VCS provider segment of project paths (`github`, `bitbucket`)
    pub vcs_type: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for CircleCiConfig {
    fn default() -> Self {
        CircleCiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            vcs_type: "github".to_string(),
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for CircleCiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircleCiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("vcs_type", &self.vcs_type)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl CircleCiConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        CircleCiConfig {
            base_url: std::env::var(BASE_URL_ENV).unwrap_or(defaults.base_url),
            token: std::env::var(TOKEN_ENV).ok(),
            ..defaults
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Point at a different API root
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_vcs_type(mut self, vcs_type: &str) -> Self {
        self.vcs_type = vcs_type.to_string();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// The token, if one is set and non-blank.
    pub fn usable_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

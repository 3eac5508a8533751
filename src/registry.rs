//! Published version lookup against a remote registry
//!
//! Two registries are supported:
//! - npm: `GET {base}/{package}/latest`, field `version`
//! - GitHub releases: `GET {api}/repos/{repo}/releases/latest`, field `tag_name`
//!
//! Lookups are single-shot. Timeouts are enforced by the HTTP client; retries are left to the caller.

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Package looked up when none is configured
pub const DEFAULT_PACKAGE: &str = "zenn-cli";
pub const DEFAULT_NPM_REGISTRY: &str = "https://registry.npmjs.org";
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Remote source of the latest published version
#[async_trait]
pub trait PublishedVersionSource: Send + Sync {
    /// Fetch the latest published version string
    ///
    /// # Errors
    /// Returns an error if the registry cannot be reached or the response lacks a version
    async fn published_version(&self) -> Result<String>;
}

#[async_trait]
impl<T: PublishedVersionSource + ?Sized> PublishedVersionSource for Box<T> {
    async fn published_version(&self) -> Result<String> {
        (**self).published_version().await
    }
}

/// Errors raised by registry lookups
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Registry request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Registry returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Registry response from {url} has no '{field}' field")]
    MissingField { url: String, field: &'static str },
}

/// Latest dist-tag lookup on an npm-compatible registry
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    base_url: String,
    package: String,
    timeout: Duration,
}

impl NpmRegistry {
    pub fn new(package: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_NPM_REGISTRY, package)
    }

    pub fn with_base_url(base_url: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            package: package.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn latest_url(&self) -> String {
        format!("{}/{}/latest", self.base_url.trim_end_matches('/'), self.package)
    }
}

#[async_trait]
impl PublishedVersionSource for NpmRegistry {
    async fn published_version(&self) -> Result<String> {
        let url = self.latest_url();
        let body = fetch_json(&url, self.timeout).await?;
        Ok(extract_field(&body, "version", &url)?)
    }
}

/// Upgrade command for a globally installed npm package
pub fn npm_upgrade_hint(package: &str) -> String {
    format!("npm install -g {}@latest", package)
}

/// Latest release lookup on GitHub
#[derive(Debug, Clone)]
pub struct GithubReleases {
    api_base: String,
    repo: String,
    timeout: Duration,
}

impl GithubReleases {
    pub fn new(repo: impl Into<String>) -> Self {
        Self::with_api_base(DEFAULT_GITHUB_API, repo)
    }

    pub fn with_api_base(api_base: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            repo: repo.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn latest_url(&self) -> String {
        format!(
            "{}/repos/{}/releases/latest",
            self.api_base.trim_end_matches('/'),
            self.repo
        )
    }
}

#[async_trait]
impl PublishedVersionSource for GithubReleases {
    async fn published_version(&self) -> Result<String> {
        let url = self.latest_url();
        let body = fetch_json(&url, self.timeout).await?;
        Ok(extract_field(&body, "tag_name", &url)?)
    }
}

async fn fetch_json(url: &str, timeout: Duration) -> std::result::Result<Value, RegistryError> {
    let request_error = |source: reqwest::Error| RegistryError::Request {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(request_error)?;

    tracing::debug!(url, "fetching published version");
    let response = client.get(url).send().await.map_err(request_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(RegistryError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.json::<Value>().await.map_err(request_error)
}

fn extract_field(
    body: &Value,
    field: &'static str,
    url: &str,
) -> std::result::Result<String, RegistryError> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RegistryError::MissingField {
            url: url.to_string(),
            field,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_npm_latest_url() {
        let registry = NpmRegistry::with_base_url("https://registry.example.com/", "zenn-cli");
        assert_eq!(
            registry.latest_url(),
            "https://registry.example.com/zenn-cli/latest"
        );
        assert_eq!(
            NpmRegistry::new("zenn-cli").latest_url(),
            "https://registry.npmjs.org/zenn-cli/latest"
        );
    }

    #[test]
    fn test_github_latest_url() {
        let releases = GithubReleases::new("zenn-dev/zenn-editor");
        assert_eq!(
            releases.latest_url(),
            "https://api.github.com/repos/zenn-dev/zenn-editor/releases/latest"
        );
    }

    #[test]
    fn test_extract_field() {
        let body = json!({ "name": "zenn-cli", "version": "0.1.150" });
        let version = extract_field(&body, "version", "u").unwrap();
        assert_eq!(version, "0.1.150");
    }

    #[test]
    fn test_extract_field_missing_or_wrong_type() {
        let body = json!({ "version": 12 });
        let err = extract_field(&body, "version", "https://r/x/latest").unwrap_err();
        assert!(matches!(err, RegistryError::MissingField { field: "version", .. }));
        assert!(err.to_string().contains("https://r/x/latest"));

        let err = extract_field(&json!({}), "tag_name", "u").unwrap_err();
        assert!(err.to_string().contains("tag_name"));
    }

    #[tokio::test]
    async fn test_unreachable_registry_fails() {
        // Bind an ephemeral port and release it so nothing is listening there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let registry = NpmRegistry::with_base_url(format!("http://127.0.0.1:{port}"), "zenn-cli")
            .timeout(Duration::from_secs(2));
        let err = registry.published_version().await.unwrap_err();
        assert!(err.downcast_ref::<RegistryError>().is_some());
    }
}

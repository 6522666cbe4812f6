//! 配置模块：运行所需的凭据、端点与节流参数。
//!
//! Run configuration, built once at process start and passed by reference into
//! every component constructor.
//!
//! - [`SeederConfig`]: credentials, endpoints and [`PipelineSettings`].
//! - [`PipelineSettings`]: batching / pacing / retry knobs (JSON or YAML file).
//! - [`IssueKindsConfig`]: which CSV feeds which issue kind and project.
//!
//! Environment variables are read only by [`SeederConfig::from_env`]:
//! - `TEAM_SETUP_TOKEN` (falls back to the OS keyring entry `repo-seeder/github`)
//! - `GITHUB_REPOSITORY` (`owner/name`)
//! - `GITHUB_API_URL`, `GITHUB_GRAPHQL_URL` (optional overrides)

use crate::types::IssueKind;
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const KEYRING_SERVICE: &str = "repo-seeder";
const KEYRING_USER: &str = "github";

/// Batching, pacing and retry knobs. Durations are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_pause: f64,
    /// Pause before each non-initial item of a batch.
    pub request_delay: f64,
    /// Base delay for the first rate-limit backoff and for 5xx / transport retries.
    pub retry_delay: f64,
    /// Attempt budget per item.
    pub max_retries: u32,
    /// Base delay for rate-limit backoff after the first attempt.
    pub secondary_limit_delay: f64,
    /// Added on top of an explicit `retry-after` hint.
    pub retry_after_margin: f64,
    /// Rate-limited responses reporting more remaining quota than this are
    /// treated as secondary (content-creation) limits. Unset disables the heuristic.
    pub secondary_limit_remaining_threshold: Option<u64>,
    pub max_retry_rounds: u32,
    /// Settle time before each retry round.
    pub retry_settle_delay: f64,
    /// Pause between retry rounds.
    pub retry_round_pause: f64,
    /// Pause between project-link calls.
    pub link_delay: f64,
    /// Per-HTTP-call timeout.
    pub http_timeout: f64,
    /// Pause between project creations.
    pub project_pause: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_pause: 15.0,
            request_delay: 1.0,
            retry_delay: 120.0,
            max_retries: 15,
            secondary_limit_delay: 300.0,
            retry_after_margin: 0.0,
            secondary_limit_remaining_threshold: None,
            max_retry_rounds: 2,
            retry_settle_delay: 3.0,
            retry_round_pause: 5.0,
            link_delay: 0.1,
            http_timeout: 30.0,
            project_pause: 2.0,
        }
    }
}

impl PipelineSettings {
    /// Load settings from a `.json`, `.yaml` or `.yml` file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Self = load_structured(path.as_ref())?;
        settings.validate()?;
        info!(path = %path.as_ref().display(), "Loaded pipeline settings");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(invalid_setting("batch_size", "must be at least 1"));
        }
        if self.max_retries == 0 {
            return Err(invalid_setting("max_retries", "must be at least 1"));
        }
        let durations = [
            ("batch_pause", self.batch_pause),
            ("request_delay", self.request_delay),
            ("retry_delay", self.retry_delay),
            ("secondary_limit_delay", self.secondary_limit_delay),
            ("retry_after_margin", self.retry_after_margin),
            ("retry_settle_delay", self.retry_settle_delay),
            ("retry_round_pause", self.retry_round_pause),
            ("link_delay", self.link_delay),
            ("http_timeout", self.http_timeout),
            ("project_pause", self.project_pause),
        ];
        for (name, secs) in durations {
            if !secs.is_finite() || secs < 0.0 {
                return Err(invalid_setting(
                    name,
                    format!("must be a non-negative number of seconds, got {secs}"),
                ));
            }
        }
        // A zero timeout fails every call before it is sent.
        if self.http_timeout == 0.0 {
            return Err(invalid_setting(
                "http_timeout",
                "must be a positive number of seconds",
            ));
        }
        Ok(())
    }

    pub fn batch_pause(&self) -> Duration {
        secs(self.batch_pause)
    }
    pub fn request_delay(&self) -> Duration {
        secs(self.request_delay)
    }
    pub fn retry_delay(&self) -> Duration {
        secs(self.retry_delay)
    }
    pub fn secondary_limit_delay(&self) -> Duration {
        secs(self.secondary_limit_delay)
    }
    pub fn retry_after_margin(&self) -> Duration {
        secs(self.retry_after_margin)
    }
    pub fn retry_settle_delay(&self) -> Duration {
        secs(self.retry_settle_delay)
    }
    pub fn retry_round_pause(&self) -> Duration {
        secs(self.retry_round_pause)
    }
    pub fn link_delay(&self) -> Duration {
        secs(self.link_delay)
    }
    pub fn http_timeout(&self) -> Duration {
        secs(self.http_timeout)
    }
    pub fn project_pause(&self) -> Duration {
        secs(self.project_pause)
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

fn invalid_setting(name: &str, details: impl Into<String>) -> Error {
    Error::configuration_with_context(
        format!("Invalid setting '{name}'"),
        ErrorContext::new()
            .with_field_path(format!("settings.{name}"))
            .with_details(details)
            .with_source("pipeline_settings"),
    )
}

/// Credentials, endpoints and settings for one run.
#[derive(Debug, Clone)]
pub struct SeederConfig {
    token: String,
    owner: String,
    name: String,
    pub api_base: Url,
    pub graphql_url: Url,
    pub settings: PipelineSettings,
}

impl SeederConfig {
    /// Build a config for `owner/name` against the public GitHub API.
    pub fn new(token: impl Into<String>, repository: &str) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "Access token is required",
                ErrorContext::new()
                    .with_field_path("env.TEAM_SETUP_TOKEN")
                    .with_source("config"),
            ));
        }
        let (owner, name) = split_repository(repository)?;
        let api_base = parse_url("api_base", DEFAULT_API_BASE)?;
        let graphql_url = graphql_url_for(&api_base)?;
        Ok(Self {
            token,
            owner,
            name,
            api_base,
            graphql_url,
            settings: PipelineSettings::default(),
        })
    }

    /// Build a config from the process environment. Missing credentials are fatal.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("TEAM_SETUP_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(token_from_keyring)
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "TEAM_SETUP_TOKEN and GITHUB_REPOSITORY are required",
                    ErrorContext::new()
                        .with_field_path("env.TEAM_SETUP_TOKEN")
                        .with_details("set the variable or store a token in the OS keyring")
                        .with_source("config"),
                )
            })?;
        let repository = std::env::var("GITHUB_REPOSITORY").map_err(|_| {
            Error::configuration_with_context(
                "TEAM_SETUP_TOKEN and GITHUB_REPOSITORY are required",
                ErrorContext::new()
                    .with_field_path("env.GITHUB_REPOSITORY")
                    .with_source("config"),
            )
        })?;

        let mut config = Self::new(token, &repository)?;
        if let Ok(base) = std::env::var("GITHUB_API_URL") {
            config = config.with_api_base(&base)?;
        }
        if let Ok(graphql) = std::env::var("GITHUB_GRAPHQL_URL") {
            config.graphql_url = parse_url("graphql_url", &graphql)?;
        }
        Ok(config)
    }

    /// Point both REST and GraphQL at another host (GHES, mock servers).
    pub fn with_api_base(mut self, base: &str) -> Result<Self> {
        self.api_base = parse_url("api_base", base)?;
        self.graphql_url = graphql_url_for(&self.api_base)?;
        Ok(self)
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Result<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo_name(&self) -> &str {
        &self.name
    }

    /// `owner/name`
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Log the effective configuration (never the token).
    pub fn log_settings(&self) {
        let s = &self.settings;
        info!(
            repository = %self.repository(),
            api_base = %self.api_base,
            batch_size = s.batch_size,
            batch_pause_secs = s.batch_pause,
            request_delay_secs = s.request_delay,
            max_retries = s.max_retries,
            retry_delay_secs = s.retry_delay,
            max_retry_rounds = s.max_retry_rounds,
            "Current configuration"
        );
    }
}

fn token_from_keyring() -> Option<String> {
    let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()?;
    match entry.get_password() {
        Ok(token) if !token.trim().is_empty() => Some(token),
        _ => None,
    }
}

fn split_repository(repository: &str) -> Result<(String, String)> {
    let invalid = || {
        Error::configuration_with_context(
            format!("Invalid repository '{repository}'"),
            ErrorContext::new()
                .with_field_path("env.GITHUB_REPOSITORY")
                .with_details("expected owner/name")
                .with_source("config"),
        )
    };
    let (owner, name) = repository.trim().split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return Err(invalid());
    }
    Ok((owner.to_string(), name.to_string()))
}

fn parse_url(field: &str, raw: &str) -> Result<Url> {
    Url::parse(raw.trim_end_matches('/')).map_err(|e| {
        Error::configuration_with_context(
            format!("Invalid URL '{raw}'"),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(e.to_string())
                .with_source("config"),
        )
    })
}

fn graphql_url_for(api_base: &Url) -> Result<Url> {
    let base = api_base.as_str().trim_end_matches('/');
    parse_url("graphql_url", &format!("{base}/graphql"))
}

/// How one issue kind is sourced, titled, labelled and linked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueKindSpec {
    pub name: String,
    pub csv_file: String,
    #[serde(default)]
    pub title_prefix: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default = "default_numbered")]
    pub numbered_title: bool,
}

fn default_numbered() -> bool {
    true
}

impl IssueKindSpec {
    pub fn kind(&self) -> IssueKind {
        IssueKind::new(&self.name)
    }
}

/// Ordered issue kinds. Order decides request order across kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueKindsConfig {
    pub kinds: Vec<IssueKindSpec>,
}

impl Default for IssueKindsConfig {
    fn default() -> Self {
        let kind = |name: &str, csv: &str, prefix: &str, project: &str, numbered: bool| {
            IssueKindSpec {
                name: name.to_string(),
                csv_file: csv.to_string(),
                title_prefix: prefix.to_string(),
                labels: vec![name.to_string()],
                project_name: Some(project.to_string()),
                numbered_title: numbered,
            }
        };
        Self {
            kinds: vec![
                kind("task", "tasks_for_issues.csv", "Task", "Tasks", true),
                kind("test", "tests_for_issues.csv", "Test", "Tests", true),
                kind("kpt", "kpt_for_issues.csv", "", "KPT", false),
            ],
        }
    }
}

impl IssueKindsConfig {
    /// Load kinds from a JSON / YAML file; falls back to the defaults when the file is absent.
    pub fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Issue kinds file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = load_structured(path)?;
        if config.kinds.is_empty() {
            return Err(Error::configuration_with_context(
                "No issue kinds configured",
                ErrorContext::new()
                    .with_field_path("kinds")
                    .with_source("issue_kinds"),
            ));
        }
        info!(path = %path.display(), kinds = config.kinds.len(), "Loaded issue kinds");
        Ok(config)
    }

    pub fn get(&self, name: &str) -> Option<&IssueKindSpec> {
        self.kinds.iter().find(|k| k.name == name)
    }

    /// Keep only the named kind (CLI `--only`).
    pub fn only(mut self, name: &str) -> Result<Self> {
        self.kinds.retain(|k| k.name == name);
        if self.kinds.is_empty() {
            return Err(Error::configuration_with_context(
                format!("Unknown issue kind '{name}'"),
                ErrorContext::new()
                    .with_field_path("--only")
                    .with_source("issue_kinds"),
            ));
        }
        Ok(self)
    }
}

/// Deserialize a JSON or YAML file, chosen by extension.
pub fn load_structured<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let ctx = || {
        ErrorContext::new()
            .with_field_path(path.display().to_string())
            .with_source("config_loader")
    };
    match ext.as_str() {
        "json" => serde_json::from_str(&content).map_err(|e| {
            Error::configuration_with_context("Invalid JSON", ctx().with_details(e.to_string()))
        }),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| {
            Error::configuration_with_context("Invalid YAML", ctx().with_details(e.to_string()))
        }),
        other => Err(Error::configuration_with_context(
            format!("Unsupported config format '{other}'"),
            ctx().with_details("expected .json, .yaml or .yml"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("repo-seeder-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_new_rejects_missing_token() {
        let err = SeederConfig::new("  ", "acme/app").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_new_rejects_malformed_repository() {
        for repo in ["acme", "/app", "acme/", "a/b/c"] {
            assert!(SeederConfig::new("t", repo).is_err(), "{repo} should be rejected");
        }
    }

    #[test]
    fn test_graphql_url_follows_api_base() {
        let config = SeederConfig::new("t", "acme/app")
            .unwrap()
            .with_api_base("http://127.0.0.1:4010/")
            .unwrap();
        assert_eq!(config.graphql_url.as_str(), "http://127.0.0.1:4010/graphql");
        assert_eq!(config.owner(), "acme");
        assert_eq!(config.repo_name(), "app");
        assert_eq!(config.repository(), "acme/app");
    }

    #[test]
    fn test_settings_file_merges_with_defaults() {
        let path = temp_file("settings.json", r#"{"batch_size": 25, "request_delay": 0.5}"#);
        let settings = PipelineSettings::from_file(&path).unwrap();
        assert_eq!(settings.batch_size, 25);
        assert_eq!(settings.request_delay(), Duration::from_millis(500));
        assert_eq!(settings.max_retries, 15);
        assert_eq!(settings.secondary_limit_delay(), Duration::from_secs(300));
    }

    #[test]
    fn test_settings_yaml_file() {
        let path = temp_file(
            "settings.yaml",
            "batch_pause: 20\nsecondary_limit_remaining_threshold: 3000\n",
        );
        let settings = PipelineSettings::from_file(&path).unwrap();
        assert_eq!(settings.batch_pause(), Duration::from_secs(20));
        assert_eq!(settings.secondary_limit_remaining_threshold, Some(3000));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut s = PipelineSettings::default();
        s.batch_size = 0;
        assert!(s.validate().is_err());

        let mut s = PipelineSettings::default();
        s.request_delay = -1.0;
        let err = s.validate().unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("settings.request_delay")
        );

        let mut s = PipelineSettings::default();
        s.batch_pause = f64::NAN;
        assert!(s.validate().is_err());

        let mut s = PipelineSettings::default();
        s.max_retries = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_http_timeout() {
        let mut s = PipelineSettings::default();
        s.http_timeout = 0.0;
        let err = s.validate().unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("settings.http_timeout")
        );

        s.http_timeout = 0.25;
        assert!(s.validate().is_ok());
        assert!(SeederConfig::new("t", "acme/app")
            .unwrap()
            .with_settings(PipelineSettings {
                http_timeout: 0.0,
                ..PipelineSettings::default()
            })
            .is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let path = temp_file("settings.toml", "batch_size = 3");
        assert!(PipelineSettings::from_file(&path).is_err());
    }

    #[test]
    fn test_issue_kinds_defaults_and_only() {
        let kinds = IssueKindsConfig::default();
        let names: Vec<_> = kinds.kinds.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, ["task", "test", "kpt"]);
        assert!(!kinds.get("kpt").unwrap().numbered_title);

        let only = kinds.clone().only("test").unwrap();
        assert_eq!(only.kinds.len(), 1);
        assert!(kinds.only("nope").is_err());
    }

    #[test]
    fn test_issue_kinds_missing_file_uses_defaults() {
        let kinds = IssueKindsConfig::from_file_or_default("/definitely/not/here.json").unwrap();
        assert_eq!(kinds, IssueKindsConfig::default());
    }
}

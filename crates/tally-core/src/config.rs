use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;
use crate::metrics::{Bucketing, CALC_LIMIT, ONE_DAY, ONE_HOUR};

/// Project config location relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = ".tally/config.toml";

const REDACTED: &str = "********";

/// Configuration load and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config file format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid configuration: {}", .problems.join("; "))]
    Invalid { problems: Vec<String> },
}

impl ConfigError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Parse { .. } => ErrorCode::ConfigParseError,
            Self::UnsupportedFormat { .. } => ErrorCode::UnsupportedConfigFormat,
            Self::Invalid { .. } => ErrorCode::InvalidConfig,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub jql: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            server: None,
            token: None,
            jql: None,
            page_size: default_page_size(),
            max_workers: default_max_workers(),
        }
    }
}

/// Jira connection values supplied outside the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JiraOverrides {
    pub server: Option<String>,
    pub token: Option<String>,
    pub jql: Option<String>,
}

impl JiraOverrides {
    /// Read `JIRA_SERVER`, `JIRA_TOKEN` and `JIRA_JQL`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: lookup("JIRA_SERVER"),
            token: lookup("JIRA_TOKEN"),
            jql: lookup("JIRA_JQL"),
        }
    }
}

impl JiraConfig {
    /// Apply overrides with precedence `cli > env > file`. Empty values are unset.
    #[must_use]
    pub fn merged(self, env: JiraOverrides, cli: JiraOverrides) -> Self {
        fn pick(cli: Option<String>, env: Option<String>, file: Option<String>) -> Option<String> {
            [cli, env, file]
                .into_iter()
                .flatten()
                .find(|value| !value.trim().is_empty())
        }

        Self {
            server: pick(cli.server, env.server, self.server),
            token: pick(cli.token, env.token, self.token),
            jql: pick(cli.jql, env.jql, self.jql),
            ..self
        }
    }

    /// Check that everything needed to query Jira is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        match self.server.as_deref() {
            None => problems.push(
                "Jira server URL is missing. Set --jira-server, JIRA_SERVER, or config file."
                    .to_string(),
            ),
            Some(server) if !(server.starts_with("http://") || server.starts_with("https://")) => {
                problems.push("Jira server URL must start with http:// or https://.".to_string());
            }
            Some(_) => {}
        }
        if self.token.is_none() {
            problems.push(
                "Jira token is missing. Set --jira-token, JIRA_TOKEN, or config file.".to_string(),
            );
        }
        if self.jql.is_none() {
            problems.push(
                "Jira JQL is missing. Set --jira-jql, JIRA_JQL, or config file.".to_string(),
            );
        }
        if self.page_size == 0 {
            problems.push("jira.page_size must be greater than zero.".to_string());
        }
        if self.max_workers == 0 {
            problems.push("jira.max_workers must be greater than zero.".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }

    /// Copy safe to print: the token is masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            token: self.token.as_ref().map(|_| REDACTED.to_string()),
            ..self.clone()
        }
    }
}

/// Return-to-testing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestingConfig {
    #[serde(default = "default_testing_labels")]
    pub labels: Vec<String>,
    #[serde(default = "default_min_testing_count")]
    pub min_count: usize,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            labels: default_testing_labels(),
            min_count: default_min_testing_count(),
        }
    }
}

/// Calculator parameters for the metrics façade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_daily")]
    pub cycle_time: Bucketing,
    #[serde(default = "default_daily")]
    pub lead_time: Bucketing,
    #[serde(default = "default_daily")]
    pub queue_time: Bucketing,
    #[serde(default = "default_cumulative")]
    pub cumulative_queue_time: Bucketing,
    #[serde(default)]
    pub return_to_testing: TestingConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cycle_time: default_daily(),
            lead_time: default_daily(),
            queue_time: default_daily(),
            cumulative_queue_time: default_cumulative(),
            return_to_testing: TestingConfig::default(),
        }
    }
}

impl MetricsConfig {
    /// Reject zero-width buckets and zero caps.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every offending section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sections = [
            ("cycle_time", &self.cycle_time),
            ("lead_time", &self.lead_time),
            ("queue_time", &self.queue_time),
            ("cumulative_queue_time", &self.cumulative_queue_time),
        ];

        let mut problems = Vec::new();
        for (name, bucketing) in sections {
            if bucketing.bucket_seconds == 0 {
                problems.push(format!("metrics.{name}.bucket_seconds must be greater than zero."));
            }
            if bucketing.cap == 0 {
                problems.push(format!("metrics.{name}.cap must be greater than zero."));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }
}

/// Load a config file, choosing the format from its extension.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file is unreadable, unparsable, or not
/// `.toml`, `.yaml`, `.yml` or `.json`.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let format = match extension.as_deref() {
        Some("toml") => ConfigFormat::Toml,
        Some("yaml" | "yml") => ConfigFormat::Yaml,
        Some("json") => ConfigFormat::Json,
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = match format {
        ConfigFormat::Toml => toml::from_str(&content).map_err(|err| err.to_string()),
        ConfigFormat::Yaml => serde_yaml::from_str(&content).map_err(|err| err.to_string()),
        ConfigFormat::Json => serde_json::from_str(&content).map_err(|err| err.to_string()),
    };

    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Load `.tally/config.toml` under `project_root`, or defaults when absent.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but cannot be loaded.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = project_root.join(PROJECT_CONFIG_PATH);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    load_config_file(&path)
}

/// Explicit `--config` path wins; otherwise the project config.
///
/// # Errors
///
/// Propagates [`ConfigError`] from the chosen loader.
pub fn resolve_config(
    explicit: Option<&Path>,
    project_root: &Path,
) -> Result<ProjectConfig, ConfigError> {
    explicit.map_or_else(|| load_project_config(project_root), load_config_file)
}

const fn default_page_size() -> usize {
    50
}

const fn default_max_workers() -> usize {
    8
}

const fn default_daily() -> Bucketing {
    Bucketing::new(ONE_DAY, CALC_LIMIT)
}

const fn default_cumulative() -> Bucketing {
    Bucketing::new(ONE_HOUR, 1000)
}

fn default_testing_labels() -> Vec<String> {
    vec!["testing".to_string()]
}

const fn default_min_testing_count() -> usize {
    1
}

pub mod completions;
pub mod config;
pub mod report;
pub mod show;

use std::path::{Path, PathBuf};

use clap::Args;
use tally_core::ItemCollection;
use tally_core::config::{JiraOverrides, ProjectConfig, resolve_config};
use tally_core::source::ExportFile;

use crate::jira::JiraClient;
use crate::output::CliError;

/// Where items come from: an export file, or the Jira search API.
#[derive(Args, Debug, Default, Clone)]
pub struct SourceArgs {
    /// Read a Jira search export (JSON) instead of querying Jira.
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Jira base URL (overrides JIRA_SERVER and the config file).
    #[arg(long, value_name = "URL")]
    pub jira_server: Option<String>,

    /// Jira API token (overrides JIRA_TOKEN and the config file).
    #[arg(long, value_name = "TOKEN")]
    pub jira_token: Option<String>,

    /// JQL selecting the issues (overrides JIRA_JQL and the config file).
    #[arg(long, value_name = "JQL")]
    pub jira_jql: Option<String>,
}

impl SourceArgs {
    fn overrides(&self) -> JiraOverrides {
        JiraOverrides {
            server: self.jira_server.clone(),
            token: self.jira_token.clone(),
            jql: self.jira_jql.clone(),
        }
    }
}

/// Load and validate the effective project config.
pub fn load_config(config_path: Option<&Path>, project_root: &Path) -> Result<ProjectConfig, CliError> {
    let config = resolve_config(config_path, project_root)?;
    config.metrics.validate()?;
    Ok(config)
}

/// Build the item collection from the selected source.
pub fn load_collection(
    source: &SourceArgs,
    config: &ProjectConfig,
) -> Result<ItemCollection, CliError> {
    if let Some(path) = &source.input {
        return Ok(ItemCollection::from_source(&ExportFile::new(path))?);
    }

    let jira = config
        .jira
        .clone()
        .merged(JiraOverrides::from_env(), source.overrides());
    let client = JiraClient::from_config(&jira)?;
    Ok(ItemCollection::from_source(&client)?)
}

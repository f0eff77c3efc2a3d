//! `tally config`: effective configuration, token redacted.

use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use tally_core::config::{JiraOverrides, ProjectConfig};

use super::load_config;
use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `tally config`.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {}

/// Resolve the config the other commands would use, with env overrides
/// applied and the token masked.
fn effective_config(config: ProjectConfig, env: JiraOverrides) -> ProjectConfig {
    let jira = config.jira.merged(env, JiraOverrides::default()).redacted();
    ProjectConfig { jira, ..config }
}

/// Execute `tally config`.
pub fn run_config(
    _args: &ConfigArgs,
    config_path: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let config = load_config(config_path, project_root)?;
    let effective = effective_config(config, JiraOverrides::from_env());
    render_mode(output, &effective, render_config_text, render_config_pretty)
}

fn to_toml(config: &ProjectConfig) -> io::Result<String> {
    toml::to_string_pretty(config).map_err(io::Error::other)
}

fn render_config_text(config: &ProjectConfig, w: &mut dyn Write) -> io::Result<()> {
    write!(w, "{}", to_toml(config)?)
}

fn render_config_pretty(config: &ProjectConfig, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Effective configuration")?;
    write!(w, "{}", to_toml(config)?)
}

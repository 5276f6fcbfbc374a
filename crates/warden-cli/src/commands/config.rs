//! Configuration management commands.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use warden::ConfigLoader;

use super::load_config;
use crate::style::{print_hint, print_labeled, print_success};

/// Show the effective configuration.
pub fn show(project: &Path) -> Result<ExitCode> {
    let config = load_config(project).context("Failed to load configuration")?;
    print!("{}", config.to_redacted_toml()?);
    Ok(ExitCode::SUCCESS)
}

/// Validate configuration files.
pub fn validate(project: &Path) -> Result<ExitCode> {
    load_config(project).context("Configuration validation failed")?;
    print_success("Configuration is valid");
    for (layer, path) in ConfigLoader::new().with_project_dir(project).layers() {
        let state = if path.exists() { "loaded" } else { "absent" };
        print_labeled(layer.as_str(), &format!("{} ({state})", path.display()));
    }
    print_hint("WARDEN_<SECTION>__<KEY> environment variables override every file");
    Ok(ExitCode::SUCCESS)
}

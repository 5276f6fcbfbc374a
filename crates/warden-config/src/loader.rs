//! Layered configuration loading.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;

use crate::WardenConfig;

/// Prefix of environment overrides, e.g. `WARDEN_PII__MATCH_CONFIDENCE=80`.
pub const ENV_PREFIX: &str = "WARDEN";

/// A TOML file layer, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// `~/.config/warden/config.toml`
    User,
    /// `warden.toml`, checked in with the project.
    Project,
    /// `warden.local.toml`, gitignored overrides.
    Local,
}

impl ConfigLayer {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigLayer::User => "user",
            ConfigLayer::Project => "project",
            ConfigLayer::Local => "local",
        }
    }
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a [`WardenConfig`] from defaults, the file layers and the
/// environment, later sources winning.
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_source: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Loader rooted at the current directory.
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_source: None,
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Read variables from `vars` instead of the process environment.
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    /// File layers in precedence order. The user layer is omitted when the
    /// platform has no home directory.
    pub fn layers(&self) -> Vec<(ConfigLayer, PathBuf)> {
        let mut layers = Vec::with_capacity(3);
        if let Some(dirs) = ProjectDirs::from("com", "Warden", "warden") {
            layers.push((ConfigLayer::User, dirs.config_dir().join("config.toml")));
        }
        layers.push((ConfigLayer::Project, self.project_dir.join("warden.toml")));
        layers.push((ConfigLayer::Local, self.project_dir.join("warden.local.toml")));
        layers
    }

    pub fn load(self) -> Result<WardenConfig> {
        let mut builder = Config::builder().add_source(Config::try_from(&WardenConfig::default())?);

        for (_, path) in self.layers().into_iter().filter(|(_, p)| p.exists()) {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(self.env_source),
        );

        let config: WardenConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate().context("Configuration failed validation")?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

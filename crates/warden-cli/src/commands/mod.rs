//! CLI command implementations.

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use warden::{AllowAllPolicy, AuthorizationKernel, ConfigLoader, PolicyDecisionPoint, WardenConfig};

pub mod check;
pub mod config;
pub mod protect;
pub mod scan;

/// Exit code for an authorization denial.
pub const DENIED: u8 = 3;

pub fn denied() -> ExitCode {
    ExitCode::from(DENIED)
}

pub fn load_config(project: &Path) -> Result<WardenConfig> {
    ConfigLoader::new().with_project_dir(project).load()
}

/// Builds a kernel from the project's configuration.
///
/// The CLI has no audit sink; events still reach the log on stderr.
pub fn kernel(project: &Path, pdp: Option<Arc<dyn PolicyDecisionPoint>>) -> Result<AuthorizationKernel> {
    let config = load_config(project)?;
    let pdp = pdp.unwrap_or_else(|| Arc::new(AllowAllPolicy));
    AuthorizationKernel::from_config(&config, pdp, None).context("Failed to build authorization kernel")
}

/// Reads and parses a JSON file into `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Reads a document, falling back to one string value when it is not JSON.
pub fn read_document(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&raw).unwrap_or(Value::String(raw)))
}

pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

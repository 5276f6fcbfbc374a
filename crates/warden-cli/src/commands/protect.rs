//! Protect command - print a masked, encrypted or tokenized copy.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use warden::ProtectionLevel;

use super::{kernel, print_json, read_document};

pub fn run(project: &Path, file: &Path, level: ProtectionLevel, report: bool) -> Result<ExitCode> {
    let kernel = kernel(project, None)?;
    let document = read_document(file)?;

    let result = kernel
        .protect_pii(&document, level)
        .with_context(|| format!("Failed to protect {}", file.display()))?;

    if report {
        print_json(&result)?;
    } else {
        print_json(&result.protected_data)?;
    }
    Ok(ExitCode::SUCCESS)
}

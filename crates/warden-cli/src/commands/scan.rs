//! Scan command - report the PII found in a document.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;

use super::{kernel, print_json, read_document};

pub fn run(project: &Path, file: &Path) -> Result<ExitCode> {
    let kernel = kernel(project, None)?;
    let document = read_document(file)?;

    let result = kernel.detect_pii(&document);
    tracing::debug!(has_pii = result.has_pii, locations = result.locations.len(), "Scan complete");

    print_json(&result)?;
    Ok(ExitCode::SUCCESS)
}

//! Dry-run commands for the tenant guard and the full pipeline.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use warden::{
    AuthorizationContext, AuthorizationError, AuthorizationRequest, ResourceRecord, ResourceType,
    RulePolicy, StaticPolicyStore,
};

use super::{denied, kernel, read_json};
use crate::style::{print_error, print_labeled, print_success};

/// Runs `assert_readable` for one record.
pub fn read(project: &Path, context: &Path, record: &Path, resource: ResourceType) -> Result<ExitCode> {
    let kernel = kernel(project, None)?;
    let context: AuthorizationContext = read_json(context)?;
    let record: ResourceRecord = read_json(record)?;

    match kernel.assert_readable(Some(&record), &context, resource) {
        Ok(_) => {
            print_success(&format!("read of {resource} allowed"));
            print_labeled("org", &context.org_id.to_string());
            print_labeled("clearance", context.data_classification.as_str());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_denial("read", &e)),
    }
}

/// Runs the session, constraint, RBAC and ABAC gates for one request.
pub fn authorize(
    project: &Path,
    context: &Path,
    request: &Path,
    policy: Option<&Path>,
) -> Result<ExitCode> {
    let policy = match policy {
        Some(path) => read_json::<RulePolicy>(path)?,
        None => RulePolicy::hr_baseline(),
    };
    let kernel = kernel(project, Some(Arc::new(StaticPolicyStore::uniform(policy))))?;
    let context: AuthorizationContext = read_json(context)?;
    let request: AuthorizationRequest = read_json(request)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match runtime.block_on(kernel.execute_authorization(&request, &context)) {
        Ok(()) => {
            print_success("request authorized");
            if let Some(action) = request.action {
                print_labeled("action", action.as_str());
            }
            if let Some(resource_type) = request.resource_type {
                print_labeled("resource", resource_type.as_str());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_denial("request", &e)),
    }
}

fn report_denial(what: &str, error: &AuthorizationError) -> ExitCode {
    print_error(&format!("{what} denied: {error}"));
    eprintln!("  code: {}", error.code());
    if error.is_step_up() {
        eprintln!("  re-authenticate and retry");
    }
    denied()
}

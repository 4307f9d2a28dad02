//! Implementation of the `mkpipe run` command.
//!
//! Runs the requested targets with their prerequisites under an exclusive
//! project lock and exits with the status of the first failing process.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info};

use mkpipe_lib::config::ConfigInputs;
use mkpipe_lib::pipeline::{OutcomeStatus, Pipeline, RunReport};
use mkpipe_lib::process::SystemRunner;
use mkpipe_lib::run_lock::{LockMode, RunLock};

use crate::output::{OutputFormat, format_elapsed, print_error, print_info, print_json, print_stat, print_success};

pub fn cmd_run(project_dir: &Path, inputs: ConfigInputs, targets: &[String], format: OutputFormat) -> Result<u8> {
  let goals = super::goals(targets);
  let lock = RunLock::acquire(project_dir, LockMode::Exclusive, &goals.join(" "))?;
  debug!(lock = %lock.lock_path().display(), "run lock held");
  info!(project = %project_dir.display(), goals = ?goals, "running targets");

  let pipeline = Pipeline::load(project_dir, inputs, SystemRunner)?;

  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;
  let report = rt.block_on(pipeline.run_goals(&goals))?;

  if format.is_json() {
    print_json(&report_json(&goals, &report))?;
  } else {
    print_report(&report);
  }

  Ok(u8::try_from(report.exit_code()).unwrap_or(1))
}

fn report_json(goals: &[&str], report: &RunReport) -> serde_json::Value {
  let failed = report.failed.as_ref().map(|(target, err)| {
    json!({ "target": target, "error": err.to_string(), "exit_code": err.exit_code() })
  });
  json!({
    "goals": goals,
    "success": report.is_success(),
    "rebuilt": report.rebuilt(),
    "outcomes": report.outcomes,
    "failed": failed,
  })
}

fn print_report(report: &RunReport) {
  for outcome in &report.outcomes {
    match outcome.status {
      OutcomeStatus::Executed => {
        let detail = outcome.detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default();
        print_success(&format!(
          "{}{} ({})",
          outcome.target,
          detail,
          format_elapsed(outcome.elapsed_ms)
        ));
      }
      OutcomeStatus::UpToDate => print_info(&format!("{} is up to date", outcome.target)),
    }
  }

  if let Some((target, err)) = &report.failed {
    print_error(&format!("target '{}' failed: {}", target, err));
  }

  println!();
  print_stat("Executed", &report.executed().len().to_string());
  print_stat("Up to date", &report.skipped().len().to_string());
  print_stat("Rebuilt", &report.rebuilt().to_string());
}

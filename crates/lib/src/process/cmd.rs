//! System process runner.
//!
//! Build drivers and test runners talk to the user directly, so stdio is
//! inherited rather than captured. Each process is awaited to its exit status
//! before the next one starts.

use tokio::process::Command;
use tracing::{debug, info};

use super::{CommandRunner, CommandSpec, ProcessError, ProcessStatus};

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  async fn run(&self, spec: &CommandSpec) -> Result<ProcessStatus, ProcessError> {
    info!(cmd = %spec.display(), "executing command");
    debug!(cwd = ?spec.cwd, env = ?spec.env, "spawning process");

    let mut command = Command::new(&spec.program);
    command.args(&spec.args).current_dir(&spec.cwd);

    for (key, value) in &spec.env {
      command.env(key, value);
    }

    let status = command.status().await.map_err(|source| ProcessError::Spawn {
      program: spec.program.clone(),
      source,
    })?;

    debug!(code = ?status.code(), "process exited");

    Ok(ProcessStatus { code: status.code() })
  }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[tokio::test]
  async fn successful_command() {
    let temp = TempDir::new().unwrap();
    let spec = CommandSpec::new("/bin/sh", temp.path()).args(["-c", "exit 0"]);
    let status = SystemRunner.run(&spec).await.unwrap();
    assert!(status.success());
  }

  #[tokio::test]
  async fn failing_command_reports_code() {
    let temp = TempDir::new().unwrap();
    let spec = CommandSpec::new("/bin/sh", temp.path()).args(["-c", "exit 3"]);
    let status = SystemRunner.run(&spec).await.unwrap();
    assert_eq!(status.code, Some(3));
  }

  #[tokio::test]
  async fn env_is_applied_to_child_only() {
    let temp = TempDir::new().unwrap();
    let spec = CommandSpec::new("/bin/sh", temp.path())
      .args(["-c", "printf '%s' \"$MKPIPE_TEST_VAR\" > seen"])
      .env("MKPIPE_TEST_VAR", "child-value");

    SystemRunner.run(&spec).await.unwrap();

    let seen = std::fs::read_to_string(temp.path().join("seen")).unwrap();
    assert_eq!(seen, "child-value");
    assert!(std::env::var("MKPIPE_TEST_VAR").is_err());
  }

  #[tokio::test]
  async fn runs_in_requested_directory() {
    let temp = TempDir::new().unwrap();
    let sub = temp.path().join("tests");
    std::fs::create_dir(&sub).unwrap();

    let spec = CommandSpec::new("/usr/bin/touch", &sub).arg("cwd_marker");
    SystemRunner.run(&spec).await.unwrap();

    assert!(sub.join("cwd_marker").exists());
  }

  #[tokio::test]
  async fn missing_program_is_spawn_error() {
    let temp = TempDir::new().unwrap();
    let spec = CommandSpec::new("/definitely/not/here", temp.path());
    let err = SystemRunner.run(&spec).await.unwrap_err();
    assert!(matches!(err, ProcessError::Spawn { .. }));
  }
}

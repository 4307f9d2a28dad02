//! Target actions.
//!
//! This module provides the dispatch logic from a [`TargetKind`] to the code
//! that carries it out, and the error type shared by all actions.

pub mod clean;
pub mod extensions;
pub mod installer;
pub mod placement;
pub mod third_party;
pub mod unittest;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::config::BuildConfig;
use crate::process::{CommandRunner, CommandSpec, ProcessError, ProcessStatus};
use crate::project::Project;
use crate::stamp::StampError;
use crate::target::TargetKind;
use crate::util::hash::DirHashError;

/// Errors an action can fail with.
#[derive(Debug, Error)]
pub enum ActionError {
  /// An external compiler, driver or test runner exited unsuccessfully.
  #[error("{program} failed with {}", describe_status(.status))]
  ProcessFailed { program: String, status: ProcessStatus },

  #[error(transparent)]
  Spawn(#[from] ProcessError),

  /// A compiled module is not where the build should have put it.
  #[error(
    "artifact '{artifact}' not found at {} (is the interpreter version or platform configured correctly?)",
    .expected.display()
  )]
  ArtifactMissing { artifact: String, expected: PathBuf },

  #[error("third-party component '{component}' not found at {}", .path.display())]
  ComponentMissing { component: String, path: PathBuf },

  #[error("test script for '{test}' not found at {}", .path.display())]
  TestScriptMissing { test: String, path: PathBuf },

  /// An action that needs the build configuration ran without one.
  #[error("build configuration required but not resolved")]
  ConfigRequired,

  #[error("{action} {}: {source}", .path.display())]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("fingerprint error: {0}")]
  Hash(#[from] DirHashError),

  #[error("stamp error: {0}")]
  Stamp(#[from] StampError),
}

impl ActionError {
  /// Exit code to propagate: the child's own status when one failed, 1 otherwise.
  pub fn exit_code(&self) -> i32 {
    match self {
      ActionError::ProcessFailed { status, .. } => status.code.filter(|c| *c != 0).unwrap_or(1),
      _ => 1,
    }
  }

  pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
    ActionError::Io {
      action,
      path: path.to_path_buf(),
      source,
    }
  }
}

fn describe_status(status: &ProcessStatus) -> String {
  match status.code {
    Some(code) => format!("exit code {}", code),
    None => "termination by signal".to_string(),
  }
}

/// Result of executing a single action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionResult {
  /// Short human-readable summary, if the action has something to report.
  pub detail: Option<String>,
}

impl ActionResult {
  pub fn detail(detail: impl Into<String>) -> Self {
    Self {
      detail: Some(detail.into()),
    }
  }
}

/// Everything an action may read. Shared, read-only for the whole run.
pub struct ActionContext<'a, R> {
  pub project_root: &'a Path,
  pub project: &'a Project,
  pub config: Option<&'a BuildConfig>,
  pub runner: &'a R,
}

impl<R> ActionContext<'_, R> {
  fn config(&self) -> Result<&BuildConfig, ActionError> {
    self.config.ok_or(ActionError::ConfigRequired)
  }
}

/// Execute the action of a target kind.
pub async fn execute_action<R: CommandRunner>(
  kind: &TargetKind,
  ctx: &ActionContext<'_, R>,
) -> Result<ActionResult, ActionError> {
  match kind {
    TargetKind::Group => Ok(ActionResult::default()),

    TargetKind::ThirdParty => {
      third_party::compile_components(ctx.project_root, &ctx.project.third_party, ctx.runner).await
    }

    TargetKind::Extensions => {
      extensions::build_extensions(ctx.project_root, &ctx.project.extensions, ctx.config()?, ctx.runner).await
    }

    TargetKind::Placement => {
      let artifacts = placement::resolve_artifacts(ctx.project_root, ctx.project, ctx.config()?);
      placement::place_artifacts(&artifacts).await
    }

    TargetKind::Installer => {
      installer::build_installer(ctx.project_root, ctx.project, ctx.config()?, ctx.runner).await
    }

    TargetKind::Clean => clean::clean(ctx.project_root, &ctx.project.clean),

    TargetKind::UnitTest { name } => {
      unittest::invoke(ctx.project_root, &ctx.project.tests, name.as_deref(), ctx.config()?, ctx.runner).await
    }
  }
}

/// Run a command and turn an unsuccessful exit into [`ActionError::ProcessFailed`].
pub(crate) async fn run_checked<R: CommandRunner>(runner: &R, spec: &CommandSpec) -> Result<(), ActionError> {
  let status = runner.run(spec).await?;
  if !status.success() {
    error!(cmd = %spec.display(), code = ?status.code, "command failed");
    return Err(ActionError::ProcessFailed {
      program: spec.program.clone(),
      status,
    });
  }
  Ok(())
}

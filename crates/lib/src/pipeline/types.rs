//! Types for pipeline runs and plans.

use serde::Serialize;
use thiserror::Error;

use crate::actions::ActionError;
use crate::config::ConfigError;
use crate::project::ProjectError;
use crate::stamp::TargetState;
use crate::target::{Freshness, GraphError, TargetKind};
use crate::util::hash::DirHashError;

/// Errors that stop a run before any target executes.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error("configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Project(#[from] ProjectError),

  #[error("fingerprint error: {0}")]
  Hash(#[from] DirHashError),
}

/// What happened to a target that was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
  /// The action ran to completion.
  Executed,
  /// A stamped target found its marker current and did nothing.
  UpToDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
  pub target: String,
  pub status: OutcomeStatus,
  pub freshness: Freshness,
  pub detail: Option<String>,
  pub elapsed_ms: u64,
}

/// Result of running one or more goals.
#[derive(Debug, Default)]
pub struct RunReport {
  /// Targets that completed, in execution order.
  pub outcomes: Vec<TargetOutcome>,

  /// Target that failed (at most one, stops execution).
  pub failed: Option<(String, ActionError)>,
}

impl RunReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_none()
  }

  /// Names of targets whose action ran.
  pub fn executed(&self) -> Vec<&str> {
    self.with_status(OutcomeStatus::Executed)
  }

  /// Names of targets found up to date.
  pub fn skipped(&self) -> Vec<&str> {
    self.with_status(OutcomeStatus::UpToDate)
  }

  /// Number of stamped targets that actually rebuilt.
  pub fn rebuilt(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|o| o.status == OutcomeStatus::Executed && o.freshness == Freshness::Stamped)
      .count()
  }

  /// Process exit code for this run.
  pub fn exit_code(&self) -> i32 {
    self.failed.as_ref().map(|(_, e)| e.exit_code()).unwrap_or(0)
  }

  fn with_status(&self, status: OutcomeStatus) -> Vec<&str> {
    self
      .outcomes
      .iter()
      .filter(|o| o.status == status)
      .map(|o| o.target.as_str())
      .collect()
  }
}

/// Why a target will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunReason {
  /// Not stamped; runs whenever reached.
  Always,
  /// A prerequisite runs first.
  PrerequisiteRuns,
  /// No marker, or inputs changed since the marker was written.
  State(TargetState),
}

impl std::fmt::Display for RunReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      RunReason::Always => write!(f, "always"),
      RunReason::PrerequisiteRuns => write!(f, "prerequisite runs"),
      RunReason::State(state) => write!(f, "{}", state),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedTarget {
  pub name: String,
  #[serde(flatten)]
  pub kind: TargetKind,
  pub freshness: Freshness,
  /// `None` when the target is up to date and will be skipped.
  pub run: Option<RunReason>,
}

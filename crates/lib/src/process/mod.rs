//! External process seam.
//!
//! Every compiler, build driver, interpreter and test runner the pipeline
//! drives goes through a [`CommandRunner`]. Values such as the header
//! directory or the module search path are carried on the [`CommandSpec`] and
//! applied to the child only; the orchestrator's own environment is never
//! modified.

pub mod cmd;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub use cmd::SystemRunner;

/// One external process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: PathBuf,
  /// Variables set on the child on top of the inherited environment.
  pub env: BTreeMap<String, String>,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: cwd.into(),
      env: BTreeMap::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  /// Program and arguments joined for display.
  pub fn display(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Exit status of a finished process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessStatus {
  /// Exit code; `None` when the process was terminated by a signal.
  pub code: Option<i32>,
}

impl ProcessStatus {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

#[derive(Debug, Error)]
pub enum ProcessError {
  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },
}

/// Runs external processes to completion.
pub trait CommandRunner {
  /// Run `spec` and wait for it to exit.
  fn run(&self, spec: &CommandSpec) -> impl Future<Output = Result<ProcessStatus, ProcessError>>;
}

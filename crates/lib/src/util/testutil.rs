//! Test utilities for mkpipe-lib.
//!
//! [`FakeRunner`] records every command instead of launching it, and lets a
//! test decide each exit status or simulate what the command would leave on
//! disk.

use std::path::Path;
use std::sync::Mutex;

use crate::config::{BuildConfig, ConfigInputs};
use crate::process::{CommandRunner, CommandSpec, ProcessError, ProcessStatus};

type Hook = Box<dyn Fn(&CommandSpec) -> ProcessStatus + Send + Sync>;

/// A [`CommandRunner`] that never spawns anything.
pub struct FakeRunner {
  calls: Mutex<Vec<CommandSpec>>,
  hook: Hook,
}

impl FakeRunner {
  /// Every command succeeds.
  pub fn new() -> Self {
    Self::with_hook(|_| ProcessStatus { code: Some(0) })
  }

  /// The hook decides the status of each command and may touch the filesystem.
  pub fn with_hook(hook: impl Fn(&CommandSpec) -> ProcessStatus + Send + Sync + 'static) -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      hook: Box::new(hook),
    }
  }

  pub fn calls(&self) -> Vec<CommandSpec> {
    self.calls.lock().unwrap().clone()
  }

  /// Program and arguments of each recorded command.
  pub fn command_lines(&self) -> Vec<String> {
    self.calls().iter().map(CommandSpec::display).collect()
  }

  /// Status the hook gives `spec`, without recording a call.
  pub fn respond(&self, spec: &CommandSpec) -> ProcessStatus {
    (self.hook)(spec)
  }

  pub fn clear(&self) {
    self.calls.lock().unwrap().clear();
  }
}

impl Default for FakeRunner {
  fn default() -> Self {
    Self::new()
  }
}

impl CommandRunner for FakeRunner {
  async fn run(&self, spec: &CommandSpec) -> Result<ProcessStatus, ProcessError> {
    self.calls.lock().unwrap().push(spec.clone());
    Ok((self.hook)(spec))
  }
}

pub fn ok() -> ProcessStatus {
  ProcessStatus { code: Some(0) }
}

pub fn exit(code: i32) -> ProcessStatus {
  ProcessStatus { code: Some(code) }
}

/// Inputs for an interpreter installed under `base/python-root`, with an
/// explicit placeholder executable so resolution succeeds on every host.
pub fn config_inputs(base: &Path, version: &str, platform: &str) -> ConfigInputs {
  let root = base.join("python-root");
  std::fs::create_dir_all(&root).unwrap();
  let exe = root.join("python");
  std::fs::write(&exe, "").unwrap();

  ConfigInputs {
    python_version: Some(version.to_string()),
    python_root: Some(root.to_string_lossy().to_string()),
    python: Some(exe.to_string_lossy().to_string()),
    platform: Some(platform.to_string()),
  }
}

pub fn build_config(base: &Path, version: &str, platform: &str) -> BuildConfig {
  config_inputs(base, version, platform).resolve().unwrap()
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
  let path = root.join(rel);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
}

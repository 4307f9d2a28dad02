//! Shared test helpers for CLI integration tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

fn copy_tree(src: &Path, dest: &Path) {
  std::fs::create_dir_all(dest).unwrap();
  for entry in std::fs::read_dir(src).unwrap() {
    let entry = entry.unwrap();
    let target = dest.join(entry.file_name());
    if entry.file_type().unwrap().is_dir() {
      copy_tree(&entry.path(), &target);
    } else {
      std::fs::copy(entry.path(), &target).unwrap();
    }
  }
}

/// Isolated test environment.
///
/// Each test gets a copy of the fixture project and a stand-in interpreter
/// installed under its own root, at the location derived from the version.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    copy_tree(&fixture_path("project"), &temp.path().join("project"));

    let bin = temp.path().join("python26").join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let exe = bin.join("python2.6");
    std::fs::copy(fixture_path("python"), &exe).unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

    Self { temp }
  }

  /// Project root.
  pub fn project(&self) -> PathBuf {
    let p = self.temp.path().join("project");
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Interpreter installation root.
  pub fn python_root(&self) -> PathBuf {
    let p = self.temp.path().join("python26");
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.project().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Commands the stand-in tools recorded, one per line.
  pub fn calls(&self) -> Vec<String> {
    std::fs::read_to_string(self.project().join("calls.log"))
      .map(|s| s.lines().map(String::from).collect())
      .unwrap_or_default()
  }

  /// The binary with no configuration at all, isolated from the caller's
  /// environment.
  pub fn bare_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("mkpipe");
    for var in [
      "MKPIPE_PYTHON_VERSION",
      "MKPIPE_PYTHON_ROOT",
      "MKPIPE_PYTHON",
      "MKPIPE_PLATFORM",
      "RUST_LOG",
    ] {
      cmd.env_remove(var);
    }
    cmd.arg("-C").arg(self.project());
    cmd
  }

  /// Get a pre-configured Command for the mkpipe binary.
  ///
  /// Points it at the project copy and the stand-in interpreter, with a fixed
  /// platform tag so module paths are the same on every host.
  pub fn mkpipe(&self) -> Command {
    let mut cmd = self.bare_cmd();
    cmd
      .arg("--python-version")
      .arg("2.6")
      .arg("--python-root")
      .arg(self.python_root())
      .arg("--platform")
      .arg("linux-test");
    cmd
  }
}

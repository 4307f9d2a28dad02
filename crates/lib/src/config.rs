//! Build configuration.
//!
//! The interpreter parameters every native build step needs are gathered from
//! the command line, the environment and the project file into a
//! [`ConfigInputs`], then resolved once per invocation into an immutable
//! [`BuildConfig`]. Resolution validates everything up front so that a
//! misconfigured checkout fails before any external process is launched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving the build configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("interpreter version is not set (use --python-version or MKPIPE_PYTHON_VERSION)")]
  MissingVersion,

  #[error("invalid interpreter version '{0}': expected <major>.<minor>")]
  InvalidVersion(String),

  #[error("interpreter root is not set (use --python-root or MKPIPE_PYTHON_ROOT)")]
  MissingRoot,

  #[error("interpreter root does not exist: {}", .0.display())]
  RootNotFound(PathBuf),

  #[error("interpreter executable not found: {}", .0.display())]
  InterpreterNotFound(PathBuf),
}

/// Raw, possibly incomplete configuration values from a single source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigInputs {
  /// Interpreter version, e.g. `2.6`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub python_version: Option<String>,

  /// Interpreter installation root, e.g. `C:\Python26`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub python_root: Option<String>,

  /// Explicit interpreter executable, overriding the one derived from the root.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub python: Option<String>,

  /// Platform tag used to name the intermediate build directory.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub platform: Option<String>,
}

impl ConfigInputs {
  /// Fill every unset field from a lower-precedence source.
  pub fn merge(self, fallback: ConfigInputs) -> ConfigInputs {
    ConfigInputs {
      python_version: self.python_version.or(fallback.python_version),
      python_root: self.python_root.or(fallback.python_root),
      python: self.python.or(fallback.python),
      platform: self.platform.or(fallback.platform),
    }
  }

  /// Validate and resolve into a [`BuildConfig`].
  pub fn resolve(&self) -> Result<BuildConfig, ConfigError> {
    let version = self
      .python_version
      .as_deref()
      .map(str::trim)
      .filter(|v| !v.is_empty())
      .ok_or(ConfigError::MissingVersion)?;
    if !is_valid_version(version) {
      return Err(ConfigError::InvalidVersion(version.to_string()));
    }

    let root = self
      .python_root
      .as_deref()
      .map(str::trim)
      .filter(|r| !r.is_empty())
      .ok_or(ConfigError::MissingRoot)?;
    // Children run from the project or tests directory, so relative paths are
    // pinned to the invoking directory here.
    let root_path = absolute(Path::new(root));
    if !root_path.is_dir() {
      return Err(ConfigError::RootNotFound(root_path));
    }
    let root = root_path.to_string_lossy().into_owned();

    let interpreter = match self.python.as_deref().filter(|p| !p.is_empty()) {
      Some(explicit) => absolute(Path::new(explicit)),
      None => default_interpreter(&root, version),
    };
    if !interpreter.is_file() {
      return Err(ConfigError::InterpreterNotFound(interpreter));
    }

    let platform = self
      .platform
      .clone()
      .filter(|p| !p.is_empty())
      .unwrap_or_else(host_platform_tag);

    Ok(BuildConfig {
      version: version.to_string(),
      include_dir: PathBuf::from(join_native(&root, "include")),
      root: root_path,
      interpreter,
      platform,
    })
  }
}

/// Resolved, immutable configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
  version: String,
  root: PathBuf,
  include_dir: PathBuf,
  interpreter: PathBuf,
  platform: String,
}

impl BuildConfig {
  pub fn version(&self) -> &str {
    &self.version
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Header directory handed to the extension build.
  pub fn include_dir(&self) -> &Path {
    &self.include_dir
  }

  pub fn interpreter(&self) -> &Path {
    &self.interpreter
  }

  pub fn platform(&self) -> &str {
    &self.platform
  }

  /// `<platform>-<version>`, e.g. `win32-2.6`.
  pub fn build_tag(&self) -> String {
    format!("{}-{}", self.platform, self.version)
  }

  /// Name of the intermediate directory the interpreter's build tooling
  /// writes compiled modules into, e.g. `lib.win32-2.6`.
  pub fn lib_dir_name(&self) -> String {
    format!("lib.{}", self.build_tag())
  }

  /// File suffix of compiled extension modules for the target platform.
  pub fn module_suffix(&self) -> &'static str {
    if self.platform.starts_with("win") { ".pyd" } else { ".so" }
  }

  /// Values folded into the fingerprint of every configuration-dependent target.
  pub fn fingerprint_values(&self) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
      ("python_version", self.version.clone()),
      ("python_root", self.root.display().to_string()),
      ("include_dir", self.include_dir.display().to_string()),
      ("interpreter", self.interpreter.display().to_string()),
      ("platform", self.platform.clone()),
    ])
  }
}

fn absolute(path: &Path) -> PathBuf {
  std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// `<major>.<minor>` with optional further numeric components.
fn is_valid_version(version: &str) -> bool {
  let parts: Vec<&str> = version.split('.').collect();
  parts.len() >= 2 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

/// Join `child` onto `root` using the separator `root` is spelled with.
///
/// A Windows-style root keeps its backslashes on every host, so configuration
/// written for one machine resolves identically on another.
pub fn join_native(root: &str, child: &str) -> String {
  let separator = if root.contains('\\') && !root.contains('/') {
    '\\'
  } else {
    std::path::MAIN_SEPARATOR
  };
  let trimmed = root.trim_end_matches(['\\', '/']);
  if trimmed.is_empty() {
    return format!("{}{}", separator, child);
  }
  format!("{}{}{}", trimmed, separator, child)
}

#[cfg(windows)]
fn default_interpreter(root: &str, _version: &str) -> PathBuf {
  PathBuf::from(join_native(root, "python.exe"))
}

#[cfg(not(windows))]
fn default_interpreter(root: &str, version: &str) -> PathBuf {
  Path::new(root).join("bin").join(format!("python{}", version))
}

/// The distutils-style platform tag of the host.
pub fn host_platform_tag() -> String {
  platform_tag(std::env::consts::OS, std::env::consts::ARCH)
}

fn platform_tag(os: &str, arch: &str) -> String {
  match (os, arch) {
    ("windows", "x86") => "win32".to_string(),
    ("windows", "x86_64") => "win-amd64".to_string(),
    ("windows", other) => format!("win-{}", other),
    ("macos", other) => format!("macosx-{}", other),
    (os, arch) => format!("{}-{}", os, arch),
  }
}

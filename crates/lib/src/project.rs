//! Project manifest.
//!
//! Describes where the pieces the pipeline drives live inside a checkout:
//! third-party components, extension sources, the compiled artifacts and their
//! destinations, the test layout, installer arguments and what `clean` removes.
//!
//! The manifest is read from `mkpipe.json` at the project root when present.
//! Every section is optional and falls back to the layout of the toolkit this
//! pipeline was written for.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigInputs;
use crate::consts::PROJECT_FILE;

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {}: {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid project file {}: {message}", .path.display())]
  Invalid { path: PathBuf, message: String },
}

/// A third-party library compiled before the package's own extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThirdPartyComponent {
  /// Component name used in logs and errors.
  pub name: String,
  /// Directory relative to the project root the driver runs in.
  pub dir: PathBuf,
  /// Build driver invocation, program first.
  pub driver: Vec<String>,
  /// Optional components whose directory is absent are skipped with a warning
  /// instead of failing the build.
  #[serde(default)]
  pub optional: bool,
}

/// How the package's extension modules are built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionSpec {
  /// Build script run by the interpreter, relative to the project root.
  pub setup_script: PathBuf,
  /// Build-extensions command passed to the build script.
  pub command: String,
  /// Variable the build script reads the interpreter header directory from.
  pub include_env: String,
  /// Source files and directories that make up the extensions.
  pub sources: Vec<PathBuf>,
}

impl Default for ExtensionSpec {
  fn default() -> Self {
    Self {
      setup_script: PathBuf::from("setup.py"),
      command: "build_ext".to_string(),
      include_env: "PYTHON_INCLUDE".to_string(),
      sources: vec![
        PathBuf::from("setup.py"),
        PathBuf::from("mvpa/clfs/libsvmc"),
        PathBuf::from("mvpa/clfs/libsmlrc"),
      ],
    }
  }
}

/// A compiled extension module and the package directory that imports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
  /// Logical component (classifier backend) the module belongs to.
  pub component: String,
  /// Module file stem, without the platform suffix.
  pub module: String,
  /// Package directory, relative to both the project root and the
  /// intermediate build directory.
  pub package_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestSpec {
  /// Directory the test processes run in.
  pub dir: PathBuf,
  /// `ut-<name>` runs `<script_prefix><name><script_suffix>`.
  pub script_prefix: String,
  pub script_suffix: String,
  /// Entry point running the whole suite.
  pub suite_entry: String,
  /// Module search path variable pointed at the project root.
  pub search_path_env: String,
}

impl Default for TestSpec {
  fn default() -> Self {
    Self {
      dir: PathBuf::from("tests"),
      script_prefix: "test_".to_string(),
      script_suffix: ".py".to_string(),
      suite_entry: "main.py".to_string(),
      search_path_env: "PYTHONPATH".to_string(),
    }
  }
}

impl TestSpec {
  pub fn script_name(&self, test: &str) -> String {
    format!("{}{}{}", self.script_prefix, test, self.script_suffix)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerSpec {
  /// Arguments passed to the build script after its name.
  pub args: Vec<String>,
}

impl Default for InstallerSpec {
  fn default() -> Self {
    Self {
      args: vec![
        "bdist_wininst".to_string(),
        "--bitmap".to_string(),
        "doc/misc/logo/pymvpa_logo_win_installer.bmp".to_string(),
      ],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanSpec {
  /// Intermediate build directory, relative to the project root.
  pub build_dir: PathBuf,
  /// Extensions of stray native files removed anywhere in the tree.
  pub extensions: Vec<String>,
}

impl Default for CleanSpec {
  fn default() -> Self {
    Self {
      build_dir: PathBuf::from("build"),
      extensions: ["a", "o", "gch", "pyd", "so"].iter().map(|e| e.to_string()).collect(),
    }
  }
}

/// The full project description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Project {
  /// Lowest-precedence interpreter settings.
  pub interpreter: ConfigInputs,
  pub third_party: Vec<ThirdPartyComponent>,
  pub extensions: ExtensionSpec,
  pub artifacts: Vec<ArtifactSpec>,
  pub tests: TestSpec,
  pub installer: InstallerSpec,
  pub clean: CleanSpec,
}

impl Default for Project {
  fn default() -> Self {
    Self {
      interpreter: ConfigInputs::default(),
      third_party: vec![ThirdPartyComponent {
        name: "libsvm".to_string(),
        dir: PathBuf::from("3rd/libsvm"),
        driver: default_driver(),
        optional: false,
      }],
      extensions: ExtensionSpec::default(),
      artifacts: vec![
        ArtifactSpec {
          component: "smlrc".to_string(),
          module: "smlrc".to_string(),
          package_dir: PathBuf::from("mvpa/clfs/libsmlrc"),
        },
        ArtifactSpec {
          component: "svmc".to_string(),
          module: "_svmc".to_string(),
          package_dir: PathBuf::from("mvpa/clfs/libsvmc"),
        },
      ],
      tests: TestSpec::default(),
      installer: InstallerSpec::default(),
      clean: CleanSpec::default(),
    }
  }
}

#[cfg(windows)]
fn default_driver() -> Vec<String> {
  vec!["make".to_string(), "-f".to_string(), "Makefile.win".to_string()]
}

#[cfg(not(windows))]
fn default_driver() -> Vec<String> {
  vec!["make".to_string()]
}

impl Project {
  /// Load `mkpipe.json` from `root`, or the built-in layout if there is none.
  pub fn load(root: &Path) -> Result<Self, ProjectError> {
    let path = root.join(PROJECT_FILE);
    if !path.exists() {
      return Ok(Self::default());
    }

    let content = fs::read_to_string(&path).map_err(|source| ProjectError::Read {
      path: path.clone(),
      source,
    })?;
    let project: Project = serde_json::from_str(&content).map_err(|source| ProjectError::Parse {
      path: path.clone(),
      source,
    })?;
    project.validate(&path)?;
    Ok(project)
  }

  fn validate(&self, path: &Path) -> Result<(), ProjectError> {
    let invalid = |message: String| ProjectError::Invalid {
      path: path.to_path_buf(),
      message,
    };

    for component in &self.third_party {
      if component.driver.is_empty() {
        return Err(invalid(format!("component '{}' has an empty driver", component.name)));
      }
    }
    if self.extensions.command.is_empty() {
      return Err(invalid("extensions.command is empty".to_string()));
    }
    if self.artifacts.is_empty() {
      return Err(invalid("no artifacts declared".to_string()));
    }
    Ok(())
  }

  /// Exclusion list for fingerprinting source trees.
  ///
  /// Byproducts of compilation and the intermediate build directory are
  /// skipped so running a build never changes its own fingerprint.
  pub fn byproduct_names(&self) -> Vec<String> {
    let mut names: Vec<String> = crate::consts::VCS_DIRS.iter().map(|d| d.to_string()).collect();
    names.push(crate::consts::STATE_DIR.to_string());
    names.push(crate::consts::BYTECODE_DIR.to_string());
    if let Some(build) = self.clean.build_dir.file_name() {
      names.push(build.to_string_lossy().to_string());
    }
    names
  }

  /// Extensions skipped when fingerprinting: native byproducts plus the
  /// bytecode test runs leave in the package tree.
  pub fn byproduct_extensions(&self) -> Vec<String> {
    let mut extensions = self.clean.extensions.clone();
    for ext in crate::consts::BYTECODE_EXTENSIONS {
      if !extensions.iter().any(|e| e == ext) {
        extensions.push(ext.to_string());
      }
    }
    extensions
  }
}

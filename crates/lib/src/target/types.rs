//! Target definitions and the standard target table.

use serde::Serialize;
use thiserror::Error;

/// Grouping target building and placing everything.
pub const ALL: &str = "all";
pub const THIRD_PARTY: &str = "3rd";
pub const BUILD: &str = "build";
pub const CONFIGURE_INPLACE: &str = "configure-inplace-use";
pub const INSTALLER: &str = "installer";
pub const CLEAN: &str = "clean";
pub const UNITTEST: &str = "unittest";

/// Prefix of the parameterized single-test targets (`ut-<name>`).
pub const UNIT_TEST_PREFIX: &str = "ut-";

/// What a target does when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetKind {
  /// No action; exists only to pull in its prerequisites.
  Group,
  /// Compile third-party components.
  ThirdParty,
  /// Build the package's own extension modules.
  Extensions,
  /// Copy compiled modules into the package tree.
  Placement,
  /// Build the distribution installer.
  Installer,
  /// Remove build output and stray native files.
  Clean,
  /// Run one test script, or the whole suite when `name` is `None`.
  UnitTest { name: Option<String> },
}

impl TargetKind {
  /// Whether the action needs a resolved build configuration.
  pub fn needs_config(&self) -> bool {
    matches!(
      self,
      TargetKind::Extensions | TargetKind::Placement | TargetKind::Installer | TargetKind::UnitTest { .. }
    )
  }
}

/// How a target decides whether it is up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
  /// Runs every time it is reached.
  Always,
  /// Guarded by a fingerprinted stamp marker.
  Stamped,
}

/// A named build step with ordered prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDef {
  pub name: String,
  pub prerequisites: Vec<String>,
  #[serde(flatten)]
  pub kind: TargetKind,
  pub freshness: Freshness,
  pub description: String,
}

impl TargetDef {
  fn new(name: &str, prerequisites: &[&str], kind: TargetKind, freshness: Freshness, description: &str) -> Self {
    Self {
      name: name.to_string(),
      prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
      kind,
      freshness,
      description: description.to_string(),
    }
  }

  /// The parameterized `ut-<name>` target.
  pub fn unit_test(test: &str) -> Result<Self, GraphError> {
    validate_test_name(test)?;
    Ok(Self::new(
      &format!("{}{}", UNIT_TEST_PREFIX, test),
      &[BUILD, CONFIGURE_INPLACE],
      TargetKind::UnitTest {
        name: Some(test.to_string()),
      },
      Freshness::Always,
      "Run a single test script",
    ))
  }
}

/// The fixed targets every project has, in declaration order.
pub fn standard_targets() -> Vec<TargetDef> {
  vec![
    TargetDef::new(
      ALL,
      &[BUILD, CONFIGURE_INPLACE],
      TargetKind::Group,
      Freshness::Always,
      "Build everything and place modules for in-place use",
    ),
    TargetDef::new(
      THIRD_PARTY,
      &[],
      TargetKind::ThirdParty,
      Freshness::Stamped,
      "Compile third-party components",
    ),
    TargetDef::new(
      BUILD,
      &[THIRD_PARTY],
      TargetKind::Extensions,
      Freshness::Stamped,
      "Build native extension modules",
    ),
    TargetDef::new(
      CONFIGURE_INPLACE,
      &[BUILD],
      TargetKind::Placement,
      Freshness::Always,
      "Copy compiled modules into the package tree",
    ),
    TargetDef::new(
      INSTALLER,
      &[THIRD_PARTY, BUILD],
      TargetKind::Installer,
      Freshness::Always,
      "Build the distribution installer",
    ),
    TargetDef::new(
      CLEAN,
      &[],
      TargetKind::Clean,
      Freshness::Always,
      "Remove build output and stray native files",
    ),
    TargetDef::new(
      UNITTEST,
      &[BUILD, CONFIGURE_INPLACE],
      TargetKind::UnitTest { name: None },
      Freshness::Always,
      "Run the full test suite",
    ),
  ]
}

/// Test identifiers end up in a file name, so only plain names are allowed.
fn validate_test_name(test: &str) -> Result<(), GraphError> {
  let valid = !test.is_empty()
    && !test.contains("..")
    && test
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
  if valid {
    Ok(())
  } else {
    Err(GraphError::InvalidTestName(test.to_string()))
  }
}

/// Errors in the target graph or target lookup.
#[derive(Debug, Error)]
pub enum GraphError {
  #[error("unknown target: {0}")]
  UnknownTarget(String),

  #[error("target '{target}' depends on unknown target '{prerequisite}'")]
  UnknownPrerequisite { target: String, prerequisite: String },

  #[error("duplicate target: {0}")]
  DuplicateTarget(String),

  #[error("dependency cycle detected involving target '{0}'")]
  Cycle(String),

  #[error("invalid test name '{0}': use letters, digits, '_', '-' or '.'")]
  InvalidTestName(String),
}

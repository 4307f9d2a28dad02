//! In-place placement of compiled modules.
//!
//! The interpreter's build tooling writes compiled modules into
//! `<build>/lib.<platform>-<version>/<package dir>/`. For the package to be
//! importable straight from the checkout, each module is copied next to the
//! sources of the package that imports it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::{ActionError, ActionResult};
use crate::config::BuildConfig;
use crate::project::Project;

/// A compiled module and where it has to end up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
  pub component: String,
  /// `<platform>-<version>` the module was built for.
  pub tag: String,
  pub source: PathBuf,
  pub destination: PathBuf,
}

/// Module paths in the intermediate directory, relative to the project root.
pub fn build_outputs(project: &Project, config: &BuildConfig) -> Vec<PathBuf> {
  let lib_dir = project.clean.build_dir.join(config.lib_dir_name());
  project
    .artifacts
    .iter()
    .map(|a| {
      lib_dir
        .join(&a.package_dir)
        .join(format!("{}{}", a.module, config.module_suffix()))
    })
    .collect()
}

pub fn resolve_artifacts(project_root: &Path, project: &Project, config: &BuildConfig) -> Vec<Artifact> {
  project
    .artifacts
    .iter()
    .zip(build_outputs(project, config))
    .map(|(spec, output)| {
      let file_name = format!("{}{}", spec.module, config.module_suffix());
      Artifact {
        component: spec.component.clone(),
        tag: config.build_tag(),
        source: project_root.join(output),
        destination: project_root.join(&spec.package_dir).join(file_name),
      }
    })
    .collect()
}

/// Copy every artifact to its destination, overwriting existing files.
///
/// All sources are checked before anything is copied, so a missing module
/// leaves the package tree untouched.
pub async fn place_artifacts(artifacts: &[Artifact]) -> Result<ActionResult, ActionError> {
  if let Some(missing) = artifacts.iter().find(|a| !a.source.is_file()) {
    return Err(ActionError::ArtifactMissing {
      artifact: missing.component.clone(),
      expected: missing.source.clone(),
    });
  }

  for artifact in artifacts {
    if let Some(parent) = artifact.destination.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| ActionError::io("failed to create", parent, e))?;
    }
    tokio::fs::copy(&artifact.source, &artifact.destination)
      .await
      .map_err(|e| ActionError::io("failed to copy to", &artifact.destination, e))?;
    debug!(component = %artifact.component, src = ?artifact.source, dest = ?artifact.destination, "placed module");
  }

  info!(count = artifacts.len(), "modules placed for in-place use");
  Ok(ActionResult::detail(format!("{} module(s) placed", artifacts.len())))
}

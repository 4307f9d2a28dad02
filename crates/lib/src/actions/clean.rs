//! Removal of build output and stray native files.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use super::{ActionError, ActionResult};
use crate::consts::{STAMPS_DIR, STATE_DIR, VCS_DIRS};
use crate::project::CleanSpec;

/// Delete the intermediate build directory, every stamp marker and all files
/// with a byproduct extension anywhere in the checkout.
///
/// Version control directories are never entered. Missing paths are not an
/// error, so cleaning twice is a no-op.
pub fn clean(project_root: &Path, spec: &CleanSpec) -> Result<ActionResult, ActionError> {
  let mut removed_dirs = 0usize;
  for dir in [project_root.join(&spec.build_dir), project_root.join(STATE_DIR).join(STAMPS_DIR)] {
    if remove_dir(&dir)? {
      removed_dirs += 1;
    }
  }

  let stray = find_byproducts(project_root, &spec.extensions)?;
  for path in &stray {
    match std::fs::remove_file(path) {
      Ok(()) => debug!(path = ?path, "removed"),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => return Err(ActionError::io("failed to remove", path, e)),
    }
  }

  info!(dirs = removed_dirs, files = stray.len(), "clean complete");
  Ok(ActionResult::detail(format!(
    "removed {} director{} and {} file(s)",
    removed_dirs,
    if removed_dirs == 1 { "y" } else { "ies" },
    stray.len()
  )))
}

fn remove_dir(path: &Path) -> Result<bool, ActionError> {
  match std::fs::remove_dir_all(path) {
    Ok(()) => {
      debug!(path = ?path, "removed directory");
      Ok(true)
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(ActionError::io("failed to remove", path, e)),
  }
}

fn find_byproducts(project_root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, ActionError> {
  let walker = WalkDir::new(project_root).into_iter().filter_entry(|e| {
    e.depth() == 0
      || !e
        .file_name()
        .to_str()
        .map(|name| VCS_DIRS.contains(&name))
        .unwrap_or(false)
  });

  let mut found = Vec::new();
  for entry in walker {
    let entry = entry.map_err(|e| {
      let path = e.path().unwrap_or(project_root).to_path_buf();
      ActionError::io("failed to walk", &path, e.into())
    })?;
    if !entry.file_type().is_file() {
      continue;
    }
    let matches = entry
      .path()
      .extension()
      .and_then(|e| e.to_str())
      .map(|ext| extensions.iter().any(|x| x == ext))
      .unwrap_or(false);
    if matches {
      found.push(entry.into_path());
    }
  }
  Ok(found)
}

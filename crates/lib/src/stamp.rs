//! Stamp markers recording completed targets.
//!
//! A stamp is written after a stamped target's action succeeds. It records the
//! fingerprint of everything the target was built from and the outputs it
//! promised to leave behind. On the next run the orchestrator recomputes the
//! fingerprint and compares:
//!
//! ```text
//! {project}/.mkpipe/stamps/
//! ├── 3rd.json
//! └── build.json
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{STAMP_VERSION, STAMPS_DIR, STATE_DIR};
use crate::util::hash::Fingerprint;

/// Freshness of a stamped target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
  /// Never built, or the last attempt did not finish.
  Pending,
  /// Built from exactly the current inputs and all outputs are present.
  Built,
  /// Built once, but inputs changed or outputs went missing since.
  Stale,
}

impl std::fmt::Display for TargetState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TargetState::Pending => write!(f, "pending"),
      TargetState::Built => write!(f, "built"),
      TargetState::Stale => write!(f, "stale"),
    }
  }
}

#[derive(Debug, Error)]
pub enum StampError {
  #[error("failed to create stamp directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to write stamp {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to remove stamp {}: {source}", .path.display())]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize stamp: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// Stamp file content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampMarker {
  /// Marker format version.
  pub version: u32,
  pub target: String,
  pub fingerprint: Fingerprint,
  /// Outputs relative to the project root that must still exist.
  #[serde(default)]
  pub outputs: Vec<PathBuf>,
  pub built_at_unix: u64,
}

/// Reads and writes stamp markers for one checkout.
#[derive(Debug, Clone)]
pub struct StampStore {
  project_root: PathBuf,
  base_path: PathBuf,
}

impl StampStore {
  pub fn new(project_root: &Path) -> Self {
    Self {
      project_root: project_root.to_path_buf(),
      base_path: project_root.join(STATE_DIR).join(STAMPS_DIR),
    }
  }

  pub fn base_path(&self) -> &Path {
    &self.base_path
  }

  fn stamp_path(&self, target: &str) -> PathBuf {
    self.base_path.join(format!("{}.json", target))
  }

  /// Read a marker; unreadable or outdated markers count as absent.
  pub fn read(&self, target: &str) -> Option<StampMarker> {
    let path = self.stamp_path(target);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<StampMarker>(&content) {
      Ok(marker) if marker.version == STAMP_VERSION && marker.target == target => Some(marker),
      Ok(_) => {
        debug!(path = ?path, "ignoring stamp from another format version");
        None
      }
      Err(e) => {
        debug!(path = ?path, error = %e, "ignoring unparsable stamp");
        None
      }
    }
  }

  /// Classify a target against its current fingerprint.
  pub fn state(&self, target: &str, current: &Fingerprint) -> TargetState {
    let path = self.stamp_path(target);
    if !path.exists() {
      return TargetState::Pending;
    }
    let Some(marker) = self.read(target) else {
      return TargetState::Stale;
    };
    if marker.fingerprint != *current {
      debug!(step = target, recorded = %marker.fingerprint, current = %current, "fingerprint changed");
      return TargetState::Stale;
    }
    if let Some(missing) = marker.outputs.iter().find(|o| !self.project_root.join(o).exists()) {
      debug!(step = target, output = ?missing, "recorded output is missing");
      return TargetState::Stale;
    }
    TargetState::Built
  }

  /// Record a successful build.
  ///
  /// Uses atomic write (write to temp, then rename) so an interrupted run never
  /// leaves a half-written marker behind.
  pub fn write(&self, target: &str, fingerprint: &Fingerprint, outputs: &[PathBuf]) -> Result<(), StampError> {
    fs::create_dir_all(&self.base_path).map_err(StampError::CreateDir)?;

    let marker = StampMarker {
      version: STAMP_VERSION,
      target: target.to_string(),
      fingerprint: fingerprint.clone(),
      outputs: outputs.to_vec(),
      built_at_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs(),
    };
    let content = serde_json::to_string_pretty(&marker)?;

    let path = self.stamp_path(target);
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, format!("{}\n", content)).map_err(|source| StampError::Write {
      path: temp_path.clone(),
      source,
    })?;
    fs::rename(&temp_path, &path).map_err(|source| StampError::Write { path, source })?;
    Ok(())
  }

  /// Remove a marker, if present.
  pub fn remove(&self, target: &str) -> Result<(), StampError> {
    let path = self.stamp_path(target);
    match fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(source) => Err(StampError::Remove { path, source }),
    }
  }
}

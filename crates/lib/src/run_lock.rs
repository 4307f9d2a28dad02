//! Per-checkout run lock.
//!
//! Two pipelines working on the same checkout would race on the intermediate
//! build directory and the stamp markers. A run holds an exclusive lock on
//! `.mkpipe/.lock` for its whole duration; read-only commands such as `plan`
//! take a shared one.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{LOCK_FILENAME, STATE_DIR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
  Shared,
  Exclusive,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  /// Goals of the run holding the lock.
  pub command: String,
  pub project: PathBuf,
}

#[derive(Debug, Error)]
pub enum RunLockError {
  #[error(
    "project is locked by another mkpipe run: {command} (PID {pid}, started at unix time {started_at_unix})\n\
     If no such process is running, remove the lock file:\n  {}",
    .lock_path.display()
  )]
  Contention {
    command: String,
    pid: u32,
    started_at_unix: u64,
    lock_path: PathBuf,
  },

  #[error(
    "project is locked by another mkpipe run\n\
     If no such process is running, remove the lock file:\n  {}",
    .lock_path.display()
  )]
  ContentionUnknown { lock_path: PathBuf },

  #[error("failed to create state directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to open lock file: {0}")]
  OpenFile(#[source] io::Error),

  #[error("failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("failed to acquire lock: {0}")]
  LockFailed(#[source] io::Error),
}

/// Held for as long as the value lives; released on drop.
pub struct RunLock {
  file: File,
  lock_path: PathBuf,
}

impl RunLock {
  pub fn acquire(project_root: &Path, mode: LockMode, command: &str) -> Result<Self, RunLockError> {
    let state_dir = project_root.join(STATE_DIR);
    std::fs::create_dir_all(&state_dir).map_err(RunLockError::CreateDir)?;
    let lock_path = state_dir.join(LOCK_FILENAME);

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(RunLockError::OpenFile)?;

    if let Err(err) = try_lock(&file, mode) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(read_contention_error(&lock_path));
      }
      return Err(RunLockError::LockFailed(err));
    }

    if mode == LockMode::Exclusive {
      write_metadata(&file, command, project_root)?;
    }
    debug!(path = ?lock_path, ?mode, "acquired run lock");

    Ok(RunLock { file, lock_path })
  }

  /// Reads the metadata through the held handle.
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    use std::io::{Seek, SeekFrom};

    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

fn write_metadata(file: &File, command: &str, project_root: &Path) -> Result<(), RunLockError> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    command: command.to_string(),
    project: project_root.to_path_buf(),
  };

  file.set_len(0).map_err(RunLockError::WriteMetadata)?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(|e| RunLockError::WriteMetadata(io::Error::other(e)))?;
  writer.flush().map_err(RunLockError::WriteMetadata)?;
  Ok(())
}

fn read_contention_error(lock_path: &Path) -> RunLockError {
  if let Ok(mut file) = File::open(lock_path) {
    let mut contents = String::new();
    if file.read_to_string(&mut contents).is_ok()
      && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
    {
      return RunLockError::Contention {
        command: metadata.command,
        pid: metadata.pid,
        started_at_unix: metadata.started_at_unix,
        lock_path: lock_path.to_path_buf(),
      };
    }
  }

  RunLockError::ContentionUnknown {
    lock_path: lock_path.to_path_buf(),
  }
}

#[cfg(unix)]
fn try_lock(file: &File, mode: LockMode) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  let operation = match mode {
    LockMode::Shared => FlockOperation::NonBlockingLockShared,
    LockMode::Exclusive => FlockOperation::NonBlockingLockExclusive,
  };

  flock(file.as_fd(), operation).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock(file: &File, mode: LockMode) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;
  let flags = match mode {
    LockMode::Shared => LOCKFILE_FAIL_IMMEDIATELY,
    LockMode::Exclusive => LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
  };

  // SAFETY: OVERLAPPED is valid zero-initialized and the handle is open.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(handle, flags, 0, 1, 0, &mut overlapped)
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}

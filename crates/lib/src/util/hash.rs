//! Hashing utilities for freshness fingerprints.
//!
//! This module provides:
//! - `ContentHash`: a full 64-character SHA-256 of file or tree content
//! - `Fingerprint`: the combined identity of everything a target was built from
//! - `hash_tree()`: deterministic hashing of a file or directory tree
//! - `hash_file()` / `hash_bytes()`: single file and arbitrary byte hashing

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA256 hash of some content.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// The recorded identity of a target's inputs.
///
/// Two runs that see the same fingerprint for a target consider its output
/// up to date; anything else marks it stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Names and file extensions skipped while hashing a tree.
///
/// Build byproducts (object files, compiled modules) live next to sources, so
/// they have to be filtered out or every build would invalidate itself.
#[derive(Debug, Clone, Default)]
pub struct Exclusions<'a> {
  /// Exact file or directory names, e.g. `build` or `.git`.
  pub names: &'a [&'a str],
  /// File extensions without the dot, e.g. `o` or `so`.
  pub extensions: &'a [String],
}

impl Exclusions<'_> {
  fn excludes(&self, path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
      return false;
    };
    if self.names.contains(&name) {
      return true;
    }
    path
      .extension()
      .and_then(|e| e.to_str())
      .map(|ext| self.extensions.iter().any(|x| x == ext))
      .unwrap_or(false)
  }
}

/// Error during tree hashing.
#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },

  #[error("failed to read symlink {path}: {message}")]
  ReadSymlink { path: String, message: String },
}

/// Compute a deterministic hash of a file or directory tree.
///
/// The hash includes:
/// - File contents (not metadata like timestamps or permissions)
/// - Directory structure
/// - Symlink targets
///
/// Entries are sorted by path for determinism. A path that does not exist
/// hashes to a fixed "missing" value, so a directory appearing later changes
/// the result.
pub fn hash_tree(path: &Path, exclusions: &Exclusions<'_>) -> Result<ContentHash, DirHashError> {
  if !path.exists() {
    return Ok(hash_bytes(b"missing"));
  }
  if path.is_file() {
    return hash_file(path);
  }

  let mut entries: Vec<(String, String)> = Vec::new();

  let walker = WalkDir::new(path)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| e.depth() == 0 || !exclusions.excludes(e.path()));

  for entry in walker {
    let entry = entry.map_err(|e| DirHashError::WalkDir { message: e.to_string() })?;
    let entry_path = entry.path();

    // Forward slashes so the same checkout hashes identically on every host
    let rel_path = entry_path
      .strip_prefix(path)
      .unwrap_or(entry_path)
      .to_string_lossy()
      .replace('\\', "/");

    if rel_path.is_empty() {
      continue;
    }

    let file_type = entry.file_type();
    let entry_hash = if file_type.is_file() {
      let content_hash = hash_file(entry_path)?;
      format!("F:{}:{}", rel_path, content_hash.0)
    } else if file_type.is_dir() {
      format!("D:{}", rel_path)
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry_path).map_err(|e| DirHashError::ReadSymlink {
        path: entry_path.display().to_string(),
        message: e.to_string(),
      })?;
      let target_hash = hash_bytes(target.to_string_lossy().as_bytes());
      format!("L:{}:{}", rel_path, target_hash.0)
    } else {
      // Sockets, devices and the like
      continue;
    };

    entries.push((rel_path, entry_hash));
  }

  entries.sort_by(|a, b| a.0.cmp(&b.0));

  let mut hasher = Sha256::new();
  for (_, entry_hash) in entries {
    hasher.update(entry_hash.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash a file's contents.
///
/// Returns the full 64-character SHA256 hash of the file.
pub fn hash_file(path: &Path) -> Result<ContentHash, DirHashError> {
  let mut file = fs::File::open(path).map_err(|e| DirHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| DirHashError::ReadFile {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  ContentHash(hex::encode(Sha256::digest(data)))
}

/// Accumulates labelled values into a [`Fingerprint`].
///
/// Each entry is length-prefixed, so `("ab", "c")` and `("a", "bc")` never
/// collide.
#[derive(Default)]
pub struct FingerprintBuilder {
  hasher: Sha256,
}

impl FingerprintBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn value(mut self, label: &str, value: &str) -> Self {
    for part in [label, value] {
      self.hasher.update((part.len() as u64).to_le_bytes());
      self.hasher.update(part.as_bytes());
    }
    self
  }

  pub fn content(self, label: &str, hash: &ContentHash) -> Self {
    self.value(label, &hash.0)
  }

  pub fn fingerprint(self, label: &str, fingerprint: &Fingerprint) -> Self {
    self.value(label, &fingerprint.0)
  }

  pub fn finish(self) -> Fingerprint {
    Fingerprint(hex::encode(self.hasher.finalize()))
  }
}

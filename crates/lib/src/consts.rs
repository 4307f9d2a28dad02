//! Names and fixed paths shared across the crate.

/// Project file looked up at the project root.
pub const PROJECT_FILE: &str = "mkpipe.json";

/// Per-checkout state directory (stamps, lock).
pub const STATE_DIR: &str = ".mkpipe";

pub const STAMPS_DIR: &str = "stamps";

pub const LOCK_FILENAME: &str = ".lock";

/// Stamp marker format version.
pub const STAMP_VERSION: u32 = 1;

/// Version control directories never touched by `clean` or fingerprinting.
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Interpreter bytecode written next to sources whenever the package is imported.
pub const BYTECODE_EXTENSIONS: &[&str] = &["pyc", "pyo"];
pub const BYTECODE_DIR: &str = "__pycache__";

pub const ENV_PYTHON_VERSION: &str = "MKPIPE_PYTHON_VERSION";
pub const ENV_PYTHON_ROOT: &str = "MKPIPE_PYTHON_ROOT";
pub const ENV_PYTHON: &str = "MKPIPE_PYTHON";
pub const ENV_PLATFORM: &str = "MKPIPE_PLATFORM";

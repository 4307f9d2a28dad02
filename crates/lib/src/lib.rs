//! mkpipe-lib: dependency-ordered build pipeline for native extension modules.
//!
//! The pipeline compiles a third-party numerical library, builds the package's
//! own extension modules against the configured interpreter, places the
//! resulting binaries into the package tree and runs the test suite:
//! - `target`: named targets and the dependency DAG between them
//! - `stamp`: fingerprint-backed freshness markers
//! - `actions`: what each target actually does
//! - `pipeline`: the orchestrator tying the above together

pub mod actions;
pub mod config;
pub mod consts;
pub mod pipeline;
pub mod process;
pub mod project;
pub mod run_lock;
pub mod stamp;
pub mod target;
pub mod util;

//! End-to-end tests driving the binary against a fixture project.
//!
//! The stand-in interpreter and build driver are shell scripts, so these run
//! on unix hosts only.

#![cfg(unix)]

mod common;
mod plan_tests;
mod run_tests;

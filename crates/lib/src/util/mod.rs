//! Shared utilities.
//!
//! Hashing helpers used for fingerprints, plus test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;

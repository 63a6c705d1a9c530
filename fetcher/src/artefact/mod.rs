//! Firmware artifact acquisition: locating, downloading, verifying, and
//! unpacking.
//!
//! # Sub-modules
//!
//! - [`location`] - Resolved artifact and checksum URLs (`ArtifactLocation`).
//! - [`sha256_digest`] - Computed and published digest types.
//! - [`verification`] - Streaming SHA-256 accumulator and comparison.
//! - [`download`] - Transfer backends and the single-pass download manager.
//! - [`cache`] - Reuse of verified local artifacts.
//! - [`extraction`] - Firmware layout detection and `boot.img` unpacking.
//! - [`dumper`] - External `payload.bin` dumper invocation.

pub mod cache;
pub mod download;
pub mod dumper;
pub mod extraction;
pub mod location;
pub mod sha256_digest;
pub mod verification;

//! bootpull library.
//!
//! This crate finds the newest firmware build for a device from a ROM
//! provider, downloads and verifies it against the published SHA-256
//! checksum, and extracts the device's `boot.img`. It is used by the
//! `bootpull` CLI binary and can be driven programmatically with injected
//! collaborators for testing.
//!
//! # Modules
//!
//! - [`artefact`] - Download, caching, verification, and unpacking of archives
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Run configuration and environment overrides
//! - [`device`] - Validated device code names
//! - [`error`] - Semantic error types
//! - [`exec`] - External command execution abstraction
//! - [`output`] - Status lines and progress reporting
//! - [`pipeline`] - End-to-end acquisition pipeline
//! - [`prompt`] - Interactive questions and confirmation
//! - [`provider`] - ROM providers that resolve the latest artifact
//! - [`workspace`] - Scratch directory lifecycle

pub mod artefact;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod exec;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod provider;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod workspace;

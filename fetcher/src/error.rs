//! Error types for the bootpull acquisition pipeline.
//!
//! Every variant is fatal to a run; there is no automatic retry. Messages
//! carry enough context (expected and actual digests, archive and file
//! names) to diagnose a failure without reading logs.

use crate::artefact::download::DownloadError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while acquiring a boot image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The device identifier failed validation.
    #[error("invalid device name \"{value}\": {reason}")]
    InvalidInput {
        /// The rejected identifier.
        value: String,
        /// Description of the violated constraint.
        reason: String,
    },

    /// The provider's listing does not know the device (HTTP 404).
    #[error("device does not exist (got 404 from {url})")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The provider's listing returned an unexpected response.
    #[error("unexpected response from {url}: {reason}")]
    UpstreamError {
        /// The URL that was requested.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// The provider's listing had no artifact matching the device.
    #[error("no downloads found for {device} from {provider}")]
    NoArtifactFound {
        /// The device identifier that was searched for.
        device: String,
        /// Label of the provider that was queried.
        provider: &'static str,
    },

    /// A wrapper archive did not contain the nested firmware archive.
    #[error("no firmware file found in {archive}")]
    MissingFirmwareEntry {
        /// File name of the outer archive.
        archive: String,
    },

    /// The downloaded or cached artifact does not match the published digest.
    #[error("checksum does not match (expected {expected}, actual {actual})")]
    ChecksumMismatch {
        /// The digest published by the provider.
        expected: String,
        /// The digest computed over the local bytes.
        actual: String,
    },

    /// The firmware archive contains neither `boot.img` nor `payload.bin`.
    #[error("{archive} is missing both boot.img and payload.bin; this firmware is not supported")]
    UnsupportedFirmwareFormat {
        /// File name of the inspected archive.
        archive: String,
    },

    /// The payload dumper did not produce the expected boot image.
    #[error("boot image extraction failed ({path}): {reason}")]
    ExtractionFailed {
        /// Where the boot image was expected.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The output file exists and overwriting it was not confirmed.
    #[error("{path} already exists; rename it so that the new boot image can be extracted")]
    DestinationConflict {
        /// The existing output file.
        path: PathBuf,
    },

    /// The cache or output path lies inside the working directory, which is
    /// deleted during every run.
    #[error("the {role} {path} lies inside the working directory {work_dir}, which is removed after each run")]
    OverlappingPaths {
        /// Which configured path overlaps.
        role: &'static str,
        /// The overlapping path.
        path: PathBuf,
        /// The configured working directory.
        work_dir: PathBuf,
    },

    /// A provider menu selection was out of range or unknown.
    #[error("invalid provider selection \"{value}\"; expected a number between 1 and {max}")]
    InvalidSelection {
        /// The rejected selection.
        value: String,
        /// Number of registered providers.
        max: usize,
    },

    /// Transferring a remote resource failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A firmware archive could not be read.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`FetchError`].
pub type Result<T> = std::result::Result<T, FetchError>;

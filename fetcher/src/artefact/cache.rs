//! Cache gate for downloaded artifacts.
//!
//! A file in the cache directory is reused only when its digest matches the
//! checksum fetched during the current run. Anything else, a corrupt file or
//! an artifact superseded upstream, is downloaded again and replaced once the
//! new bytes verify.

use super::download::DownloadManager;
use super::sha256_digest::{ExpectedChecksum, Sha256Digest};
use super::verification::{compute_sha256, verify};
use crate::error::Result;
use std::path::{Path, PathBuf};
use url::Url;

/// How a local artifact came to be available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// A cached copy matched the expected checksum.
    Reused,
    /// The artifact was downloaded in this run.
    Downloaded,
}

/// A verified firmware archive on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    path: PathBuf,
    digest: Sha256Digest,
    source: ArtifactSource,
}

impl LocalArtifact {
    /// Path of the archive in the cache directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verified digest of the archive.
    #[must_use]
    pub fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    /// Whether the archive was reused or downloaded.
    #[must_use]
    pub fn source(&self) -> ArtifactSource {
        self.source
    }
}

/// Return a verified copy of the artifact at `destination`.
///
/// An existing file is hashed once and reused on a match. Otherwise
/// `on_download` runs, then `url` is downloaded through `manager`, verified,
/// and only then moved over the cached copy.
///
/// # Errors
///
/// Returns [`crate::error::FetchError::ChecksumMismatch`] when the
/// downloaded bytes do not match `expected`, leaving any previous file in
/// place. Transfer and I/O failures propagate unchanged.
pub fn acquire(
    destination: &Path,
    url: &Url,
    expected: &ExpectedChecksum,
    manager: &DownloadManager<'_>,
    on_download: impl FnOnce(),
) -> Result<LocalArtifact> {
    if let Some(artifact) = find_reusable(destination, expected)? {
        return Ok(artifact);
    }
    on_download();
    download_verified(destination, url, expected, manager)
}

/// Hash an existing file at `destination` and return it if it matches.
fn find_reusable(
    destination: &Path,
    expected: &ExpectedChecksum,
) -> Result<Option<LocalArtifact>> {
    if !destination.is_file() {
        log::debug!("no cached artifact at {}", destination.display());
        return Ok(None);
    }

    let digest = compute_sha256(destination)?;
    if !digest.matches(expected) {
        log::warn!(
            "cached {} has digest {digest}, expected {expected}; downloading again",
            destination.display()
        );
        return Ok(None);
    }

    log::info!("reusing cached {}", destination.display());
    Ok(Some(LocalArtifact {
        path: destination.to_path_buf(),
        digest,
        source: ArtifactSource::Reused,
    }))
}

/// Download `url`, verify it against `expected`, and move it to
/// `destination`. Nothing at `destination` changes on a mismatch.
fn download_verified(
    destination: &Path,
    url: &Url,
    expected: &ExpectedChecksum,
    manager: &DownloadManager<'_>,
) -> Result<LocalArtifact> {
    let staged = manager.fetch(url, destination)?;
    verify(expected, staged.digest())?;
    let digest = staged.digest().clone();
    let path = staged.commit()?;
    log::info!("downloaded {} ({digest})", path.display());

    Ok(LocalArtifact {
        path,
        digest,
        source: ArtifactSource::Downloaded,
    })
}

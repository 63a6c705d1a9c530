//! Resolved artifact locations.
//!
//! A provider turns a device code into an [`ArtifactLocation`]; everything
//! downstream (checksum fetch, cache key, download) reads from it.

use crate::error::{FetchError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use url::Url;

/// Suffix appended to an artifact URL to locate its checksum file.
pub const CHECKSUM_SUFFIX: &str = ".sha256sum";

/// When the provider last published the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTime {
    /// The source exposes a timestamp.
    Known(DateTime<Utc>),
    /// The source exposes no timestamp.
    Unknown,
}

/// Where to download a firmware artifact and its checksum.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    url: Url,
    checksum_url: Url,
    update_time: UpdateTime,
}

impl ArtifactLocation {
    /// Create a location with an explicit checksum URL.
    #[must_use]
    pub fn new(url: Url, checksum_url: Url, update_time: UpdateTime) -> Self {
        Self {
            url,
            checksum_url,
            update_time,
        }
    }

    /// Create a location whose checksum lives at `<url>.sha256sum`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UpstreamError`] if the derived URL is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use bootpull::artefact::location::{ArtifactLocation, UpdateTime};
    /// use url::Url;
    ///
    /// let url = Url::parse("https://download.example/sunfish/lineage-sunfish.zip")?;
    /// let location = ArtifactLocation::with_sha256sum(url, UpdateTime::Unknown)?;
    /// assert!(location.checksum_url().as_str().ends_with("lineage-sunfish.zip.sha256sum"));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn with_sha256sum(url: Url, update_time: UpdateTime) -> Result<Self> {
        let raw = format!("{url}{CHECKSUM_SUFFIX}");
        let checksum_url = Url::parse(&raw).map_err(|e| FetchError::UpstreamError {
            url: raw.clone(),
            reason: format!("invalid checksum URL: {e}"),
        })?;
        Ok(Self::new(url, checksum_url, update_time))
    }

    /// The artifact URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The checksum file URL.
    #[must_use]
    pub fn checksum_url(&self) -> &Url {
        &self.checksum_url
    }

    /// When the artifact was last updated.
    #[must_use]
    pub fn update_time(&self) -> UpdateTime {
        self.update_time
    }

    /// The remote file name, used as the cache key.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UpstreamError`] when the URL path has no final
    /// segment to name a file after.
    pub fn file_name(&self) -> Result<String> {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .map(str::to_owned)
            .ok_or_else(|| FetchError::UpstreamError {
                url: self.url.to_string(),
                reason: "artifact URL does not name a file".to_owned(),
            })
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

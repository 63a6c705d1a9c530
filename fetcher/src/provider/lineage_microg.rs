//! LineageOS for microG builds from the project's download listing.

use super::Provider;
use super::http::fetch_page;
use super::listing::{parse_listing, select_latest};
use crate::artefact::download::HttpClient;
use crate::artefact::location::{ArtifactLocation, UpdateTime};
use crate::device::DeviceId;
use crate::error::{FetchError, Result};
use url::Url;

/// Resolves the newest build from `<base>/<device>/`.
#[derive(Debug, Clone)]
pub struct LineageMicrog {
    base_url: String,
}

impl LineageMicrog {
    /// Menu label.
    pub const LABEL: &'static str = "LineageOS for microG";

    /// Create a provider reading listings below `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Listing URL for `device`.
    #[must_use]
    pub fn listing_url(&self, device: &DeviceId) -> String {
        format!("{}/{device}/", self.base_url.trim_end_matches('/'))
    }
}

impl Provider for LineageMicrog {
    fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn resolve(&self, device: &DeviceId, http: &dyn HttpClient) -> Result<ArtifactLocation> {
        let listing_url = self.listing_url(device);
        let html = fetch_page(http, &listing_url)?;
        let candidates = parse_listing(&html, &listing_url)?;
        log::debug!("{} files listed at {listing_url}", candidates.len());

        let newest = select_latest(&candidates, &device.artifact_suffix()).ok_or_else(|| {
            FetchError::NoArtifactFound {
                device: device.to_string(),
                provider: Self::LABEL,
            }
        })?;

        let invalid = |reason: String| FetchError::UpstreamError {
            url: listing_url.clone(),
            reason,
        };
        let base = Url::parse(&listing_url).map_err(|e| invalid(e.to_string()))?;
        let url = base
            .join(&newest.name)
            .map_err(|e| invalid(format!("bad link {}: {e}", newest.name)))?;
        let update_time = newest.updated.map_or(UpdateTime::Unknown, UpdateTime::Known);

        ArtifactLocation::with_sha256sum(url, update_time)
    }
}

//! CalyxOS factory images.
//!
//! CalyxOS publishes no browsable listing, so the download link is scraped
//! from the per-device install instructions. The factory zip wraps the
//! actual firmware archive (`image-*.zip`), which is pulled out before
//! unpacking.

use super::Provider;
use super::http::fetch_page;
use super::listing::selector;
use crate::artefact::download::HttpClient;
use crate::artefact::extraction::{display_name, extract_entry, open};
use crate::artefact::location::{ArtifactLocation, UpdateTime};
use crate::device::DeviceId;
use crate::error::{FetchError, Result};
use regex::Regex;
use scraper::Html;
use std::path::{Path, PathBuf};
use url::Url;

/// Download buttons on the install page.
const BUTTON_SELECTOR: &str = "a.btn";

/// Factory image links.
const FACTORY_LINK: &str = r"^https://release\.calyxinstitute\.org/[^-]+-factory-[^-]+\.zip$";

/// Nested firmware archive inside a factory zip.
const FIRMWARE_ENTRY: &str = r"image-.+?\.zip$";

/// Resolves factory images from the CalyxOS install instructions.
#[derive(Debug, Clone)]
pub struct CalyxOs {
    base_url: String,
}

impl CalyxOs {
    /// Menu label.
    pub const LABEL: &'static str = "CalyxOS";

    /// Create a provider reading install pages below `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Install instructions URL for `device`.
    #[must_use]
    pub fn instructions_url(&self, device: &DeviceId) -> String {
        format!(
            "{}/install/devices/{device}/windows/",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl Provider for CalyxOs {
    fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn resolve(&self, device: &DeviceId, http: &dyn HttpClient) -> Result<ArtifactLocation> {
        let page_url = self.instructions_url(device);
        let html = fetch_page(http, &page_url)?;
        let buttons = selector(BUTTON_SELECTOR, &page_url)?;
        let factory = pattern(FACTORY_LINK)?;

        let document = Html::parse_document(&html);
        let href = document
            .select(&buttons)
            .filter_map(|button| button.value().attr("href"))
            .find(|href| factory.is_match(href))
            .ok_or_else(|| FetchError::NoArtifactFound {
                device: device.to_string(),
                provider: Self::LABEL,
            })?;

        let url = Url::parse(href).map_err(|e| FetchError::UpstreamError {
            url: page_url.clone(),
            reason: format!("bad download link {href}: {e}"),
        })?;
        ArtifactLocation::with_sha256sum(url, UpdateTime::Unknown)
    }

    fn pre_extract(&self, archive: &Path, work_dir: &Path) -> Result<Option<PathBuf>> {
        let firmware = pattern(FIRMWARE_ENTRY)?;
        let entry = open(archive)?
            .file_names()
            .find(|name| firmware.is_match(name))
            .map(str::to_owned)
            .ok_or_else(|| FetchError::MissingFirmwareEntry {
                archive: display_name(archive),
            })?;

        let base_name = Path::new(&entry)
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| FetchError::MissingFirmwareEntry {
                archive: display_name(archive),
            })?;
        let dest = work_dir.join(base_name);
        log::info!("extracting firmware file {entry}");
        extract_entry(archive, &entry, &dest)?;
        Ok(Some(dest))
    }
}

fn pattern(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|err| FetchError::UpstreamError {
        url: String::new(),
        reason: format!("invalid pattern {source}: {err}"),
    })
}

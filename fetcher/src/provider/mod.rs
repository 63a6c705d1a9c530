//! Firmware providers and the built-in registry.
//!
//! A provider maps a device code to the location of its newest firmware
//! artifact. The set of providers is closed; [`ProviderKind::ALL`] fixes the
//! order shown in the interactive menu.
//!
//! # Sub-modules
//!
//! - [`calyxos`] - CalyxOS factory images.
//! - [`lineage_microg`] - LineageOS for microG builds.
//! - [`listing`] - Directory listing parsing and newest-build selection.
//! - [`http`] - Status policy for provider pages.

pub mod calyxos;
pub mod http;
pub mod lineage_microg;
pub mod listing;

use crate::artefact::download::HttpClient;
use crate::artefact::location::ArtifactLocation;
use crate::config::FetchConfig;
use crate::device::DeviceId;
use crate::error::{FetchError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use calyxos::CalyxOs;
pub use lineage_microg::LineageMicrog;

/// A source of firmware artifacts.
pub trait Provider {
    /// Human-readable name shown in menus.
    fn label(&self) -> &'static str;

    /// Locate the newest artifact for `device`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] when the provider does not know the
    /// device, [`FetchError::UpstreamError`] on other unexpected responses,
    /// and [`FetchError::NoArtifactFound`] when nothing matches.
    fn resolve(&self, device: &DeviceId, http: &dyn HttpClient) -> Result<ArtifactLocation>;

    /// Provider-specific step run on the downloaded archive before it is
    /// unpacked.
    ///
    /// Returns the archive to unpack instead, if it differs. The default
    /// unpacks the download as-is.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::MissingFirmwareEntry`] when the expected nested
    /// archive is absent.
    fn pre_extract(&self, archive: &Path, work_dir: &Path) -> Result<Option<PathBuf>> {
        let _ = (archive, work_dir);
        Ok(None)
    }
}

/// The built-in providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// CalyxOS.
    CalyxOs,
    /// LineageOS for microG.
    LineageMicrog,
}

impl ProviderKind {
    /// Every provider, in menu order.
    pub const ALL: [Self; 2] = [Self::CalyxOs, Self::LineageMicrog];

    /// Human-readable name shown in menus.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::CalyxOs => CalyxOs::LABEL,
            Self::LineageMicrog => LineageMicrog::LABEL,
        }
    }

    /// Short name accepted on the command line.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::CalyxOs => "calyxos",
            Self::LineageMicrog => "lineage-microg",
        }
    }

    /// Look up a provider by its 1-based menu number.
    #[must_use]
    pub fn from_menu_number(number: usize) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index))
            .copied()
    }

    /// Instantiate the provider with endpoints from `config`.
    #[must_use]
    pub fn build(self, config: &FetchConfig) -> Box<dyn Provider> {
        match self {
            Self::CalyxOs => Box::new(CalyxOs::new(config.calyxos_base_url.clone())),
            Self::LineageMicrog => Box::new(LineageMicrog::new(config.microg_base_url.clone())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProviderKind {
    type Err = FetchError;

    /// Accept either a menu number or a slug.
    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let by_number = trimmed.parse::<usize>().ok().and_then(Self::from_menu_number);
        let by_slug = || {
            Self::ALL
                .into_iter()
                .find(|kind| kind.slug().eq_ignore_ascii_case(trimmed))
        };
        by_number.or_else(by_slug).ok_or_else(|| FetchError::InvalidSelection {
            value: value.to_owned(),
            max: Self::ALL.len(),
        })
    }
}

/// Render the numbered provider menu.
///
/// # Examples
///
/// ```
/// let menu = bootpull::provider::menu();
/// assert_eq!(menu, "1. CalyxOS\n2. LineageOS for microG\n");
/// ```
#[must_use]
pub fn menu() -> String {
    ProviderKind::ALL
        .iter()
        .enumerate()
        .map(|(index, kind)| format!("{}. {}\n", index + 1, kind.label()))
        .collect()
}

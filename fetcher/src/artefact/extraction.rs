//! Firmware archive unpacking.
//!
//! Firmware zips come in two mutually exclusive layouts: a flat image set
//! with `boot.img` at the root, or an A/B OTA package carrying `payload.bin`.
//! [`unpack`] routes on the layout reported by [`inspect`]:
//!
//! ```text
//! Inspecting ─┬─ BootImage ─▶ DirectExtract ────────────────────────┬─▶ Validated ─▶ Done
//!             └─ Payload ───▶ DelegatedExtract ─▶ dumper ─▶ check ──┘
//! ```
//!
//! An archive with neither entry is rejected before any external tool runs.

use super::dumper::PayloadDumper;
use crate::error::{FetchError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Name of the boot image inside archives and in the working area.
pub const BOOT_IMAGE: &str = "boot.img";

/// Name of the A/B OTA payload inside archives.
pub const PAYLOAD: &str = "payload.bin";

/// How the boot image is packaged in a firmware archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareLayout {
    /// `boot.img` sits at the archive root.
    BootImage,
    /// Partitions are packed in `payload.bin`.
    Payload,
}

/// Result of a successful unpack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackOutcome {
    /// Path of the extracted `boot.img` in the working area.
    pub boot_image: PathBuf,
    /// The layout the archive used.
    pub layout: FirmwareLayout,
}

/// Determine the layout of the firmware archive at `archive`.
///
/// # Errors
///
/// Returns [`FetchError::UnsupportedFirmwareFormat`] when the archive holds
/// neither `boot.img` nor `payload.bin`, and [`FetchError::Archive`] when it
/// is not a readable zip.
pub fn inspect(archive: &Path) -> Result<FirmwareLayout> {
    let zip = open(archive)?;
    let has_entry = |wanted: &str| zip.file_names().any(|name| name == wanted);

    if has_entry(BOOT_IMAGE) {
        Ok(FirmwareLayout::BootImage)
    } else if has_entry(PAYLOAD) {
        Ok(FirmwareLayout::Payload)
    } else {
        Err(FetchError::UnsupportedFirmwareFormat {
            archive: display_name(archive),
        })
    }
}

/// Extract the boot image from `archive` into `work_dir`.
///
/// Payload archives are handed to `dumper`, whose success is only trusted
/// once `<work_dir>/boot.img` exists. The staged `payload.bin` is removed
/// afterwards.
///
/// # Errors
///
/// Returns [`FetchError::UnsupportedFirmwareFormat`] for unrecognised
/// archives, [`FetchError::ExtractionFailed`] when the dumper fails or leaves
/// no image behind, and archive or I/O errors from extraction.
pub fn unpack(archive: &Path, work_dir: &Path, dumper: &dyn PayloadDumper) -> Result<UnpackOutcome> {
    let layout = inspect(archive)?;
    unpack_as(archive, layout, work_dir, dumper)
}

fn unpack_as(
    archive: &Path,
    layout: FirmwareLayout,
    work_dir: &Path,
    dumper: &dyn PayloadDumper,
) -> Result<UnpackOutcome> {
    let boot_image = work_dir.join(BOOT_IMAGE);
    log::debug!("{} uses the {layout:?} layout", archive.display());

    match layout {
        FirmwareLayout::BootImage => {
            extract_entry(archive, BOOT_IMAGE, &boot_image)?;
        }
        FirmwareLayout::Payload => {
            let payload = work_dir.join(PAYLOAD);
            extract_entry(archive, PAYLOAD, &payload)?;
            dumper.dump(work_dir)?;
            if !boot_image.is_file() {
                return Err(FetchError::ExtractionFailed {
                    path: boot_image,
                    reason: "the payload dumper finished without writing boot.img".to_owned(),
                });
            }
            fs::remove_file(&payload)?;
        }
    }

    Ok(UnpackOutcome { boot_image, layout })
}

/// Copy the entry `name` out of `archive` into the file `dest`.
///
/// # Errors
///
/// Returns [`FetchError::Archive`] if the entry is missing or the archive is
/// unreadable.
pub fn extract_entry(archive: &Path, name: &str, dest: &Path) -> Result<()> {
    let mut zip = open(archive)?;
    let mut entry = zip.by_name(name)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(dest)?;
    let bytes = io::copy(&mut entry, &mut out)?;
    log::debug!("extracted {name} ({bytes} bytes) to {}", dest.display());
    Ok(())
}

/// Open `archive` as a zip.
pub(crate) fn open(archive: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(archive)?;
    Ok(ZipArchive::new(file)?)
}

/// File name of `archive` for error messages.
pub(crate) fn display_name(archive: &Path) -> String {
    archive
        .file_name()
        .map_or_else(|| archive.display().to_string(), |name| name.to_string_lossy().into_owned())
}

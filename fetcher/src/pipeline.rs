//! Acquisition pipeline orchestration.
//!
//! One run goes: resolve the artifact with the chosen provider, fetch its
//! published checksum, reuse or download the archive, unpack `boot.img` in a
//! scratch directory, and move it to the output path once any existing file
//! there may be replaced.
//!
//! [`run`] wires the production collaborators; [`run_with`] takes them
//! injected so the whole flow can be exercised without network or Docker.

use crate::artefact::cache::{self, ArtifactSource, LocalArtifact};
use crate::artefact::download::{
    DownloadManager, HttpClient, HttpTransfer, Transfer, UreqClient, WgetTransfer,
    fetch_expected_checksum,
};
use crate::artefact::dumper::{DockerPayloadDumper, PayloadDumper};
use crate::artefact::extraction::{self, FirmwareLayout};
use crate::artefact::location::ArtifactLocation;
use crate::config::{FetchConfig, TransferBackend};
use crate::device::DeviceId;
use crate::error::{FetchError, Result};
use crate::exec::SystemCommandExecutor;
use crate::output::{Reporter, describe_update_time};
use crate::prompt::Confirm;
use crate::provider::Provider;
use crate::workspace::WorkingArea;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Question asked before an existing output file is replaced.
pub const OVERWRITE_QUESTION: &str =
    "A boot.img file already exists. Are you sure you want to overwrite it?";

/// External collaborators of a run.
pub struct Collaborators<'a> {
    /// Fetches provider pages and checksum files.
    pub http: &'a dyn HttpClient,
    /// Streams artifact bodies.
    pub transfer: &'a dyn Transfer,
    /// Handles `payload.bin` firmware.
    pub dumper: &'a dyn PayloadDumper,
    /// Approves overwriting an existing output file.
    pub confirm: &'a dyn Confirm,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The resolved artifact.
    pub location: ArtifactLocation,
    /// The verified archive in the cache.
    pub artifact: LocalArtifact,
    /// How the boot image was packaged.
    pub layout: FirmwareLayout,
    /// Where the boot image was written.
    pub output: Utf8PathBuf,
}

/// Run the pipeline with production collaborators.
///
/// # Errors
///
/// Returns the first failure of any stage; see [`run_with`].
pub fn run(
    config: &FetchConfig,
    device: &DeviceId,
    provider: &dyn Provider,
    confirm: &dyn Confirm,
    stderr: &mut dyn Write,
) -> Result<RunSummary> {
    let transfer: Box<dyn Transfer> = match config.transfer {
        TransferBackend::Http => Box::new(HttpTransfer::new(config.quiet)),
        TransferBackend::Wget => Box::new(WgetTransfer::new(config.quiet)),
    };
    let executor = SystemCommandExecutor;
    let dumper = DockerPayloadDumper::new(&executor, config.dumper_image.clone());
    let collaborators = Collaborators {
        http: &UreqClient,
        transfer: transfer.as_ref(),
        dumper: &dumper,
        confirm,
    };
    run_with(config, device, provider, &collaborators, stderr)
}

/// Run the pipeline with injected collaborators.
///
/// # Errors
///
/// - [`FetchError::OverlappingPaths`] before any work when the cache or
///   output path lies inside the working directory;
/// - provider failures ([`FetchError::NotFound`],
///   [`FetchError::UpstreamError`], [`FetchError::NoArtifactFound`]);
/// - [`FetchError::ChecksumMismatch`] when the download does not verify;
/// - unpacking failures ([`FetchError::MissingFirmwareEntry`],
///   [`FetchError::UnsupportedFirmwareFormat`],
///   [`FetchError::ExtractionFailed`]);
/// - [`FetchError::DestinationConflict`] when overwriting is refused.
///
/// The working directory is removed whatever the outcome. The cache is
/// never cleaned.
pub fn run_with(
    config: &FetchConfig,
    device: &DeviceId,
    provider: &dyn Provider,
    deps: &Collaborators<'_>,
    stderr: &mut dyn Write,
) -> Result<RunSummary> {
    config.validate()?;
    let mut reporter = Reporter::new(stderr, config.quiet);

    reporter.line(format_args!(
        "Looking up the latest {} build for {device}",
        provider.label()
    ));
    let location = provider.resolve(device, deps.http)?;
    let file_name = location.file_name()?;
    log::info!("resolved {device} to {location}");

    reporter.line("Downloading checksum");
    let expected = fetch_expected_checksum(deps.http, location.checksum_url())?;
    reporter.line(format_args!("(Expecting checksum to be {expected})"));

    let cached = config.cache_dir.join(&file_name);
    let manager = DownloadManager::new(deps.transfer);
    let artifact = cache::acquire(
        cached.as_std_path(),
        location.url(),
        &expected,
        &manager,
        || {
            reporter.line(format_args!(
                "Downloading the latest version, updated {}",
                describe_update_time(&location.update_time())
            ));
        },
    )?;
    match artifact.source() {
        ArtifactSource::Reused => reporter.line(format_args!(
            "Skipping download as {file_name} already exists and matches the checksum"
        )),
        ArtifactSource::Downloaded => reporter.line("The checksum matches the expected value"),
    }

    let area = WorkingArea::prepare(&config.work_dir)?;
    let archive = provider
        .pre_extract(artifact.path(), area.path().as_std_path())?
        .unwrap_or_else(|| artifact.path().to_path_buf());

    let outcome = extraction::unpack(&archive, area.path().as_std_path(), deps.dumper)?;
    match outcome.layout {
        FirmwareLayout::BootImage => reporter.line("Found boot.img file"),
        FirmwareLayout::Payload => {
            reporter.line("Found payload.bin file, extracted boot.img from it");
        }
    }

    finalize(&outcome.boot_image, &config.output_path, deps.confirm)?;
    drop(area);
    reporter.line(format_args!("Boot image written to {}", config.output_path));

    Ok(RunSummary {
        location,
        artifact,
        layout: outcome.layout,
        output: config.output_path.clone(),
    })
}

/// Move the staged image to `output`, asking before replacing a file.
fn finalize(staged: &Path, output: &Utf8Path, confirm: &dyn Confirm) -> Result<()> {
    if output.exists() && !confirm.confirm(OVERWRITE_QUESTION) {
        return Err(FetchError::DestinationConflict {
            path: output.as_std_path().to_path_buf(),
        });
    }
    if let Some(parent) = output.parent().filter(|parent| !parent.as_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if let Err(err) = fs::rename(staged, output) {
        log::debug!("rename into {output} failed ({err}); copying instead");
        fs::copy(staged, output)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

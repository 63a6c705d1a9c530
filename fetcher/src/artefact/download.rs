//! Artifact transfer and the single-pass download manager.
//!
//! Provides trait-based abstractions for fetching text resources (listings,
//! checksum files) and streaming artifact bodies, so tests can stand in for
//! the network. [`DownloadManager`] tees the streamed body into a staged file
//! in the cache directory and into a SHA-256 accumulator at the same time.

use super::sha256_digest::{ExpectedChecksum, Sha256Digest};
use super::verification::Sha256Verifier;
use crate::output::download_progress;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tempfile::NamedTempFile;
use url::Url;

/// Errors arising from transfer operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource was not found (HTTP 404).
    #[error("resource not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The external transfer tool failed.
    #[error("transfer of {url} failed: {reason}")]
    TransferFailed {
        /// The URL being transferred.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] io::Error),
}

/// A fully read text response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl TextResponse {
    /// Whether the status is exactly 200.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Trait for fetching small text resources such as listings and checksum
/// files.
///
/// Non-success statuses are returned, not raised, so that each caller can
/// apply its own status policy.
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient {
    /// GET `url` and read the whole body as text.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HttpError`] on transport failures.
    fn get_text(&self, url: &str) -> Result<TextResponse, DownloadError>;
}

/// Trait for streaming an artifact body into a sink.
pub trait Transfer {
    /// Stream the body at `url` into `sink`, returning the byte count.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails or the sink rejects a write.
    fn transfer(&self, url: &str, sink: &mut dyn Write) -> Result<u64, DownloadError>;
}

/// Shared `ureq` agent.
///
/// Status codes are surfaced as values rather than errors. No timeout is
/// configured; a hung server blocks the run.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a transport-level ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// HTTP client backed by `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqClient;

impl HttpClient for UreqClient {
    fn get_text(&self, url: &str) -> Result<TextResponse, DownloadError> {
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| map_ureq_error(url, &e))?;
        Ok(TextResponse { status, body })
    }
}

/// In-process HTTP transfer with a progress bar on standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransfer {
    quiet: bool,
}

impl HttpTransfer {
    /// Create a transfer; `quiet` hides the progress bar.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Transfer for HttpTransfer {
    fn transfer(&self, url: &str, sink: &mut dyn Write) -> Result<u64, DownloadError> {
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let status = response.status().as_u16();
        if status == 404 {
            return Err(DownloadError::NotFound {
                url: url.to_owned(),
            });
        }
        if !response.status().is_success() {
            return Err(DownloadError::HttpError {
                url: url.to_owned(),
                reason: format!("unexpected status code {status}"),
            });
        }

        let progress = download_progress(response.body().content_length(), self.quiet);
        let mut reader = response.into_body().into_reader();
        let mut tracked = progress.wrap_write(sink);
        let copied = io::copy(&mut reader, &mut tracked);
        progress.finish_and_clear();
        Ok(copied?)
    }
}

/// Transfer delegated to `wget`, which writes the body to standard output.
#[derive(Debug, Clone)]
pub struct WgetTransfer {
    program: String,
    quiet: bool,
}

impl WgetTransfer {
    /// Create a transfer invoking `wget` from `PATH`.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_program("wget", quiet)
    }

    /// Create a transfer invoking `program` with wget-compatible arguments.
    #[must_use]
    pub fn with_program(program: impl Into<String>, quiet: bool) -> Self {
        Self {
            program: program.into(),
            quiet,
        }
    }

    /// Arguments passed to the transfer tool for `url`.
    #[must_use]
    pub fn arguments(url: &str) -> Vec<String> {
        [url, "-q", "--show-progress", "--progress=bar:force", "-O", "-"]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }
}

impl Transfer for WgetTransfer {
    fn transfer(&self, url: &str, sink: &mut dyn Write) -> Result<u64, DownloadError> {
        let stderr = if self.quiet {
            Stdio::null()
        } else {
            Stdio::inherit()
        };
        let mut child = Command::new(&self.program)
            .args(Self::arguments(url))
            .stdout(Stdio::piped())
            .stderr(stderr)
            .spawn()?;

        let Some(mut stdout) = child.stdout.take() else {
            return Err(DownloadError::TransferFailed {
                url: url.to_owned(),
                reason: format!("{} stdout was not captured", self.program),
            });
        };

        let copied = match io::copy(&mut stdout, sink) {
            Ok(bytes) => bytes,
            Err(err) => {
                if let Err(kill_err) = child.kill() {
                    log::debug!("could not stop {}: {kill_err}", self.program);
                }
                child.wait()?;
                return Err(DownloadError::Io(err));
            }
        };

        let status = child.wait()?;
        if !status.success() {
            return Err(DownloadError::TransferFailed {
                url: url.to_owned(),
                reason: format!("{} exited with {status}", self.program),
            });
        }
        Ok(copied)
    }
}

/// Fetch and parse the published checksum at `url`.
///
/// The response body is used whatever its status. A non-200 status is only
/// logged; an error page simply yields a checksum that will not match.
///
/// # Errors
///
/// Returns [`DownloadError::HttpError`] on transport failures.
pub fn fetch_expected_checksum(
    http: &dyn HttpClient,
    url: &Url,
) -> Result<ExpectedChecksum, DownloadError> {
    let response = http.get_text(url.as_str())?;
    if !response.is_ok() {
        log::warn!(
            "checksum request to {url} returned status {}; using the body anyway",
            response.status
        );
    }
    Ok(ExpectedChecksum::parse(&response.body))
}

/// Writer fan-out feeding one byte stream to a file and a digest.
///
/// Each chunk is hashed only after the underlying writer has accepted it,
/// and only the accepted prefix is hashed, so the digest never runs ahead of
/// (or diverges from) what reached disk.
#[derive(Debug)]
pub struct TeeWriter<W: Write> {
    writer: W,
    verifier: Sha256Verifier,
}

impl<W: Write> TeeWriter<W> {
    /// Wrap `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            verifier: Sha256Verifier::new(),
        }
    }

    /// Bytes written through the tee so far.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.verifier.bytes_hashed()
    }

    /// Flush the writer and return it together with the final digest.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while flushing.
    pub fn finish(mut self) -> io::Result<(W, Sha256Digest)> {
        self.writer.flush()?;
        Ok((self.writer, self.verifier.finalize()))
    }
}

impl<W: Write> Write for TeeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.writer.write(buf)?;
        if let Some(accepted) = buf.get(..written) {
            self.verifier.update(accepted);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A downloaded file waiting for verification.
///
/// The bytes live in a temporary file beside the destination. Dropping the
/// value without [`commit`](Self::commit) deletes them, so an unverified
/// download never replaces anything in the cache.
#[derive(Debug)]
pub struct StagedDownload {
    staged: NamedTempFile,
    destination: PathBuf,
    digest: Sha256Digest,
    bytes: u64,
}

impl StagedDownload {
    /// Digest of the downloaded bytes.
    #[must_use]
    pub fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    /// Number of bytes downloaded.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Move the staged file to its destination, replacing any stale copy.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised by the rename.
    pub fn commit(self) -> io::Result<PathBuf> {
        self.staged
            .persist(&self.destination)
            .map_err(|err| err.error)?;
        Ok(self.destination)
    }
}

/// Streams artifacts to disk while hashing them in the same pass.
pub struct DownloadManager<'a> {
    transfer: &'a dyn Transfer,
}

impl<'a> DownloadManager<'a> {
    /// Create a manager using `transfer` for the network side.
    #[must_use]
    pub fn new(transfer: &'a dyn Transfer) -> Self {
        Self { transfer }
    }

    /// Download `url` into a staged file next to `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging file cannot be created or the
    /// transfer fails. A truncated stream is not detected here; it produces
    /// a digest that fails verification.
    pub fn fetch(&self, url: &Url, destination: &Path) -> Result<StagedDownload, DownloadError> {
        let directory = destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(directory)?;

        let mut staged = tempfile::Builder::new()
            .prefix(".bootpull-")
            .suffix(".part")
            .tempfile_in(directory)?;

        log::debug!("downloading {url} into {}", staged.path().display());
        let mut tee = TeeWriter::new(staged.as_file_mut());
        let transferred = self.transfer.transfer(url.as_str(), &mut tee)?;
        let bytes = tee.bytes_written();
        let (_, digest) = tee.finish()?;
        log::debug!("transfer reported {transferred} bytes, {bytes} written, digest {digest}");

        Ok(StagedDownload {
            staged,
            destination: destination.to_path_buf(),
            digest,
            bytes,
        })
    }
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;

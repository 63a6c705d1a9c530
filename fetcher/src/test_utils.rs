//! Shared test utilities for the bootpull crate.

use crate::artefact::download::{DownloadError, HttpClient, TextResponse, Transfer};
use crate::artefact::dumper::PayloadDumper;
use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::prompt::Confirm;
use sha2::{Digest, Sha256};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::Path;
use std::process::{ExitStatus, Output};
use zip::write::SimpleFileOptions;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// A recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The program that was invoked.
    pub cmd: String,
    /// The arguments passed to the program.
    pub args: Vec<String>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Returns queued results in order and records every invocation so tests
/// can assert on the exact command line.
#[derive(Debug)]
pub struct StubExecutor {
    results: RefCell<VecDeque<Result<Output>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` returning `results` in order.
    #[must_use]
    pub fn new(results: Vec<Result<Output>>) -> Self {
        Self {
            results: RefCell::new(results.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Returns every invocation seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Asserts that all queued results have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining results that were not returned.
    pub fn assert_finished(&self) {
        assert!(
            self.results.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        self.calls.borrow_mut().push(RecordedCall {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
        });
        self.results
            .borrow_mut()
            .pop_front()
            .expect("unexpected command invocation")
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Write a zip archive at `path` containing the given `(name, contents)`
/// entries.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(contents).expect("write zip entry");
    }
    writer.finish().expect("finish zip");
}

/// Build an in-memory zip archive containing the given entries.
///
/// # Panics
///
/// Panics if the archive cannot be assembled.
#[must_use]
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(contents).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// A LineageOS for microG style directory listing with the given
/// `(file name, RFC 3339 timestamp)` rows.
#[must_use]
pub fn microg_listing_html(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(name, time)| {
            format!(
                concat!(
                    "<tr class=\"file\">",
                    "<td><a href=\"{name}\">{name}</a></td>",
                    "<td><time datetime=\"{time}\">{time}</time></td>",
                    "</tr>"
                ),
                name = name,
                time = time
            )
        })
        .collect();
    format!(
        concat!(
            "<html><body><div class=\"listing\"><table>",
            "<thead><tr><th>Name</th><th>Modified</th></tr></thead>",
            "<tbody><tr><td><a href=\"../\">Go up</a></td></tr>{}</tbody>",
            "</table></div></body></html>"
        ),
        body
    )
}

/// Size of the chunks [`StubTransfer`] writes, small enough to exercise
/// multi-write streams.
const STUB_CHUNK_LEN: usize = 7;

/// A `Transfer` serving a fixed body and counting invocations.
#[derive(Debug, Default)]
pub struct StubTransfer {
    body: Vec<u8>,
    fail: bool,
    urls: RefCell<Vec<String>>,
}

impl StubTransfer {
    /// A transfer that serves `body` for any URL.
    #[must_use]
    pub fn serving(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// A transfer that writes half the body and then fails.
    #[must_use]
    pub fn failing_after_partial(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            fail: true,
            ..Self::default()
        }
    }

    /// Number of transfers performed.
    #[must_use]
    pub fn transfer_count(&self) -> usize {
        self.urls.borrow().len()
    }

    /// URLs requested so far.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.urls.borrow().clone()
    }
}

impl Transfer for StubTransfer {
    fn transfer(&self, url: &str, sink: &mut dyn Write) -> std::result::Result<u64, DownloadError> {
        self.urls.borrow_mut().push(url.to_owned());
        let body = if self.fail {
            self.body.get(..self.body.len() / 2).unwrap_or_default()
        } else {
            self.body.as_slice()
        };
        for chunk in body.chunks(STUB_CHUNK_LEN) {
            sink.write_all(chunk)?;
        }
        if self.fail {
            return Err(DownloadError::TransferFailed {
                url: url.to_owned(),
                reason: "connection reset".to_owned(),
            });
        }
        Ok(body.len() as u64)
    }
}

/// An `HttpClient` serving fixed pages; any other URL answers 404.
#[derive(Debug, Default)]
pub struct StaticHttp {
    pages: HashMap<String, TextResponse>,
    requests: RefCell<Vec<String>>,
}

impl StaticHttp {
    /// A client with no pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `url`.
    #[must_use]
    pub fn page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.status(url, 200, body)
    }

    /// Serve `body` with `status` at `url`.
    #[must_use]
    pub fn status(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.pages.insert(
            url.into(),
            TextResponse {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// URLs requested so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl HttpClient for StaticHttp {
    fn get_text(&self, url: &str) -> std::result::Result<TextResponse, DownloadError> {
        self.requests.borrow_mut().push(url.to_owned());
        Ok(self.pages.get(url).cloned().unwrap_or_else(|| TextResponse {
            status: 404,
            body: String::new(),
        }))
    }
}

/// A `PayloadDumper` that optionally writes a fixed `boot.img`.
#[derive(Debug, Default)]
pub struct ScriptedDumper {
    image: Option<Vec<u8>>,
    runs: Cell<usize>,
}

impl ScriptedDumper {
    /// A dumper that writes `image` as `boot.img` into the work directory.
    #[must_use]
    pub fn producing(image: impl Into<Vec<u8>>) -> Self {
        Self {
            image: Some(image.into()),
            runs: Cell::new(0),
        }
    }

    /// A dumper that succeeds without writing anything.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Number of times the dumper ran.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.runs.get()
    }
}

impl PayloadDumper for ScriptedDumper {
    fn dump(&self, work_dir: &Path) -> Result<()> {
        self.runs.set(self.runs.get() + 1);
        if let Some(image) = &self.image {
            std::fs::write(work_dir.join("boot.img"), image)?;
        }
        Ok(())
    }
}

/// A `Confirm` giving a fixed answer and recording the questions asked.
#[derive(Debug, Default)]
pub struct FixedAnswer {
    answer: bool,
    questions: RefCell<Vec<String>>,
}

impl FixedAnswer {
    /// Answer every question with `answer`.
    #[must_use]
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            questions: RefCell::new(Vec::new()),
        }
    }

    /// Questions asked so far.
    #[must_use]
    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }
}

impl Confirm for FixedAnswer {
    fn confirm(&self, message: &str) -> bool {
        self.questions.borrow_mut().push(message.to_owned());
        self.answer
    }
}

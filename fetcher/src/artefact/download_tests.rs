//! Tests for transfers and the download manager.

use super::*;
use crate::test_utils::{StubTransfer, sha256_hex};
use rstest::rstest;

const BODY: &[u8] = b"firmware archive bytes, long enough to span several chunks";

fn url() -> Url {
    Url::parse("https://download.example/sunfish/lineage-sunfish.zip").expect("valid URL")
}

/// Writer accepting at most `limit` bytes per call.
struct ShortWriter {
    inner: Vec<u8>,
    limit: usize,
}

impl Write for ShortWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = buf.get(..self.limit).unwrap_or(buf);
        self.inner.extend_from_slice(accepted);
        Ok(accepted.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn map_ureq_error_maps_404_to_not_found() {
    let err = ureq::Error::StatusCode(404);
    let mapped = map_ureq_error("https://example.test/fw.zip", &err);
    assert!(matches!(mapped, DownloadError::NotFound { .. }));
}

#[test]
fn map_ureq_error_maps_other_status_to_http_error() {
    let err = ureq::Error::StatusCode(500);
    let mapped = map_ureq_error("https://example.test/fw.zip", &err);
    assert!(matches!(mapped, DownloadError::HttpError { .. }));
}

#[rstest]
#[case(200, true)]
#[case(204, false)]
#[case(404, false)]
fn text_response_ok_only_for_200(#[case] status: u16, #[case] expected: bool) {
    let response = TextResponse {
        status,
        body: String::new(),
    };
    assert_eq!(response.is_ok(), expected);
}

#[test]
fn wget_arguments_stream_to_stdout() {
    assert_eq!(
        WgetTransfer::arguments("https://a.test/fw.zip"),
        [
            "https://a.test/fw.zip",
            "-q",
            "--show-progress",
            "--progress=bar:force",
            "-O",
            "-"
        ]
    );
}

#[test]
fn tee_feeds_disk_and_digest_identically() {
    let mut tee = TeeWriter::new(Vec::new());
    for chunk in BODY.chunks(5) {
        tee.write_all(chunk).expect("write");
    }
    assert_eq!(tee.bytes_written(), BODY.len() as u64);
    let (written, digest) = tee.finish().expect("finish");
    assert_eq!(written, BODY);
    assert_eq!(digest.as_str(), sha256_hex(BODY));
}

#[test]
fn tee_hashes_only_accepted_bytes_on_short_writes() {
    let mut tee = TeeWriter::new(ShortWriter {
        inner: Vec::new(),
        limit: 3,
    });
    tee.write_all(BODY).expect("write_all retries short writes");
    let (writer, digest) = tee.finish().expect("finish");
    assert_eq!(writer.inner, BODY);
    assert_eq!(digest.as_str(), sha256_hex(BODY));
}

#[test]
fn fetch_stages_file_with_digest() {
    let temp = tempfile::tempdir().expect("temp dir");
    let destination = temp.path().join("dl").join("lineage-sunfish.zip");
    let transfer = StubTransfer::serving(BODY);

    let staged = DownloadManager::new(&transfer)
        .fetch(&url(), &destination)
        .expect("fetch");

    assert_eq!(staged.bytes(), BODY.len() as u64);
    assert_eq!(staged.digest().as_str(), sha256_hex(BODY));
    assert!(!destination.exists(), "nothing is published before commit");

    let committed = staged.commit().expect("commit");
    assert_eq!(committed, destination);
    assert_eq!(std::fs::read(&destination).expect("read"), BODY);
    assert_eq!(transfer.urls(), [url().to_string()]);
}

#[test]
fn dropping_uncommitted_download_leaves_no_trace() {
    let temp = tempfile::tempdir().expect("temp dir");
    let destination = temp.path().join("fw.zip");
    let transfer = StubTransfer::serving(BODY);

    let staged = DownloadManager::new(&transfer)
        .fetch(&url(), &destination)
        .expect("fetch");
    drop(staged);

    let leftovers: Vec<_> = std::fs::read_dir(temp.path()).expect("list").collect();
    assert!(leftovers.is_empty(), "staging file was not removed");
}

#[test]
fn commit_replaces_stale_file() {
    let temp = tempfile::tempdir().expect("temp dir");
    let destination = temp.path().join("fw.zip");
    std::fs::write(&destination, b"stale").expect("seed stale file");
    let transfer = StubTransfer::serving(BODY);

    DownloadManager::new(&transfer)
        .fetch(&url(), &destination)
        .expect("fetch")
        .commit()
        .expect("commit");

    assert_eq!(std::fs::read(&destination).expect("read"), BODY);
}

#[test]
fn failed_transfer_keeps_existing_file_and_cleans_up() {
    let temp = tempfile::tempdir().expect("temp dir");
    let destination = temp.path().join("fw.zip");
    std::fs::write(&destination, b"previous").expect("seed file");
    let transfer = StubTransfer::failing_after_partial(BODY);

    let err = DownloadManager::new(&transfer)
        .fetch(&url(), &destination)
        .expect_err("transfer fails");

    assert!(matches!(err, DownloadError::TransferFailed { .. }));
    assert_eq!(std::fs::read(&destination).expect("read"), b"previous");
    assert_eq!(std::fs::read_dir(temp.path()).expect("list").count(), 1);
}

#[cfg(unix)]
#[test]
fn wget_non_zero_exit_is_transfer_failure() {
    let transfer = WgetTransfer::with_program("false", true);
    let mut sink = Vec::new();
    let err = transfer
        .transfer("https://a.test/fw.zip", &mut sink)
        .expect_err("false exits non-zero");
    assert!(matches!(err, DownloadError::TransferFailed { .. }));
}

#[cfg(unix)]
#[test]
fn wget_missing_program_is_io_error() {
    let transfer = WgetTransfer::with_program("bootpull-no-such-transfer-tool", true);
    let mut sink = Vec::new();
    let err = transfer
        .transfer("https://a.test/fw.zip", &mut sink)
        .expect_err("spawn fails");
    assert!(matches!(err, DownloadError::Io(_)));
}

#[test]
fn checksum_takes_first_token_of_body() {
    let mut http = MockHttpClient::new();
    http.expect_get_text()
        .withf(|url| url.ends_with(".sha256sum"))
        .returning(|_| {
            Ok(TextResponse {
                status: 200,
                body: "abc123  lineage-sunfish.zip\n".to_owned(),
            })
        });
    let checksum_url = Url::parse("https://a.test/lineage-sunfish.zip.sha256sum").expect("url");

    let expected = fetch_expected_checksum(&http, &checksum_url).expect("checksum");

    assert_eq!(expected.as_str(), "abc123");
}

#[test]
fn checksum_error_status_still_parses_body() {
    let mut http = MockHttpClient::new();
    http.expect_get_text().returning(|_| {
        Ok(TextResponse {
            status: 404,
            body: "<html>Not Found</html>".to_owned(),
        })
    });
    let checksum_url = Url::parse("https://a.test/fw.zip.sha256sum").expect("url");

    let expected = fetch_expected_checksum(&http, &checksum_url).expect("checksum");

    assert_eq!(expected.as_str(), "<html>Not");
}

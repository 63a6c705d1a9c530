//! Streaming SHA-256 verification.
//!
//! The verifier is fed incrementally, either directly or as one half of the
//! download tee, and only finalised once the whole stream has been seen.

use super::sha256_digest::{ExpectedChecksum, Sha256Digest};
use crate::error::{FetchError, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Incremental SHA-256 accumulator.
///
/// # Examples
///
/// ```
/// use bootpull::artefact::verification::Sha256Verifier;
///
/// let mut verifier = Sha256Verifier::new();
/// verifier.update(b"hello ");
/// verifier.update(b"world");
/// assert_eq!(
///     verifier.finalize().as_str(),
///     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
/// );
/// ```
#[derive(Clone, Default)]
pub struct Sha256Verifier {
    hasher: Sha256,
    bytes: u64,
}

impl fmt::Debug for Sha256Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sha256Verifier")
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}

impl Sha256Verifier {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `data` into the digest.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes = self.bytes.saturating_add(data.len() as u64);
    }

    /// Number of bytes hashed so far.
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    /// Consume the accumulator and return the lowercase hex digest.
    #[must_use]
    pub fn finalize(self) -> Sha256Digest {
        Sha256Digest::from_bytes(&self.hasher.finalize())
    }
}

impl Write for Sha256Verifier {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Hash everything `reader` yields.
///
/// Interrupted reads are retried.
///
/// # Errors
///
/// Returns any I/O error raised while reading.
pub fn digest_reader(reader: &mut dyn Read) -> io::Result<Sha256Digest> {
    let mut verifier = Sha256Verifier::new();
    io::copy(reader, &mut verifier)?;
    Ok(verifier.finalize())
}

/// Compute the SHA-256 digest of the file at `path` in a single pass.
///
/// # Errors
///
/// Returns any I/O error raised while opening or reading the file.
pub fn compute_sha256(path: &Path) -> io::Result<Sha256Digest> {
    let mut file = fs::File::open(path)?;
    digest_reader(&mut file)
}

/// Compare a computed digest against the published checksum.
///
/// # Errors
///
/// Returns [`FetchError::ChecksumMismatch`] carrying both values when they
/// differ.
pub fn verify(expected: &ExpectedChecksum, actual: &Sha256Digest) -> Result<()> {
    if actual.matches(expected) {
        return Ok(());
    }
    Err(FetchError::ChecksumMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sha256_hex;

    const SAMPLE: &[u8] = b"the quick brown fox jumps over the lazy dog";

    #[test]
    fn known_bytes_match_known_digest() {
        let mut reader = SAMPLE;
        let digest = digest_reader(&mut reader).expect("hash");
        let expected = ExpectedChecksum::parse(&sha256_hex(SAMPLE));
        assert!(verify(&expected, &digest).is_ok());
    }

    #[test]
    fn flipping_any_single_byte_causes_mismatch() {
        let expected = ExpectedChecksum::parse(&sha256_hex(SAMPLE));
        for index in 0..SAMPLE.len() {
            let mut tampered = SAMPLE.to_vec();
            if let Some(byte) = tampered.get_mut(index) {
                *byte ^= 0x01;
            }
            let mut reader = tampered.as_slice();
            let digest = digest_reader(&mut reader).expect("hash");
            assert!(
                matches!(
                    verify(&expected, &digest),
                    Err(FetchError::ChecksumMismatch { .. })
                ),
                "flip at {index} went unnoticed"
            );
        }
    }

    #[test]
    fn mismatch_reports_expected_and_actual() {
        let mut reader = SAMPLE;
        let digest = digest_reader(&mut reader).expect("hash");
        let err = verify(&ExpectedChecksum::parse("deadbeef"), &digest).expect_err("mismatch");
        match err {
            FetchError::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, "deadbeef");
                assert_eq!(actual, digest.as_str());
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn incremental_updates_equal_one_shot() {
        let mut verifier = Sha256Verifier::new();
        for chunk in SAMPLE.chunks(7) {
            verifier.update(chunk);
        }
        assert_eq!(verifier.bytes_hashed(), SAMPLE.len() as u64);
        assert_eq!(verifier.finalize().as_str(), sha256_hex(SAMPLE));
    }

    #[test]
    fn compute_sha256_reads_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("artifact.zip");
        std::fs::write(&path, SAMPLE).expect("write");
        let digest = compute_sha256(&path).expect("hash file");
        assert_eq!(digest.as_str(), sha256_hex(SAMPLE));
    }

    /// Reader that reports `Interrupted` before every chunk it yields.
    struct Flaky<'a> {
        rest: &'a [u8],
        interrupt_next: bool,
    }

    impl Read for Flaky<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt_next {
                self.interrupt_next = false;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.interrupt_next = true;
            let len = buf.len().min(5).min(self.rest.len());
            let (head, tail) = self.rest.split_at(len);
            if let Some(dest) = buf.get_mut(..len) {
                dest.copy_from_slice(head);
            }
            self.rest = tail;
            Ok(len)
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let mut reader = Flaky {
            rest: SAMPLE,
            interrupt_next: true,
        };
        let digest = digest_reader(&mut reader).expect("hash despite interruptions");
        assert_eq!(digest.as_str(), sha256_hex(SAMPLE));
    }

    #[test]
    fn empty_input_has_well_known_digest() {
        let digest = Sha256Verifier::new().finalize();
        assert_eq!(
            digest.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

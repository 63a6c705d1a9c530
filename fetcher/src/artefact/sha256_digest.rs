//! SHA-256 digest types for artifact verification.
//!
//! [`Sha256Digest`] is a computed digest and is always a 64-character
//! lowercase hex string. [`ExpectedChecksum`] is whatever the provider
//! published; it is deliberately not validated so that a malformed checksum
//! file surfaces as a mismatch rather than a parse failure.

use std::fmt;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// A SHA-256 digest string failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid SHA-256 digest: {reason}")]
pub struct InvalidDigest {
    /// Description of the validation failure.
    pub reason: String,
}

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use bootpull::artefact::sha256_digest::Sha256Digest;
///
/// let hex = "a".repeat(64);
/// let digest = Sha256Digest::try_from(hex.as_str())?;
/// assert_eq!(digest.as_str().len(), 64);
/// # Ok::<(), bootpull::artefact::sha256_digest::InvalidDigest>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Build a digest from raw hash output bytes.
    #[must_use]
    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        let hex = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
        Self(hex)
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this digest equals the published checksum.
    ///
    /// Comparison is an exact, case-sensitive string match.
    #[must_use]
    pub fn matches(&self, expected: &ExpectedChecksum) -> bool {
        self.0 == expected.as_str()
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = InvalidDigest;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate that `value` is a well-formed hex-encoded SHA-256 digest.
fn validate_sha256(value: &str) -> Result<(), InvalidDigest> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(InvalidDigest {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(InvalidDigest {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(InvalidDigest {
            reason: "digest must be lowercase".to_owned(),
        });
    }
    Ok(())
}

/// The digest a provider publishes for an artifact.
///
/// # Examples
///
/// ```
/// use bootpull::artefact::sha256_digest::ExpectedChecksum;
///
/// let expected = ExpectedChecksum::parse("deadbeef  sunfish.zip\n");
/// assert_eq!(expected.as_str(), "deadbeef");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpectedChecksum(String);

impl ExpectedChecksum {
    /// Extract the digest from checksum file contents.
    ///
    /// The digest is the first whitespace-delimited token; an empty file
    /// yields an empty checksum, which never matches any digest.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let token = contents.split_whitespace().next().unwrap_or_default();
        Self(token.to_owned())
    }

    /// Return the checksum as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpectedChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Semantic wrapper for device code names.
//!
//! Device codes (for example `sunfish` or `oriole`) are interpolated into
//! provider URLs, so they are validated before any network access.

use crate::error::{FetchError, Result};
use std::fmt;

/// A validated, case-sensitive device code name.
///
/// Only ASCII letters, digits, and underscores are accepted.
///
/// # Examples
///
/// ```
/// use bootpull::device::DeviceId;
///
/// let device = DeviceId::parse("sunfish")?;
/// assert_eq!(device.as_str(), "sunfish");
/// assert!(DeviceId::parse("../etc").is_err());
/// # Ok::<(), bootpull::error::FetchError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate `value` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] when `value` is empty or contains
    /// anything other than ASCII alphanumerics and `_`.
    pub fn parse(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(FetchError::InvalidInput {
                value: value.to_owned(),
                reason: "device name is empty".to_owned(),
            });
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(FetchError::InvalidInput {
                value: value.to_owned(),
                reason: format!("unexpected character '{bad}'"),
            });
        }
        Ok(Self(value.to_owned()))
    }

    /// Get the device code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The file name suffix that identifies this device's artifacts.
    #[must_use]
    pub fn artifact_suffix(&self) -> String {
        format!("{}.zip", self.0)
    }
}

impl TryFrom<&str> for DeviceId {
    type Error = FetchError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::lowercase("sunfish")]
    #[case::mixed_case("PL2")]
    #[case::underscore("a71_5g")]
    #[case::digits("8t")]
    fn accepts_valid_names(#[case] name: &str) {
        let device = DeviceId::parse(name).expect("valid device name");
        assert_eq!(device.as_str(), name);
    }

    #[rstest]
    #[case::empty("")]
    #[case::slash("sun/fish")]
    #[case::traversal("..")]
    #[case::hyphen("sun-fish")]
    #[case::space("sun fish")]
    #[case::non_ascii("sunfïsh")]
    fn rejects_invalid_names(#[case] name: &str) {
        let result = DeviceId::parse(name);
        assert!(
            matches!(result, Err(FetchError::InvalidInput { .. })),
            "expected InvalidInput for {name:?}"
        );
    }

    #[test]
    fn artifact_suffix_appends_zip_extension() {
        let device = DeviceId::parse("sunfish").expect("valid");
        assert_eq!(device.artifact_suffix(), "sunfish.zip");
    }

    #[test]
    fn case_is_preserved() {
        let device = DeviceId::try_from("Oriole").expect("valid");
        assert_eq!(device.to_string(), "Oriole");
    }
}

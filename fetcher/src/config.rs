//! Explicit run configuration for the acquisition pipeline.
//!
//! All process-wide assumptions (relative working directories, the
//! `DL_URL` host override) are captured here once and threaded into the
//! pipeline, so library callers and tests never depend on ambient state.

use crate::error::{FetchError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fmt;

/// Environment variable overriding the LineageOS for microG download host.
pub const DL_URL_ENV: &str = "DL_URL";

/// Default LineageOS for microG download host.
pub const DEFAULT_MICROG_BASE_URL: &str = "https://download.lineage.microg.org";

/// Default CalyxOS site hosting the per-device install instructions.
pub const DEFAULT_CALYXOS_BASE_URL: &str = "https://calyxos.org";

/// Default container image used to dump `payload.bin` partitions.
pub const DEFAULT_DUMPER_IMAGE: &str = "vm03/payload_dumper";

/// Which mechanism streams artifact bytes from the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum TransferBackend {
    /// In-process HTTP client.
    #[default]
    Http,
    /// External `wget` writing the body to standard output.
    Wget,
}

impl fmt::Display for TransferBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Wget => write!(f, "wget"),
        }
    }
}

/// Configuration for one acquisition run.
///
/// # Examples
///
/// ```
/// use bootpull::config::FetchConfig;
///
/// let config = FetchConfig::default();
/// assert_eq!(config.cache_dir, "dl");
/// assert_eq!(config.work_dir, "wd");
/// assert_eq!(config.output_path, "boot.img");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Download cache; artifacts are keyed by their remote file name and
    /// never cleaned automatically.
    pub cache_dir: Utf8PathBuf,
    /// Scratch space for unpacking, removed when the run ends.
    pub work_dir: Utf8PathBuf,
    /// Final location of the extracted boot image.
    pub output_path: Utf8PathBuf,
    /// Base URL of the LineageOS for microG download listing.
    pub microg_base_url: String,
    /// Base URL of the CalyxOS website.
    pub calyxos_base_url: String,
    /// Container image invoked for `payload.bin` firmware.
    pub dumper_image: String,
    /// Transfer mechanism for artifact downloads.
    pub transfer: TransferBackend,
    /// Suppress progress output.
    pub quiet: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_dir: Utf8PathBuf::from("dl"),
            work_dir: Utf8PathBuf::from("wd"),
            output_path: Utf8PathBuf::from("boot.img"),
            microg_base_url: DEFAULT_MICROG_BASE_URL.to_owned(),
            calyxos_base_url: DEFAULT_CALYXOS_BASE_URL.to_owned(),
            dumper_image: DEFAULT_DUMPER_IMAGE.to_owned(),
            transfer: TransferBackend::default(),
            quiet: false,
        }
    }
}

impl FetchConfig {
    /// Build the default configuration, applying overrides from the process
    /// environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build the default configuration, applying overrides from `lookup`.
    ///
    /// Blank values are ignored so that an exported-but-empty `DL_URL`
    /// falls back to the default host.
    ///
    /// # Examples
    ///
    /// ```
    /// use bootpull::config::FetchConfig;
    ///
    /// let config = FetchConfig::from_env_with(|key| {
    ///     (key == "DL_URL").then(|| "http://mirror.test/".to_owned())
    /// });
    /// assert_eq!(config.microg_base_url, "http://mirror.test");
    /// ```
    #[must_use]
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(base) = lookup(DL_URL_ENV)
            .map(|value| value.trim().trim_end_matches('/').to_owned())
            .filter(|value| !value.is_empty())
        {
            config.microg_base_url = base;
        }
        config
    }

    /// Check that the working directory holds neither the cache nor the
    /// output path.
    ///
    /// The working directory is deleted before unpacking and again when the
    /// run ends, so anything placed inside it would be lost. Paths are
    /// compared lexically after resolving relative ones against the current
    /// directory; symlinks are not followed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::OverlappingPaths`] naming the first path found
    /// inside the working directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use bootpull::config::FetchConfig;
    ///
    /// assert!(FetchConfig::default().validate().is_ok());
    ///
    /// let config = FetchConfig {
    ///     output_path: "wd/boot.img".into(),
    ///     ..FetchConfig::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        let work_dir = normalise(&self.work_dir);
        for (role, path) in [
            ("download cache", &self.cache_dir),
            ("output path", &self.output_path),
        ] {
            if normalise(path).starts_with(&work_dir) {
                return Err(FetchError::OverlappingPaths {
                    role,
                    path: path.as_std_path().to_path_buf(),
                    work_dir: self.work_dir.as_std_path().to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

/// Absolute, lexically normalised form of `path`.
fn normalise(path: &Utf8Path) -> Utf8PathBuf {
    let absolute = if path.is_absolute() {
        path.to_owned()
    } else {
        std::env::current_dir()
            .ok()
            .and_then(|cwd| Utf8PathBuf::from_path_buf(cwd).ok())
            .map_or_else(|| path.to_owned(), |cwd| cwd.join(path))
    };

    let mut normalised = Utf8PathBuf::new();
    for component in absolute.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalised.pop();
            }
            other => normalised.push(other.as_str()),
        }
    }
    normalised
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_use_relative_directories() {
        let config = FetchConfig::default();
        assert_eq!(config.cache_dir, Utf8PathBuf::from("dl"));
        assert_eq!(config.work_dir, Utf8PathBuf::from("wd"));
        assert_eq!(config.output_path, Utf8PathBuf::from("boot.img"));
        assert_eq!(config.transfer, TransferBackend::Http);
        assert!(!config.quiet);
    }

    #[test]
    fn env_override_replaces_microg_host() {
        let config = temp_env::with_var(DL_URL_ENV, Some("https://mirror.example"), || {
            FetchConfig::from_env()
        });
        assert_eq!(config.microg_base_url, "https://mirror.example");
    }

    #[test]
    fn missing_env_keeps_default_host() {
        let config = temp_env::with_var_unset(DL_URL_ENV, FetchConfig::from_env);
        assert_eq!(config.microg_base_url, DEFAULT_MICROG_BASE_URL);
    }

    #[test]
    fn blank_override_is_ignored() {
        let config = FetchConfig::from_env_with(|_| Some("   ".to_owned()));
        assert_eq!(config.microg_base_url, DEFAULT_MICROG_BASE_URL);
    }

    #[test]
    fn override_does_not_touch_calyxos_host() {
        let config = FetchConfig::from_env_with(|_| Some("http://127.0.0.1:8080".to_owned()));
        assert_eq!(config.calyxos_base_url, DEFAULT_CALYXOS_BASE_URL);
    }

    #[rstest]
    #[case::defaults("dl", "wd", "boot.img")]
    #[case::sibling_prefix("wd-cache", "wd", "wdboot.img")]
    #[case::work_dir_inside_cache("dl", "dl/wd", "boot.img")]
    #[case::output_elsewhere("dl", "scratch/wd", "out/boot.img")]
    fn separate_directories_are_accepted(
        #[case] cache_dir: &str,
        #[case] work_dir: &str,
        #[case] output_path: &str,
    ) {
        let config = FetchConfig {
            cache_dir: cache_dir.into(),
            work_dir: work_dir.into(),
            output_path: output_path.into(),
            ..FetchConfig::default()
        };
        assert!(config.validate().is_ok(), "{config:?} rejected");
    }

    #[rstest]
    #[case::cache_is_work_dir("wd", "wd", "boot.img", "download cache")]
    #[case::cache_inside_work_dir("wd/dl", "wd", "boot.img", "download cache")]
    #[case::dotted_cache("./wd/./dl", "wd", "boot.img", "download cache")]
    #[case::output_inside_work_dir("dl", "wd", "wd/boot.img", "output path")]
    #[case::output_via_parent_dir("dl", "wd", "wd/sub/../boot.img", "output path")]
    #[case::current_dir_as_work_dir("dl", ".", "boot.img", "download cache")]
    fn paths_inside_work_dir_are_rejected(
        #[case] cache_dir: &str,
        #[case] work_dir: &str,
        #[case] output_path: &str,
        #[case] expected_role: &str,
    ) {
        let config = FetchConfig {
            cache_dir: cache_dir.into(),
            work_dir: work_dir.into(),
            output_path: output_path.into(),
            ..FetchConfig::default()
        };
        match config.validate() {
            Err(FetchError::OverlappingPaths { role, .. }) => assert_eq!(role, expected_role),
            other => panic!("expected OverlappingPaths, got {other:?}"),
        }
    }

    #[test]
    fn absolute_and_relative_forms_are_compared_alike() {
        let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir().expect("cwd"))
            .expect("utf8 cwd");
        let config = FetchConfig {
            output_path: cwd.join("wd").join("boot.img"),
            ..FetchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FetchError::OverlappingPaths { .. })
        ));
    }

    #[test]
    fn backend_display_matches_cli_value() {
        assert_eq!(TransferBackend::Http.to_string(), "http");
        assert_eq!(TransferBackend::Wget.to_string(), "wget");
    }
}

//! External `payload.bin` dumper.
//!
//! A/B OTA firmware ships partitions inside `payload.bin`. Extracting the boot
//! partition is delegated to a containerised dumper; its exit status is
//! checked here, but its output is validated by the unpacker.

use crate::error::{FetchError, Result};
use crate::exec::CommandExecutor;
use std::fs;
use std::path::Path;

/// Mount point of the working directory inside the container.
const CONTAINER_DATA_DIR: &str = "/data";

/// Trait for turning `<work_dir>/payload.bin` into `<work_dir>/boot.img`.
#[cfg_attr(test, mockall::automock)]
pub trait PayloadDumper {
    /// Run the dumper against the payload staged in `work_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ExtractionFailed`] if the tool cannot be run or
    /// reports failure.
    fn dump(&self, work_dir: &Path) -> Result<()>;
}

/// Runs the dumper image through `docker`.
pub struct DockerPayloadDumper<'a> {
    executor: &'a dyn CommandExecutor,
    image: String,
}

impl<'a> DockerPayloadDumper<'a> {
    /// Create a dumper running `image` via `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, image: impl Into<String>) -> Self {
        Self {
            executor,
            image: image.into(),
        }
    }

    /// Arguments passed to `docker` for a working directory at `host_dir`.
    #[must_use]
    pub fn arguments(&self, host_dir: &Path) -> Vec<String> {
        vec![
            "run".to_owned(),
            "--rm".to_owned(),
            "-v".to_owned(),
            format!("{}:{CONTAINER_DATA_DIR}/", host_dir.display()),
            self.image.clone(),
            format!("{CONTAINER_DATA_DIR}/payload.bin"),
            "--out".to_owned(),
            CONTAINER_DATA_DIR.to_owned(),
            "--images".to_owned(),
            "boot".to_owned(),
        ]
    }
}

impl PayloadDumper for DockerPayloadDumper<'_> {
    fn dump(&self, work_dir: &Path) -> Result<()> {
        let boot_image = work_dir.join(super::extraction::BOOT_IMAGE);
        let host_dir = fs::canonicalize(work_dir)?;
        let args = self.arguments(&host_dir);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self
            .executor
            .run("docker", &arg_refs)
            .map_err(|err| FetchError::ExtractionFailed {
                path: boot_image.clone(),
                reason: format!("could not run docker: {err}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::ExtractionFailed {
                path: boot_image,
                reason: format!("payload dumper exited with {}: {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DUMPER_IMAGE;
    use crate::test_utils::{StubExecutor, failure_output, success_output};

    #[test]
    fn invokes_docker_with_mounted_work_dir() {
        let temp = tempfile::tempdir().expect("temp dir");
        let executor = StubExecutor::new(vec![Ok(success_output())]);
        let dumper = DockerPayloadDumper::new(&executor, DEFAULT_DUMPER_IMAGE);

        dumper.dump(temp.path()).expect("dump");

        let host = fs::canonicalize(temp.path()).expect("canonical path");
        let calls = executor.calls();
        let call = calls.first().expect("one call");
        assert_eq!(call.cmd, "docker");
        assert_eq!(
            call.args,
            [
                "run".to_owned(),
                "--rm".to_owned(),
                "-v".to_owned(),
                format!("{}:/data/", host.display()),
                "vm03/payload_dumper".to_owned(),
                "/data/payload.bin".to_owned(),
                "--out".to_owned(),
                "/data".to_owned(),
                "--images".to_owned(),
                "boot".to_owned(),
            ]
        );
        executor.assert_finished();
    }

    #[test]
    fn custom_image_is_used() {
        let temp = tempfile::tempdir().expect("temp dir");
        let executor = StubExecutor::new(vec![Ok(success_output())]);
        DockerPayloadDumper::new(&executor, "example/dumper:2")
            .dump(temp.path())
            .expect("dump");
        let calls = executor.calls();
        assert!(calls.iter().any(|call| call.args.contains(&"example/dumper:2".to_owned())));
    }

    #[test]
    fn non_zero_exit_carries_stderr() {
        let temp = tempfile::tempdir().expect("temp dir");
        let executor = StubExecutor::new(vec![Ok(failure_output("no space left on device"))]);
        let err = DockerPayloadDumper::new(&executor, DEFAULT_DUMPER_IMAGE)
            .dump(temp.path())
            .expect_err("dumper fails");
        match err {
            FetchError::ExtractionFailed { reason, .. } => {
                assert!(reason.contains("no space left on device"));
            }
            other => panic!("expected ExtractionFailed, got {other:?}"),
        }
    }

    #[test]
    fn spawn_failure_is_extraction_failure() {
        let temp = tempfile::tempdir().expect("temp dir");
        let executor = StubExecutor::new(vec![Err(FetchError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "docker not found",
        )))]);
        let result = DockerPayloadDumper::new(&executor, DEFAULT_DUMPER_IMAGE).dump(temp.path());
        assert!(matches!(result, Err(FetchError::ExtractionFailed { .. })));
    }
}

//! Scratch directory for unpacking.

use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// The working directory of one run.
///
/// Created empty by [`prepare`](Self::prepare) and removed with everything in
/// it when dropped, whether the run succeeded or not.
#[derive(Debug)]
pub struct WorkingArea {
    path: Utf8PathBuf,
}

impl WorkingArea {
    /// Create `path` as an empty directory.
    ///
    /// Leftovers from an interrupted earlier run are removed first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be cleared or created.
    pub fn prepare(path: &Utf8Path) -> Result<Self> {
        if path.exists() {
            log::debug!("clearing stale working directory {path}");
            fs::remove_dir_all(path)?;
        }
        fs::create_dir_all(path)?;
        Ok(Self {
            path: path.to_owned(),
        })
    }

    /// The directory path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for WorkingArea {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("could not remove working directory {}: {err}", self.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf8 temp path")
    }

    #[test]
    fn prepare_creates_and_drop_removes() {
        let temp = tempfile::tempdir().expect("temp dir");
        let wd = utf8(temp.path()).join("wd");
        {
            let area = WorkingArea::prepare(&wd).expect("prepare");
            fs::write(area.path().join("payload.bin"), b"payload").expect("write");
            assert!(wd.is_dir());
        }
        assert!(!wd.exists());
    }

    #[test]
    fn prepare_discards_stale_contents() {
        let temp = tempfile::tempdir().expect("temp dir");
        let wd = utf8(temp.path()).join("wd");
        fs::create_dir_all(&wd).expect("mkdir");
        fs::write(wd.join("boot.img"), b"stale").expect("write");

        let area = WorkingArea::prepare(&wd).expect("prepare");

        assert!(!area.path().join("boot.img").exists());
    }

    #[test]
    fn drop_tolerates_already_removed_directory() {
        let temp = tempfile::tempdir().expect("temp dir");
        let wd = utf8(temp.path()).join("wd");
        let area = WorkingArea::prepare(&wd).expect("prepare");
        fs::remove_dir_all(&wd).expect("remove");
        drop(area);
        assert!(!wd.exists());
    }
}

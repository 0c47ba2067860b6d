//! Filesystem side effects of the pipeline, suppressed in dry-run mode.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::{Result, RunnerError};

#[derive(Debug, Clone, Copy, Default)]
pub struct FsOps {
    dry_run: bool,
}

impl FsOps {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn create_dir_all(&self, dir: &Path) -> Result<()> {
        if self.dry_run {
            println!("[dry-run] mkdir -p {}", dir.display());
            return Ok(());
        }
        fs::create_dir_all(dir)?;
        Ok(())
    }

    /// Copy a checkpoint into place, creating the destination's parent.
    ///
    /// A missing source is a `MissingCheckpoint` error, even in dry-run mode.
    pub fn copy_checkpoint(&self, src: &Path, dest: &Path) -> Result<()> {
        if !src.is_file() {
            return Err(RunnerError::MissingCheckpoint(src.to_path_buf()));
        }
        if self.dry_run {
            println!("[dry-run] cp {} {}", src.display(), dest.display());
            return Ok(());
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        if src == dest {
            return Ok(());
        }
        fs::copy(src, dest)?;
        info!("Copied {} -> {}", src.display(), dest.display());
        Ok(())
    }

    /// Remove a file; a missing file is logged and reported as `false`.
    pub fn remove_file(&self, path: &Path) -> Result<bool> {
        if self.dry_run {
            println!("[dry-run] rm {}", path.display());
            return Ok(false);
        }
        match fs::remove_file(path) {
            Ok(()) => {
                info!("Removed {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Nothing to remove at {}", path.display());
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

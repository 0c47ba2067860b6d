//! Zip archives of generated split directories.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Result, RunnerError};

/// Archive file name for one sampling run.
///
/// Only depends on its inputs, so reruns with the same arguments overwrite the
/// same archive.
pub fn archive_name(split: &str, experiment: &str, pool_size: u32, sampler: &str) -> String {
    format!("split{}_{}_pool{}_{}.zip", split, experiment, pool_size, sampler)
}

/// Zip `dirs` (and everything below them) into `dest`.
///
/// Entry names are relative to `root`. Returns the number of files written.
pub fn zip_dirs(root: &Path, dirs: &[PathBuf], dest: &Path) -> Result<usize> {
    for dir in dirs {
        if !dir.is_dir() {
            return Err(RunnerError::Archive(format!(
                "expected generated split directory {}",
                dir.display()
            )));
        }
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(dest)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut files = 0;

    for dir in dirs {
        zip.add_directory(entry_name(root, dir)?, options)?;

        for path in walk(dir)? {
            let name = entry_name(root, &path)?;
            if path.is_dir() {
                zip.add_directory(name, options)?;
            } else {
                debug!("Adding {}", name);
                zip.start_file(name, options)?;
                let mut input = File::open(&path)?;
                io::copy(&mut input, &mut zip)?;
                files += 1;
            }
        }
    }

    zip.finish()?;
    info!("Wrote {} files to {}", files, dest.display());
    Ok(files)
}

/// Every path below `dir`, sorted so archives are reproducible.
fn walk(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.display().to_string()));
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| RunnerError::Archive(e.to_string()))? {
        paths.push(entry.map_err(|e| RunnerError::Archive(e.to_string()))?);
    }
    paths.sort();
    Ok(paths)
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        RunnerError::Archive(format!("{} is not under {}", path.display(), root.display()))
    })?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use glob::glob;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

/// Flat file count and byte total for one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderStats {
    pub files: u64,
    pub bytes: u64,
}

/// Delete regular files directly under `dir` whose mtime is older than
/// `cutoff`. Returns the paths removed. Entries that cannot be read or
/// removed are logged and skipped rather than failing the sweep.
pub fn cleanup_older_than(dir: &Path, cutoff: SystemTime) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }

    let pattern = dir.join("*").to_string_lossy().into_owned();
    let mut removed = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("bad glob pattern {}", pattern))? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "unreadable directory entry");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "no modification time, skipping");
                continue;
            }
        };
        if modified < cutoff {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "removed expired file");
                    removed.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove"),
            }
        }
    }
    Ok(removed)
}

/// Remove files older than `days_to_keep` days.
pub fn cleanup_old_files(dir: &Path, days_to_keep: u32) -> Result<Vec<PathBuf>> {
    let cutoff = Utc::now() - Duration::days(i64::from(days_to_keep));
    cleanup_older_than(dir, SystemTime::from(cutoff))
}

/// Copy a workbook into `upload_dir` under its file name, so the
/// period's source material sits next to its report and ages out with
/// the retention sweep. When the source already is the stored file,
/// under any path spelling or through a symlink, nothing is copied and
/// the file is left untouched.
pub fn stash_upload(src: &Path, upload_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(upload_dir)
        .with_context(|| format!("creating {}", upload_dir.display()))?;
    let file_name = src
        .file_name()
        .with_context(|| format!("no file name in {}", src.display()))?;
    let dest = upload_dir.join(file_name);

    // path spellings can differ while naming the same file
    if dest.exists() {
        let src_real = fs::canonicalize(src)
            .with_context(|| format!("resolving {}", src.display()))?;
        let dest_real = fs::canonicalize(&dest)
            .with_context(|| format!("resolving {}", dest.display()))?;
        if src_real == dest_real {
            return Ok(dest);
        }
    }

    fs::copy(src, &dest)
        .with_context(|| format!("storing {} in {}", src.display(), upload_dir.display()))?;
    info!(path = %dest.display(), "stored upload");
    Ok(dest)
}

/// File count and total size directly under `dir`.
pub fn folder_stats(dir: &Path) -> Result<FolderStats> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }

    let mut stats = FolderStats::default();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_file() {
            stats.files += 1;
            stats.bytes += meta.len();
        }
    }
    Ok(stats)
}

//! File staging: copy the program's own files into the target directory
//!
//! Only the top level of the source directory is copied. A file whose
//! content hash already matches its copy is left alone, so staging twice
//! writes nothing the second time.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a staging run did
#[derive(Debug, Default)]
pub struct StageReport {
    pub copied: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

impl StageReport {
    pub fn total(&self) -> usize {
        self.copied.len() + self.unchanged.len()
    }
}

/// Copy every file in `source` into `target`, creating `target` if needed
pub fn stage(source: &Path, target: &Path) -> Result<StageReport> {
    if same_directory(source, target) {
        log::info!("Already running from {}; nothing to stage", target.display());
        return Ok(StageReport::default());
    }

    fs::create_dir_all(target)
        .with_context(|| format!("Failed to create {}", target.display()))?;

    let mut report = StageReport::default();

    for entry in WalkDir::new(source).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", source.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let dest = target.join(entry.file_name());
        if dest.is_file() && file_hash(entry.path())? == file_hash(&dest)? {
            log::debug!("Unchanged: {}", dest.display());
            report.unchanged.push(dest);
            continue;
        }

        fs::copy(entry.path(), &dest).with_context(|| {
            format!(
                "Failed to copy {} -> {}",
                entry.path().display(),
                dest.display()
            )
        })?;
        log::debug!("Copied: {}", dest.display());
        report.copied.push(dest);
    }

    Ok(report)
}

/// Remove the target directory; returns false when it did not exist
pub fn unstage(target: &Path) -> Result<bool> {
    if !target.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(target)
        .with_context(|| format!("Failed to remove {}", target.display()))?;
    Ok(true)
}

fn file_hash(path: &Path) -> Result<blake3::Hash> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(blake3::hash(&bytes))
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("drivemap.exe"), b"binary").unwrap();
        fs::write(dir.path().join("config.json"), b"{}").unwrap();
        fs::create_dir(dir.path().join("logs")).unwrap();
        fs::write(dir.path().join("logs").join("old.log"), b"x").unwrap();
        dir
    }

    #[test]
    fn test_stage_copies_top_level_files() {
        let source = source_dir();
        let root = TempDir::new().unwrap();
        let target = root.path().join("Program Files").join("DriveMapper");

        let report = stage(source.path(), &target).unwrap();
        assert_eq!(report.copied.len(), 2);
        assert!(target.join("drivemap.exe").is_file());
        assert!(!target.join("logs").exists());
    }

    #[test]
    fn test_restage_is_idempotent() {
        let source = source_dir();
        let target = TempDir::new().unwrap();

        stage(source.path(), target.path()).unwrap();
        let again = stage(source.path(), target.path()).unwrap();
        assert!(again.copied.is_empty());
        assert_eq!(again.unchanged.len(), 2);

        fs::write(source.path().join("config.json"), b"{\"changed\":1}").unwrap();
        let changed = stage(source.path(), target.path()).unwrap();
        assert_eq!(changed.copied, vec![target.path().join("config.json")]);
    }

    #[test]
    fn test_stage_into_itself_is_noop() {
        let source = source_dir();
        let report = stage(source.path(), source.path()).unwrap();
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_unstage_tolerates_absence() {
        let root = TempDir::new().unwrap();
        let target = root.path().join("DriveMapper");
        fs::create_dir(&target).unwrap();

        assert!(unstage(&target).unwrap());
        assert!(!target.exists());
        assert!(!unstage(&target).unwrap());
    }
}

//! Sorting of unsorted files into per-format input folders

use crate::error::{IngestError, Result};
use crate::reader::ContainerKind;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Counts from one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifySummary {
    pub msg_files: usize,
    pub pst_files: usize,
    pub other_files: usize,
}

/// Move every `.msg` / `.pst` file directly inside `unsorted_dir` into its
/// input folder; other files are left in place and counted
///
/// # Errors
/// Returns an error if `unsorted_dir` is a file or the target folders cannot
/// be created. A missing `unsorted_dir` is only a warning.
pub fn classify(unsorted_dir: &Path, msg_dir: &Path, pst_dir: &Path) -> Result<ClassifySummary> {
    fs::create_dir_all(msg_dir)?;
    fs::create_dir_all(pst_dir)?;

    let mut summary = ClassifySummary::default();

    if !unsorted_dir.exists() {
        warn!("Unsorted directory {} does not exist", unsorted_dir.display());
        return Ok(summary);
    }
    if !unsorted_dir.is_dir() {
        return Err(IngestError::Path(format!(
            "Unsorted path is not a directory: {}",
            unsorted_dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(unsorted_dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        warn!("No files found in {}", unsorted_dir.display());
        return Ok(summary);
    }

    info!("Found {} files to sort", files.len());

    for path in files {
        let Some(kind) = ContainerKind::from_path(&path) else {
            warn!("Unsupported file type: {}", path.display());
            summary.other_files += 1;
            continue;
        };

        let target_dir = match kind {
            ContainerKind::Msg => msg_dir,
            ContainerKind::Pst => pst_dir,
        };
        let Some(name) = path.file_name() else {
            continue;
        };

        match move_file(&path, &target_dir.join(name)) {
            Ok(()) => {
                info!("Moved {} to {}", path.display(), target_dir.display());
                match kind {
                    ContainerKind::Msg => summary.msg_files += 1,
                    ContainerKind::Pst => summary.pst_files += 1,
                }
            }
            Err(e) => error!("Error moving {}: {e}", path.display()),
        }
    }

    info!(
        "File sorting completed: {} .msg files, {} .pst files, {} other files",
        summary.msg_files, summary.pst_files, summary.other_files
    );

    Ok(summary)
}

/// Rename, falling back to copy + remove across filesystems
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sorts_by_extension() {
        let dir = tempdir().unwrap();
        let unsorted = dir.path().join("unsorted");
        let msg_dir = dir.path().join("msg");
        let pst_dir = dir.path().join("pst");
        fs::create_dir(&unsorted).unwrap();
        for name in ["a.msg", "B.MSG", "archive.pst", "readme.txt"] {
            fs::write(unsorted.join(name), name).unwrap();
        }
        fs::create_dir(unsorted.join("nested.msg")).unwrap();

        let summary = classify(&unsorted, &msg_dir, &pst_dir).unwrap();
        assert_eq!(
            summary,
            ClassifySummary {
                msg_files: 2,
                pst_files: 1,
                other_files: 1
            }
        );
        assert!(msg_dir.join("a.msg").exists());
        assert!(msg_dir.join("B.MSG").exists());
        assert!(pst_dir.join("archive.pst").exists());
        assert!(unsorted.join("readme.txt").exists());
        assert!(!unsorted.join("a.msg").exists());
    }

    #[test]
    fn test_missing_unsorted_dir() {
        let dir = tempdir().unwrap();
        let summary = classify(
            &dir.path().join("missing"),
            &dir.path().join("msg"),
            &dir.path().join("pst"),
        )
        .unwrap();
        assert_eq!(summary, ClassifySummary::default());
        assert!(dir.path().join("msg").is_dir());
    }

    #[test]
    fn test_unsorted_path_is_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        let result = classify(&file, &dir.path().join("msg"), &dir.path().join("pst"));
        assert!(matches!(result, Err(IngestError::Path(_))));
    }
}

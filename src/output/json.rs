//! JSON artifact writing and loading

use crate::context::RunContext;
use crate::email::Email;
use crate::error::Result;
use chrono::Local;
use log::{debug, error, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// `YYYYmmdd_HHMMSS`, shared by every artifact written in one run
#[must_use]
pub fn artifact_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Writes timestamped JSON artifacts into one directory
pub struct JsonArtifactWriter {
    dir: PathBuf,
    timestamp: String,
}

impl JsonArtifactWriter {
    /// Create a writer for `dir`, creating the directory if needed
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: &Path, timestamp: impl Into<String>) -> Result<Self> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            timestamp: timestamp.into(),
        })
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Path of the artifact named `<stem>_<timestamp>.json`
    #[must_use]
    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}_{}.json", self.timestamp))
    }

    /// Write `emails` as a pretty-printed array to `<stem>_<timestamp>.json`
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn write_emails(&self, stem: &str, emails: &[Email]) -> Result<PathBuf> {
        let path = self.write(stem, emails)?;
        info!("Saved {} emails to {}", emails.len(), path.display());
        Ok(path)
    }

    /// Write any serializable value to `<stem>_<timestamp>.json`
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn write<T: Serialize + ?Sized>(&self, stem: &str, value: &T) -> Result<PathBuf> {
        let path = self.path_for(stem);
        let file = File::create(&path)?;
        let mut writer = BufWriter::with_capacity(64 * 1024, file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Load every `*.json` array of emails from `dir`, in file name order
///
/// Files that are not arrays are skipped with a warning, unreadable files
/// are logged and skipped. A missing directory yields nothing.
#[must_use]
pub fn read_email_artifacts(dir: &Path, ctx: &mut RunContext) -> Vec<Email> {
    let files = match json_files(dir) {
        Ok(files) => files,
        Err(e) => {
            ctx.warn(format!("Cannot list {}: {e}", dir.display()));
            return Vec::new();
        }
    };
    ctx.file_discovered(files.len());

    let mut emails = Vec::new();
    for path in files {
        match read_email_file(&path) {
            Ok(Some(batch)) => {
                info!("Loaded {} emails from {}", batch.len(), path.display());
                ctx.file_processed();
                emails.extend(batch);
            }
            Ok(None) => {
                ctx.file_failed();
                ctx.warn(format!("JSON file {} does not contain a list", path.display()));
            }
            Err(e) => {
                ctx.file_failed();
                error!("Error loading {}: {e}", path.display());
            }
        }
    }

    emails
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_email_file(path: &Path) -> Result<Option<Vec<Email>>> {
    let reader = BufReader::new(File::open(path)?);
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    if !value.is_array() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn email(sender: &str) -> Email {
        Email {
            sender_email: sender.to_string(),
            subject: format!("from {sender}"),
            ..Default::default()
        }
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = artifact_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
    }

    #[test]
    fn test_write_and_reload() {
        let dir = tempdir().unwrap();
        let writer = JsonArtifactWriter::new(&dir.path().join("out"), "20240101_120000").unwrap();

        let path = writer
            .write_emails("pst_emails", &[email("a@x.com"), email("b@y.com")])
            .unwrap();
        assert!(path.ends_with("pst_emails_20240101_120000.json"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"senderEmail\": \"a@x.com\""));

        let loaded = read_email_artifacts(&dir.path().join("out"), &mut RunContext::new());
        assert_eq!(loaded, vec![email("a@x.com"), email("b@y.com")]);
    }

    #[test]
    fn test_reload_skips_non_lists_and_garbage() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"[{"senderEmail": "a@x.com"}]"#).unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"senderEmail": "b@x.com"}"#).unwrap();
        std::fs::write(dir.path().join("c.json"), "not json").unwrap();
        std::fs::write(dir.path().join("d.txt"), r#"[{"senderEmail": "d@x.com"}]"#).unwrap();
        std::fs::write(dir.path().join("e.json"), r#"[{"senderEmail": "e@x.com"}]"#).unwrap();

        let mut ctx = RunContext::new();
        let senders: Vec<_> = read_email_artifacts(dir.path(), &mut ctx)
            .into_iter()
            .map(|e| e.sender_email)
            .collect();
        assert_eq!(senders, ["a@x.com", "e@x.com"]);

        let report = ctx.finish();
        assert_eq!(report.files_discovered, 4);
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.files_failed, 2);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_reload_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(read_email_artifacts(&dir.path().join("nope"), &mut RunContext::new()).is_empty());
    }
}

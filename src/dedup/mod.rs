//! Sender-based deduplication
//!
//! Emails are grouped by trimmed, lowercased sender address. The first
//! record seen for each sender is kept and every later one is discarded,
//! regardless of which is newer or more complete. Output order is the order
//! in which distinct senders were first seen.

use crate::context::RunContext;
use crate::email::Email;
use crate::error::Result;
use crate::output::{artifact_timestamp, read_email_artifacts, JsonArtifactWriter};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Run summary persisted next to the deduplicated emails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupSummary {
    pub total_emails_processed: usize,
    pub unique_senders: usize,
    pub duplicates_removed: usize,
    pub timestamp: String,
}

/// Result of one deduplication pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOutcome {
    pub emails: Vec<Email>,
    pub total: usize,
    /// Records with no usable sender address, excluded before grouping
    pub skipped_no_sender: usize,
    /// Records dropped because an earlier record had the same sender
    pub duplicates_removed: usize,
}

impl DedupOutcome {
    #[must_use]
    pub fn summary(&self, timestamp: impl Into<String>) -> DedupSummary {
        DedupSummary {
            total_emails_processed: self.total,
            unique_senders: self.emails.len(),
            duplicates_removed: self.duplicates_removed,
            timestamp: timestamp.into(),
        }
    }
}

/// Emails sharing one normalized sender, in discovery order
#[derive(Debug, Default)]
struct EmailGroups<'a> {
    order: Vec<String>,
    groups: HashMap<String, Vec<&'a Email>>,
}

impl<'a> EmailGroups<'a> {
    fn push(&mut self, key: String, email: &'a Email) {
        if let Some(group) = self.groups.get_mut(&key) {
            group.push(email);
            return;
        }
        self.order.push(key.clone());
        self.groups.insert(key, vec![email]);
    }

    /// Groups in first-seen order
    fn iter(&self) -> impl Iterator<Item = (&str, &[&'a Email])> {
        self.order.iter().filter_map(|key| {
            self.groups
                .get(key)
                .map(|group| (key.as_str(), group.as_slice()))
        })
    }
}

/// Keep the first email per sender and report what was dropped
///
/// Records without a sender address are counted in `ctx` and excluded
/// before grouping.
pub fn deduplicate_with_report(emails: &[Email], ctx: &mut RunContext) -> DedupOutcome {
    info!("Starting deduplication of {} emails", emails.len());

    let mut groups = EmailGroups::default();
    let mut skipped_no_sender = 0;

    for email in emails {
        let key = email.normalized_sender();
        if key.is_empty() {
            skipped_no_sender += 1;
            ctx.dropped_no_sender();
            ctx.warn(format!("Email without sender email: {:?}", email.subject));
            continue;
        }
        groups.push(key, email);
    }

    let mut unique = Vec::with_capacity(groups.order.len());
    let mut duplicates_removed = 0;

    for (sender, group) in groups.iter() {
        if group.len() > 1 {
            duplicates_removed += group.len() - 1;
            debug!(
                "Found {} emails from {sender}, keeping first one",
                group.len()
            );
        }
        unique.push(group[0].clone());
    }

    info!(
        "Deduplication completed: {} unique senders, {duplicates_removed} duplicates removed, {skipped_no_sender} without sender",
        unique.len()
    );

    DedupOutcome {
        emails: unique,
        total: emails.len(),
        skipped_no_sender,
        duplicates_removed,
    }
}

/// Keep the first email per normalized sender address, in first-seen order
#[must_use]
pub fn deduplicate(emails: &[Email]) -> Vec<Email> {
    deduplicate_with_report(emails, &mut RunContext::new()).emails
}

/// Files written by [`Deduplicator::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupArtifacts {
    pub emails_path: PathBuf,
    pub summary_path: PathBuf,
    pub summary: DedupSummary,
}

/// Loads reader artifacts, deduplicates them and persists the result
pub struct Deduplicator {
    output_dir: PathBuf,
}

impl Deduplicator {
    #[must_use]
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Deduplicate every email found in `source_dirs`
    ///
    /// Returns `Ok(None)` when there is nothing to deduplicate.
    ///
    /// # Errors
    /// Returns an error if the output artifacts cannot be written.
    pub fn run(
        &self,
        source_dirs: &[PathBuf],
        ctx: &mut RunContext,
    ) -> Result<Option<DedupArtifacts>> {
        let mut emails = Vec::new();
        for dir in source_dirs {
            if !dir.exists() {
                ctx.warn(format!("Output directory {} does not exist", dir.display()));
                continue;
            }
            emails.extend(read_email_artifacts(dir, ctx));
        }

        if emails.is_empty() {
            ctx.warn("No emails found to process");
            return Ok(None);
        }

        info!("Total emails loaded: {}", emails.len());
        let outcome = deduplicate_with_report(&emails, ctx);

        if outcome.emails.is_empty() {
            ctx.warn("No email had a usable sender address");
            return Ok(None);
        }

        let writer = JsonArtifactWriter::new(&self.output_dir, artifact_timestamp())?;
        let emails_path = writer.write_emails("deduplicated_emails", &outcome.emails)?;
        let summary = outcome.summary(writer.timestamp());
        let summary_path = writer.write("deduplication_summary", &summary)?;
        info!("Saved deduplication summary to {}", summary_path.display());

        Ok(Some(DedupArtifacts {
            emails_path,
            summary_path,
            summary,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn email(sender: &str, subject: &str) -> Email {
        Email {
            sender_email: sender.to_string(),
            subject: subject.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_case_insensitive_first_wins() {
        let input = vec![
            email("A@X.com", "Hi"),
            email("a@x.com", "Bye"),
            email("b@y.com", "Yo"),
        ];

        let outcome = deduplicate_with_report(&input, &mut RunContext::new());
        assert_eq!(outcome.emails, vec![email("A@X.com", "Hi"), email("b@y.com", "Yo")]);
        assert_eq!(outcome.duplicates_removed, 1);
        assert_eq!(outcome.summary("ts").duplicates_removed, 1);
    }

    #[test]
    fn test_empty_sender_skipped() {
        let input = vec![email("", "anonymous"), email("a@x.com", "Hi"), email("  ", "blank")];

        let mut ctx = RunContext::new();
        let outcome = deduplicate_with_report(&input, &mut ctx);
        let summary = outcome.summary("20240101_000000");
        assert_eq!(summary.total_emails_processed, 3);
        assert_eq!(summary.unique_senders, 1);
        assert_eq!(summary.duplicates_removed, 0);
        assert_eq!(outcome.skipped_no_sender, 2);

        let report = ctx.finish();
        assert_eq!(report.dropped_no_sender, 2);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("anonymous"));
    }

    #[test]
    fn test_whitespace_and_case_collapse() {
        let input = vec![
            email("  Jane@Corp.COM ", "first"),
            email("jane@corp.com", "second"),
            email("JANE@CORP.COM\t", "third"),
        ];
        let output = deduplicate(&input);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].subject, "first");
    }

    #[test]
    fn test_first_seen_order() {
        let input = vec![
            email("c@x.com", "1"),
            email("a@x.com", "2"),
            email("c@x.com", "3"),
            email("b@x.com", "4"),
            email("a@x.com", "5"),
        ];
        let subjects: Vec<_> = deduplicate(&input).into_iter().map(|e| e.subject).collect();
        assert_eq!(subjects, ["1", "2", "4"]);
    }

    #[test]
    fn test_properties_over_generated_inputs() {
        let senders = ["a@x.com", "A@x.com", "b@y.org", " b@y.org", "", "c@z.io", "C@Z.IO "];
        // Deterministic pseudo-random sequences over a small sender alphabet
        let mut seed: u32 = 7;
        for len in 0..40 {
            let input: Vec<Email> = (0..len)
                .map(|i| {
                    seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                    let sender = senders[(seed >> 16) as usize % senders.len()];
                    email(sender, &i.to_string())
                })
                .collect();

            let once = deduplicate(&input);
            assert!(once.len() <= input.len());

            let mut keys: Vec<_> = once.iter().map(Email::normalized_sender).collect();
            let before = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), before, "duplicate sender in output");
            assert!(keys.iter().all(|k| !k.is_empty()));

            assert_eq!(deduplicate(&once), once, "not idempotent");
        }
    }

    #[test]
    fn test_empty_input() {
        let outcome = deduplicate_with_report(&[], &mut RunContext::new());
        assert!(outcome.emails.is_empty());
        assert_eq!(outcome.total, 0);
    }

    #[test]
    fn test_run_persists_artifacts() {
        let dir = tempdir().unwrap();
        let msg_out = dir.path().join("msg");
        let pst_out = dir.path().join("pst");

        JsonArtifactWriter::new(&msg_out, "20240101_000000")
            .unwrap()
            .write_emails("msg_emails", &[email("a@x.com", "one"), email("", "none")])
            .unwrap();
        JsonArtifactWriter::new(&pst_out, "20240101_000000")
            .unwrap()
            .write_emails("pst_emails", &[email("A@X.COM", "two"), email("b@y.com", "three")])
            .unwrap();

        let mut ctx = RunContext::new();
        let artifacts = Deduplicator::new(&dir.path().join("dedup"))
            .run(&[msg_out, pst_out, dir.path().join("missing")], &mut ctx)
            .unwrap()
            .unwrap();

        let report = ctx.finish();
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.dropped_no_sender, 1);
        assert!(report.warnings.iter().any(|w| w.contains("missing")));

        assert_eq!(artifacts.summary.total_emails_processed, 4);
        assert_eq!(artifacts.summary.unique_senders, 2);
        assert_eq!(artifacts.summary.duplicates_removed, 1);

        let saved: Vec<Email> =
            serde_json::from_str(&std::fs::read_to_string(&artifacts.emails_path).unwrap())
                .unwrap();
        assert_eq!(saved, vec![email("a@x.com", "one"), email("b@y.com", "three")]);

        let summary: DedupSummary =
            serde_json::from_str(&std::fs::read_to_string(&artifacts.summary_path).unwrap())
                .unwrap();
        assert_eq!(summary, artifacts.summary);
    }

    #[test]
    fn test_run_with_nothing_to_do() {
        let dir = tempdir().unwrap();
        let result = Deduplicator::new(&dir.path().join("dedup"))
            .run(&[dir.path().join("missing")], &mut RunContext::new())
            .unwrap();
        assert!(result.is_none());
        assert!(!dir.path().join("dedup").exists());
    }
}

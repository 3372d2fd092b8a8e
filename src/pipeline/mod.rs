//! Ingestion orchestration: discover containers, read, normalize, persist

use crate::config::Config;
use crate::context::{RunContext, RunReport};
use crate::email::Email;
use crate::error::Result;
use crate::normalize::EmailNormalizer;
use crate::output::{artifact_timestamp, JsonArtifactWriter};
use crate::reader::{ContainerKind, SourceReader};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use std::path::{Path, PathBuf};

/// Everything one ingestion run produced
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub kind: ContainerKind,
    pub emails: Vec<Email>,
    /// `None` when there was nothing to persist
    pub artifact: Option<PathBuf>,
    pub report: RunReport,
}

/// Sequential ingestion of one container family
///
/// Files are processed one at a time in file name order; each file is fully
/// read and normalized before the next one is opened.
pub struct IngestionPipeline {
    normalizer: EmailNormalizer,
    show_progress: bool,
}

impl IngestionPipeline {
    #[must_use]
    pub const fn new(config: &Config) -> Self {
        Self {
            normalizer: EmailNormalizer::new(),
            show_progress: config.show_progress,
        }
    }

    /// Ingest `input` and persist the aggregate into `output_dir`
    ///
    /// # Errors
    /// Returns an error only if the output artifact cannot be written.
    pub fn run(&self, kind: ContainerKind, input: &Path, output_dir: &Path) -> Result<IngestOutcome> {
        let mut ctx = RunContext::new();
        let emails = self.ingest(kind, input, &mut ctx);

        let artifact = if emails.is_empty() {
            ctx.warn(format!("No emails were extracted from {kind} files"));
            None
        } else {
            let writer = JsonArtifactWriter::new(output_dir, artifact_timestamp())?;
            Some(writer.write_emails(&format!("{}_emails", kind.extension()), &emails)?)
        };

        Ok(IngestOutcome {
            kind,
            emails,
            artifact,
            report: ctx.finish(),
        })
    }

    /// Ingest each family from its configured input into `config.output_dir`
    ///
    /// A family whose artifact cannot be saved is logged and skipped; the
    /// remaining families still run. Only the outcomes that ran to completion
    /// are returned.
    pub fn run_all(&self, config: &Config, kinds: &[ContainerKind]) -> Vec<IngestOutcome> {
        let mut outcomes = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            info!("Processing {kind} files");
            match self.run(kind, config.input_for(kind), &config.output_dir) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Error saving {kind} emails: {e}"),
            }
        }

        outcomes
    }

    /// Read and normalize every `kind` container under `input`, in discovery order
    pub fn ingest(&self, kind: ContainerKind, input: &Path, ctx: &mut RunContext) -> Vec<Email> {
        let files = collect_container_files(input, kind, ctx);
        if files.is_empty() {
            return Vec::new();
        }

        info!("Found {} {kind} file(s) to process", files.len());

        let reader = SourceReader::for_kind(kind);
        let progress_bar = self.progress_bar(files.len());
        let mut emails = Vec::new();

        for path in &files {
            let filename = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            progress_bar.set_message(filename.clone());

            let before = emails.len();
            self.ingest_file(&reader, path, ctx, &mut emails);
            debug!("Extracted {} emails from {filename}", emails.len() - before);

            progress_bar.inc(1);
        }

        progress_bar.finish_with_message(format!("{kind} processing complete"));
        info!(
            "Extracted {} emails from {} {kind} file(s)",
            emails.len(),
            files.len()
        );

        emails
    }

    /// Read one container; an unreadable container contributes nothing
    fn ingest_file(
        &self,
        reader: &SourceReader,
        path: &Path,
        ctx: &mut RunContext,
        emails: &mut Vec<Email>,
    ) {
        info!("Processing {} file: {}", reader.kind(), path.display());

        match reader.read(path, ctx) {
            Ok(records) => {
                ctx.file_processed();
                emails.extend(
                    records
                        .into_iter()
                        .filter_map(|record| self.normalizer.normalize(record, ctx)),
                );
            }
            Err(e) => {
                ctx.file_failed();
                error!("Error processing {} file {}: {e}", reader.kind(), path.display());
            }
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        ) {
            progress_bar.set_style(style.progress_chars("█▓░"));
        }
        progress_bar
    }
}

/// Container files of `kind` at `input`: the file itself, or the matching
/// files directly inside the directory, sorted by name
///
/// A missing location, a wrong extension or an empty directory produce a
/// warning and no files.
pub fn collect_container_files(input: &Path, kind: ContainerKind, ctx: &mut RunContext) -> Vec<PathBuf> {
    if input.is_file() {
        if ContainerKind::from_path(input) == Some(kind) {
            ctx.file_discovered(1);
            return vec![input.to_path_buf()];
        }
        ctx.warn(format!(
            "Input file is not a {kind} file: {}",
            input.display()
        ));
        return Vec::new();
    }

    if !input.is_dir() {
        ctx.warn(format!("Input directory {} does not exist", input.display()));
        return Vec::new();
    }

    let entries = match std::fs::read_dir(input) {
        Ok(entries) => entries,
        Err(e) => {
            ctx.warn(format!("Cannot read {}: {e}", input.display()));
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && ContainerKind::from_path(path) == Some(kind))
        .collect();
    files.sort();

    if files.is_empty() {
        ctx.warn(format!("No {kind} files found in {}", input.display()));
    }
    ctx.file_discovered(files.len());

    files
}

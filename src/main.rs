//! Mailbox ingest - normalize Outlook MSG/PST archives into JSON records
//!
//! Reads every message of the MSG and PST containers in the input folders,
//! maps them onto one email schema, and keeps one email per sender address
//! for downstream contact enrichment.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use mailbox_ingest::cli::{Args, Command};
use mailbox_ingest::classify::classify;
use mailbox_ingest::{
    Config, ContainerKind, Deduplicator, IngestionPipeline, RunContext, RunReport,
};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Mailbox ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from(&args);
    config.validate()?;

    let start = Instant::now();

    let ok = match args.command {
        Command::Classify => {
            classify(
                &config.unsorted_dir,
                &config.msg_input_dir,
                &config.pst_input_dir,
            )?;
            true
        }
        Command::Ingest { only } => {
            let kinds = only.map_or_else(|| vec![ContainerKind::Pst, ContainerKind::Msg], |k| vec![k.into()]);
            ingest(&config, &kinds) > 0
        }
        Command::Dedup => dedup(&config)?,
        Command::Run => {
            ingest(&config, &[ContainerKind::Pst, ContainerKind::Msg]);
            dedup(&config)?
        }
    };

    let elapsed = start.elapsed();
    info!("Completed in {elapsed:?}");

    if !ok {
        error!("No emails available. Stopping workflow.");
        std::process::exit(1);
    }

    Ok(())
}

/// Ingest each container family in turn; returns the number of emails extracted
fn ingest(config: &Config, kinds: &[ContainerKind]) -> usize {
    let outcomes = IngestionPipeline::new(config).run_all(config, kinds);

    outcomes
        .iter()
        .map(|outcome| {
            log_report(&outcome.kind.to_string(), &outcome.report);
            outcome.emails.len()
        })
        .sum()
}

/// Deduplicate the artifact folder; `false` when nothing was left
fn dedup(config: &Config) -> Result<bool> {
    info!("Deduplicating emails");
    let mut ctx = RunContext::new();
    let artifacts = Deduplicator::new(&config.dedup_output_dir)
        .run(&[config.output_dir.clone()], &mut ctx)?;
    log_report("Dedup", &ctx.finish());

    let Some(artifacts) = artifacts else {
        return Ok(false);
    };

    info!(
        "Deduplication completed: {} of {} emails kept, {} duplicates removed",
        artifacts.summary.unique_senders,
        artifacts.summary.total_emails_processed,
        artifacts.summary.duplicates_removed
    );
    info!("Output: {}", artifacts.emails_path.display());

    Ok(true)
}

fn log_report(stage: &str, report: &RunReport) {
    info!(
        "{stage}: {} file(s) found, {} processed, {} failed; {} messages read, {} failed; {} emails, {} without sender",
        report.files_discovered,
        report.files_processed,
        report.files_failed,
        report.messages_read,
        report.messages_failed,
        report.emails_emitted,
        report.dropped_no_sender,
    );
    if report.folders_failed > 0 {
        warn!("{stage}: {} folder(s) could not be read", report.folders_failed);
    }
}

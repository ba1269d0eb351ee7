//! Parallel locus picking.
//!
//! [`pick`] runs the whole pipeline:
//!
//! 1. transcripts are read from a JSON-lines file and chained into
//!    superloci ([`input`])
//! 2. a pool of workers decomposes the superloci and writes counter-tagged
//!    partial files ([`pool`], [`sink`])
//! 3. the partial files are merged back in input order, renaming genes and
//!    transcripts on the way ([`merge`])

pub mod analyse;
pub mod consts;
pub mod input;
pub mod merge;
pub mod pool;
pub mod sink;

use std::cell::Cell;
use std::fs::{create_dir_all, remove_file};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use loctars_loci::{metrics_header, scores_header};
use loctars_scoring::PickConfig;

use crate::consts::*;
use crate::input::{SuperlocusGrouper, TranscriptReader};
use crate::merge::{merge_gff, merge_loci, merge_table};
use crate::pool::{PartialFiles, run_pool};

// re-exports
pub use analyse::analyse_locus;
pub use merge::{LocusRenamer, RenameMap};
pub use sink::OutputRequest;

#[derive(Debug, Clone)]
pub struct PickOptions {
    /// JSON-lines transcripts, `-` for stdin.
    pub input: String,
    pub output_dir: PathBuf,
    pub request: OutputRequest,
}

#[derive(Debug, Clone, Default)]
pub struct PickSummary {
    pub superloci: usize,
    pub genes: usize,
    pub dropped_transcripts: usize,
    pub outputs: Vec<PathBuf>,
}

fn partials_for<'a>(partials: &'a PartialFiles, name: &str) -> &'a [PathBuf] {
    partials.get(name).map(|paths| paths.as_slice()).unwrap_or_default()
}

fn merge_outputs(
    partials: &PartialFiles,
    directory: &Path,
    config: &PickConfig,
    summary: &mut PickSummary,
) -> Result<()> {
    let metrics = metrics_header();
    let scores = scores_header(config);

    let path = directory.join(LOCI_GFF);
    let (renamed, genes) = merge_loci(
        partials_for(partials, LOCI_GFF),
        &path,
        &config.output_format.id_prefix,
    )?;
    summary.genes = genes;
    summary.outputs.push(path);

    for (name, header) in [(LOCI_METRICS, &metrics), (LOCI_SCORES, &scores)] {
        let path = directory.join(name);
        merge_table(partials_for(partials, name), &path, header, Some(&renamed))?;
        summary.outputs.push(path);
    }

    if partials.contains_key(SUBLOCI_GFF) {
        let path = directory.join(SUBLOCI_GFF);
        merge_gff(partials_for(partials, SUBLOCI_GFF), &path)?;
        summary.outputs.push(path);
        for (name, header) in [(SUBLOCI_METRICS, &metrics), (SUBLOCI_SCORES, &scores)] {
            let path = directory.join(name);
            merge_table(partials_for(partials, name), &path, header, None)?;
            summary.outputs.push(path);
        }
    }
    if partials.contains_key(MONOLOCI_GFF) {
        let path = directory.join(MONOLOCI_GFF);
        merge_gff(partials_for(partials, MONOLOCI_GFF), &path)?;
        summary.outputs.push(path);
    }
    Ok(())
}

fn remove_partials(partials: &PartialFiles) -> Result<()> {
    for path in partials.values().flatten() {
        remove_file(path).with_context(|| format!("Failed to remove {:?}", path))?;
        debug!("Removed {:?}", path);
    }
    Ok(())
}

///
/// Pick loci from a sorted transcript file and write the merged outputs.
///
/// # Arguments
///
/// - config: the picking configuration
/// - options: input, output directory and optional streams
///
pub fn pick(config: &PickConfig, options: &PickOptions) -> Result<PickSummary> {
    let directory = options.output_dir.as_path();
    create_dir_all(directory)
        .with_context(|| format!("Failed to create output directory {:?}", directory))?;

    let mut reader = TranscriptReader::from_path(&options.input)?;
    let superloci = SuperlocusGrouper::new(reader.by_ref());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")?
            .tick_strings(&["-", "\\", "|", "/"]),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Queueing superloci...");

    let queued = Cell::new(0usize);
    let partials = run_pool(superloci, config, directory, options.request, |count| {
        queued.set(count);
        spinner.set_message(format!("{} superloci queued", count));
    });
    spinner.finish_and_clear();
    let partials = partials?;

    let mut summary = PickSummary {
        superloci: queued.get(),
        dropped_transcripts: reader.dropped(),
        ..Default::default()
    };
    info!("Merging partial outputs into {:?}", directory);
    let merged = merge_outputs(&partials, directory, config, &mut summary);
    let removed = remove_partials(&partials);
    merged?;
    removed?;

    info!(
        "Wrote {} genes; {} input transcripts skipped",
        summary.genes, summary.dropped_transcripts
    );
    Ok(summary)
}

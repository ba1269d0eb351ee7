use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use loctars_core::utils::get_dynamic_writer;
use loctars_loci::{Level, Superlocus};
use loctars_scoring::PickConfig;

use crate::consts::*;

type DynWriter = BufWriter<Box<dyn Write + Send>>;

enum PartialWriter {
    Gff(DynWriter),
    Table(csv::Writer<DynWriter>),
}

/// Which optional streams to produce besides the loci.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputRequest {
    pub subloci: bool,
    pub monoloci: bool,
}

impl OutputRequest {
    /// Names of the output streams, loci first.
    pub fn streams(&self) -> Vec<&'static str> {
        let mut names = vec![LOCI_GFF, LOCI_METRICS, LOCI_SCORES];
        if self.subloci {
            names.extend([SUBLOCI_GFF, SUBLOCI_METRICS, SUBLOCI_SCORES]);
        }
        if self.monoloci {
            names.push(MONOLOCI_GFF);
        }
        names
    }
}

pub fn is_table(name: &str) -> bool {
    name.ends_with(".tsv")
}

pub fn partial_path(directory: &Path, name: &str, identifier: usize) -> PathBuf {
    directory.join(format!("{}-{}", name, identifier))
}

pub fn table_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer)
}

///
/// Private output files of one worker. Every record is prefixed with the
/// counter of the superlocus it comes from, so that the merge can restore
/// the input order.
///
pub struct PartialSink {
    identifier: usize,
    streams: BTreeMap<&'static str, (PathBuf, PartialWriter)>,
}

impl PartialSink {
    pub fn create(directory: &Path, identifier: usize, request: OutputRequest) -> Result<Self> {
        let mut streams = BTreeMap::new();
        for name in request.streams() {
            let path = partial_path(directory, name, identifier);
            let writer = get_dynamic_writer(&path)?;
            let writer = match is_table(name) {
                true => PartialWriter::Table(table_writer(writer)),
                false => PartialWriter::Gff(writer),
            };
            streams.insert(name, (path, writer));
        }
        Ok(PartialSink {
            identifier,
            streams,
        })
    }

    pub fn identifier(&self) -> usize {
        self.identifier
    }

    fn write_lines(&mut self, name: &str, counter: usize, lines: &[String]) -> Result<()> {
        if let Some((path, PartialWriter::Gff(writer))) = self.streams.get_mut(name) {
            for line in lines {
                writeln!(writer, "{}{}{}", counter, COUNTER_SEPARATOR, line)
                    .with_context(|| format!("Failed to write to {:?}", path))?;
            }
        }
        Ok(())
    }

    fn write_rows(&mut self, name: &str, counter: usize, rows: Vec<Vec<String>>) -> Result<()> {
        if let Some((path, PartialWriter::Table(writer))) = self.streams.get_mut(name) {
            for mut row in rows {
                if let Some(first) = row.first_mut() {
                    *first = format!("{}{}{}", counter, COUNTER_SEPARATOR, first);
                }
                writer
                    .write_record(&row)
                    .with_context(|| format!("Failed to write to {:?}", path))?;
            }
        }
        Ok(())
    }

    ///
    /// Write every requested stream for the superloci derived from one input superlocus.
    ///
    pub fn write(&mut self, counter: usize, superloci: &[Superlocus], config: &PickConfig) -> Result<()> {
        let source = config.output_format.source.as_str();
        let print_cds = !config.run_options.exclude_cds;

        for slocus in superloci {
            let lines = slocus.format_gff(Level::Loci, source, print_cds)?;
            self.write_lines(LOCI_GFF, counter, &lines)?;
            self.write_rows(LOCI_METRICS, counter, slocus.locus_metrics_rows())?;
            self.write_rows(LOCI_SCORES, counter, slocus.locus_score_rows(config))?;

            if self.streams.contains_key(SUBLOCI_GFF) {
                let lines = slocus.format_gff(Level::Subloci, source, print_cds)?;
                self.write_lines(SUBLOCI_GFF, counter, &lines)?;
                self.write_rows(SUBLOCI_METRICS, counter, slocus.sublocus_metrics_rows())?;
                self.write_rows(SUBLOCI_SCORES, counter, slocus.sublocus_score_rows(config))?;
            }
            if self.streams.contains_key(MONOLOCI_GFF) {
                let lines = slocus.format_gff(Level::Monosubloci, source, print_cds)?;
                self.write_lines(MONOLOCI_GFF, counter, &lines)?;
            }
        }
        Ok(())
    }

    ///
    /// Flush and close every file.
    ///
    /// # Returns
    ///
    /// The path of each partial file, by stream name.
    ///
    pub fn finish(self) -> Result<BTreeMap<&'static str, PathBuf>> {
        let mut paths = BTreeMap::new();
        for (name, (path, writer)) in self.streams {
            let flushed = match writer {
                PartialWriter::Gff(mut writer) => writer.flush(),
                PartialWriter::Table(mut writer) => writer.flush(),
            };
            flushed.with_context(|| format!("Failed to flush {:?}", path))?;
            paths.insert(name, path);
        }
        Ok(paths)
    }
}

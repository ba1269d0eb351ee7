use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use fxhash::FxHashMap;
use log::debug;

use loctars_core::models::GffLine;
use loctars_core::utils::{get_dynamic_reader, get_dynamic_writer};

use crate::consts::{COUNTER_SEPARATOR, GFF_VERSION_HEADER};
use crate::sink::table_writer;

/// Old id to new id, for genes and transcripts.
pub type RenameMap = FxHashMap<String, String>;

fn split_counter<'a>(value: &'a str, path: &Path) -> Result<(usize, &'a str)> {
    let (counter, rest) = value
        .split_once(COUNTER_SEPARATOR)
        .ok_or_else(|| anyhow!("Record without a counter in {:?}: {}", path, value))?;
    let counter = counter
        .parse::<usize>()
        .with_context(|| format!("Invalid counter in {:?}: {}", path, counter))?;
    Ok((counter, rest))
}

///
/// Read every partial file and group its lines by counter. No partial file is
/// sorted on its own, so everything is buffered before anything is written.
///
pub fn collect_lines(paths: &[PathBuf]) -> Result<BTreeMap<usize, Vec<String>>> {
    let mut blocks: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for path in paths {
        let reader = get_dynamic_reader(path)?;
        for line in reader.lines() {
            let line = line.with_context(|| format!("Failed to read {:?}", path))?;
            if line.is_empty() {
                continue;
            }
            let (counter, rest) = split_counter(&line, path)?;
            blocks.entry(counter).or_default().push(rest.to_string());
        }
    }
    Ok(blocks)
}

///
/// Concatenate the partial files in ascending counter order.
///
/// # Returns
///
/// The number of lines written.
///
pub fn merge_partial<W: Write>(paths: &[PathBuf], writer: &mut W) -> Result<usize> {
    let blocks = collect_lines(paths)?;
    let mut written = 0;
    for (_, lines) in blocks {
        for line in lines {
            writeln!(writer, "{}", line)?;
            written += 1;
        }
    }
    Ok(written)
}

pub fn merge_gff(paths: &[PathBuf], output: &Path) -> Result<usize> {
    let mut writer = get_dynamic_writer(output)?;
    writeln!(writer, "{}", GFF_VERSION_HEADER)?;
    let written = merge_partial(paths, &mut writer)?;
    writer.flush()?;
    Ok(written)
}

///
/// Merge tabular partial files under a header, in counter order. Values of
/// the first two columns (transcript and parent ids) found in `rename` are
/// replaced.
///
pub fn merge_table(
    paths: &[PathBuf],
    output: &Path,
    header: &[String],
    rename: Option<&RenameMap>,
) -> Result<usize> {
    let mut blocks: BTreeMap<usize, Vec<Vec<String>>> = BTreeMap::new();
    for path in paths {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_reader(get_dynamic_reader(path)?);
        for record in reader.records() {
            let record = record.with_context(|| format!("Failed to read {:?}", path))?;
            let mut row: Vec<String> = record.iter().map(|field| field.to_string()).collect();
            let Some(first) = row.first_mut() else {
                continue;
            };
            let (counter, tid) = split_counter(first, path)?;
            *first = tid.to_string();
            if let Some(rename) = rename {
                for field in row.iter_mut().take(2) {
                    if let Some(new) = rename.get(field.as_str()) {
                        *field = new.clone();
                    }
                }
            }
            blocks.entry(counter).or_default().push(row);
        }
    }

    let mut writer = table_writer(get_dynamic_writer(output)?);
    writer.write_record(header)?;
    let mut written = 0;
    for (_, rows) in blocks {
        for row in rows {
            writer.write_record(&row)?;
            written += 1;
        }
    }
    writer.flush()?;
    Ok(written)
}

struct TranscriptBlock {
    header: GffLine,
    children: Vec<GffLine>,
}

struct GeneBlock {
    gene: GffLine,
    transcripts: Vec<TranscriptBlock>,
}

///
/// Gives genes and transcripts their final names while the loci stream is
/// written in order: `{prefix}.{chrom}G{n}` for genes, numbered from 1 on
/// each chromosome, and `{gene}.{m}` for their transcripts, the primary
/// transcript first and the others by position. Fragments keep their ids
/// and do not use up a gene number.
///
pub struct LocusRenamer {
    prefix: String,
    current_chrom: Option<String>,
    gene_counter: usize,
    genes: usize,
    renamed: RenameMap,
}

impl LocusRenamer {
    pub fn new(prefix: &str) -> Self {
        LocusRenamer {
            prefix: prefix.to_string(),
            current_chrom: None,
            gene_counter: 0,
            genes: 0,
            renamed: RenameMap::default(),
        }
    }

    /// Number of genes renamed so far.
    pub fn genes(&self) -> usize {
        self.genes
    }

    pub fn into_map(self) -> RenameMap {
        self.renamed
    }

    fn next_gene_id(&mut self, chrom: &str) -> String {
        if self.current_chrom.as_deref() != Some(chrom) {
            self.current_chrom = Some(chrom.to_string());
            self.gene_counter = 0;
        }
        self.gene_counter += 1;
        self.genes += 1;
        format!("{}.{}G{}", self.prefix, chrom, self.gene_counter)
    }

    fn flush_gene(&mut self, block: GeneBlock, out: &mut Vec<String>) {
        let GeneBlock {
            mut gene,
            mut transcripts,
        } = block;

        if gene.attribute("fragment") == Some("True") {
            out.push(gene.to_string());
            for transcript in transcripts {
                out.push(transcript.header.to_string());
                out.extend(transcript.children.iter().map(|c| c.to_string()));
            }
            return;
        }

        let gene_id = self.next_gene_id(&gene.chrom);
        if let Some(old) = gene.id() {
            self.renamed.insert(old.to_string(), gene_id.clone());
        }
        gene.set_attribute("ID", &gene_id);
        out.push(gene.to_string());

        transcripts.sort_by_key(|t| {
            let primary = t.header.attribute("primary") == Some("True");
            (!primary, t.header.start, t.header.end)
        });

        for (n, transcript) in transcripts.into_iter().enumerate() {
            let TranscriptBlock {
                mut header,
                children,
            } = transcript;
            let old_tid = header.id().unwrap_or_default().to_string();
            let new_tid = format!("{}.{}", gene_id, n + 1);

            header.set_attribute("ID", &new_tid);
            header.set_attribute("Parent", &gene_id);
            header.set_attribute("alias", &old_tid);
            out.push(header.to_string());

            for mut child in children {
                if let Some(child_id) = child.id().map(|id| id.to_string()) {
                    let renamed = match child_id.strip_prefix(old_tid.as_str()) {
                        Some(rest) => format!("{}{}", new_tid, rest),
                        None => child_id,
                    };
                    child.set_attribute("ID", &renamed);
                }
                child.set_attribute("Parent", &new_tid);
                out.push(child.to_string());
            }
            self.renamed.insert(old_tid, new_tid);
        }
    }

    ///
    /// Rename the records of one superlocus block. Container lines and the
    /// block separator are passed through unchanged.
    ///
    pub fn process(&mut self, lines: &[String]) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(lines.len());
        let mut current: Option<GeneBlock> = None;

        for line in lines {
            if line.starts_with('#') {
                if let Some(block) = current.take() {
                    self.flush_gene(block, &mut out);
                }
                out.push(line.clone());
                continue;
            }

            let record: GffLine = line.parse()?;
            if record.is_gene() {
                if let Some(block) = current.take() {
                    self.flush_gene(block, &mut out);
                }
                current = Some(GeneBlock {
                    gene: record,
                    transcripts: Vec::new(),
                });
                continue;
            }

            let Some(block) = current.as_mut() else {
                out.push(record.to_string());
                continue;
            };
            if record.is_transcript() {
                block.transcripts.push(TranscriptBlock {
                    header: record,
                    children: Vec::new(),
                });
            } else if record.is_exon() && !block.transcripts.is_empty() {
                if let Some(transcript) = block.transcripts.last_mut() {
                    transcript.children.push(record);
                }
            } else {
                if let Some(block) = current.take() {
                    self.flush_gene(block, &mut out);
                }
                out.push(record.to_string());
            }
        }
        if let Some(block) = current.take() {
            self.flush_gene(block, &mut out);
        }
        Ok(out)
    }
}

///
/// Merge the loci partial files, renaming genes and transcripts on the way.
///
/// # Returns
///
/// The rename map and the number of genes written.
///
pub fn merge_loci(paths: &[PathBuf], output: &Path, prefix: &str) -> Result<(RenameMap, usize)> {
    let blocks = collect_lines(paths)?;
    let mut writer = get_dynamic_writer(output)?;
    writeln!(writer, "{}", GFF_VERSION_HEADER)?;

    let mut renamer = LocusRenamer::new(prefix);
    for (counter, lines) in blocks.iter() {
        debug!("Merging superlocus block {}", counter);
        for line in renamer.process(lines)? {
            writeln!(writer, "{}", line)?;
        }
    }
    writer.flush()?;

    let genes = renamer.genes();
    debug!("Renamed {} genes", genes);
    Ok((renamer.into_map(), genes))
}

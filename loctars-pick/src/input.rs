use std::io::{BufRead, BufReader, Lines, Read};

use anyhow::{Context, Result, bail};
use fxhash::FxHashSet;
use log::{debug, warn};

use loctars_core::models::Transcript;
use loctars_core::utils::get_dynamic_reader_w_stdin;
use loctars_loci::Superlocus;

///
/// Streams finalized transcripts from a JSON-lines file (`-` for stdin,
/// `.gz` accepted). Lines that do not hold a valid transcript are logged
/// and skipped.
///
pub struct TranscriptReader {
    lines: Lines<BufReader<Box<dyn Read>>>,
    line_number: usize,
    dropped: usize,
}

impl TranscriptReader {
    pub fn from_path(path: &str) -> Result<Self> {
        let reader = get_dynamic_reader_w_stdin(path)
            .with_context(|| format!("Failed to open transcripts from {}", path))?;
        Ok(TranscriptReader {
            lines: reader.lines(),
            line_number: 0,
            dropped: 0,
        })
    }

    /// Number of lines skipped so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Iterator for TranscriptReader {
    type Item = Result<Transcript>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e).context("Failed to read transcripts")),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut transcript: Transcript = match serde_json::from_str(&line) {
                Ok(transcript) => transcript,
                Err(e) => {
                    warn!("Skipping malformed line {}: {}", self.line_number, e);
                    self.dropped += 1;
                    continue;
                }
            };
            if let Err(e) = transcript.finalize() {
                warn!("Skipping invalid transcript on line {}: {}", self.line_number, e);
                self.dropped += 1;
                continue;
            }
            return Some(Ok(transcript));
        }
    }
}

///
/// Chains a position-sorted transcript stream into unstranded superloci.
///
/// A transcript joins the current superlocus while its span overlaps the
/// region grown so far; otherwise the superlocus is emitted and a new one
/// is started. Input that goes back in position, or revisits a chromosome,
/// is an error.
///
pub struct SuperlocusGrouper<I> {
    transcripts: I,
    current: Option<Superlocus>,
    last_position: Option<(String, u32)>,
    finished_chroms: FxHashSet<String>,
}

impl<I> SuperlocusGrouper<I>
where
    I: Iterator<Item = Result<Transcript>>,
{
    pub fn new(transcripts: I) -> Self {
        SuperlocusGrouper {
            transcripts,
            current: None,
            last_position: None,
            finished_chroms: FxHashSet::default(),
        }
    }

    fn check_order(&mut self, transcript: &Transcript) -> Result<()> {
        if let Some((chrom, start)) = self.last_position.as_ref() {
            if *chrom == transcript.chrom {
                if transcript.start < *start {
                    bail!(
                        "Input is not sorted: {} starts at {}:{} after a transcript starting at {}",
                        transcript.id,
                        transcript.chrom,
                        transcript.start,
                        start
                    );
                }
            } else {
                if self.finished_chroms.contains(&transcript.chrom) {
                    bail!(
                        "Input is not sorted: {} returns to chromosome {}",
                        transcript.id,
                        transcript.chrom
                    );
                }
                self.finished_chroms.insert(chrom.clone());
            }
        }
        self.last_position = Some((transcript.chrom.clone(), transcript.start));
        Ok(())
    }
}

impl<I> Iterator for SuperlocusGrouper<I>
where
    I: Iterator<Item = Result<Transcript>>,
{
    type Item = Result<Superlocus>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let transcript = match self.transcripts.next() {
                Some(Ok(transcript)) => transcript,
                Some(Err(e)) => return Some(Err(e)),
                None => return self.current.take().map(Ok),
            };
            if let Err(e) = self.check_order(&transcript) {
                return Some(Err(e));
            }

            let extends = self.current.as_ref().is_some_and(|s| s.in_locus(&transcript));
            match self.current.as_mut() {
                Some(superlocus) if extends => {
                    let tid = transcript.id.clone();
                    if let Err(e) = superlocus.add_transcript(transcript) {
                        warn!("Dropping {}: {}", tid, e);
                    }
                }
                _ => {
                    let tid = transcript.id.clone();
                    let next = match Superlocus::new(transcript, false) {
                        Ok(next) => next,
                        Err(e) => {
                            warn!("Dropping {}: {}", tid, e);
                            continue;
                        }
                    };
                    if let Some(done) = self.current.replace(next) {
                        debug!("Grouped {}", done);
                        return Some(Ok(done));
                    }
                }
            }
        }
    }
}

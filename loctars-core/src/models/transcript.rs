use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::errors::TranscriptError;
use crate::models::Strand;

/// A closed genomic interval `(start, end)`, 1-based.
pub type Segment = (u32, u32);

///
/// Metrics that only make sense relative to the container holding the transcript.
/// They are (re)computed by the sublocus every time its composition changes.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelativeMetrics {
    pub exon_fraction: f64,
    pub intron_fraction: f64,
    pub combined_cds_intron_fraction: f64,
    pub retained_introns: Vec<Segment>,
    pub retained_fraction: f64,
    pub proportion_verified_introns_inlocus: f64,
}

///
/// Transcript record, as handed over by the parsers.
///
/// The geometry fields are public so that parsers can fill them in; derived
/// geometry (introns, CDS introns, UTRs) is only available after [`Transcript::finalize`].
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub id: String,
    pub chrom: String,
    #[serde(default)]
    pub start: u32,
    #[serde(default)]
    pub end: u32,
    #[serde(default)]
    pub strand: Strand,
    pub exons: Vec<Segment>,
    #[serde(default)]
    pub cds: Vec<Segment>,
    #[serde(default)]
    pub has_start_codon: bool,
    #[serde(default)]
    pub has_stop_codon: bool,
    #[serde(default)]
    pub verified_introns: BTreeSet<Segment>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub parent: Option<String>,

    #[serde(skip)]
    pub score: Option<f64>,
    #[serde(skip)]
    pub metrics: RelativeMetrics,

    #[serde(skip)]
    introns: BTreeSet<Segment>,
    #[serde(skip)]
    combined_cds_introns: BTreeSet<Segment>,
    #[serde(skip)]
    five_utr: Vec<Segment>,
    #[serde(skip)]
    three_utr: Vec<Segment>,
    #[serde(skip)]
    finalized: bool,
}

impl Transcript {
    pub fn new(id: &str, chrom: &str, strand: Strand, exons: Vec<Segment>) -> Self {
        Transcript {
            id: id.to_string(),
            chrom: chrom.to_string(),
            start: 0,
            end: 0,
            strand,
            exons,
            cds: Vec::new(),
            has_start_codon: false,
            has_stop_codon: false,
            verified_introns: BTreeSet::new(),
            attributes: BTreeMap::new(),
            parent: None,
            score: None,
            metrics: RelativeMetrics::default(),
            introns: BTreeSet::new(),
            combined_cds_introns: BTreeSet::new(),
            five_utr: Vec::new(),
            three_utr: Vec::new(),
            finalized: false,
        }
    }

    /// Builder-style helper to attach CDS segments before finalization.
    pub fn with_cds(mut self, cds: Vec<Segment>) -> Self {
        self.cds = cds;
        self.finalized = false;
        self
    }

    ///
    /// Validate the geometry and compute the derived sets.
    ///
    /// Calling this more than once is a no-op.
    ///
    pub fn finalize(&mut self) -> Result<(), TranscriptError> {
        if self.finalized {
            return Ok(());
        }
        if self.exons.is_empty() {
            return Err(TranscriptError::NoExons(self.id.clone()));
        }
        for &(start, end) in self.exons.iter().chain(self.cds.iter()) {
            if start > end {
                return Err(TranscriptError::InvertedSegment(self.id.clone(), start, end));
            }
        }

        self.exons.sort_unstable();
        self.exons.dedup();
        // exons must leave an intron of at least one base between them
        for w in self.exons.windows(2) {
            let (first, second) = (w[0], w[1]);
            if second.0 <= first.1 {
                return Err(TranscriptError::OverlappingExons(
                    self.id.clone(),
                    first.0,
                    first.1,
                    second.0,
                    second.1,
                ));
            }
            if second.0 == first.1 + 1 {
                return Err(TranscriptError::TouchingExons(
                    self.id.clone(),
                    first.0,
                    first.1,
                    second.0,
                    second.1,
                ));
            }
        }

        let exon_start = self.exons[0].0;
        let exon_end = self.exons[self.exons.len() - 1].1;
        if self.start == 0 && self.end == 0 {
            self.start = exon_start;
            self.end = exon_end;
        } else if self.start != exon_start || self.end != exon_end {
            return Err(TranscriptError::SpanMismatch {
                id: self.id.clone(),
                start: self.start,
                end: self.end,
                exon_start,
                exon_end,
            });
        }

        self.introns = self
            .exons
            .windows(2)
            .map(|w| (w[0].1 + 1, w[1].0 - 1))
            .collect();

        self.cds.sort_unstable();
        self.cds.dedup();
        for &(start, end) in self.cds.iter() {
            if !self.exons.iter().any(|&(es, ee)| es <= start && end <= ee) {
                return Err(TranscriptError::CdsOutsideExons(self.id.clone(), start, end));
            }
        }

        self.combined_cds_introns.clear();
        self.five_utr.clear();
        self.three_utr.clear();
        if let (Some(&(cds_start, _)), Some(&(_, cds_end))) = (self.cds.first(), self.cds.last()) {
            self.combined_cds_introns = self
                .introns
                .iter()
                .filter(|intron| intron.0 > cds_start && intron.1 < cds_end)
                .copied()
                .collect();

            let mut left = Vec::new();
            let mut right = Vec::new();
            for &(start, end) in self.exons.iter() {
                if start < cds_start {
                    left.push((start, end.min(cds_start - 1)));
                }
                if end > cds_end {
                    right.push((start.max(cds_end + 1), end));
                }
            }
            match self.strand {
                Strand::Minus => {
                    self.five_utr = right;
                    self.three_utr = left;
                }
                _ => {
                    self.five_utr = left;
                    self.three_utr = right;
                }
            }
        }

        self.finalized = true;
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn monoexonic(&self) -> bool {
        self.exons.len() == 1
    }

    pub fn is_coding(&self) -> bool {
        !self.cds.is_empty()
    }

    pub fn span(&self) -> Segment {
        (self.start, self.end)
    }

    /// Introns as closed intervals between consecutive exons.
    pub fn introns(&self) -> &BTreeSet<Segment> {
        &self.introns
    }

    /// Splice junctions; for this model they coincide with the introns.
    pub fn junctions(&self) -> &BTreeSet<Segment> {
        &self.introns
    }

    /// Introns lying strictly inside the CDS.
    pub fn combined_cds_introns(&self) -> &BTreeSet<Segment> {
        &self.combined_cds_introns
    }

    pub fn five_utr(&self) -> &[Segment] {
        &self.five_utr
    }

    pub fn three_utr(&self) -> &[Segment] {
        &self.three_utr
    }

    /// First CDS base in the direction of transcription.
    pub fn combined_cds_start(&self) -> Option<u32> {
        match self.strand {
            Strand::Minus => self.cds.last().map(|c| c.1),
            _ => self.cds.first().map(|c| c.0),
        }
    }

    pub fn cdna_length(&self) -> u32 {
        self.exons.iter().map(|(s, e)| e - s + 1).sum()
    }

    pub fn exon_num(&self) -> usize {
        self.exons.len()
    }

    pub fn max_intron_length(&self) -> u32 {
        self.introns.iter().map(|(s, e)| e - s + 1).max().unwrap_or(0)
    }

    pub fn min_intron_length(&self) -> u32 {
        self.introns.iter().map(|(s, e)| e - s + 1).min().unwrap_or(0)
    }

    pub fn combined_cds_length(&self) -> u32 {
        self.cds.iter().map(|(s, e)| e - s + 1).sum()
    }

    pub fn combined_cds_num(&self) -> usize {
        self.cds.len()
    }

    pub fn combined_cds_fraction(&self) -> f64 {
        let cdna = self.cdna_length();
        if cdna == 0 {
            return 0.0;
        }
        self.combined_cds_length() as f64 / cdna as f64
    }

    pub fn five_utr_length(&self) -> u32 {
        self.five_utr.iter().map(|(s, e)| e - s + 1).sum()
    }

    pub fn three_utr_length(&self) -> u32 {
        self.three_utr.iter().map(|(s, e)| e - s + 1).sum()
    }

    pub fn combined_utr_length(&self) -> u32 {
        self.five_utr_length() + self.three_utr_length()
    }

    pub fn is_complete(&self) -> bool {
        self.has_start_codon && self.has_stop_codon
    }

    pub fn verified_introns_num(&self) -> usize {
        self.verified_introns.intersection(&self.introns).count()
    }

    pub fn proportion_verified_introns(&self) -> f64 {
        if self.introns.is_empty() {
            return 0.0;
        }
        self.verified_introns_num() as f64 / self.introns.len() as f64
    }

    /// Key used to order transcripts by position, with the id as last resort.
    pub fn position_key(&self) -> (u32, u32, &str) {
        (self.start, self.end, self.id.as_str())
    }
}

impl Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}:{}-{}\t{}",
            self.id, self.chrom, self.start, self.end, self.strand
        )
    }
}

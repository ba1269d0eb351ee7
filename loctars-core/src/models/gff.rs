use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::GffError;
use crate::models::Strand;

///
/// A single GFF3 record. Attributes keep their insertion order so that
/// `ID` and `Parent` are always written first.
///
#[derive(Debug, Clone, PartialEq)]
pub struct GffLine {
    pub chrom: String,
    pub source: String,
    pub feature: String,
    pub start: u32,
    pub end: u32,
    pub score: Option<f64>,
    pub strand: Strand,
    pub phase: Option<u8>,
    pub attributes: Vec<(String, String)>,
}

impl GffLine {
    pub fn new(chrom: &str, source: &str, feature: &str, start: u32, end: u32, strand: Strand) -> Self {
        GffLine {
            chrom: chrom.to_string(),
            source: source.to_string(),
            feature: feature.to_string(),
            start,
            end,
            score: None,
            strand,
            phase: None,
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any previous value in place.
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("ID")
    }

    pub fn parent(&self) -> Option<&str> {
        self.attribute("Parent")
    }

    pub fn is_gene(&self) -> bool {
        self.feature == "gene"
    }

    pub fn is_transcript(&self) -> bool {
        matches!(self.feature.as_str(), "transcript" | "mRNA" | "ncRNA")
    }

    pub fn is_exon(&self) -> bool {
        matches!(
            self.feature.as_str(),
            "exon" | "CDS" | "five_prime_UTR" | "three_prime_UTR"
        )
    }
}

impl FromStr for GffLine {
    type Err = GffError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
        if fields.len() != 9 {
            return Err(GffError::FieldCount(fields.len(), line.to_string()));
        }

        let start = fields[3]
            .parse::<u32>()
            .map_err(|_| GffError::InvalidCoordinate(fields[3].to_string()))?;
        let end = fields[4]
            .parse::<u32>()
            .map_err(|_| GffError::InvalidCoordinate(fields[4].to_string()))?;
        let score = match fields[5] {
            "." => None,
            raw => Some(
                raw.parse::<f64>()
                    .map_err(|_| GffError::InvalidScore(raw.to_string()))?,
            ),
        };
        let strand =
            Strand::from_str(fields[6]).map_err(|_| GffError::InvalidStrand(fields[6].to_string()))?;
        let phase = fields[7].parse::<u8>().ok();

        let attributes = fields[8]
            .split(';')
            .filter(|kv| !kv.is_empty())
            .filter_map(|kv| {
                kv.split_once('=')
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            })
            .collect();

        Ok(GffLine {
            chrom: fields[0].to_string(),
            source: fields[1].to_string(),
            feature: fields[2].to_string(),
            start,
            end,
            score,
            strand,
            phase,
            attributes,
        })
    }
}

impl Display for GffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score = self
            .score
            .map_or(".".to_string(), |s| format!("{:.2}", s));
        let phase = self.phase.map_or(".".to_string(), |p| p.to_string());
        let attributes = self
            .attributes
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(";");
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.source,
            self.feature,
            self.start,
            self.end,
            score,
            self.strand,
            phase,
            attributes
        )
    }
}

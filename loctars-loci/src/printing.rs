use std::collections::BTreeMap;

use loctars_core::models::{GffLine, Segment, Strand, Transcript};
use loctars_scoring::{Metric, PickConfig};

/// Column value for a missing number.
pub const NA: &str = "NA";

/// Marker closing a superlocus block in GFF output.
pub const BLOCK_SEPARATOR: &str = "###";

/// Round to two decimals; integral values print without a fraction.
pub fn format_value(value: f64) -> String {
    format!("{}", (value * 100.0).round() / 100.0)
}

fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

///
/// Header line of a container (superlocus, sublocus, gene, ...).
///
pub fn container_line(
    feature: &str,
    id: &str,
    parent: Option<&str>,
    span: (&str, u32, u32, Strand),
    source: &str,
) -> GffLine {
    let (chrom, start, end, strand) = span;
    let mut line = GffLine::new(chrom, source, feature, start, end, strand);
    line.set_attribute("ID", id);
    if let Some(parent) = parent {
        line.set_attribute("Parent", parent);
    }
    line
}

fn cds_phases(transcript: &Transcript) -> Vec<(Segment, u8)> {
    let mut ordered = transcript.cds.clone();
    if transcript.strand == Strand::Minus {
        ordered.reverse();
    }
    let mut covered = 0u32;
    let mut phases: Vec<(Segment, u8)> = ordered
        .into_iter()
        .map(|segment| {
            let phase = ((3 - covered % 3) % 3) as u8;
            covered += segment.1 - segment.0 + 1;
            (segment, phase)
        })
        .collect();
    phases.sort_unstable();
    phases
}

///
/// GFF3 lines of a transcript and its children.
///
/// # Arguments
///
/// - transcript: a finalized transcript
/// - parent: id of the containing record
/// - source: value of the source column
/// - print_cds: when false, only exon children are written
/// - extra: attributes written after `ID` and `Parent`
///
pub fn transcript_lines(
    transcript: &Transcript,
    parent: &str,
    source: &str,
    print_cds: bool,
    extra: &[(&str, &str)],
) -> Vec<GffLine> {
    let tid = transcript.id.as_str();
    let feature = if transcript.is_coding() { "mRNA" } else { "transcript" };
    let mut header = container_line(
        feature,
        tid,
        Some(parent),
        (&transcript.chrom, transcript.start, transcript.end, transcript.strand),
        source,
    );
    header.score = transcript.score;
    for (key, value) in extra {
        header.set_attribute(key, value);
    }
    for (key, value) in transcript.attributes.iter() {
        if key != "ID" && key != "Parent" {
            header.set_attribute(key, value);
        }
    }

    let child = |feature: &str, n: usize, segment: Segment| {
        container_line(
            feature,
            &format!("{}.{}{}", tid, feature, n),
            Some(tid),
            (&transcript.chrom, segment.0, segment.1, transcript.strand),
            source,
        )
    };

    let mut lines = vec![header];
    for (n, exon) in transcript.exons.iter().enumerate() {
        lines.push(child("exon", n + 1, *exon));
    }
    if !print_cds || !transcript.is_coding() {
        return lines;
    }

    let mut features: Vec<GffLine> = Vec::new();
    for (n, segment) in transcript.five_utr().iter().enumerate() {
        features.push(child("five_prime_UTR", n + 1, *segment));
    }
    for (n, (segment, phase)) in cds_phases(transcript).into_iter().enumerate() {
        let mut line = child("CDS", n + 1, segment);
        line.phase = Some(phase);
        features.push(line);
    }
    for (n, segment) in transcript.three_utr().iter().enumerate() {
        features.push(child("three_prime_UTR", n + 1, *segment));
    }
    features.sort_by_key(|line| (line.start, line.end));
    lines.extend(features);
    lines
}

pub fn metrics_header() -> Vec<String> {
    ["tid", "parent", "score"]
        .iter()
        .map(|s| s.to_string())
        .chain(Metric::ALL.iter().map(|m| m.name().to_string()))
        .collect()
}

///
/// One row of the metrics table: id, parent, score, then every registered metric.
///
pub fn metrics_row(transcript: &Transcript, parent: &str) -> Vec<String> {
    let mut row = vec![
        transcript.id.clone(),
        parent.to_string(),
        transcript.score.map_or(NA.to_string(), format_value),
    ];
    for metric in Metric::ALL {
        let value = metric.value(transcript);
        row.push(match metric.is_boolean() {
            true => format_bool(value > 0.0).to_string(),
            false => format_value(value),
        });
    }
    row
}

pub fn scores_header(config: &PickConfig) -> Vec<String> {
    ["tid", "parent", "score"]
        .iter()
        .map(|s| s.to_string())
        .chain(config.scoring_keys().into_iter().map(|k| k.to_string()))
        .collect()
}

///
/// One row of the scores table: id, parent, total score, then one column per scoring metric.
///
pub fn scores_row(
    transcript: &Transcript,
    parent: &str,
    scores: Option<&BTreeMap<&'static str, f64>>,
    config: &PickConfig,
) -> Vec<String> {
    let mut row = vec![
        transcript.id.clone(),
        parent.to_string(),
        transcript.score.map_or(NA.to_string(), format_value),
    ];
    for key in config.scoring_keys() {
        row.push(
            scores
                .and_then(|s| s.get(key))
                .map_or(NA.to_string(), |v| format_value(*v)),
        );
    }
    row
}

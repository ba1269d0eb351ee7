use loctars_core::models::{Segment, Transcript};

///
/// Signed overlap length of two closed intervals.
/// Values `<= 0` mean the intervals do not overlap; negative values give the gap size.
///
#[inline]
pub fn overlap(first: Segment, second: Segment) -> i64 {
    first.1.min(second.1) as i64 - first.0.max(second.0) as i64 + 1
}

/// True if `inner` lies entirely within `outer`.
#[inline]
pub fn contains(outer: Segment, inner: Segment) -> bool {
    outer.0 <= inner.0 && inner.1 <= outer.1
}

///
/// Clustering predicate used to build subloci:
///
/// - both multiexonic: at least one shared splice junction
/// - both monoexonic: the spans overlap
/// - one of each: never
///
/// A transcript never intersects itself.
///
pub fn is_intersecting(transcript: &Transcript, other: &Transcript) -> bool {
    if transcript.id == other.id {
        return false;
    }
    match (transcript.monoexonic(), other.monoexonic()) {
        (false, false) => transcript
            .junctions()
            .iter()
            .any(|junction| other.junctions().contains(junction)),
        (true, true) => overlap(transcript.span(), other.span()) > 0,
        _ => false,
    }
}

///
/// Coarser predicate used when merging monosubloci into loci:
/// two transcripts intersect when any of their exons overlap.
///
pub fn exonic_overlap(transcript: &Transcript, other: &Transcript) -> bool {
    if transcript.id == other.id {
        return false;
    }
    if overlap(transcript.span(), other.span()) <= 0 {
        return false;
    }
    transcript
        .exons
        .iter()
        .any(|exon| other.exons.iter().any(|oexon| overlap(*exon, *oexon) > 0))
}

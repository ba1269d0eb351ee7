//! Decomposition of whole superloci: subloci, monosubloci, loci and fragments.

use loctars_core::models::{Segment, Strand, Transcript};
use loctars_loci::{Level, Superlocus, remove_fragments};
use loctars_overlaprs::{exonic_overlap, is_intersecting};
use loctars_scoring::PickConfig;
use pretty_assertions::assert_eq;
use rstest::*;

fn transcript(id: &str, strand: Strand, exons: Vec<Segment>) -> Transcript {
    Transcript::new(id, "chr5", strand, exons)
}

fn superlocus(transcripts: Vec<Transcript>) -> Superlocus {
    let mut iter = transcripts.into_iter();
    let mut superlocus = Superlocus::new(iter.next().unwrap(), false).unwrap();
    for t in iter {
        superlocus.add_transcript(t).unwrap();
    }
    superlocus
}

fn config(purge: bool) -> PickConfig {
    format!(
        r#"
[scoring.cdna_length]
rescaling = "max"

[requirements]
expression = "cdna_length and exon_fraction"

[requirements.parameters.cdna_length]
operator = "ge"
value = 150

[requirements.parameters.exon_fraction]
operator = "lt"
value = 0.35

[run_options]
purge = {}
"#,
        purge
    )
    .parse()
    .unwrap()
}

///
/// Every transcript shares the (101, 200) junction. "x" is too short; once it
/// is gone, "y" holds 4 of the 10 remaining exons and fails too.
///
#[fixture]
fn cascading() -> Superlocus {
    superlocus(vec![
        transcript("keep1", Strand::Plus, vec![(1, 100), (201, 330)]),
        transcript("keep2", Strand::Plus, vec![(11, 100), (201, 310)]),
        transcript("keep3", Strand::Plus, vec![(21, 100), (201, 320)]),
        transcript(
            "y",
            Strand::Plus,
            vec![(31, 100), (201, 250), (351, 400), (501, 600)],
        ),
        transcript("x", Strand::Plus, vec![(81, 100), (201, 230)]),
    ])
}

#[rstest]
fn test_two_subloci_end_to_end() {
    let slocus = superlocus(vec![
        transcript("first", Strand::Plus, vec![(1001, 1200), (1501, 1800)]),
        transcript("second", Strand::Plus, vec![(1101, 1200), (1501, 1900)]),
        transcript("third", Strand::Plus, vec![(1001, 1300), (1601, 1800)]),
    ]);
    let mut split = slocus.split_strands().unwrap();
    assert_eq!(split.len(), 1);

    let slocus = &mut split[0];
    slocus.define_subloci().unwrap();
    let mut members: Vec<Vec<String>> = slocus
        .subloci()
        .iter()
        .map(|s| s.transcripts().keys().cloned().collect())
        .collect();
    members.sort();
    assert_eq!(
        members,
        vec![
            vec!["first".to_string(), "second".to_string()],
            vec!["third".to_string()]
        ]
    );
}

#[rstest]
fn test_fixed_point_ends_in_excluded(mut cascading: Superlocus) {
    let config = config(true);
    cascading.define_subloci().unwrap();
    assert_eq!(cascading.subloci().len(), 1);

    cascading.define_loci(&config).unwrap();
    let excluded: Vec<&str> = cascading
        .excluded()
        .transcripts()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(excluded, vec!["x", "y"]);
    assert!(cascading.excluded().transcripts().all(|t| t.score == Some(0.0)));

    let sublocus = &cascading.subloci()[0];
    assert_eq!(sublocus.len(), 3);
    assert!(sublocus.failed().contains("x"));
    assert!(sublocus.failed().contains("y"));

    let loci: Vec<&str> = cascading
        .loci()
        .iter()
        .map(|l| l.transcript.id.as_str())
        .collect();
    assert_eq!(loci, vec!["keep1"]);

    // three sublocus rows, then the two excluded ones
    let rows = cascading.sublocus_metrics_rows();
    assert_eq!(rows.len(), 5);
    assert!(rows[3][1].starts_with("excluded:"));
}

#[rstest]
fn test_failures_without_purge_stay_in_place(mut cascading: Superlocus) {
    let config = config(false);
    cascading.define_monosubloci(&config).unwrap();

    assert!(cascading.excluded().is_empty());
    let sublocus = &cascading.subloci()[0];
    assert_eq!(sublocus.len(), 5);
    assert_eq!(sublocus.get("x").unwrap().score, Some(0.0));
    // "x" never leaves the pool, so "y" keeps passing
    assert!(!sublocus.failed().contains("y"));
}

#[rstest]
fn test_monosubloci_never_intersect() {
    let mut transcripts = Vec::new();
    for i in 0..16u32 {
        let offset = (i % 5) * 20;
        let exons = vec![
            (1 + offset, 100 + offset),
            (201 + (i % 3) * 30, 400 + i * 10),
            (601 + (i % 2) * 50, 700 + i * 5),
        ];
        transcripts.push(transcript(&format!("t{:02}", i), Strand::Plus, exons));
    }
    let config: PickConfig = "[scoring.cdna_length]\nrescaling = \"max\"\n".parse().unwrap();

    let pristine = superlocus(transcripts);
    let mut first = pristine.clone();
    let mut second = pristine;
    first.define_loci(&config).unwrap();
    second.define_loci(&config).unwrap();

    let winners: Vec<&Transcript> = first.monosubloci().iter().map(|m| &m.transcript).collect();
    for a in winners.iter() {
        for b in winners.iter() {
            assert!(!is_intersecting(a, b));
        }
    }
    let loci: Vec<&Transcript> = first.loci().iter().map(|l| &l.transcript).collect();
    for a in loci.iter() {
        for b in loci.iter() {
            assert!(!exonic_overlap(a, b));
        }
    }

    let ids = |s: &Superlocus| -> Vec<String> {
        s.monosubloci()
            .iter()
            .map(|m| m.transcript.id.clone())
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[rstest]
#[case(50, true)]
#[case(500, false)]
fn test_fragment_threshold(#[case] cds_length: u32, #[case] is_fragment: bool) {
    let config: PickConfig = "[scoring.cdna_length]\nrescaling = \"max\"\n".parse().unwrap();
    let host = Transcript::new(
        "host",
        "chr5",
        Strand::Plus,
        vec![(1001, 2000), (3001, 4000)],
    )
    .with_cds(vec![(1201, 2000), (3001, 3800)]);
    let mono = Transcript::new("mono", "chr5", Strand::Plus, vec![(1101, 1900)])
        .with_cds(vec![(1201, 1200 + cds_length)]);

    // different subloci, but the exons overlap: run them as separate
    // superloci so that the holder does not merge them
    let mut batch = Vec::new();
    for t in [host, mono] {
        let mut s = Superlocus::new(t, true).unwrap();
        s.define_loci(&config).unwrap();
        batch.push(s);
    }

    let mut flagged = batch.clone();
    let found = remove_fragments(&mut flagged, 100, false);
    assert_eq!(found, usize::from(is_fragment));
    assert_eq!(flagged[1].loci()[0].is_fragment, is_fragment);
    let gff = flagged[1].format_gff(Level::Loci, "loctars", true).unwrap();
    assert_eq!(gff[1].contains("fragment=True"), is_fragment);

    let mut removed = batch;
    remove_fragments(&mut removed, 100, true);
    assert_eq!(removed[1].loci().is_empty(), is_fragment);
    assert_eq!(removed[0].loci().len(), 1);
}

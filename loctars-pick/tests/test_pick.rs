use std::fs::{read_dir, read_to_string, write};
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::{TempDir, tempdir};

use loctars_pick::consts::*;
use loctars_pick::merge::{merge_gff, merge_table};
use loctars_pick::{OutputRequest, PickOptions, pick};
use loctars_scoring::PickConfig;

fn write_partial(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    write(&path, lines.join("\n") + "\n").unwrap();
    path
}

#[fixture]
fn shuffled_partials() -> (TempDir, Vec<PathBuf>) {
    let dir = tempdir().unwrap();
    let paths = [vec![5, 1, 9], vec![2, 8], vec![3, 4, 6, 7]]
        .iter()
        .enumerate()
        .map(|(worker, counters)| {
            let lines: Vec<String> = counters
                .iter()
                .map(|c| format!("{}/t{}\tlocus{}\t{}", c, c, c, c))
                .collect();
            write_partial(dir.path(), &format!("part-{}", worker), &lines)
        })
        .collect();
    (dir, paths)
}

#[rstest]
fn test_merge_restores_input_order(shuffled_partials: (TempDir, Vec<PathBuf>)) {
    let (dir, paths) = shuffled_partials;
    let output = dir.path().join("merged.gff3");
    let written = merge_gff(&paths, &output).unwrap();
    assert_eq!(written, 9);

    let merged = read_to_string(&output).unwrap();
    let counters: Vec<String> = merged
        .lines()
        .skip(1)
        .map(|l| l.split('\t').next().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (1..=9).map(|c| format!("t{}", c)).collect();
    assert_eq!(counters, expected);
    assert_eq!(merged.lines().next(), Some(GFF_VERSION_HEADER));
}

#[rstest]
fn test_merge_table_header_first(shuffled_partials: (TempDir, Vec<PathBuf>)) {
    let (dir, paths) = shuffled_partials;
    let output = dir.path().join("merged.tsv");
    let header: Vec<String> = ["tid", "parent", "score"].iter().map(|s| s.to_string()).collect();
    merge_table(&paths, &output, &header, None).unwrap();

    let merged = read_to_string(&output).unwrap();
    let lines: Vec<&str> = merged.lines().collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0], "tid\tparent\tscore");
    assert_eq!(lines[1], "t1\tlocus1\t1");
    assert_eq!(lines[9], "t9\tlocus9\t9");
}

const TRANSCRIPTS: &str = r#"{"id": "a", "chrom": "chr1", "strand": "+", "exons": [[1, 100], [201, 300]]}
{"id": "b", "chrom": "chr1", "strand": "+", "exons": [[1, 100], [201, 400]]}
{"id": "c", "chrom": "chr1", "strand": "+", "exons": [[1000, 1100], [1201, 1300]]}
{"id": "d", "chrom": "chr2", "strand": "-", "exons": [[1, 500]]}
"#;

#[rstest]
#[case(1)]
#[case(3)]
fn test_pick_end_to_end(#[case] threads: usize) {
    let dir = tempdir().unwrap();
    let input = dir.path().join("transcripts.jsonl");
    write(&input, TRANSCRIPTS).unwrap();

    let text = format!(
        "[scoring.cdna_length]\nrescaling = \"max\"\n\n[run_options]\nthreads = {}\n\n[output_format]\nid_prefix = \"test\"\n",
        threads
    );
    let config: PickConfig = text.parse().unwrap();
    let output_dir = dir.path().join("out");
    let options = PickOptions {
        input: input.to_str().unwrap().to_string(),
        output_dir: output_dir.clone(),
        request: OutputRequest {
            subloci: true,
            monoloci: true,
        },
    };

    let summary = pick(&config, &options).unwrap();
    assert_eq!(summary.superloci, 3);
    assert_eq!(summary.genes, 3);
    assert_eq!(summary.dropped_transcripts, 0);

    // partial files are gone
    let mut names: Vec<String> = read_dir(&output_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            LOCI_GFF,
            LOCI_METRICS,
            LOCI_SCORES,
            MONOLOCI_GFF,
            SUBLOCI_GFF,
            SUBLOCI_METRICS,
            SUBLOCI_SCORES
        ]
    );

    let gff = read_to_string(output_dir.join(LOCI_GFF)).unwrap();
    assert!(gff.contains("ID=test.chr1G1.1;"));
    assert!(gff.contains("alias=b"));
    assert!(gff.contains("ID=test.chr1G2.1;"));
    assert!(gff.contains("ID=test.chr2G1;"));
    assert!(!gff.contains("alias=a"));

    let metrics = read_to_string(output_dir.join(LOCI_METRICS)).unwrap();
    let tids: Vec<&str> = metrics
        .lines()
        .skip(1)
        .map(|l| l.split('\t').next().unwrap())
        .collect();
    assert_eq!(tids, vec!["test.chr1G1.1", "test.chr1G2.1", "test.chr2G1.1"]);
    let first: Vec<&str> = metrics.lines().nth(1).unwrap().split('\t').collect();
    assert_eq!(first[1], "test.chr1G1");

    // both a and b stay in the subloci output
    let subloci = read_to_string(output_dir.join(SUBLOCI_METRICS)).unwrap();
    assert_eq!(subloci.lines().count(), 5);
}

/// Two transcripts per region, the longer one always wins; a few broken records mixed in.
fn many_regions() -> String {
    let mut lines = Vec::new();
    for (chrom, regions) in [("chr1", 30u32), ("chr2", 20u32)] {
        for i in 0..regions {
            let b = 1 + i * 10_000;
            lines.push(format!(
                r#"{{"id": "{c}_{i}_a", "chrom": "{c}", "strand": "+", "exons": [[{}, {}], [{}, {}]]}}"#,
                b,
                b + 99,
                b + 200,
                b + 299,
                c = chrom,
                i = i
            ));
            if chrom == "chr1" && i == 11 {
                // same id again in the same region
                lines.push(lines[lines.len() - 1].clone());
            }
            lines.push(format!(
                r#"{{"id": "{c}_{i}_b", "chrom": "{c}", "strand": "+", "exons": [[{}, {}], [{}, {}]]}}"#,
                b,
                b + 99,
                b + 200,
                b + 399,
                c = chrom,
                i = i
            ));
            if chrom == "chr1" && i == 3 {
                lines.push("{\"id\": \"broken\", \"chrom\":".to_string());
            }
            if chrom == "chr1" && i == 7 {
                lines.push(format!(
                    r#"{{"id": "touching", "chrom": "chr1", "strand": "+", "exons": [[{}, {}], [{}, {}]]}}"#,
                    b + 10,
                    b + 99,
                    b + 100,
                    b + 150
                ));
            }
        }
    }
    lines.join("\n") + "\n"
}

fn run_many_regions(dir: &Path, threads: usize) -> (loctars_pick::PickSummary, PathBuf) {
    let input = dir.join(format!("regions-{}.jsonl", threads));
    write(&input, many_regions()).unwrap();
    let text = format!(
        "[scoring.cdna_length]\nrescaling = \"max\"\n\n[run_options]\nthreads = {}\n\n[output_format]\nid_prefix = \"run\"\n",
        threads
    );
    let config: PickConfig = text.parse().unwrap();
    let output_dir = dir.join(format!("out-{}", threads));
    let options = PickOptions {
        input: input.to_str().unwrap().to_string(),
        output_dir: output_dir.clone(),
        request: OutputRequest::default(),
    };
    (pick(&config, &options).unwrap(), output_dir)
}

#[rstest]
fn test_parallel_run_is_ordered_and_skips_bad_records() {
    let dir = tempdir().unwrap();
    let (serial, serial_dir) = run_many_regions(dir.path(), 1);
    let (parallel, parallel_dir) = run_many_regions(dir.path(), 4);

    assert_eq!(parallel.superloci, 50);
    assert_eq!(parallel.genes, 50);
    // the malformed line and the touching-exon transcript
    assert_eq!(parallel.dropped_transcripts, 2);
    assert_eq!(serial.genes, parallel.genes);

    for name in [LOCI_GFF, LOCI_METRICS, LOCI_SCORES] {
        let expected = read_to_string(serial_dir.join(name)).unwrap();
        let found = read_to_string(parallel_dir.join(name)).unwrap();
        assert_eq!(found, expected, "{} differs between 1 and 4 workers", name);
    }

    let gff = read_to_string(parallel_dir.join(LOCI_GFF)).unwrap();
    let genes: Vec<(String, u32, String)> = gff
        .lines()
        .map(|l| l.split('\t').collect::<Vec<&str>>())
        .filter(|f| f.len() == 9 && f[2] == "gene")
        .map(|f| {
            let id = f[8]
                .split(';')
                .find_map(|kv| kv.strip_prefix("ID="))
                .unwrap()
                .to_string();
            (f[0].to_string(), f[3].parse().unwrap(), id)
        })
        .collect();
    assert_eq!(genes.len(), 50);
    for (n, (chrom, start, id)) in genes.iter().enumerate() {
        let (expected_chrom, i) = if n < 30 { ("chr1", n) } else { ("chr2", n - 30) };
        assert_eq!(chrom, expected_chrom);
        assert_eq!(*start, 1 + i as u32 * 10_000);
        assert_eq!(id, &format!("run.{}G{}", expected_chrom, i + 1));
    }
    assert!(!gff.contains("touching"));
    assert!(gff.contains("alias=chr1_11_b"));
}

const UNSORTED: &str = r#"{"id": "a", "chrom": "chr1", "strand": "+", "exons": [[1, 100], [201, 300]]}
{"id": "b", "chrom": "chr1", "strand": "+", "exons": [[5001, 5100], [5201, 5300]]}
{"id": "c", "chrom": "chr1", "strand": "+", "exons": [[9001, 9100], [9201, 9300]]}
{"id": "late", "chrom": "chr1", "strand": "+", "exons": [[50, 100], [201, 250]]}
"#;

#[rstest]
#[case(1)]
#[case(3)]
fn test_failed_run_leaves_no_partials(#[case] threads: usize) {
    let dir = tempdir().unwrap();
    let input = dir.path().join("unsorted.jsonl");
    write(&input, UNSORTED).unwrap();

    let text = format!(
        "[scoring.cdna_length]\nrescaling = \"max\"\n\n[run_options]\nthreads = {}\n",
        threads
    );
    let config: PickConfig = text.parse().unwrap();
    let output_dir = dir.path().join("out");
    let options = PickOptions {
        input: input.to_str().unwrap().to_string(),
        output_dir: output_dir.clone(),
        request: OutputRequest {
            subloci: true,
            monoloci: true,
        },
    };

    let error = pick(&config, &options).unwrap_err();
    assert!(format!("{:#}", error).contains("not sorted"));

    let names: Vec<String> = read_dir(&output_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, Vec::<String>::new());
}

pub const PICK_CMD: &str = "pick";
pub const DEFAULT_OUTPUT_DIR: &str = "loctars_out";

pub const LOCI_GFF: &str = "loci.gff3";
pub const LOCI_METRICS: &str = "loci.metrics.tsv";
pub const LOCI_SCORES: &str = "loci.scores.tsv";

pub const SUBLOCI_GFF: &str = "subloci.gff3";
pub const SUBLOCI_METRICS: &str = "subloci.metrics.tsv";
pub const SUBLOCI_SCORES: &str = "subloci.scores.tsv";

pub const MONOLOCI_GFF: &str = "monosubloci.gff3";

/// Separates the superlocus counter from the payload in partial files.
pub const COUNTER_SEPARATOR: char = '/';

/// Work items buffered per worker in the input channel.
pub const QUEUE_SLOTS_PER_WORKER: usize = 4;

pub const GFF_VERSION_HEADER: &str = "##gff-version 3";

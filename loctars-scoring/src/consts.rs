pub const DEFAULT_SOURCE: &str = "loctars";
pub const DEFAULT_ID_PREFIX: &str = "loctars";
pub const DEFAULT_FRAGMENTS_MAXIMAL_CDS: u32 = 100;
pub const DEFAULT_THREADS: usize = 1;
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

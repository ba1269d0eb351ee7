use loctars_core::models::Transcript;

use crate::container::TranscriptPool;
use crate::errors::LociResult;
use crate::printing::metrics_row;

///
/// Residual container for transcripts purged by the requirements filter.
/// Used only for reporting; no compatibility checks are applied.
///
#[derive(Debug, Clone, Default)]
pub struct Excluded {
    pool: TranscriptPool,
}

impl Excluded {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> String {
        format!(
            "excluded:{}{}:{}-{}",
            self.pool.chrom(),
            self.pool.strand(),
            self.pool.start(),
            self.pool.end()
        )
    }

    pub fn add(&mut self, transcript: Transcript) -> LociResult<()> {
        let id = self.id();
        self.pool.add(&id, transcript)
    }

    pub fn contains(&self, tid: &str) -> bool {
        self.pool.contains(tid)
    }

    pub fn transcripts(&self) -> impl Iterator<Item = &Transcript> {
        self.pool.iter()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn metrics_rows(&self) -> Vec<Vec<String>> {
        let id = self.id();
        self.pool
            .sorted()
            .into_iter()
            .map(|t| metrics_row(t, &id))
            .collect()
    }
}

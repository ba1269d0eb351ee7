use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use loctars_core::models::Transcript;
use loctars_scoring::PickConfig;

use crate::container::TranscriptPool;

/// Per-transcript, per-metric scores after rescaling and weighting.
pub type ScoreTable = BTreeMap<String, BTreeMap<&'static str, f64>>;

///
/// Result of scoring a pool.
///
#[derive(Debug, Default)]
pub struct ScoringOutcome {
    pub scores: ScoreTable,
    /// Every transcript that failed the requirements, purged or not.
    pub failed: BTreeSet<String>,
    /// Transcripts removed from the pool, in the order they were purged.
    pub purged: Vec<Transcript>,
}

///
/// Apply the requirements filter until no transcript newly fails it.
///
/// Failing transcripts get a score of 0. With `purge`, they are also removed
/// from the pool; since the relative metrics depend on the composition of the
/// pool, metrics are recomputed and the requirements evaluated again on the
/// survivors.
///
fn filter_requirements(
    pool: &mut TranscriptPool,
    config: &PickConfig,
    purge: bool,
    outcome: &mut ScoringOutcome,
) {
    let requirements = match &config.requirements {
        Some(requirements) => requirements,
        None => return,
    };

    loop {
        let newly_failing: Vec<String> = pool
            .iter()
            .filter(|t| !outcome.failed.contains(&t.id))
            .filter(|t| !requirements.passes(t))
            .map(|t| t.id.clone())
            .collect();

        if newly_failing.is_empty() {
            break;
        }
        debug!(
            "{} transcripts fail the requirements: {:?}",
            newly_failing.len(),
            newly_failing
        );

        for tid in newly_failing {
            if purge {
                if let Some(mut transcript) = pool.remove(&tid) {
                    transcript.score = Some(0.0);
                    outcome.purged.push(transcript);
                }
            } else if let Some(transcript) = pool.get_mut(&tid) {
                transcript.score = Some(0.0);
            }
            outcome.failed.insert(tid);
        }

        if pool.is_empty() {
            break;
        }
        pool.calculate_metrics();
    }
}

///
/// Compute metrics and scores for every transcript of the pool.
///
/// Each configured metric is rescaled across the surviving transcripts, zeroed
/// where its own filter fails, and multiplied by its weight. The total score
/// is the sum over metrics, except for transcripts that failed the
/// requirements, which keep a score of 0.
///
pub fn score_pool(pool: &mut TranscriptPool, config: &PickConfig, purge: bool) -> ScoringOutcome {
    let mut outcome = ScoringOutcome::default();

    pool.calculate_metrics();
    filter_requirements(pool, config, purge, &mut outcome);

    if pool.is_empty() {
        return outcome;
    }

    let tids: Vec<String> = pool.transcripts().keys().cloned().collect();
    for tid in tids.iter() {
        outcome.scores.insert(tid.clone(), BTreeMap::new());
    }

    for param in config.scoring.iter() {
        let values: Vec<f64> = pool.iter().map(|t| param.metric.value(t)).collect();
        let rescaled = param.rescaling.rescale(&values);
        for ((tid, value), rescaled) in tids.iter().zip(values).zip(rescaled) {
            let check = param
                .filter
                .as_ref()
                .is_none_or(|filter| filter.evaluate(value));
            let score = if check { rescaled } else { 0.0 };
            if let Some(row) = outcome.scores.get_mut(tid) {
                row.insert(param.name(), score * param.multiplier);
            }
        }
    }

    for transcript in pool.iter_mut() {
        let total = match outcome.failed.contains(&transcript.id) {
            true => 0.0,
            false => outcome
                .scores
                .get(&transcript.id)
                .map(|row| row.values().sum())
                .unwrap_or(0.0),
        };
        transcript.score = Some(total);
    }

    outcome
}

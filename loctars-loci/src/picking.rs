use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use log::{debug, error};

use loctars_core::models::Transcript;
use loctars_overlaprs::{OverlapGraph, find_communities};
use loctars_scoring::TieBreak;

use crate::errors::{LociError, LociResult};

///
/// Ordering used to pick a winner; `Ordering::Less` means `a` is better.
///
/// Scores are compared first (unset counts as 0), then, depending on the
/// tie-break policy, the cDNA length, and finally the id in lexical order,
/// so that the choice never depends on iteration order.
///
pub fn compare_candidates(a: &Transcript, b: &Transcript, tie_break: TieBreak) -> Ordering {
    let score_a = a.score.unwrap_or(0.0);
    let score_b = b.score.unwrap_or(0.0);
    let by_score = score_b.total_cmp(&score_a);
    let by_length = match tie_break {
        TieBreak::Score => Ordering::Equal,
        TieBreak::ScoreThenLength => b.cdna_length().cmp(&a.cdna_length()),
    };
    by_score.then(by_length).then_with(|| a.id.cmp(&b.id))
}

/// Best transcript among the candidates.
pub fn choose_best<'a, I>(candidates: I, tie_break: TieBreak) -> Option<&'a Transcript>
where
    I: IntoIterator<Item = &'a Transcript>,
{
    candidates
        .into_iter()
        .min_by(|a, b| compare_candidates(a, b, tie_break))
}

///
/// Iterative winner selection over an overlap graph.
///
/// While the graph is not empty: split it into cliques and communities, pick
/// the best transcript of each community, then remove the winner and every
/// transcript sharing a clique with it. Winners whose score is not positive
/// are dropped when `purge` is set.
///
/// # Arguments
///
/// - container: name used in logs and errors
/// - transcripts: the pool to pick from
/// - intersecting: the predicate defining the edges of the graph
///
/// # Returns
///
/// The ids of the winners, in selection order.
///
pub fn select_winners<F>(
    container: &str,
    transcripts: &BTreeMap<String, Transcript>,
    intersecting: F,
    tie_break: TieBreak,
    purge: bool,
) -> LociResult<Vec<String>>
where
    F: Fn(&Transcript, &Transcript) -> bool,
{
    let mut graph = OverlapGraph::build(
        transcripts.iter().map(|(tid, t)| (tid.clone(), t)),
        intersecting,
    );
    let mut winners = Vec::new();

    while !graph.is_empty() {
        let (cliques, communities) = find_communities(&graph);
        let mut to_remove: BTreeSet<String> = BTreeSet::new();

        for community in communities.iter() {
            let selected = match choose_best(
                community.iter().filter_map(|tid| transcripts.get(tid)),
                tie_break,
            ) {
                Some(selected) => selected,
                None => continue,
            };

            to_remove.insert(selected.id.clone());
            for clique in cliques.iter().filter(|c| c.contains(&selected.id)) {
                to_remove.extend(clique.iter().cloned());
            }

            if !purge || selected.score.unwrap_or(0.0) > 0.0 {
                winners.push(selected.id.clone());
            }
        }

        if to_remove.is_empty() {
            let remaining: Vec<Vec<String>> = communities
                .iter()
                .map(|c| c.iter().cloned().collect())
                .collect();
            error!(
                "No transcripts to remove from the pool for {}; remaining: {:?}",
                container, remaining
            );
            return Err(LociError::NoProgress {
                container: container.to_string(),
                remaining,
            });
        }

        debug!(
            "Removing {} transcripts from the graph of {}",
            to_remove.len(),
            container
        );
        graph.remove_nodes(&to_remove);
    }

    Ok(winners)
}

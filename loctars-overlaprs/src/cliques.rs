use std::collections::{BTreeMap, BTreeSet};

use crate::graph::OverlapGraph;

///
/// Enumerate every maximal clique of the graph (Bron–Kerbosch with pivoting).
///
/// Isolated nodes come back as singleton cliques, so the union of the cliques
/// is always the node set of the graph. The result is sorted.
///
pub fn find_cliques<K: Ord + Clone>(graph: &OverlapGraph<K>) -> Vec<BTreeSet<K>> {
    let mut cliques = Vec::new();
    let mut current = Vec::new();
    let candidates: BTreeSet<K> = graph.nodes().cloned().collect();
    bron_kerbosch(graph, &mut current, candidates, BTreeSet::new(), &mut cliques);
    cliques.sort();
    cliques
}

fn bron_kerbosch<K: Ord + Clone>(
    graph: &OverlapGraph<K>,
    clique: &mut Vec<K>,
    mut candidates: BTreeSet<K>,
    mut excluded: BTreeSet<K>,
    cliques: &mut Vec<BTreeSet<K>>,
) {
    if candidates.is_empty() {
        if excluded.is_empty() && !clique.is_empty() {
            cliques.push(clique.iter().cloned().collect());
        }
        return;
    }

    let empty = BTreeSet::new();
    let neighbours_of = |node: &K| graph.neighbours(node).unwrap_or(&empty);

    // pivot on the node covering most candidates, to skip redundant branches
    let pivot = candidates
        .iter()
        .chain(excluded.iter())
        .max_by_key(|node| neighbours_of(node).intersection(&candidates).count())
        .cloned();
    let branches: Vec<K> = match pivot {
        Some(pivot) => candidates
            .difference(neighbours_of(&pivot))
            .cloned()
            .collect(),
        None => candidates.iter().cloned().collect(),
    };

    for node in branches {
        let neighbours = neighbours_of(&node);
        clique.push(node.clone());
        bron_kerbosch(
            graph,
            clique,
            candidates.intersection(neighbours).cloned().collect(),
            excluded.intersection(neighbours).cloned().collect(),
            cliques,
        );
        clique.pop();
        candidates.remove(&node);
        excluded.insert(node);
    }
}

///
/// Merge cliques that share at least one member into communities, i.e. the
/// connected components of the clique-adjacency graph. The result is sorted.
///
pub fn merge_cliques<K: Ord + Clone>(cliques: &[BTreeSet<K>]) -> Vec<BTreeSet<K>> {
    let mut parents: Vec<usize> = (0..cliques.len()).collect();

    fn root(parents: &mut [usize], mut index: usize) -> usize {
        while parents[index] != index {
            parents[index] = parents[parents[index]];
            index = parents[index];
        }
        index
    }

    let mut owner: BTreeMap<&K, usize> = BTreeMap::new();
    for (index, clique) in cliques.iter().enumerate() {
        for member in clique.iter() {
            match owner.get(member) {
                Some(&other) => {
                    let (a, b) = (root(&mut parents, index), root(&mut parents, other));
                    if a != b {
                        parents[a.max(b)] = a.min(b);
                    }
                }
                None => {
                    owner.insert(member, index);
                }
            }
        }
    }

    let mut communities: BTreeMap<usize, BTreeSet<K>> = BTreeMap::new();
    for (index, clique) in cliques.iter().enumerate() {
        let r = root(&mut parents, index);
        communities
            .entry(r)
            .or_default()
            .extend(clique.iter().cloned());
    }

    let mut communities: Vec<BTreeSet<K>> = communities.into_values().collect();
    communities.sort();
    communities
}

/// Convenience wrapper returning both the cliques and the communities built from them.
pub fn find_communities<K: Ord + Clone>(
    graph: &OverlapGraph<K>,
) -> (Vec<BTreeSet<K>>, Vec<BTreeSet<K>>) {
    let cliques = find_cliques(graph);
    let communities = merge_cliques(&cliques);
    (cliques, communities)
}

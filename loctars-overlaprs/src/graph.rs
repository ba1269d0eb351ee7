use std::collections::{BTreeMap, BTreeSet};

///
/// Undirected graph without self loops. Nodes are the keys of a container
/// (transcript ids); edges come from a pairwise predicate.
///
/// Ordered maps are used throughout so that traversal order, and thus every
/// downstream decision, is deterministic.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapGraph<K: Ord + Clone> {
    adjacency: BTreeMap<K, BTreeSet<K>>,
}

impl<K: Ord + Clone> Default for OverlapGraph<K> {
    fn default() -> Self {
        OverlapGraph {
            adjacency: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> OverlapGraph<K> {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Build the graph from `(key, item)` pairs, adding an edge wherever
    /// `intersecting(a, b)` holds. Every key becomes a node, connected or not.
    ///
    pub fn build<'a, T, I, F>(items: I, intersecting: F) -> Self
    where
        T: 'a + ?Sized,
        I: IntoIterator<Item = (K, &'a T)>,
        F: Fn(&T, &T) -> bool,
    {
        let items: Vec<(K, &T)> = items.into_iter().collect();
        let mut graph = Self::new();
        for (key, _) in items.iter() {
            graph.add_node(key.clone());
        }
        for (i, (key, item)) in items.iter().enumerate() {
            for (other_key, other) in items.iter().skip(i + 1) {
                if intersecting(item, other) {
                    graph.add_edge(key.clone(), other_key.clone());
                }
            }
        }
        graph
    }

    pub fn add_node(&mut self, node: K) {
        self.adjacency.entry(node).or_default();
    }

    pub fn add_edge(&mut self, a: K, b: K) {
        if a == b {
            return;
        }
        self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b).or_default().insert(a);
    }

    pub fn has_edge(&self, a: &K, b: &K) -> bool {
        self.adjacency.get(a).is_some_and(|n| n.contains(b))
    }

    /// Remove the nodes and every edge touching them.
    pub fn remove_nodes(&mut self, nodes: &BTreeSet<K>) {
        for node in nodes.iter() {
            self.adjacency.remove(node);
        }
        for neighbours in self.adjacency.values_mut() {
            neighbours.retain(|n| !nodes.contains(n));
        }
    }

    pub fn neighbours(&self, node: &K) -> Option<&BTreeSet<K>> {
        self.adjacency.get(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &K> {
        self.adjacency.keys()
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|n| n.len()).sum::<usize>() / 2
    }
}

//! Parallel batch helpers
//!
//! Uses Rayon to answer positional and name predicates over large candidate
//! sets. Output order always follows input order.

use crate::adapter::{Index, TreeAdapter};
use crate::error::Result;
use rayon::prelude::*;

/// Compute `index_in_parent` for every node
pub fn index_all<A>(adapter: &A, nodes: &[A::Node], by_type: bool) -> Vec<Index>
where
    A: TreeAdapter + Sync,
    A::Node: Send + Sync,
{
    nodes
        .par_iter()
        .map(|&node| adapter.index_in_parent(node, by_type))
        .collect()
}

/// Keep the nodes accepted by `predicate`
pub fn filter_nodes<A, F>(adapter: &A, nodes: &[A::Node], predicate: F) -> Vec<A::Node>
where
    A: TreeAdapter + Sync,
    A::Node: Send + Sync,
    F: Fn(&A, A::Node) -> bool + Sync + Send,
{
    nodes
        .par_iter()
        .copied()
        .filter(|&node| predicate(adapter, node))
        .collect()
}

/// Element descendants of `scope` whose name matches `name`
pub fn descendants_named<A>(adapter: &A, scope: A::Node, name: &str) -> Result<Vec<A::Node>>
where
    A: TreeAdapter + Sync,
    A::Node: Send + Sync,
{
    let candidates = adapter.descendants(scope)?;
    Ok(filter_nodes(adapter, &candidates, |a, node| a.name_matches(node, name)))
}

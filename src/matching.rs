//! Pairing of movies across two genres on language and country overlap.
//!
//! Every cross-genre pair whose combined similarity reaches the threshold becomes an edge
//! of an undirected graph; a maximum-weight matching on that graph picks the comparison
//! cohort.

mod blossom;

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::info;

use crate::model::entity::{MovieId, MovieRecord};
use crate::model::group::MovieTable;

pub use blossom::max_weight_matching;

/// Edge weights are scaled to integers so the matching runs on exact arithmetic.
const WEIGHT_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchingParams {
    /// Minimum combined language + country similarity for two movies to be paired.
    pub threshold: f64,
}

impl Default for MatchingParams {
    fn default() -> Self {
        MatchingParams { threshold: 1.5 }
    }
}

/// Shared elements of `a` over the length of the longer list, 0 when either is empty.
pub fn similarity<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.iter().filter(|item| b.contains(item)).count();
    shared as f64 / a.len().max(b.len()) as f64
}

fn pair_similarity(a: &MovieRecord, b: &MovieRecord) -> f64 {
    similarity(&a.languages, &b.languages) + similarity(&a.countries, &b.countries)
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityGraph {
    graph: UnGraph<MovieId, f64>,
}

impl SimilarityGraph {
    /// Nodes are inserted by ascending id and edges by ascending id pair, so the graph does
    /// not depend on which genre came first.
    fn from_edges(edges: BTreeMap<(MovieId, MovieId), f64>) -> SimilarityGraph {
        let movies: BTreeSet<MovieId> = edges.keys().flat_map(|&(a, b)| [a, b]).collect();
        let mut graph = UnGraph::with_capacity(movies.len(), edges.len());
        let nodes: BTreeMap<MovieId, NodeIndex> = movies
            .into_iter()
            .map(|movie| (movie, graph.add_node(movie)))
            .collect();
        for ((a, b), weight) in edges {
            graph.add_edge(nodes[&a], nodes[&b], weight);
        }
        SimilarityGraph { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn weight(&self, a: MovieId, b: MovieId) -> Option<f64> {
        let find = |movie| self.graph.node_indices().find(|&index| self.graph[index] == movie);
        let edge = self.graph.find_edge(find(a)?, find(b)?)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Matched movie pairs, smaller id first, in ascending order.
    pub fn max_weight_matching(&self) -> Vec<(MovieId, MovieId)> {
        let edges: Vec<blossom::Edge> = self.graph
            .edge_references()
            .map(|edge| {
                let weight = (edge.weight() * WEIGHT_SCALE).round() as i64;
                (edge.source().index(), edge.target().index(), weight)
            })
            .collect();
        let mates = max_weight_matching(self.graph.node_count(), &edges);
        mates
            .iter()
            .enumerate()
            .filter_map(|(index, mate)| match mate {
                Some(other) if index < *other => {
                    let a = self.graph[NodeIndex::new(index)];
                    let b = self.graph[NodeIndex::new(*other)];
                    Some((a.min(b), a.max(b)))
                }
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityMatcher {
    params: MatchingParams,
}

impl SimilarityMatcher {
    pub fn new(params: MatchingParams) -> SimilarityMatcher {
        SimilarityMatcher { params }
    }

    pub fn build_graph(&self, genre1: &str, genre2: &str, table: &MovieTable) -> SimilarityGraph {
        let threshold = self.params.threshold;
        let left: Vec<&MovieRecord> = table.genre(genre1).collect();
        let right: Vec<&MovieRecord> = table.genre(genre2).collect();
        let edges: BTreeMap<(MovieId, MovieId), f64> = left
            .par_iter()
            .flat_map_iter(|&a| {
                right.iter().filter_map(move |&b| {
                    if a.movie == b.movie {
                        return None;
                    }
                    let weight = pair_similarity(a, b);
                    (weight >= threshold).then_some(((a.movie.min(b.movie), a.movie.max(b.movie)), weight))
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();
        SimilarityGraph::from_edges(edges)
    }

    /// Rows of the two genres whose movie was paired by the maximum-weight matching.
    pub fn match_genres(&self, genre1: &str, genre2: &str, table: &MovieTable) -> MovieTable {
        let graph = self.build_graph(genre1, genre2, table);
        let pairs = graph.max_weight_matching();
        let matched: BTreeSet<MovieId> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
        info!(
            genre1,
            genre2,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            pairs = pairs.len(),
            "matched genres"
        );
        table
            .rows()
            .iter()
            .filter(|row| matched.contains(&row.movie) && (row.genre == genre1 || row.genre == genre2))
            .cloned()
            .collect()
    }
}

pub fn match_genres(genre1: &str, genre2: &str, table: &MovieTable) -> MovieTable {
    SimilarityMatcher::default().match_genres(genre1, genre2, table)
}

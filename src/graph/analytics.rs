//! Weight and degree rankings over a built graph.

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::model::{EdgeData, EdgeId, Graph, VertexId};
use crate::error::Result;

/// One neighbor of a vertex, with the strength of the connecting edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedNeighbor {
    /// The neighbor.
    pub vertex: VertexId,
    /// Edge reaching it.
    pub edge: EdgeId,
    /// Weight of that edge.
    pub weight: u64,
    /// Keys recorded on that edge.
    pub shared_keys: usize,
}

/// A vertex and how many neighbors it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DegreeEntry {
    /// The vertex.
    pub vertex: VertexId,
    /// Its degree.
    pub degree: usize,
}

/// Neighbors of `v` ordered by edge weight, heaviest first. Equal weights
/// keep ascending vertex id order.
pub fn ranked_neighbors<V>(graph: &Graph<V, EdgeData>, v: VertexId) -> Result<Vec<RankedNeighbor>> {
    let mut ranked: Vec<RankedNeighbor> = graph
        .neighbors(v)?
        .filter_map(|(vertex, edge)| {
            let data = graph.edge(edge)?.payload();
            Some(RankedNeighbor {
                vertex,
                edge,
                weight: data.weight,
                shared_keys: data.keys.len(),
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.weight.cmp(&a.weight).then(a.vertex.cmp(&b.vertex)));
    Ok(ranked)
}

/// Sum of the weights of every edge touching `v`.
pub fn total_weight<V>(graph: &Graph<V, EdgeData>, v: VertexId) -> Result<u64> {
    Ok(graph
        .incident_edges(v)?
        .iter()
        .filter_map(|&edge| graph.edge(edge))
        .map(|edge| edge.payload().weight)
        .sum())
}

/// Vertex of `kind` with the largest total incident weight, the lowest id
/// winning ties. Returns the vertex and its total weight.
pub fn strongest_vertex<V>(graph: &Graph<V, EdgeData>, kind: &str) -> Result<Option<(VertexId, u64)>> {
    let mut best: Option<(VertexId, u64)> = None;
    for v in graph.vertices_of_kind(kind) {
        let weight = total_weight(graph, v)?;
        match best {
            Some((_, top)) if top >= weight => {}
            _ => best = Some((v, weight)),
        }
    }
    Ok(best)
}

/// Every vertex with its degree, highest degree first, ties by vertex id.
pub fn degree_ranking<V, E>(graph: &Graph<V, E>) -> Result<Vec<DegreeEntry>> {
    let mut ranking = graph
        .vertices()
        .map(|vertex| {
            Ok(DegreeEntry {
                vertex,
                degree: graph.degree(vertex)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    ranking.sort_by(|a, b| b.degree.cmp(&a.degree).then(a.vertex.cmp(&b.vertex)));
    Ok(ranking)
}

/// Number of vertices carrying each kind tag.
pub fn count_vertices_by_kind<V, E>(graph: &Graph<V, E>) -> FxHashMap<String, usize> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for v in graph.vertices() {
        if let Some(vertex) = graph.vertex(v) {
            *counts.entry(vertex.kind().to_string()).or_insert(0) += 1;
        }
    }
    counts
}

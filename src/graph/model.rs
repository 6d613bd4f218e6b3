use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{DbError, Result};
use crate::model::Value;

/// Handle of a vertex inside the graph that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(usize);

/// Handle of an edge inside the graph that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(usize);

impl VertexId {
    /// Position in the vertex arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl EdgeId {
    /// Position in the edge arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A vertex: its kind tag and caller payload.
#[derive(Debug, Clone)]
pub struct Vertex<V> {
    kind: Arc<str>,
    payload: V,
}

impl<V> Vertex<V> {
    /// Category tag, e.g. `"developer"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Caller data attached at insertion.
    pub fn payload(&self) -> &V {
        &self.payload
    }
}

/// An undirected edge between two vertices.
#[derive(Debug, Clone)]
pub struct Edge<E> {
    endpoints: (VertexId, VertexId),
    payload: E,
}

impl<E> Edge<E> {
    /// Endpoints in the order given to `insert_edge`.
    pub fn endpoints(&self) -> (VertexId, VertexId) {
        self.endpoints
    }

    /// Edge data.
    pub fn payload(&self) -> &E {
        &self.payload
    }

    /// Mutable edge data.
    pub fn payload_mut(&mut self) -> &mut E {
        &mut self.payload
    }

    /// The endpoint opposite `v`, or `None` if `v` is not an endpoint.
    pub fn other(&self, v: VertexId) -> Option<VertexId> {
        match self.endpoints {
            (a, b) if a == v => Some(b),
            (a, b) if b == v => Some(a),
            _ => None,
        }
    }
}

/// Default edge payload: how many distinct keys linked the two endpoints,
/// and which ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Number of distinct keys recorded.
    pub weight: u64,
    /// The keys themselves, ascending.
    pub keys: BTreeSet<Value>,
}

impl EdgeData {
    /// Adds `key`, bumping the weight only the first time it is seen.
    pub fn record(&mut self, key: Value) -> bool {
        let added = self.keys.insert(key);
        if added {
            self.weight += 1;
        }
        added
    }
}

#[derive(Debug, Clone, Default)]
struct Adjacency {
    by_neighbor: FxHashMap<VertexId, EdgeId>,
    incident: Vec<EdgeId>,
}

/// Undirected graph stored as arenas of vertices and edges plus, per
/// vertex, a neighbor → edge map. At most one edge joins any vertex pair.
#[derive(Debug, Clone)]
pub struct Graph<V, E = EdgeData> {
    vertices: Vec<Vertex<V>>,
    edges: Vec<Edge<E>>,
    adjacency: Vec<Adjacency>,
}

impl<V, E> Graph<V, E> {
    /// Empty graph.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            adjacency: Vec::new(),
        }
    }

    /// Adds a vertex tagged `kind` and returns its handle.
    pub fn insert_vertex(&mut self, payload: V, kind: impl Into<Arc<str>>) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex {
            kind: kind.into(),
            payload,
        });
        self.adjacency.push(Adjacency::default());
        id
    }

    /// Returns the edge joining `u` and `v`, creating it with `payload` if
    /// none exists yet. An existing edge is returned untouched and `payload`
    /// is dropped. A self-loop appears once in its vertex's adjacency.
    pub fn insert_edge(&mut self, u: VertexId, v: VertexId, payload: E) -> Result<EdgeId> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        if let Some(existing) = self.get_edge(u, v) {
            return Ok(existing);
        }

        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            endpoints: (u, v),
            payload,
        });
        for (from, to) in [(u, v), (v, u)] {
            let adjacency = &mut self.adjacency[from.0];
            if adjacency.by_neighbor.insert(to, id).is_none() {
                adjacency.incident.push(id);
            }
        }
        Ok(id)
    }

    /// The edge joining `u` and `v`, in either direction.
    pub fn get_edge(&self, u: VertexId, v: VertexId) -> Option<EdgeId> {
        self.adjacency.get(u.0)?.by_neighbor.get(&v).copied()
    }

    /// Vertex behind a handle.
    pub fn vertex(&self, v: VertexId) -> Option<&Vertex<V>> {
        self.vertices.get(v.0)
    }

    /// Edge behind a handle.
    pub fn edge(&self, e: EdgeId) -> Option<&Edge<E>> {
        self.edges.get(e.0)
    }

    /// Mutable edge behind a handle.
    pub fn edge_mut(&mut self, e: EdgeId) -> Option<&mut Edge<E>> {
        self.edges.get_mut(e.0)
    }

    /// Number of distinct neighbors of `v`.
    pub fn degree(&self, v: VertexId) -> Result<usize> {
        Ok(self.adjacency_of(v)?.incident.len())
    }

    /// Edges touching `v`, in the order they were created.
    pub fn incident_edges(&self, v: VertexId) -> Result<&[EdgeId]> {
        Ok(&self.adjacency_of(v)?.incident)
    }

    /// `(neighbor, edge)` pairs of `v`, in edge creation order.
    pub fn neighbors(&self, v: VertexId) -> Result<impl Iterator<Item = (VertexId, EdgeId)> + '_> {
        let incident = self.incident_edges(v)?;
        Ok(incident.iter().filter_map(move |&e| {
            let other = self.edges.get(e.0)?.other(v)?;
            Some((other, e))
        }))
    }

    /// The endpoint of `e` other than `v`. Asking with a vertex that `e`
    /// does not touch is a caller bug and reported as an invariant violation.
    pub fn opposite(&self, v: VertexId, e: EdgeId) -> Result<VertexId> {
        let edge = self.edges.get(e.0).ok_or(DbError::UnknownEdge(e))?;
        edge.other(v).ok_or_else(|| {
            DbError::InvariantViolation(format!("vertex {v} is not an endpoint of edge {e}"))
        })
    }

    /// Every vertex handle in creation order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId)
    }

    /// Vertices tagged `kind`, in creation order.
    pub fn vertices_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = VertexId> + 'a {
        self.vertices
            .iter()
            .enumerate()
            .filter(move |(_, vertex)| &*vertex.kind == kind)
            .map(|(index, _)| VertexId(index))
    }

    /// Every edge handle in creation order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Each undirected edge counts once.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True for a graph with no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Whether `v` is a handle of this graph.
    pub fn contains_vertex(&self, v: VertexId) -> bool {
        v.0 < self.vertices.len()
    }

    fn check_vertex(&self, v: VertexId) -> Result<()> {
        if self.contains_vertex(v) {
            Ok(())
        } else {
            Err(DbError::UnknownVertex(v))
        }
    }

    fn adjacency_of(&self, v: VertexId) -> Result<&Adjacency> {
        self.adjacency.get(v.0).ok_or(DbError::UnknownVertex(v))
    }
}

impl<V, E> Default for Graph<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Graph<&'static str>, [VertexId; 3]) {
        let mut graph = Graph::new();
        let a = graph.insert_vertex("a", "developer");
        let b = graph.insert_vertex("b", "publisher");
        let c = graph.insert_vertex("c", "publisher");
        graph.insert_edge(a, b, EdgeData::default()).unwrap();
        graph.insert_edge(a, c, EdgeData::default()).unwrap();
        graph.insert_edge(b, c, EdgeData::default()).unwrap();
        (graph, [a, b, c])
    }

    #[test]
    fn vertices_with_equal_payload_stay_distinct() {
        let mut graph: Graph<i32> = Graph::new();
        let a = graph.insert_vertex(1, "x");
        let b = graph.insert_vertex(1, "x");
        assert_ne!(a, b);
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.vertex(a).unwrap().kind(), "x");
    }

    #[test]
    fn edge_insertion_is_idempotent_in_both_directions() {
        let (mut graph, [a, b, _]) = triangle();
        let first = graph.get_edge(a, b).unwrap();
        let again = graph.insert_edge(b, a, EdgeData::default()).unwrap();
        assert_eq!(first, again);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.degree(a).unwrap(), 2);
    }

    #[test]
    fn repeat_insert_leaves_payload_for_the_caller() {
        let mut graph: Graph<()> = Graph::new();
        let a = graph.insert_vertex((), "a");
        let b = graph.insert_vertex((), "b");
        let e = graph.insert_edge(a, b, EdgeData::default()).unwrap();
        graph.edge_mut(e).unwrap().payload_mut().record(Value::Int(7));

        let mut fresh = EdgeData::default();
        fresh.record(Value::Int(8));
        let same = graph.insert_edge(a, b, fresh).unwrap();
        let payload = graph.edge(same).unwrap().payload();
        assert_eq!(payload.weight, 1);
        assert!(payload.keys.contains(&Value::Int(7)));
    }

    #[test]
    fn opposite_requires_an_incident_edge() {
        let (graph, [a, b, c]) = triangle();
        let ab = graph.get_edge(a, b).unwrap();
        assert_eq!(graph.opposite(a, ab).unwrap(), b);
        assert_eq!(graph.opposite(b, ab).unwrap(), a);
        assert!(matches!(
            graph.opposite(c, ab),
            Err(DbError::InvariantViolation(_))
        ));
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let (mut graph, [a, _, _]) = triangle();
        let stray = VertexId(42);
        assert_eq!(
            graph.insert_edge(a, stray, EdgeData::default()).unwrap_err(),
            DbError::UnknownVertex(stray)
        );
        assert!(graph.degree(stray).is_err());
        assert!(graph.incident_edges(stray).is_err());
    }

    #[test]
    fn neighbors_and_kinds() {
        let (graph, [a, b, c]) = triangle();
        let neighbors: Vec<_> = graph.neighbors(a).unwrap().map(|(v, _)| v).collect();
        assert_eq!(neighbors, vec![b, c]);
        let publishers: Vec<_> = graph.vertices_of_kind("publisher").collect();
        assert_eq!(publishers, vec![b, c]);
        assert_eq!(graph.edges().count(), 3);
    }

    #[test]
    fn self_loop_is_counted_once() {
        let mut graph: Graph<()> = Graph::new();
        let a = graph.insert_vertex((), "a");
        let e = graph.insert_edge(a, a, EdgeData::default()).unwrap();
        assert_eq!(graph.degree(a).unwrap(), 1);
        assert_eq!(graph.opposite(a, e).unwrap(), a);
    }

    #[test]
    fn edge_data_counts_distinct_keys() {
        let mut data = EdgeData::default();
        assert!(data.record(Value::Int(1)));
        assert!(!data.record(Value::Int(1)));
        assert!(data.record(Value::Int(2)));
        assert_eq!(data.weight, 2);
    }
}

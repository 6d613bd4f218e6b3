//! Undirected graph over arena handles, plus the builders and algorithms
//! that work on it.

pub mod analytics;
pub mod bipartite;
mod model;
pub mod traversal;

pub use analytics::{
    count_vertices_by_kind, degree_ranking, ranked_neighbors, strongest_vertex, total_weight,
    DegreeEntry, RankedNeighbor,
};
pub use bipartite::{BipartiteBuilder, BipartiteGraph, BipartiteSide, BuildStats};
pub use model::{Edge, EdgeData, EdgeId, Graph, Vertex, VertexId};
pub use traversal::{bfs, bfs_layers, connected_components, dfs, shortest_path};

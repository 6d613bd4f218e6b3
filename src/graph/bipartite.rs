//! Builds an undirected graph with two vertex kinds out of flat relation
//! tables joined on a shared key.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::model::{EdgeData, Graph, VertexId};
use crate::error::{DbError, Result};
use crate::model::{Record, Value};

/// Where one vertex category finds its ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BipartiteSide {
    /// Vertex kind tag for rows of this side.
    pub kind: String,
    /// Field of a vertex row holding its external id.
    pub id_field: String,
    /// Field of a relation row referencing that id.
    pub link_id_field: String,
}

impl BipartiteSide {
    /// Describes one side by its kind tag and the two id columns.
    pub fn new(
        kind: impl Into<String>,
        id_field: impl Into<String>,
        link_id_field: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            id_field: id_field.into(),
            link_id_field: link_id_field.into(),
        }
    }
}

/// Counters gathered while building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Join keys present in both relation tables.
    pub shared_keys: usize,
    /// Relation rows whose id matched no vertex row.
    pub dangling_links: usize,
}

/// Graph produced by [`BipartiteBuilder::build`], with lookups from each
/// side's external id to its vertex.
///
/// Every vertex row becomes a vertex, even when its external id repeats an
/// earlier row of the same side. Only the first such row is reachable
/// through the id lookup, so only it receives edges; later duplicates stay
/// isolated and surface as singleton components.
#[derive(Debug, Clone)]
pub struct BipartiteGraph {
    /// The graph itself; vertex payloads are the original rows.
    pub graph: Graph<Record>,
    /// External id of each `a` row to its vertex.
    pub a_vertices: FxHashMap<Value, VertexId>,
    /// External id of each `b` row to its vertex.
    pub b_vertices: FxHashMap<Value, VertexId>,
    /// What the build saw along the way.
    pub stats: BuildStats,
}

impl BipartiteGraph {
    /// Vertex of the `a` row with external id `id`.
    pub fn a_vertex(&self, id: &Value) -> Option<VertexId> {
        self.a_vertices.get(id).copied()
    }

    /// Vertex of the `b` row with external id `id`.
    pub fn b_vertex(&self, id: &Value) -> Option<VertexId> {
        self.b_vertices.get(id).copied()
    }
}

/// Builds an A/B graph from two vertex tables and two relation tables that
/// share a join key. Every join key linking `a` and `b` adds one to the
/// weight of edge `(a, b)` and is recorded in its key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BipartiteBuilder {
    /// First vertex category.
    pub a: BipartiteSide,
    /// Second vertex category.
    pub b: BipartiteSide,
    /// Join column both relation tables carry.
    pub join_field: String,
}

/// Relation rows grouped by join key, keys kept in first-seen order.
struct Grouped {
    order: Vec<Value>,
    groups: FxHashMap<Value, Vec<Value>>,
}

fn group_links(links: &[Record], join_field: &str, id_field: &str) -> Result<Grouped> {
    let mut grouped = Grouped {
        order: Vec::new(),
        groups: FxHashMap::default(),
    };
    for row in links {
        let key = row
            .get(join_field)
            .ok_or_else(|| DbError::MissingAttribute(join_field.to_string()))?;
        let id = row
            .get(id_field)
            .ok_or_else(|| DbError::MissingAttribute(id_field.to_string()))?;
        if key.is_null() || id.is_null() {
            continue;
        }
        match grouped.groups.get_mut(key) {
            Some(ids) => ids.push(id.clone()),
            None => {
                grouped.order.push(key.clone());
                grouped.groups.insert(key.clone(), vec![id.clone()]);
            }
        }
    }
    Ok(grouped)
}

fn add_vertices(
    graph: &mut Graph<Record>,
    rows: &[Record],
    side: &BipartiteSide,
) -> Result<FxHashMap<Value, VertexId>> {
    let mut lookup = FxHashMap::default();
    lookup.reserve(rows.len());
    for row in rows {
        let id = row
            .get(&side.id_field)
            .cloned()
            .ok_or_else(|| DbError::MissingAttribute(side.id_field.clone()))?;
        let vertex = graph.insert_vertex(row.clone(), side.kind.as_str());
        if lookup.contains_key(&id) {
            warn!(kind = %side.kind, id = %id, "duplicate vertex id; first row keeps the lookup");
        } else {
            lookup.insert(id, vertex);
        }
    }
    Ok(lookup)
}

fn resolve(ids: &[Value], lookup: &FxHashMap<Value, VertexId>) -> Vec<VertexId> {
    ids.iter().filter_map(|id| lookup.get(id).copied()).collect()
}

/// Relation rows, under any join key, whose id names no vertex.
fn count_dangling(grouped: &Grouped, lookup: &FxHashMap<Value, VertexId>) -> usize {
    grouped
        .groups
        .values()
        .flatten()
        .filter(|id| !lookup.contains_key(id))
        .count()
}

impl BipartiteBuilder {
    /// Builder joining `a` and `b` through `join_field`.
    pub fn new(a: BipartiteSide, b: BipartiteSide, join_field: impl Into<String>) -> Self {
        Self {
            a,
            b,
            join_field: join_field.into(),
        }
    }

    /// Developers and publishers joined through the applications they share.
    pub fn developer_publisher() -> Self {
        Self::new(
            BipartiteSide::new("developer", "id", "developer_id"),
            BipartiteSide::new("publisher", "id", "publisher_id"),
            "appid",
        )
    }

    /// Builds the graph. Vertex rows without an id field fail with
    /// [`DbError::MissingAttribute`], as do relation rows missing the join
    /// or id column. Rows with a null join key or id are ignored. Relation
    /// rows naming an id with no vertex row are skipped and counted in
    /// [`BuildStats::dangling_links`].
    pub fn build(
        &self,
        a_rows: &[Record],
        b_rows: &[Record],
        a_links: &[Record],
        b_links: &[Record],
    ) -> Result<BipartiteGraph> {
        let a_grouped = group_links(a_links, &self.join_field, &self.a.link_id_field)?;
        let b_grouped = group_links(b_links, &self.join_field, &self.b.link_id_field)?;

        let mut graph = Graph::new();
        let a_vertices = add_vertices(&mut graph, a_rows, &self.a)?;
        let b_vertices = add_vertices(&mut graph, b_rows, &self.b)?;

        let mut stats = BuildStats {
            shared_keys: 0,
            dangling_links: count_dangling(&a_grouped, &a_vertices)
                + count_dangling(&b_grouped, &b_vertices),
        };
        for key in &a_grouped.order {
            let (Some(a_ids), Some(b_ids)) = (a_grouped.groups.get(key), b_grouped.groups.get(key)) else {
                continue;
            };
            stats.shared_keys += 1;
            let a_side = resolve(a_ids, &a_vertices);
            let b_side = resolve(b_ids, &b_vertices);
            for &a in &a_side {
                for &b in &b_side {
                    let edge = graph.insert_edge(a, b, EdgeData::default())?;
                    if let Some(edge) = graph.edge_mut(edge) {
                        edge.payload_mut().record(key.clone());
                    }
                }
            }
        }

        if stats.dangling_links > 0 {
            warn!(
                dangling = stats.dangling_links,
                "relation rows referenced ids with no vertex row; skipped"
            );
        }
        info!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            shared_keys = stats.shared_keys,
            "bipartite graph built"
        );

        Ok(BipartiteGraph {
            graph,
            a_vertices,
            b_vertices,
            stats,
        })
    }
}

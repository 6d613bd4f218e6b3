use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::import::{read_records, CliError};
use crate::graph::{
    count_vertices_by_kind, ranked_neighbors, strongest_vertex, BipartiteBuilder, BipartiteGraph,
    VertexId,
};
use crate::model::Value;

/// The four CSV tables behind a bipartite graph.
#[derive(Debug, Clone)]
pub struct GraphSources {
    /// Vertex rows of the first kind.
    pub a_rows: PathBuf,
    /// Vertex rows of the second kind.
    pub b_rows: PathBuf,
    /// Relation rows for the first kind.
    pub a_links: PathBuf,
    /// Relation rows for the second kind.
    pub b_links: PathBuf,
}

/// Reads the four tables and runs `builder` over them.
pub fn load_graph(
    builder: &BipartiteBuilder,
    sources: &GraphSources,
) -> Result<BipartiteGraph, CliError> {
    let a_rows = read_records(&sources.a_rows, &[builder.a.id_field.as_str()])?;
    let b_rows = read_records(&sources.b_rows, &[builder.b.id_field.as_str()])?;
    let a_links = read_records(
        &sources.a_links,
        &[builder.join_field.as_str(), builder.a.link_id_field.as_str()],
    )?;
    let b_links = read_records(
        &sources.b_links,
        &[builder.join_field.as_str(), builder.b.link_id_field.as_str()],
    )?;
    Ok(builder.build(&a_rows, &b_rows, &a_links, &b_links)?)
}

/// Finds the vertex of `kind` whose external id is `id`.
pub fn lookup(
    builder: &BipartiteBuilder,
    built: &BipartiteGraph,
    kind: &str,
    id: &Value,
) -> Result<VertexId, CliError> {
    let found = if kind == builder.a.kind {
        built.a_vertex(id)
    } else if kind == builder.b.kind {
        built.b_vertex(id)
    } else {
        return Err(CliError::Message(format!(
            "unknown vertex kind '{}' (expected '{}' or '{}')",
            kind, builder.a.kind, builder.b.kind
        )));
    };
    found.ok_or_else(|| CliError::Message(format!("no {kind} with id {id}")))
}

/// A vertex as printed by the CLI: handle, kind, external id and name.
#[derive(Debug, Clone, Serialize)]
pub struct VertexRow {
    /// Graph handle.
    pub vertex: VertexId,
    /// Kind tag.
    pub kind: String,
    /// External id from the vertex row.
    pub id: Value,
    /// The row's `name` field, when it has one.
    pub name: Option<Value>,
}

impl VertexRow {
    /// Row for vertex `v`. A handle the graph does not know gets an empty
    /// kind and a null id.
    pub fn describe(builder: &BipartiteBuilder, built: &BipartiteGraph, v: VertexId) -> Self {
        let Some(vertex) = built.graph.vertex(v) else {
            return Self {
                vertex: v,
                kind: String::new(),
                id: Value::Null,
                name: None,
            };
        };
        let id_field = if vertex.kind() == builder.a.kind {
            &builder.a.id_field
        } else {
            &builder.b.id_field
        };
        Self {
            vertex: v,
            kind: vertex.kind().to_string(),
            id: vertex.payload().get(id_field).cloned().unwrap_or(Value::Null),
            name: vertex.payload().get("name").cloned(),
        }
    }

    /// [`VertexRow::describe`] over a list of handles.
    pub fn describe_all(
        builder: &BipartiteBuilder,
        built: &BipartiteGraph,
        vertices: &[VertexId],
    ) -> Vec<Self> {
        vertices
            .iter()
            .map(|&v| Self::describe(builder, built, v))
            .collect()
    }
}

/// Size of a built graph and what the builder saw.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    /// Vertex count.
    pub vertices: usize,
    /// Edge count.
    pub edges: usize,
    /// Vertices per kind.
    pub kinds: BTreeMap<String, usize>,
    /// Join keys found in both relation tables.
    pub shared_keys: usize,
    /// Relation rows skipped for naming an unknown id.
    pub dangling_links: usize,
}

impl GraphSummary {
    /// Summarizes `built`.
    pub fn build(built: &BipartiteGraph) -> Self {
        Self {
            vertices: built.graph.vertex_count(),
            edges: built.graph.edge_count(),
            kinds: count_vertices_by_kind(&built.graph).into_iter().collect(),
            shared_keys: built.stats.shared_keys,
            dangling_links: built.stats.dangling_links,
        }
    }
}

/// One partner in a [`TopReport`].
#[derive(Debug, Clone, Serialize)]
pub struct NeighborRow {
    /// The partner vertex.
    pub neighbor: VertexRow,
    /// Weight of the connecting edge.
    pub weight: u64,
    /// Keys recorded on that edge.
    pub shared_keys: usize,
}

/// The best-connected vertex of one kind and its partners.
#[derive(Debug, Clone, Serialize)]
pub struct TopReport {
    /// Kind the report covers.
    pub kind: String,
    /// Strongest vertex of that kind, `None` when the kind is empty.
    pub top: Option<VertexRow>,
    /// Sum of its edge weights.
    pub total_weight: u64,
    /// Its heaviest partners, at most `limit` of them.
    pub neighbors: Vec<NeighborRow>,
}

impl TopReport {
    /// Picks the strongest vertex of `kind` and lists up to `limit` partners.
    pub fn build(
        builder: &BipartiteBuilder,
        built: &BipartiteGraph,
        kind: &str,
        limit: usize,
    ) -> Result<Self, CliError> {
        let Some((v, total_weight)) = strongest_vertex(&built.graph, kind)? else {
            return Ok(Self {
                kind: kind.to_string(),
                top: None,
                total_weight: 0,
                neighbors: Vec::new(),
            });
        };
        let neighbors = ranked_neighbors(&built.graph, v)?
            .into_iter()
            .take(limit)
            .map(|ranked| NeighborRow {
                neighbor: VertexRow::describe(builder, built, ranked.vertex),
                weight: ranked.weight,
                shared_keys: ranked.shared_keys,
            })
            .collect();
        Ok(Self {
            kind: kind.to_string(),
            top: Some(VertexRow::describe(builder, built, v)),
            total_weight,
            neighbors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    fn sources(dir: &TempDir) -> GraphSources {
        GraphSources {
            a_rows: write(dir, "developers.csv", &["id,name", "1,Valve", "2,Hidden Path"]),
            b_rows: write(dir, "publishers.csv", &["id,name", "10,Valve", "11,Ubisoft"]),
            a_links: write(
                dir,
                "app_developers.csv",
                &["appid,developer_id", "100,1", "101,1", "101,2", "102,2"],
            ),
            b_links: write(
                dir,
                "app_publishers.csv",
                &["appid,publisher_id", "100,10", "101,10", "102,11"],
            ),
        }
    }

    #[test]
    fn graph_loads_from_csv_tables() {
        let dir = TempDir::new().unwrap();
        let builder = BipartiteBuilder::developer_publisher();
        let built = load_graph(&builder, &sources(&dir)).unwrap();
        let summary = GraphSummary::build(&built);
        assert_eq!(summary.vertices, 4);
        assert_eq!(summary.edges, 3);
        assert_eq!(summary.kinds["developer"], 2);
        assert_eq!(summary.shared_keys, 3);
    }

    #[test]
    fn top_developer_and_partners() {
        let dir = TempDir::new().unwrap();
        let builder = BipartiteBuilder::developer_publisher();
        let built = load_graph(&builder, &sources(&dir)).unwrap();
        let report = TopReport::build(&builder, &built, "developer", 5).unwrap();
        let top = report.top.unwrap();
        assert_eq!(top.id, Value::Int(1));
        assert_eq!(report.total_weight, 2);
        assert_eq!(report.neighbors.len(), 1);
        assert_eq!(report.neighbors[0].neighbor.name, Some(Value::from("Valve")));
    }

    #[test]
    fn lookup_by_kind_and_id() {
        let dir = TempDir::new().unwrap();
        let builder = BipartiteBuilder::developer_publisher();
        let built = load_graph(&builder, &sources(&dir)).unwrap();
        let v = lookup(&builder, &built, "publisher", &Value::Int(11)).unwrap();
        assert_eq!(VertexRow::describe(&builder, &built, v).kind, "publisher");
        assert!(lookup(&builder, &built, "platform", &Value::Int(1)).is_err());
        assert!(lookup(&builder, &built, "developer", &Value::Int(99)).is_err());
    }
}

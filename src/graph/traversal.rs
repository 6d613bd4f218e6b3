//! Unweighted traversals over a [`Graph`].
//!
//! Everything here goes through the graph's public adjacency contract
//! (`incident_edges` + `opposite`), so it works for any payload types.

use std::collections::VecDeque;

use super::model::{Graph, VertexId};
use crate::error::{DbError, Result};

fn visited_set<V, E>(graph: &Graph<V, E>) -> Vec<bool> {
    vec![false; graph.vertex_count()]
}

/// Marks `v` visited, returning true if it was not visited before.
fn visit(visited: &mut [bool], v: VertexId) -> bool {
    match visited.get_mut(v.index()) {
        Some(seen) if !*seen => {
            *seen = true;
            true
        }
        _ => false,
    }
}

fn check_start<V, E>(graph: &Graph<V, E>, v: VertexId) -> Result<()> {
    if graph.contains_vertex(v) {
        Ok(())
    } else {
        Err(DbError::UnknownVertex(v))
    }
}

/// Breadth-first traversal from `start`; returns vertices in discovery order.
pub fn bfs<V, E>(graph: &Graph<V, E>, start: VertexId) -> Result<Vec<VertexId>> {
    check_start(graph, start)?;
    let mut visited = visited_set(graph);
    let mut order = Vec::new();
    let mut queue = VecDeque::new();

    visit(&mut visited, start);
    queue.push_back(start);

    while let Some(u) = queue.pop_front() {
        order.push(u);
        for &edge in graph.incident_edges(u)? {
            let v = graph.opposite(u, edge)?;
            if visit(&mut visited, v) {
                queue.push_back(v);
            }
        }
    }

    Ok(order)
}

/// Vertices reachable from `start`, grouped by hop distance.
pub fn bfs_layers<V, E>(graph: &Graph<V, E>, start: VertexId) -> Result<Vec<Vec<VertexId>>> {
    check_start(graph, start)?;
    let mut visited = visited_set(graph);
    let mut layers = Vec::new();
    let mut current = vec![start];
    visit(&mut visited, start);

    while !current.is_empty() {
        let mut next = Vec::new();
        for &u in &current {
            for &edge in graph.incident_edges(u)? {
                let v = graph.opposite(u, edge)?;
                if visit(&mut visited, v) {
                    next.push(v);
                }
            }
        }
        layers.push(std::mem::replace(&mut current, next));
    }

    Ok(layers)
}

/// Depth-first traversal from `start`; returns vertices in discovery order.
///
/// Uses an explicit stack but visits in the same order as the recursive
/// formulation: the first unvisited neighbor is always explored first.
pub fn dfs<V, E>(graph: &Graph<V, E>, start: VertexId) -> Result<Vec<VertexId>> {
    check_start(graph, start)?;
    let mut visited = visited_set(graph);
    let mut order = vec![start];
    let mut stack: Vec<(VertexId, usize)> = vec![(start, 0)];
    visit(&mut visited, start);

    while let Some(&(u, next)) = stack.last() {
        match graph.incident_edges(u)?.get(next) {
            Some(&edge) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let v = graph.opposite(u, edge)?;
                if visit(&mut visited, v) {
                    order.push(v);
                    stack.push((v, 0));
                }
            }
            None => {
                stack.pop();
            }
        }
    }

    Ok(order)
}

/// Fewest-hops path from `start` to `target`, both inclusive. Edge weights
/// are ignored. `Ok(None)` means `target` is unreachable.
pub fn shortest_path<V, E>(
    graph: &Graph<V, E>,
    start: VertexId,
    target: VertexId,
) -> Result<Option<Vec<VertexId>>> {
    check_start(graph, start)?;
    check_start(graph, target)?;
    if start == target {
        return Ok(Some(vec![start]));
    }

    let mut parent: Vec<Option<VertexId>> = vec![None; graph.vertex_count()];
    let mut visited = visited_set(graph);
    let mut queue = VecDeque::new();
    visit(&mut visited, start);
    queue.push_back(start);

    while let Some(u) = queue.pop_front() {
        for &edge in graph.incident_edges(u)? {
            let v = graph.opposite(u, edge)?;
            if !visit(&mut visited, v) {
                continue;
            }
            parent[v.index()] = Some(u);
            if v == target {
                let mut path = vec![v];
                let mut cursor = parent[v.index()];
                while let Some(step) = cursor {
                    path.push(step);
                    cursor = parent[step.index()];
                }
                path.reverse();
                return Ok(Some(path));
            }
            queue.push_back(v);
        }
    }

    Ok(None)
}

/// Partitions all vertices into connected components. Components appear in
/// order of their lowest vertex id.
pub fn connected_components<V, E>(graph: &Graph<V, E>) -> Result<Vec<Vec<VertexId>>> {
    let mut visited = visited_set(graph);
    let mut components = Vec::new();

    for root in graph.vertices() {
        if !visit(&mut visited, root) {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![root];
        while let Some(u) = stack.pop() {
            component.push(u);
            for &edge in graph.incident_edges(u)? {
                let v = graph.opposite(u, edge)?;
                if visit(&mut visited, v) {
                    stack.push(v);
                }
            }
        }
        components.push(component);
    }

    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeData;

    /// 0 - 1 - 2 - 3 and 0 - 4, plus an isolated 5.
    fn sample() -> (Graph<u32>, Vec<VertexId>) {
        let mut graph = Graph::new();
        let v: Vec<_> = (0..6).map(|i| graph.insert_vertex(i, "n")).collect();
        for (a, b) in [(0, 1), (1, 2), (2, 3), (0, 4)] {
            graph.insert_edge(v[a], v[b], EdgeData::default()).unwrap();
        }
        (graph, v)
    }

    #[test]
    fn bfs_is_level_ordered() {
        let (graph, v) = sample();
        assert_eq!(bfs(&graph, v[0]).unwrap(), vec![v[0], v[1], v[4], v[2], v[3]]);
        assert_eq!(bfs(&graph, v[5]).unwrap(), vec![v[5]]);
    }

    #[test]
    fn dfs_goes_deep_first() {
        let (graph, v) = sample();
        assert_eq!(dfs(&graph, v[0]).unwrap(), vec![v[0], v[1], v[2], v[3], v[4]]);
    }

    #[test]
    fn layers_group_by_distance() {
        let (graph, v) = sample();
        assert_eq!(
            bfs_layers(&graph, v[0]).unwrap(),
            vec![vec![v[0]], vec![v[1], v[4]], vec![v[2]], vec![v[3]]]
        );
    }

    #[test]
    fn shortest_path_cases() {
        let (graph, v) = sample();
        assert_eq!(
            shortest_path(&graph, v[4], v[3]).unwrap(),
            Some(vec![v[4], v[0], v[1], v[2], v[3]])
        );
        assert_eq!(shortest_path(&graph, v[2], v[2]).unwrap(), Some(vec![v[2]]));
        assert_eq!(shortest_path(&graph, v[0], v[5]).unwrap(), None);
    }

    #[test]
    fn components_partition_vertices() {
        let (graph, v) = sample();
        let components = connected_components(&graph).unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[1], vec![v[5]]);
        let total: usize = components.iter().map(Vec::len).sum();
        assert_eq!(total, graph.vertex_count());
    }

    #[test]
    fn foreign_start_vertex_is_rejected() {
        let (graph, _) = sample();
        let mut other: Graph<u32> = Graph::new();
        let last = (0..10).map(|i| other.insert_vertex(i, "n")).last().unwrap();
        assert_eq!(bfs(&graph, last).unwrap_err(), DbError::UnknownVertex(last));
        assert!(dfs(&graph, last).is_err());
        assert!(shortest_path(&graph, last, last).is_err());
    }
}

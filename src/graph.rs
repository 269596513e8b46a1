use crate::room::{Room, RoomType};

use petgraph::{stable_graph::StableGraph, unionfind::UnionFind, visit::Dfs, Undirected};
use std::cmp::Ordering;

/// A candidate connection between two rooms, weighted by center distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f32,
}

/// Entrance/Exit pairs and secret rooms ignore the distance and bend limits.
pub fn bypasses_constraints(a: &Room, b: &Room) -> bool {
    let door_pair = matches!(
        (a.room_type, b.room_type),
        (RoomType::Entrance, RoomType::Exit) | (RoomType::Exit, RoomType::Entrance)
    );

    door_pair || a.room_type == RoomType::Secret || b.room_type == RoomType::Secret
}

/// Every room pair within `max_distance`, plus the pairs that bypass the cap. `a < b` always.
pub fn candidate_edges(rooms: &[Room], max_distance: f32) -> Vec<Edge> {
    let mut edges = Vec::new();
    for (i, a) in rooms.iter().enumerate() {
        for (j, b) in rooms.iter().enumerate().skip(i + 1) {
            let weight = a.center_distance(b);
            if weight <= max_distance || bypasses_constraints(a, b) {
                edges.push(Edge { a: i, b: j, weight });
            }
        }
    }
    if edges.is_empty() && rooms.len() > 1 {
        log::warn!(
            "No room pair lies within {} of another; rooms stay disconnected",
            max_distance
        );
    }

    edges
}

/// Kruskal's algorithm. Returns the indices into `edges` of the accepted tree edges, in
/// acceptance order. On a disconnected edge set this is a spanning forest.
pub fn minimum_spanning_tree(node_count: usize, edges: &[Edge]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..edges.len()).collect();
    order.sort_by(|i, j| {
        edges[*i]
            .weight
            .partial_cmp(&edges[*j].weight)
            .unwrap_or(Ordering::Equal)
    });

    let mut components = UnionFind::<usize>::new(node_count);
    let mut tree = Vec::with_capacity(node_count.saturating_sub(1));
    for i in order {
        if tree.len() + 1 >= node_count {
            break;
        }
        let e = &edges[i];
        if components.union(e.a, e.b) {
            tree.push(i);
        }
    }

    tree
}

/// Undirected room adjacency; node weights are room indices.
pub fn adjacency_graph(
    node_count: usize,
    connections: impl IntoIterator<Item = (usize, usize)>,
) -> StableGraph<usize, (), Undirected> {
    let mut graph = StableGraph::default();
    let nodes: Vec<_> = (0..node_count).map(|i| graph.add_node(i)).collect();
    for (a, b) in connections {
        graph.add_edge(nodes[a], nodes[b], ());
    }

    graph
}

/// Depth-first search from `from` looking for `to`.
pub fn is_reachable(graph: &StableGraph<usize, (), Undirected>, from: usize, to: usize) -> bool {
    let start = match graph.node_indices().find(|n| graph[*n] == from) {
        Some(n) => n,
        None => return false,
    };
    let mut dfs = Dfs::new(graph, start);
    while let Some(n) = dfs.next(graph) {
        if graph[n] == to {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extent::Extent, partition::Area, sampling::small_rng};

    use petgraph::{algo::min_spanning_tree, data::Element, Graph};
    use rand::Rng;

    fn room_at(id: usize, x: i32, y: i32) -> Room {
        Room::new(
            id,
            &Area {
                id,
                extent: Extent::new(x, y, 2, 2),
            },
        )
    }

    fn total_weight(edges: &[Edge], tree: &[usize]) -> f32 {
        tree.iter().map(|i| edges[*i].weight).sum()
    }

    #[test]
    fn test_five_rooms_hand_computed_tree() {
        let rooms = vec![
            room_at(0, 0, 0),
            room_at(1, 10, 0),
            room_at(2, 10, 10),
            room_at(3, 0, 10),
            room_at(4, 30, 0),
        ];
        let edges = candidate_edges(&rooms, 1000.0);
        assert_eq!(edges.len(), 10);

        let tree = minimum_spanning_tree(rooms.len(), &edges);

        // Three sides of the square and the hop from (10, 0) to (30, 0).
        assert_eq!(tree.len(), 4);
        assert!((total_weight(&edges, &tree) - 50.0).abs() < 1e-4);
        assert!(tree
            .iter()
            .any(|i| (edges[*i].a, edges[*i].b) == (1, 4)));
    }

    #[test]
    fn test_distance_cap_and_bypass() {
        let mut rooms = vec![room_at(0, 0, 0), room_at(1, 5, 0), room_at(2, 100, 0)];
        assert_eq!(candidate_edges(&rooms, 10.0).len(), 1);

        rooms[2].room_type = RoomType::Secret;
        assert_eq!(candidate_edges(&rooms, 10.0).len(), 3);

        rooms[2].room_type = RoomType::Exit;
        rooms[0].room_type = RoomType::Entrance;
        let edges = candidate_edges(&rooms, 10.0);
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().any(|e| (e.a, e.b) == (0, 2)));
    }

    #[test]
    fn test_tree_weight_matches_petgraph() {
        let mut rng = small_rng(17);
        for _ in 0..50 {
            let n = rng.gen_range(2, 12);
            let rooms: Vec<Room> = (0..n)
                .map(|i| room_at(i, rng.gen_range(0, 60), rng.gen_range(0, 60)))
                .collect();
            let edges = candidate_edges(&rooms, 1000.0);
            let tree = minimum_spanning_tree(n, &edges);

            let mut oracle = Graph::<(), f32, Undirected>::new_undirected();
            let nodes: Vec<_> = (0..n).map(|_| oracle.add_node(())).collect();
            for e in edges.iter() {
                oracle.add_edge(nodes[e.a], nodes[e.b], e.weight);
            }
            let oracle_weight: f32 = min_spanning_tree(&oracle)
                .filter_map(|element| match element {
                    Element::Edge { weight, .. } => Some(weight),
                    _ => None,
                })
                .sum();

            assert_eq!(tree.len(), n - 1);
            assert!((total_weight(&edges, &tree) - oracle_weight).abs() < 1e-3);

            let graph = adjacency_graph(n, tree.iter().map(|i| (edges[*i].a, edges[*i].b)));
            for target in 1..n {
                assert!(is_reachable(&graph, 0, target));
            }
        }
    }

    #[test]
    fn test_reachability_respects_components() {
        let graph = adjacency_graph(4, vec![(0, 1), (2, 3)]);

        assert!(is_reachable(&graph, 1, 0));
        assert!(!is_reachable(&graph, 0, 3));
        assert!(!is_reachable(&graph, 0, 9));
    }
}

//! Weighted path graph and shortest-route search used by the world crate.

use std::collections::{BTreeMap, BTreeSet};

use gate_defence_core::{MapConfig, NodeId, NodeKind, PathNode, Vec2};

/// Base weight of an edge between consecutive main-path waypoints.
pub const MAIN_EDGE_WEIGHT: f32 = 1.0;
/// Base weight of an edge that enters, walks or leaves a detour.
pub const DETOUR_EDGE_WEIGHT: f32 = 20.0;

/// Directed weighted connection between two path nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathEdge {
    from: NodeId,
    to: NodeId,
    weight: f32,
    base_weight: f32,
}

impl PathEdge {
    /// Creates an unblocked edge with the provided base weight.
    #[must_use]
    pub const fn new(from: NodeId, to: NodeId, weight: f32) -> Self {
        Self {
            from,
            to,
            weight,
            base_weight: weight,
        }
    }

    /// Node the edge leaves.
    #[must_use]
    pub const fn from(&self) -> NodeId {
        self.from
    }

    /// Node the edge enters.
    #[must_use]
    pub const fn to(&self) -> NodeId {
        self.to
    }

    /// Current traversal cost; infinite while the destination is blocked.
    #[must_use]
    pub const fn weight(&self) -> f32 {
        self.weight
    }
}

/// Directed graph of waypoints enemies walk along.
///
/// Nodes are immutable once built. Blocking a node never removes it: every
/// edge entering the node becomes infinitely expensive instead, and the
/// adjacency list is rebuilt from the edge list.
#[derive(Clone, Debug)]
pub struct PathGraph {
    nodes: Vec<PathNode>,
    index: BTreeMap<NodeId, usize>,
    edges: Vec<PathEdge>,
    adjacency: Vec<Vec<(usize, f32)>>,
    blocked: BTreeSet<NodeId>,
    start: NodeId,
    finish: NodeId,
}

impl PathGraph {
    /// Builds a graph from explicit nodes and edges.
    ///
    /// The first node is the start and the last node is the finish. Edges that
    /// reference unknown nodes are ignored.
    #[must_use]
    pub fn new(nodes: Vec<PathNode>, edges: Vec<PathEdge>) -> Self {
        let index: BTreeMap<NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.id, position))
            .collect();
        let start = nodes.first().map_or(NodeId::Main(0), |node| node.id);
        let finish = nodes.last().map_or(NodeId::Main(0), |node| node.id);
        let edges = edges
            .into_iter()
            .filter(|edge| index.contains_key(&edge.from) && index.contains_key(&edge.to))
            .collect();

        let mut graph = Self {
            nodes,
            index,
            edges,
            adjacency: Vec::new(),
            blocked: BTreeSet::new(),
            start,
            finish,
        };
        graph.rebuild_adjacency();
        graph
    }

    /// Builds the graph described by a validated map layout.
    ///
    /// Main-path waypoints become `node_i`; waypoints whose index matches a
    /// detour's obstacle index are tagged as obstacles. Each detour contributes
    /// its own chain of nodes connected to its enter and exit waypoints with
    /// heavier edges, so the search prefers the main path until it is blocked.
    #[must_use]
    pub fn from_map(map: &MapConfig) -> Self {
        let obstacles: BTreeSet<usize> = map
            .detours
            .iter()
            .map(|detour| detour.obstacle_index)
            .collect();

        let mut nodes: Vec<PathNode> = map
            .waypoints
            .iter()
            .enumerate()
            .map(|(index, &position)| PathNode {
                id: main_id(index),
                position,
                kind: if obstacles.contains(&index) {
                    NodeKind::Obstacle
                } else {
                    NodeKind::Default
                },
            })
            .collect();

        let mut edges: Vec<PathEdge> = (1..map.waypoints.len())
            .map(|index| PathEdge::new(main_id(index - 1), main_id(index), MAIN_EDGE_WEIGHT))
            .collect();

        let mut detour_nodes = Vec::new();
        for detour in &map.detours {
            let ids: Vec<NodeId> = (0..detour.waypoints.len())
                .map(|index| NodeId::Detour {
                    obstacle: to_u32(detour.obstacle_index),
                    index: to_u32(index),
                })
                .collect();

            detour_nodes.extend(ids.iter().zip(&detour.waypoints).map(
                |(&id, &position): (&NodeId, &Vec2)| PathNode {
                    id,
                    position,
                    kind: NodeKind::Detour,
                },
            ));

            let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
                continue;
            };
            edges.push(PathEdge::new(
                main_id(detour.enter_index),
                first,
                DETOUR_EDGE_WEIGHT,
            ));
            edges.extend(
                ids.windows(2)
                    .map(|pair| PathEdge::new(pair[0], pair[1], DETOUR_EDGE_WEIGHT)),
            );
            edges.push(PathEdge::new(
                last,
                main_id(detour.exit_index),
                DETOUR_EDGE_WEIGHT,
            ));
        }

        nodes.extend(detour_nodes);

        let mut graph = Self::new(nodes, edges);
        graph.start = main_id(0);
        graph.finish = main_id(map.waypoints.len().saturating_sub(1));
        graph
    }

    /// Node enemies enter at.
    #[must_use]
    pub const fn start(&self) -> NodeId {
        self.start
    }

    /// Node enemies walk toward.
    #[must_use]
    pub const fn finish(&self) -> NodeId {
        self.finish
    }

    /// Every node of the graph.
    #[must_use]
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    /// Every edge of the graph with its current weight.
    #[must_use]
    pub fn edges(&self) -> &[PathEdge] {
        &self.edges
    }

    /// Looks up a node by identifier.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&PathNode> {
        self.index.get(&id).map(|&position| &self.nodes[position])
    }

    /// Reports whether the node is currently blocked.
    #[must_use]
    pub fn is_blocked(&self, id: NodeId) -> bool {
        self.blocked.contains(&id)
    }

    /// Blocks or unblocks a node by rewriting the weight of every incoming edge.
    ///
    /// Returns `false` when the node is unknown.
    pub fn set_node_blocked(&mut self, id: NodeId, blocked: bool) -> bool {
        if !self.index.contains_key(&id) {
            return false;
        }

        for edge in self.edges.iter_mut().filter(|edge| edge.to == id) {
            edge.weight = if blocked {
                f32::INFINITY
            } else {
                edge.base_weight
            };
        }

        if blocked {
            let _ = self.blocked.insert(id);
        } else {
            let _ = self.blocked.remove(&id);
        }

        self.rebuild_adjacency();
        true
    }

    /// Finds the cheapest route from `start` to `end`, both endpoints included.
    ///
    /// Returns an empty route when either node is unknown or every route
    /// crosses a blocked edge.
    #[must_use]
    pub fn find_path(&self, start: NodeId, end: NodeId) -> Vec<PathNode> {
        let Some((end_index, previous)) = self.search(start, end) else {
            return Vec::new();
        };

        let mut route = Vec::new();
        let mut cursor = Some(end_index);
        while let Some(current) = cursor {
            route.push(self.nodes[current]);
            cursor = previous[current];
        }
        route.reverse();
        route
    }

    /// Total weight of the cheapest route, or `None` when none exists.
    #[must_use]
    pub fn shortest_distance(&self, start: NodeId, end: NodeId) -> Option<f32> {
        let start_index = *self.index.get(&start)?;
        let (end_index, previous) = self.search(start, end)?;

        let mut total = 0.0;
        let mut cursor = end_index;
        while cursor != start_index {
            let parent = previous[cursor]?;
            total += self.adjacency[parent]
                .iter()
                .filter(|(neighbor, _)| *neighbor == cursor)
                .map(|(_, weight)| *weight)
                .fold(f32::INFINITY, f32::min);
            cursor = parent;
        }
        Some(total)
    }

    /// Dijkstra over the adjacency list with a linear scan for the closest
    /// unvisited node. Ties resolve to the node stored first.
    fn search(&self, start: NodeId, end: NodeId) -> Option<(usize, Vec<Option<usize>>)> {
        let start = *self.index.get(&start)?;
        let end = *self.index.get(&end)?;
        let count = self.nodes.len();

        let mut distances = vec![f32::INFINITY; count];
        let mut previous: Vec<Option<usize>> = vec![None; count];
        let mut unvisited = vec![true; count];
        distances[start] = 0.0;

        loop {
            let mut closest = None;
            let mut closest_distance = f32::INFINITY;
            for (candidate, open) in unvisited.iter().enumerate() {
                if *open && distances[candidate] < closest_distance {
                    closest_distance = distances[candidate];
                    closest = Some(candidate);
                }
            }

            let Some(current) = closest else {
                break;
            };
            if current == end {
                break;
            }
            unvisited[current] = false;

            for &(neighbor, weight) in &self.adjacency[current] {
                if !unvisited[neighbor] {
                    continue;
                }
                let candidate = distances[current] + weight;
                if candidate < distances[neighbor] {
                    distances[neighbor] = candidate;
                    previous[neighbor] = Some(current);
                }
            }
        }

        if distances[end].is_infinite() {
            return None;
        }
        Some((end, previous))
    }

    fn rebuild_adjacency(&mut self) {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            let (Some(&from), Some(&to)) = (self.index.get(&edge.from), self.index.get(&edge.to))
            else {
                continue;
            };
            adjacency[from].push((to, edge.weight));
        }
        self.adjacency = adjacency;
    }
}

fn main_id(index: usize) -> NodeId {
    NodeId::Main(to_u32(index))
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

//! Traversal of a two-ring graph to produce the result of a set operation.

use smallvec::SmallVec;

use crate::{
    geom::{self, Point},
    graph::{Flags, Graph, Locations, NodeIdx, Side},
    num::Float,
    BooleanOp,
};

/// How an edge of one ring relates to the other ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeFlag {
    /// The edge is shared with the other ring, which runs along it in the same direction.
    OnFwd,
    /// The edge is shared with the other ring, which runs along it in the opposite direction.
    OnBck,
    /// The edge is inside the other ring.
    In,
    /// The edge is outside the other ring.
    Out,
}

/// Whether an edge belongs to the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraversalFlag {
    /// The edge is part of the output boundary.
    En,
    /// The edge is not part of the output boundary.
    Ex,
}

/// Classifies the edge that starts at `curr`.
pub fn edge_flag<F: Float>(graph: &Graph<F>, locations: &Locations, curr: NodeIdx) -> EdgeFlag {
    let node = &graph[curr];
    let next = node.next;
    let other = node.side().other();

    let opposite = |idx: NodeIdx| -> SmallVec<[NodeIdx; 8]> {
        locations
            .at(idx)
            .into_iter()
            .filter(|&n| graph[n].side() == other)
            .collect()
    };
    let here = opposite(curr);
    if !here.is_empty() {
        let there = opposite(next);
        for &a in &here {
            for &b in &there {
                if graph[a].next == b {
                    return EdgeFlag::OnFwd;
                }
                if graph[b].next == a {
                    return EdgeFlag::OnBck;
                }
            }
        }
    }

    let mid = node.site.midpoint(&graph[next].site);
    if geom::contains(graph.ring(other), &mid) {
        EdgeFlag::In
    } else {
        EdgeFlag::Out
    }
}

/// Decides whether an edge on `side`, classified as `edge`, is part of the result of `op`.
///
/// For differences, the second ring must have been reversed before building the graph.
pub fn traversal_flag(op: BooleanOp, side: Side, edge: EdgeFlag) -> Option<TraversalFlag> {
    use EdgeFlag::*;
    use TraversalFlag::*;

    match (op, side, edge) {
        // A shared edge is only emitted once, from the first ring.
        (_, Side::P, OnFwd) => Some(En),
        (_, Side::Q, OnFwd) => None,
        (_, _, OnBck) => None,
        (BooleanOp::Union, _, Out) => Some(En),
        (BooleanOp::Union, _, In) => Some(Ex),
        (BooleanOp::Intersection, _, In) => Some(En),
        (BooleanOp::Intersection, _, Out) => Some(Ex),
        (BooleanOp::Difference, Side::P, Out) => Some(En),
        (BooleanOp::Difference, Side::P, In) => Some(Ex),
        (BooleanOp::Difference, Side::Q, In) => Some(En),
        (BooleanOp::Difference, Side::Q, Out) => Some(Ex),
    }
}

fn same_direction<F: Float>(a: geom::Vector<F>, b: geom::Vector<F>) -> bool {
    let o = Point::default();
    geom::orientation(&o, &(o + a), &(o + b)) == F::ZERO && a.dot(&b) > F::ZERO
}

/// Untangles crowded locations.
///
/// Wherever a node has more than two neighbours and one neighbour's incoming edge continues
/// straight into another neighbour's outgoing edge, the two neighbours swap predecessors and
/// both are unlinked from the crowded node.
pub fn disambiguate<F: Float>(graph: &mut Graph<F>) {
    let crowded: Vec<NodeIdx> = graph
        .live_nodes()
        .filter(|&n| graph[n].neighbors.len() > 2)
        .collect();

    for i in crowded {
        while graph[i].neighbors.len() > 2 {
            let Some((n1, n2)) = continuing_pair(graph, i) else {
                break;
            };
            let p1 = graph[n1].prev;
            let p2 = graph[n2].prev;
            if p1 != n2 && p2 != n1 {
                graph[p1].next = n2;
                graph[n2].prev = p1;
                graph[p2].next = n1;
                graph[n1].prev = p2;
            }
            for n in [n1, n2] {
                graph[i].neighbors.retain(|m| *m != n);
                graph[n].neighbors.retain(|m| *m != i);
            }
            tracing::trace!("untangled {n1:?} and {n2:?} at {i:?}");
        }
    }
}

fn continuing_pair<F: Float>(graph: &Graph<F>, i: NodeIdx) -> Option<(NodeIdx, NodeIdx)> {
    let neighbors = &graph[i].neighbors;
    for &n1 in neighbors {
        let incoming = graph[n1].site - graph[graph[n1].prev].site;
        for &n2 in neighbors {
            if n1 == n2 {
                continue;
            }
            let outgoing = graph[graph[n2].next].site - graph[n2].site;
            if same_direction(incoming, outgoing) {
                return Some((n1, n2));
            }
        }
    }
    None
}

/// Walks the graph, returning the rings bounding the result of `op`.
///
/// Output rings wind counter-clockwise around filled regions and clockwise around holes.
pub fn traverse<F: Float>(graph: &mut Graph<F>, op: BooleanOp) -> Vec<Vec<Point<F>>> {
    let locations = graph.locations();
    let mut flags = vec![None; graph.len()];
    for idx in graph.live_nodes() {
        let edge = edge_flag(graph, &locations, idx);
        flags[idx.0] = traversal_flag(op, graph[idx].side(), edge);
        tracing::trace!("edge {idx:?}: {edge:?} -> {:?}", flags[idx.0]);
    }

    disambiguate(graph);

    let walker = Walker {
        locations: &locations,
        flags: &flags,
        direction: if op == BooleanOp::Union {
            F::ONE
        } else {
            -F::ONE
        },
        limit: 2 * graph.len() + 2,
    };

    let starts: Vec<NodeIdx> = graph.events().chain(graph.live_nodes()).collect();
    let mut rings = Vec::new();
    for start in starts {
        if graph[start].is_visited() || flags[start.0] != Some(TraversalFlag::En) {
            continue;
        }
        if let Some(ring) = walker.walk(graph, start) {
            if geom::signed_area(&ring) != F::ZERO {
                rings.push(ring);
            } else {
                tracing::trace!("dropping degenerate ring from {start:?}");
            }
        }
    }
    tracing::debug!(
        ?op,
        locations = locations.len(),
        rings = rings.len(),
        "traversed set operation"
    );
    rings
}

struct Walker<'a, F: Float> {
    locations: &'a Locations,
    flags: &'a [Option<TraversalFlag>],
    direction: F,
    limit: usize,
}

impl<F: Float> Walker<'_, F> {
    fn walk(&self, graph: &mut Graph<F>, start: NodeIdx) -> Option<Vec<Point<F>>> {
        let mut ring = Vec::new();
        let mut cur = start;
        for _ in 0..self.limit {
            ring.push(graph[cur].site);
            graph[cur].flags.insert(Flags::VISITED);

            let next = graph[cur].next;
            let here = self.locations.at(next);
            if here.len() == 1 {
                if next == start {
                    return Some(ring);
                }
                cur = next;
                continue;
            }

            // Leave the location along the output edge that turns least, measured from the
            // edge we arrived on. Passing through the start's location only closes the ring
            // if the start's own edge is the one that turns least.
            let back = (graph[cur].site - graph[next].site).angle();
            let turn = |m: NodeIdx| {
                let exit = (graph[graph[m].next].site - graph[m].site).angle();
                geom::turn(back, exit, self.direction)
            };
            let best = here
                .iter()
                .copied()
                .filter(|&m| {
                    m == start
                        || (!graph[m].is_visited() && self.flags[m.0] == Some(TraversalFlag::En))
                })
                .min_by(|&a, &b| turn(a).total_cmp(&turn(b)));
            match best {
                Some(m) if m == start => return Some(ring),
                Some(m) => cur = m,
                None => {
                    tracing::debug!("walk from {start:?} has no way out of {next:?}");
                    return None;
                }
            }
        }
        tracing::debug!("walk from {start:?} did not close");
        None
    }
}

//! The node graph shared by the set-operation and simplification traversals.
//!
//! Input rings are stored as circular doubly-linked lists of [`Node`]s in a single arena,
//! and every place where two edges meet gets a pair of intersection nodes, one spliced into
//! each edge. After [`Graph::build`], nodes that describe the same location are linked
//! through their neighbour sets.

use std::cmp::Ordering;

use smallvec::{smallvec, SmallVec};

use crate::{
    geom::{self, Point},
    num::Float,
    sweep::{self, SweepEdge},
};

/// A node's position in the arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(pub usize);

impl std::fmt::Debug for NodeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n_{}", self.0)
    }
}

/// The most neighbours a single intersection node can have.
pub const MAX_NEIGHBORS: usize = 4;

/// A small set of node flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const P: Flags = Flags(1 << 0);
    pub const Q: Flags = Flags(1 << 1);
    pub const START: Flags = Flags(1 << 2);
    pub const INTERSECT: Flags = Flags(1 << 3);
    pub const VISITED: Flags = Flags(1 << 4);

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = [
            (Flags::P, "P"),
            (Flags::Q, "Q"),
            (Flags::START, "START"),
            (Flags::INTERSECT, "INTERSECT"),
            (Flags::VISITED, "VISITED"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "-")?;
        }
        Ok(())
    }
}

/// Which input a node came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    P,
    Q,
}

impl Side {
    fn flag(self) -> Flags {
        match self {
            Side::P => Flags::P,
            Side::Q => Flags::Q,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::P => 0,
            Side::Q => 1,
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::P => Side::Q,
            Side::Q => Side::P,
        }
    }
}

/// A vertex of one of the rings, either an input vertex or an intersection.
#[derive(Clone, Debug)]
pub struct Node<F: Float> {
    pub site: Point<F>,
    pub flags: Flags,
    pub next: NodeIdx,
    pub prev: NodeIdx,
    /// For intersections, the parametric position along the host edge.
    pub alpha: F,
    /// For intersections, the input vertex that starts the host edge. Input vertices
    /// are their own origin.
    pub origin: NodeIdx,
    /// For intersections, the nodes (on any ring) at the same location.
    pub neighbors: SmallVec<[NodeIdx; MAX_NEIGHBORS]>,
}

impl<F: Float> Node<F> {
    pub fn side(&self) -> Side {
        if self.flags.contains(Flags::Q) {
            Side::Q
        } else {
            Side::P
        }
    }

    pub fn is_intersection(&self) -> bool {
        self.flags.contains(Flags::INTERSECT)
    }

    pub fn is_visited(&self) -> bool {
        self.flags.contains(Flags::VISITED)
    }
}

/// What the graph is going to be used for, which decides which edges get tested against
/// each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphKind {
    /// Two input rings; only edges from different rings are intersected.
    SetOp,
    /// One input ring, intersected with itself.
    Simplify,
}

impl GraphKind {
    fn tests(self, a: Side, b: Side) -> bool {
        match self {
            GraphKind::SetOp => a != b,
            GraphKind::Simplify => true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct EventKey<F: Float> {
    side: Side,
    origin: NodeIdx,
    alpha: F,
    partner: Option<NodeIdx>,
}

impl<F: Float> EventKey<F> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.side
            .cmp(&other.side)
            .then(self.origin.cmp(&other.origin))
            .then_with(|| self.alpha.total_cmp(&other.alpha))
            .then(self.partner.cmp(&other.partner))
    }
}

/// A node that a traversal might start from: a ring's first vertex or an intersection.
#[derive(Clone, Copy, Debug)]
pub struct Event<F: Float> {
    pub node: NodeIdx,
    key: EventKey<F>,
}

/// The ring graph.
#[derive(Clone, Debug)]
pub struct Graph<F: Float> {
    kind: GraphKind,
    nodes: Vec<Node<F>>,
    events: Vec<Event<F>>,
    rings: [Vec<Point<F>>; 2],
}

impl<F: Float> std::ops::Index<NodeIdx> for Graph<F> {
    type Output = Node<F>;

    fn index(&self, idx: NodeIdx) -> &Node<F> {
        &self.nodes[idx.0]
    }
}

impl<F: Float> std::ops::IndexMut<NodeIdx> for Graph<F> {
    fn index_mut(&mut self, idx: NodeIdx) -> &mut Node<F> {
        &mut self.nodes[idx.0]
    }
}

impl<F: Float> Graph<F> {
    /// Creates an empty graph, with room for rings of `n` and `m` points.
    pub fn new(kind: GraphKind, n: usize, m: usize) -> Self {
        // Intersections can't be bounded in advance; this covers the usual case of a
        // few crossings per edge.
        let capacity = 3 * (n + m);
        Graph {
            kind,
            nodes: Vec::with_capacity(capacity),
            events: Vec::with_capacity(capacity),
            rings: [Vec::with_capacity(n), Vec::with_capacity(m)],
        }
    }

    /// The size of the arena, including nodes that have been bypassed.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Adds the first ring.
    pub fn push_p(&mut self, points: impl IntoIterator<Item = Point<F>>) {
        self.push_ring(Side::P, points);
    }

    /// Adds the second ring.
    pub fn push_q(&mut self, points: impl IntoIterator<Item = Point<F>>) {
        self.push_ring(Side::Q, points);
    }

    fn push_ring(&mut self, side: Side, points: impl IntoIterator<Item = Point<F>>) {
        let mut pts: Vec<Point<F>> = Vec::new();
        for p in points {
            if pts.last() != Some(&p) {
                pts.push(p);
            }
        }
        while pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }

        // Anything with fewer than three distinct points encloses nothing.
        if pts.len() < 3 {
            pts.clear();
        } else {
            let first = self.nodes.len();
            let n = pts.len();
            for (i, p) in pts.iter().enumerate() {
                self.nodes.push(Node {
                    site: *p,
                    flags: side.flag(),
                    next: NodeIdx(first + (i + 1) % n),
                    prev: NodeIdx(first + (i + n - 1) % n),
                    alpha: F::ZERO,
                    origin: NodeIdx(first + i),
                    neighbors: SmallVec::new(),
                });
            }
            let start = NodeIdx(first);
            self[start].flags.insert(Flags::START);
            self.events.push(Event {
                node: start,
                key: EventKey {
                    side,
                    origin: start,
                    alpha: F::ZERO,
                    partner: None,
                },
            });
        }
        self.rings[side.index()] = pts;
    }

    /// The ring that was pushed for `side`, after duplicate removal.
    pub fn ring(&self, side: Side) -> &[Point<F>] {
        &self.rings[side.index()]
    }

    /// Finds and splices in all intersections, and collapses coincident nodes.
    pub fn build(&mut self) {
        self.find_intersections();
        self.splice();
        self.collapse();
        self.events
            .retain(|ev| is_live(&self.nodes, ev.node) && is_event(&self.nodes[ev.node.0]));
        tracing::debug!(
            kind = ?self.kind,
            nodes = self.nodes.len(),
            events = self.events.len(),
            intersections = self.live_nodes().filter(|&n| self[n].is_intersection()).count(),
            "built graph"
        );
    }

    fn find_intersections(&mut self) {
        let edges: Vec<_> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| SweepEdge::new(NodeIdx(i), node.site, self.nodes[node.next.0].site))
            .collect();
        let kind = self.kind;
        let nodes = &self.nodes;
        let pairs = sweep::candidate_pairs(&edges, F::eps(), |a, b| {
            a != b && kind.tests(nodes[a.0].side(), nodes[b.0].side())
        });

        for (a, b) in pairs {
            let (a, b) = match self.kind {
                GraphKind::SetOp if self[a].side() == Side::Q => (b, a),
                GraphKind::Simplify if b < a => (b, a),
                _ => (a, b),
            };
            let a1 = self[a].site;
            let a2 = self[self[a].next].site;
            let b1 = self[b].site;
            let b2 = self[self[b].next].site;
            for (s, t, point) in geom::hits(&a1, &a2, &b1, &b2) {
                // A hit at the end of an edge is also at the start of the next one, where
                // it gets recorded.
                if s < F::ONE && t < F::ONE {
                    self.record(a, s, b, t, point);
                }
            }
        }
        self.events.sort_by(|x, y| x.key.cmp(&y.key));
    }

    fn record(&mut self, a: NodeIdx, s: F, b: NodeIdx, t: F, point: Point<F>) {
        let i = NodeIdx(self.nodes.len());
        let j = NodeIdx(i.0 + 1);
        for (idx, origin, alpha, partner) in [(i, a, s, j), (j, b, t, i)] {
            let side = self[origin].side();
            self.nodes.push(Node {
                site: point,
                flags: side.flag() | Flags::INTERSECT,
                next: idx,
                prev: idx,
                alpha,
                origin,
                neighbors: smallvec![partner],
            });
            self.events.push(Event {
                node: idx,
                key: EventKey {
                    side,
                    origin,
                    alpha,
                    partner: Some(partner),
                },
            });
        }
        tracing::trace!(?a, ?s, ?b, ?t, ?point, "recorded intersection {i:?}/{j:?}");
    }

    fn splice(&mut self) {
        // Going backwards, each intersection is inserted directly after its origin and so
        // in front of the ones with a larger alpha.
        for k in (0..self.events.len()).rev() {
            let idx = self.events[k].node;
            if self[idx].is_intersection() {
                let origin = self[idx].origin;
                self.insert_after(origin, idx);
                tracing::trace!(alpha = ?self[idx].alpha, "spliced {idx:?} after {origin:?}");
            }
        }
    }

    fn insert_after(&mut self, at: NodeIdx, idx: NodeIdx) {
        let next = self[at].next;
        self[idx].prev = at;
        self[idx].next = next;
        self[next].prev = idx;
        self[at].next = idx;
    }

    /// Unlinks a node from its ring, leaving it pointing at itself.
    pub fn bypass(&mut self, idx: NodeIdx) {
        let prev = self[idx].prev;
        let next = self[idx].next;
        self[prev].next = next;
        self[next].prev = prev;
        self[idx].next = idx;
        self[idx].prev = idx;

        let neighbors = std::mem::take(&mut self[idx].neighbors);
        for nb in neighbors {
            self[nb].neighbors.retain(|n| *n != idx);
        }
        self[idx].flags.remove(Flags::START | Flags::INTERSECT);
        tracing::trace!("bypassed {idx:?}");
    }

    pub fn is_live(&self, idx: NodeIdx) -> bool {
        is_live(&self.nodes, idx)
    }

    fn collapse(&mut self) {
        let order: Vec<NodeIdx> = self.events.iter().map(|ev| ev.node).collect();

        // Plain vertices that sit on top of an intersection are redundant.
        for &i in &order {
            if !self[i].is_intersection() || !self.is_live(i) {
                continue;
            }
            loop {
                let p = self[i].prev;
                if p == i || self[p].is_intersection() || !self.coincident(p, i) {
                    break;
                }
                self.bypass(p);
            }
            loop {
                let n = self[i].next;
                if n == i || self[n].is_intersection() || !self.coincident(n, i) {
                    break;
                }
                self.bypass(n);
            }
        }

        // The same crossing recorded twice (by two host edges on each side). Dropping the
        // second copy on both rings leaves `i` and `pi` as partners, just like unlinking both
        // copies would. Merging rather than plainly bypassing also keeps any third node that
        // was linked only to a dropped copy at this location.
        for &i in &order {
            if !self[i].is_intersection() || !self.is_live(i) {
                continue;
            }
            let n = self[i].next;
            if n == i || !self[n].is_intersection() || !self.coincident(i, n) {
                continue;
            }
            if let Some((pi, pn)) = self.duplicate_partners(i, n) {
                tracing::trace!("dropping duplicate pair {n:?}/{pn:?}");
                self.merge_into(n, i);
                self.merge_into(pn, pi);
            }
        }

        // Anything else stacked at one location merges into a single node per ring pass.
        for &i in &order {
            if !self[i].is_intersection() || !self.is_live(i) {
                continue;
            }
            let n = self[i].next;
            if n != i && self[n].is_intersection() && self.coincident(i, n) {
                self.merge_into(i, n);
            }
        }
    }

    fn coincident(&self, a: NodeIdx, b: NodeIdx) -> bool {
        geom::coincident(&self[a].site, &self[b].site)
    }

    fn duplicate_partners(&self, i: NodeIdx, n: NodeIdx) -> Option<(NodeIdx, NodeIdx)> {
        for &pi in &self[i].neighbors {
            for &pn in &self[n].neighbors {
                if pi == n || pn == i || pi == pn {
                    continue;
                }
                let adjacent = self[pi].next == pn || self[pn].next == pi;
                if adjacent && self.coincident(pi, pn) {
                    return Some((pi, pn));
                }
            }
        }
        None
    }

    /// Hands the neighbours of `from` over to `into` and removes `from` from its ring.
    ///
    /// A neighbour is only transferred if both it and `into` have room for the new link.
    fn merge_into(&mut self, from: NodeIdx, into: NodeIdx) {
        let neighbors = std::mem::take(&mut self[from].neighbors);
        for nb in neighbors {
            self[nb].neighbors.retain(|n| *n != from);
            if nb == into {
                continue;
            }
            let has_into = self[nb].neighbors.contains(&into);
            let has_nb = self[into].neighbors.contains(&nb);
            let room = (has_into || self[nb].neighbors.len() < MAX_NEIGHBORS)
                && (has_nb || self[into].neighbors.len() < MAX_NEIGHBORS);
            if !room {
                tracing::debug!("neighbour set of {into:?} is full, dropping {nb:?}");
                continue;
            }
            if !has_into {
                self[nb].neighbors.push(into);
            }
            if !has_nb {
                self[into].neighbors.push(nb);
            }
        }
        tracing::trace!("merged {from:?} into {into:?}");
        self.bypass(from);
    }

    /// The nodes that traversals may start from, in deterministic order.
    pub fn events(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.events.iter().map(|ev| ev.node)
    }

    /// All nodes that are still linked into a ring.
    pub fn live_nodes(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        (0..self.nodes.len())
            .map(NodeIdx)
            .filter(|&idx| self.is_live(idx))
    }

    /// Returns true if any two edges met anywhere.
    pub fn has_intersections(&self) -> bool {
        self.live_nodes().any(|n| self[n].is_intersection())
    }

    /// Groups the intersection nodes by location.
    pub fn locations(&self) -> Locations {
        let mut group = vec![usize::MAX; self.nodes.len()];
        let mut members: Vec<SmallVec<[NodeIdx; 8]>> = Vec::new();
        for start in self.live_nodes() {
            if !self[start].is_intersection() || group[start.0] != usize::MAX {
                continue;
            }
            let id = members.len();
            let mut found: SmallVec<[NodeIdx; 8]> = smallvec![start];
            group[start.0] = id;
            let mut k = 0;
            while k < found.len() {
                let cur = found[k];
                for &nb in &self[cur].neighbors {
                    if group[nb.0] == usize::MAX && self.is_live(nb) {
                        group[nb.0] = id;
                        found.push(nb);
                    }
                }
                k += 1;
            }
            members.push(found);
        }
        Locations { group, members }
    }
}

fn is_live<F: Float>(nodes: &[Node<F>], idx: NodeIdx) -> bool {
    let node = &nodes[idx.0];
    node.next != idx || node.prev != idx
}

fn is_event<F: Float>(node: &Node<F>) -> bool {
    node.flags.contains(Flags::START) || node.is_intersection()
}

/// The intersection nodes of a graph, grouped by shared location.
#[derive(Clone, Debug)]
pub struct Locations {
    group: Vec<usize>,
    members: Vec<SmallVec<[NodeIdx; 8]>>,
}

impl Locations {
    /// All the nodes at the same location as `idx`, including `idx` itself.
    pub fn at(&self, idx: NodeIdx) -> SmallVec<[NodeIdx; 8]> {
        match self.group.get(idx.0) {
            Some(&g) if g != usize::MAX => self.members[g].clone(),
            _ => smallvec![idx],
        }
    }

    /// The number of locations.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// The nodes at each location.
    pub fn iter(&self) -> impl Iterator<Item = &[NodeIdx]> + '_ {
        self.members.iter().map(|m| m.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point<f64>> {
        coords.iter().map(|&c| c.into()).collect()
    }

    fn set_op(p: &[(f64, f64)], q: &[(f64, f64)]) -> Graph<f64> {
        let mut g = Graph::new(GraphKind::SetOp, p.len(), q.len());
        g.push_p(pts(p));
        g.push_q(pts(q));
        g.build();
        check_invariants(&g);
        g
    }

    fn walk(g: &Graph<f64>, start: NodeIdx) -> Vec<Point<f64>> {
        let mut ret = vec![g[start].site];
        let mut cur = g[start].next;
        while cur != start {
            ret.push(g[cur].site);
            cur = g[cur].next;
        }
        ret
    }

    fn first_live(g: &Graph<f64>, side: Side) -> NodeIdx {
        g.events().find(|&n| g[n].side() == side).unwrap()
    }

    fn check_invariants(g: &Graph<f64>) {
        for idx in g.live_nodes() {
            let node = &g[idx];
            assert_eq!(g[node.next].prev, idx);
            assert_eq!(g[node.prev].next, idx);
            assert!(node.neighbors.len() <= MAX_NEIGHBORS);
            for nb in &node.neighbors {
                assert!(g[*nb].neighbors.contains(&idx), "{idx:?} -> {nb:?}");
            }
        }
    }

    #[test]
    fn ingestion_drops_duplicates() {
        let mut g = Graph::new(GraphKind::SetOp, 5, 0);
        g.push_p(pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]));
        assert_eq!(g.ring(Side::P), pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]));
        assert_eq!(g.live_nodes().count(), 3);
        assert_eq!(g.events().count(), 1);
    }

    #[test]
    fn crossing_squares() {
        let g = set_op(
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            &[(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)],
        );
        assert!(g.has_intersections());
        assert_eq!(
            walk(&g, first_live(&g, Side::P)),
            pts(&[
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 5.0),
                (10.0, 10.0),
                (5.0, 10.0),
                (0.0, 10.0)
            ])
        );
        assert_eq!(
            walk(&g, first_live(&g, Side::Q)),
            pts(&[
                (5.0, 5.0),
                (10.0, 5.0),
                (15.0, 5.0),
                (15.0, 15.0),
                (5.0, 15.0),
                (5.0, 10.0)
            ])
        );
        assert_eq!(g.locations().len(), 2);
    }

    #[test]
    fn intersections_ordered_along_edge() {
        // The second ring crosses the bottom edge of the first four times.
        let g = set_op(
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            &[
                (1.0, -1.0),
                (2.0, 1.0),
                (3.0, -1.0),
                (4.0, 1.0),
                (5.0, -2.0),
            ],
        );
        let bottom = walk(&g, first_live(&g, Side::P));
        let xs: Vec<f64> = bottom.iter().take(6).map(|p| p.x).collect();
        assert_eq!(xs.len(), 6);
        assert_eq!(xs[0], 0.0);
        assert!(xs.windows(2).all(|w| w[0] < w[1]), "{xs:?}");
    }

    #[test]
    fn shared_edge_collapses_vertices() {
        let g = set_op(
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            &[(10.0, 0.0), (20.0, 0.0), (20.0, 10.0), (10.0, 10.0)],
        );
        let intersections: Vec<_> = g
            .live_nodes()
            .filter(|&n| g[n].is_intersection())
            .collect();
        assert_eq!(intersections.len(), 4);
        assert_eq!(g.live_nodes().count(), 8);
        for n in intersections {
            assert_eq!(g[n].neighbors.len(), 1);
            assert_eq!(g[g[n].neighbors[0]].site, g[n].site);
        }
    }

    #[test]
    fn identical_rings_pair_up_vertices() {
        let tri = [(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)];
        let g = set_op(&tri, &tri);
        assert_eq!(g.live_nodes().count(), 6);
        assert!(g.live_nodes().all(|n| g[n].is_intersection()));
        assert_eq!(g.locations().len(), 3);
    }

    #[test]
    fn stacked_intersections_merge() {
        // The top edge of p passes through the crossing point of the bow-tie q.
        let g = set_op(
            &[(-1.0, 0.0), (3.0, 0.0), (3.0, 1.0), (-1.0, 1.0)],
            &[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)],
        );
        let center = Point::new(1.0, 1.0);
        let at_center: Vec<_> = g.live_nodes().filter(|&n| g[n].site == center).collect();
        let on_p: Vec<_> = at_center
            .iter()
            .copied()
            .filter(|&n| g[n].side() == Side::P)
            .collect();
        assert_eq!(on_p.len(), 1);
        assert_eq!(g[on_p[0]].neighbors.len(), 2);
        assert_eq!(g.locations().at(on_p[0]).len(), 3);
    }

    #[test]
    fn self_crossing() {
        let mut g = Graph::new(GraphKind::Simplify, 4, 0);
        g.push_p(pts(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]));
        g.build();
        check_invariants(&g);
        let intersections: Vec<_> = g
            .live_nodes()
            .filter(|&n| g[n].is_intersection())
            .collect();
        assert_eq!(intersections.len(), 2);
        assert!(intersections
            .iter()
            .all(|&n| g[n].site == Point::new(1.0, 1.0)));
        let locations = g.locations();
        assert!(locations.at(intersections[0]).contains(&intersections[1]));
    }

    #[test]
    fn disjoint_rings() {
        let g = set_op(
            &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)],
            &[(5.0, 5.0), (6.0, 5.0), (6.0, 6.0)],
        );
        assert!(!g.has_intersections());
        assert_eq!(g.events().count(), 2);
    }
}

//! A one-dimensional sweep along the `x` axis, for pruning the segment pairs that need an
//! intersection test.

use std::cmp::Ordering;

use crate::{geom::Point, graph::NodeIdx, num::Float};

/// A segment taking part in the sweep, identified by the node at its origin.
#[derive(Clone, Copy, Debug)]
pub struct SweepEdge<F: Float> {
    pub origin: NodeIdx,
    /// The lexicographically smaller endpoint.
    pub left: Point<F>,
    /// The lexicographically larger endpoint.
    pub right: Point<F>,
    pub y_min: F,
    pub y_max: F,
}

impl<F: Float> SweepEdge<F> {
    pub fn new(origin: NodeIdx, a: Point<F>, b: Point<F>) -> Self {
        let (left, right) = if a.lex_cmp(&b) == Ordering::Greater {
            (b, a)
        } else {
            (a, b)
        };
        SweepEdge {
            origin,
            left,
            right,
            y_min: a.y.min(b.y),
            y_max: a.y.max(b.y),
        }
    }

    fn y_overlaps(&self, other: &Self, eps: F) -> bool {
        self.y_min <= other.y_max + eps && other.y_min <= self.y_max + eps
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SweepEventKind {
    Enter,
    Exit,
}

#[derive(Clone, Copy, Debug)]
struct SweepEvent<F: Float> {
    at: Point<F>,
    kind: SweepEventKind,
    edge: usize,
}

/// Returns every pair of edges whose bounding boxes touch (up to `eps`) and which `test`
/// accepts, as pairs of edge origins.
///
/// Events whose `x` coordinates lie within `eps` of the first event in a batch are handled
/// together: all the edges entering in the batch are inserted before any edge in the batch
/// exits, so ties never hide a pair.
pub fn candidate_pairs<F: Float>(
    edges: &[SweepEdge<F>],
    eps: F,
    test: impl Fn(NodeIdx, NodeIdx) -> bool,
) -> Vec<(NodeIdx, NodeIdx)> {
    let mut events = Vec::with_capacity(edges.len() * 2);
    for (i, e) in edges.iter().enumerate() {
        events.push(SweepEvent {
            at: e.left,
            kind: SweepEventKind::Enter,
            edge: i,
        });
        events.push(SweepEvent {
            at: e.right,
            kind: SweepEventKind::Exit,
            edge: i,
        });
    }
    events.sort_by(|a, b| a.at.lex_cmp(&b.at).then_with(|| a.edge.cmp(&b.edge)));

    let mut active: Vec<usize> = Vec::new();
    let mut pairs = Vec::new();
    let mut batch_start = 0;
    while batch_start < events.len() {
        let x = events[batch_start].at.x;
        let mut batch_end = batch_start;
        while batch_end < events.len() && events[batch_end].at.x - x <= eps {
            batch_end += 1;
        }
        let batch = &events[batch_start..batch_end];

        for ev in batch.iter().filter(|ev| ev.kind == SweepEventKind::Enter) {
            let new = &edges[ev.edge];
            for &other in &active {
                let old = &edges[other];
                if new.y_overlaps(old, eps) && test(old.origin, new.origin) {
                    pairs.push((old.origin, new.origin));
                }
            }
            active.push(ev.edge);
        }
        for ev in batch.iter().filter(|ev| ev.kind == SweepEventKind::Exit) {
            if let Some(pos) = active.iter().position(|&e| e == ev.edge) {
                active.remove(pos);
            }
        }

        batch_start = batch_end;
    }

    pairs
}

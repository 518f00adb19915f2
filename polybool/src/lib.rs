#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod boolean;
pub mod geom;
mod graph;
pub mod num;
pub mod ring;
mod simplify;
mod sweep;

pub use geom::Point;
pub use num::Float;
pub use ring::{Options, Orientation, Ring};

use graph::{Graph, GraphKind};

/// A fill rule tells us how to decide whether a point is "inside" a ring.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, serde::Serialize)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    #[default]
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
}

impl FillRule {
    /// Returns true if a region with this winding number is filled.
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::EvenOdd => winding % 2 != 0,
            FillRule::NonZero => winding != 0,
        }
    }
}

/// Binary operations between sets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize)]
pub enum BooleanOp {
    /// A point is in the union of two sets if it is in either one.
    Union,
    /// A point is in the intersection of two sets if it is in both.
    Intersection,
    /// A point is in the difference of two sets if it is in the first but not the second.
    Difference,
}

/// The input points were faulty.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum Error {
    /// At least one of the inputs was infinite.
    #[error("at least one input coordinate is infinite")]
    Infinity,
    /// At least one of the inputs was not a number.
    #[error("at least one input coordinate is NaN")]
    NaN,
}

fn check<F: Float>(points: &[Point<F>]) -> Result<(), Error> {
    if points.iter().any(|p| p.x.is_nan() || p.y.is_nan()) {
        return Err(Error::NaN);
    }
    if !points.iter().all(Point::is_finite) {
        return Err(Error::Infinity);
    }
    Ok(())
}

/// Copies a ring, making it wind counter-clockwise.
fn counter_clockwise<F: Float>(points: &[Point<F>]) -> Vec<Point<F>> {
    let mut ret = points.to_vec();
    if geom::signed_area(&ret) < F::ZERO {
        ret.reverse();
    }
    ret
}

/// Computes a set operation between the regions enclosed by two rings.
///
/// The inputs may wind either way, but are assumed not to cross themselves (see
/// [`simplify`] for those). Rings with fewer than three distinct points enclose nothing.
///
/// The output rings bound the result: each has winding `1` if it surrounds a filled region
/// and `-1` if it surrounds a hole, and winds according to `options.orientation`.
pub fn boolean_op<F: Float>(
    p: &[Point<F>],
    q: &[Point<F>],
    op: BooleanOp,
    options: &Options,
) -> Result<Vec<Ring<F>>, Error> {
    check(p)?;
    check(q)?;

    let p = counter_clockwise(p);
    let mut q = counter_clockwise(q);
    if op == BooleanOp::Difference {
        q.reverse();
    }

    let mut graph = Graph::new(GraphKind::SetOp, p.len(), q.len());
    graph.push_p(p);
    graph.push_q(q);
    graph.build();

    let mut rings: Vec<Ring<F>> = boolean::traverse(&mut graph, op)
        .into_iter()
        .map(|points| {
            let mut ring = Ring::new(points, 0);
            ring.winding = i32::from(ring.orientation);
            ring
        })
        .collect();
    ring::orient_set_op(&mut rings, options);
    Ok(rings)
}

/// The union of the regions enclosed by two rings, with the default [`Options`].
pub fn boolean_union<F: Float>(p: &[Point<F>], q: &[Point<F>]) -> Result<Vec<Ring<F>>, Error> {
    boolean_op(p, q, BooleanOp::Union, &Options::default())
}

/// The intersection of the regions enclosed by two rings, with the default [`Options`].
pub fn boolean_intersection<F: Float>(
    p: &[Point<F>],
    q: &[Point<F>],
) -> Result<Vec<Ring<F>>, Error> {
    boolean_op(p, q, BooleanOp::Intersection, &Options::default())
}

/// The region enclosed by `p` but not by `q`, with the default [`Options`].
pub fn boolean_difference<F: Float>(
    p: &[Point<F>],
    q: &[Point<F>],
) -> Result<Vec<Ring<F>>, Error> {
    boolean_op(p, q, BooleanOp::Difference, &Options::default())
}

/// Breaks a ring into rings that don't cross themselves or each other.
///
/// Each output ring is labelled with the winding number of the input around the region it
/// encloses. Nested output rings are allowed: a region enclosed twice by the input comes
/// out as a ring of winding `2` inside a ring of winding `1`.
///
/// With [`FillRule::EvenOdd`] the rings are redirected so that those with odd winding
/// follow `options.orientation` and the others oppose it. With [`FillRule::NonZero`] they
/// keep the direction in which the input traced them.
pub fn simplify<F: Float>(p: &[Point<F>], options: &Options) -> Result<Vec<Ring<F>>, Error> {
    check(p)?;
    let mut graph = Graph::new(GraphKind::Simplify, p.len(), 0);
    graph.push_p(p.iter().copied());
    graph.build();

    let mut rings = simplify::traverse(&mut graph);
    ring::orient_simplified(&mut rings, options);
    Ok(rings)
}

/// [`simplify`] with the default [`Options`].
pub fn boolean_simplify<F: Float>(p: &[Point<F>]) -> Result<Vec<Ring<F>>, Error> {
    simplify(p, &Options::default())
}

/// Returns true if the ring never meets itself, other than at consecutive edges sharing
/// their endpoint.
pub fn is_simple<F: Float>(p: &[Point<F>]) -> Result<bool, Error> {
    check(p)?;
    let mut graph = Graph::new(GraphKind::Simplify, p.len(), 0);
    graph.push_p(p.iter().copied());
    graph.build();
    Ok(!graph.has_intersections())
}

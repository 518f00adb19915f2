//! Output rings, and the conventions that decide which way they wind.

use crate::{
    geom::{self, Point},
    num::Float,
    FillRule,
};

/// The direction in which rings bounding filled regions should wind.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, serde::Serialize)]
pub enum Orientation {
    /// Filled regions are bounded by counter-clockwise rings (in a y-up frame), and holes
    /// by clockwise ones.
    #[default]
    CounterClockwise,
    /// Filled regions are bounded by clockwise rings, and holes by counter-clockwise ones.
    Clockwise,
}

impl Orientation {
    /// The sign of the signed area of a ring winding this way.
    pub fn sign(self) -> i8 {
        match self {
            Orientation::CounterClockwise => 1,
            Orientation::Clockwise => -1,
        }
    }
}

/// Configuration shared by all the entry points.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Options {
    /// The winding direction of output rings that bound filled regions.
    pub orientation: Orientation,
    /// How winding numbers decide the direction of simplified rings.
    ///
    /// Set operations treat their inputs as simple rings, so this only affects
    /// [`simplify`](crate::simplify).
    pub fill_rule: FillRule,
}

/// A closed ring of points in the output.
///
/// The last point connects back to the first; it is not repeated.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Ring<F: Float> {
    /// The vertices, in order.
    pub points: Vec<Point<F>>,
    /// The enclosed area, which is never negative.
    pub area: F,
    /// The sign of the signed area: `1` for counter-clockwise, `-1` for clockwise.
    pub orientation: i8,
    /// The winding number of the region enclosed by this ring.
    ///
    /// For set operations this is `1` for a ring bounding a filled region and `-1` for a
    /// hole. For simplification it counts how many times the input winds
    /// counter-clockwise around the region.
    pub winding: i32,
}

impl<F: Float> Ring<F> {
    /// Creates a ring, computing its area and orientation.
    pub fn new(points: Vec<Point<F>>, winding: i32) -> Self {
        let signed = geom::signed_area(&points);
        Ring {
            area: signed.abs(),
            orientation: signed.sign(),
            points,
            winding,
        }
    }

    /// The area, positive for counter-clockwise rings and negative for clockwise ones.
    pub fn signed_area(&self) -> F {
        if self.orientation < 0 {
            -self.area
        } else {
            self.area
        }
    }

    /// Reverses the direction of this ring. The winding number is a property of the
    /// enclosed region, so it stays the same.
    pub fn reverse(&mut self) {
        self.points.reverse();
        self.orientation = -self.orientation;
    }

    /// Returns true if the region enclosed by this ring is filled under `fill_rule`.
    pub fn is_filled(&self, fill_rule: FillRule) -> bool {
        fill_rule.is_inside(self.winding)
    }
}

/// Makes the rings of a simplification follow the configured direction.
///
/// Under the even-odd rule, regions with an odd winding number are filled and get the
/// configured direction while the others get the opposite one. The non-zero rule leaves
/// the rings as traced, so their direction matches the sign of their winding number.
pub(crate) fn orient_simplified<F: Float>(rings: &mut [Ring<F>], options: &Options) {
    if options.fill_rule == FillRule::NonZero {
        return;
    }
    let declared = options.orientation.sign();
    for ring in rings {
        let odd = ring.winding % 2 != 0;
        let agrees = ring.orientation == declared;
        if odd != agrees {
            ring.reverse();
        }
    }
}

/// Makes the rings of a set operation follow the configured direction.
///
/// Set-operation rings come out of the traversal counter-clockwise around filled regions.
pub(crate) fn orient_set_op<F: Float>(rings: &mut [Ring<F>], options: &Options) {
    if options.orientation == Orientation::Clockwise {
        for ring in rings {
            ring.reverse();
        }
    }
}

//! Geometric primitives on 2D points.
//!
//! Everything here is a pure function of its arguments. The only tolerances are the
//! zero-snap in [`orientation`] and the distance test in [`coincident`]; every other
//! comparison is exact.

use std::cmp::Ordering;

use crate::num::Float;

/// A point in the plane.
#[derive(Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct Point<F: Float> {
    /// Horizontal coordinate.
    pub x: F,
    /// Vertical coordinate.
    pub y: F,
}

impl<F: Float> std::fmt::Debug for Point<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl<F: Float> Point<F> {
    /// Creates a new point.
    pub fn new(x: F, y: F) -> Self {
        Point { x, y }
    }

    /// The point `t` of the way from `self` to `other`.
    pub fn affine(&self, other: &Self, t: F) -> Self {
        *self + (*other - *self) * t
    }

    /// The midpoint of `self` and `other`.
    pub fn midpoint(&self, other: &Self) -> Self {
        let half = F::from_f32(0.5);
        Point {
            x: (self.x + other.x) * half,
            y: (self.y + other.y) * half,
        }
    }

    /// Lexicographic comparison: by `x` and then by `y`.
    pub fn lex_cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }

    /// Returns true if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<F: Float> From<(F, F)> for Point<F> {
    fn from((x, y): (F, F)) -> Self {
        Self { x, y }
    }
}

impl<F: Float> std::ops::Sub for Point<F> {
    type Output = Vector<F>;

    fn sub(self, rhs: Self) -> Self::Output {
        Vector {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl<F: Float> std::ops::Add<Vector<F>> for Point<F> {
    type Output = Point<F>;

    fn add(self, rhs: Vector<F>) -> Self::Output {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

/// A displacement between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector<F: Float> {
    /// Horizontal component.
    pub x: F,
    /// Vertical component.
    pub y: F,
}

impl<F: Float> Vector<F> {
    /// The z component of the cross product.
    pub fn cross(&self, other: &Self) -> F {
        self.x * other.y - self.y * other.x
    }

    /// The dot product.
    pub fn dot(&self, other: &Self) -> F {
        self.x * other.x + self.y * other.y
    }

    /// The squared euclidean length.
    pub fn length_squared(&self) -> F {
        self.dot(self)
    }

    /// The direction of this vector, in radians from the positive `x` axis.
    pub fn angle(&self) -> F {
        self.y.atan2(self.x)
    }
}

impl<F: Float> std::ops::Mul<F> for Vector<F> {
    type Output = Vector<F>;

    fn mul(self, rhs: F) -> Self::Output {
        Vector {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// Twice the signed area of the triangle `a`, `b`, `c`.
///
/// Positive if the triangle winds counter-clockwise (in a y-up frame). Results too small
/// to be distinguished from rounding error are reported as exactly zero, so the sign of
/// the result is a reliable three-way classification.
pub fn orientation<F: Float>(a: &Point<F>, b: &Point<F>, c: &Point<F>) -> F {
    let l = (b.x - a.x) * (c.y - a.y);
    let r = (b.y - a.y) * (c.x - a.x);
    let det = l - r;
    if det.abs() <= F::EPSILON * l.abs().max(r.abs()) {
        F::ZERO
    } else {
        det
    }
}

/// Returns true if the two points are equal up to the engine's tolerance.
pub fn coincident<F: Float>(a: &Point<F>, b: &Point<F>) -> bool {
    let scale = F::ONE
        .max(a.x.abs())
        .max(a.y.abs())
        .max(b.x.abs())
        .max(b.y.abs());
    let tol = F::eps() * scale;
    (*a - *b).length_squared() <= tol * tol
}

/// The result of intersecting two segments `a1 -- a2` and `b1 -- b2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentIntersection<F: Float> {
    /// The cross product of the two segment directions. Zero iff they're parallel.
    pub u: F,
    /// Parametric position of the intersection on segment `a` (only meaningful if `u != 0`).
    pub s: F,
    /// Parametric position of the intersection on segment `b` (only meaningful if `u != 0`).
    pub t: F,
    /// The crossing point, if the segments cross or touch at a single point.
    pub point: Option<Point<F>>,
    /// The shared sub-segment, if the segments are collinear and overlap. Both ends are the
    /// same point when collinear segments only touch end-to-end.
    pub overlap: Option<(Point<F>, Point<F>)>,
}

impl<F: Float> SegmentIntersection<F> {
    fn empty(u: F) -> Self {
        SegmentIntersection {
            u,
            s: F::ZERO,
            t: F::ZERO,
            point: None,
            overlap: None,
        }
    }

    /// Returns true if the segments share at least one point.
    pub fn is_some(&self) -> bool {
        self.point.is_some() || self.overlap.is_some()
    }
}

/// Parametric position of `p` along `o -- o + d`, assuming that `p` is on that line.
fn project<F: Float>(o: &Point<F>, d: &Vector<F>, p: &Point<F>) -> F {
    (*p - *o).dot(d) / d.length_squared()
}

/// Intersects the segments `a1 -- a2` and `b1 -- b2`.
///
/// Neither segment may be degenerate.
pub fn intersect<F: Float>(
    a1: &Point<F>,
    a2: &Point<F>,
    b1: &Point<F>,
    b2: &Point<F>,
) -> SegmentIntersection<F> {
    let da = *a2 - *a1;
    let db = *b2 - *b1;

    let l = da.x * db.y;
    let r = da.y * db.x;
    let mut u = l - r;
    if u.abs() <= F::EPSILON * l.abs().max(r.abs()) {
        u = F::ZERO;
    }

    let oa1 = orientation(b1, b2, a1).sign();
    let oa2 = orientation(b1, b2, a2).sign();
    let ob1 = orientation(a1, a2, b1).sign();
    let ob2 = orientation(a1, a2, b2).sign();

    if u == F::ZERO {
        if oa1 != 0 || oa2 != 0 || ob1 != 0 || ob2 != 0 {
            // Parallel, but not on the same line.
            return SegmentIntersection::empty(u);
        }

        // Collinear. Endpoints of `a` are kept if they're anywhere in `b`, but endpoints of
        // `b` only if they're strictly inside `a`: an endpoint of `b` that coincides with an
        // endpoint of `a` has already been collected.
        let len_a = da.length_squared();
        let len_b = db.length_squared();
        let in_b = |p: &Point<F>| {
            let d = (*p - *b1).dot(&db);
            d >= F::ZERO && d <= len_b
        };
        let strictly_in_a = |p: &Point<F>| {
            let d = (*p - *a1).dot(&da);
            d > F::ZERO && d < len_a
        };

        let mut candidates: smallvec::SmallVec<[Point<F>; 4]> = smallvec::SmallVec::new();
        for p in [a1, a2] {
            if in_b(p) {
                candidates.push(*p);
            }
        }
        for p in [b1, b2] {
            if strictly_in_a(p) {
                candidates.push(*p);
            }
        }
        if candidates.is_empty() {
            return SegmentIntersection::empty(u);
        }

        // The overlap runs between the extreme candidates along `a`.
        let key = |p: &Point<F>| project(a1, &da, p);
        let first = candidates
            .iter()
            .copied()
            .min_by(|p, q| key(p).total_cmp(&key(q)))
            .unwrap_or(*a1);
        let last = candidates
            .iter()
            .copied()
            .max_by(|p, q| key(p).total_cmp(&key(q)))
            .unwrap_or(first);
        return SegmentIntersection {
            u,
            s: F::ZERO,
            t: F::ZERO,
            point: None,
            overlap: Some((first, last)),
        };
    }

    if oa1 * oa2 > 0 || ob1 * ob2 > 0 {
        return SegmentIntersection::empty(u);
    }

    let w = *b1 - *a1;
    let mut s = (w.cross(&db) / u).max(F::ZERO).min(F::ONE);
    let mut t = (w.cross(&da) / u).max(F::ZERO).min(F::ONE);
    if oa1 == 0 {
        s = F::ZERO;
    } else if oa2 == 0 {
        s = F::ONE;
    }
    if ob1 == 0 {
        t = F::ZERO;
    } else if ob2 == 0 {
        t = F::ONE;
    }

    let point = if s == F::ZERO {
        *a1
    } else if s == F::ONE {
        *a2
    } else if t == F::ZERO {
        *b1
    } else if t == F::ONE {
        *b2
    } else if s.abs() <= t.abs() {
        *a1 + da * s
    } else {
        *b1 + db * t
    };

    SegmentIntersection {
        u,
        s,
        t,
        point: Some(point),
        overlap: None,
    }
}

/// The places where two segments meet, as `(s, t, point)` triples.
///
/// A crossing gives one triple and an overlap gives one per end of the shared region.
pub fn hits<F: Float>(
    a1: &Point<F>,
    a2: &Point<F>,
    b1: &Point<F>,
    b2: &Point<F>,
) -> smallvec::SmallVec<[(F, F, Point<F>); 2]> {
    let isect = intersect(a1, a2, b1, b2);
    let mut ret = smallvec::SmallVec::new();
    if let Some(p) = isect.point {
        ret.push((isect.s, isect.t, p));
    } else if let Some((first, last)) = isect.overlap {
        let da = *a2 - *a1;
        let db = *b2 - *b1;
        let param = |o: &Point<F>, end: &Point<F>, d: &Vector<F>, p: &Point<F>| {
            if p == o {
                F::ZERO
            } else if p == end {
                F::ONE
            } else {
                project(o, d, p).max(F::ZERO).min(F::ONE)
            }
        };
        ret.push((param(a1, a2, &da, &first), param(b1, b2, &db, &first), first));
        if last != first {
            ret.push((param(a1, a2, &da, &last), param(b1, b2, &db, &last), last));
        }
    }
    ret
}

/// The signed area of a closed ring, positive if it winds counter-clockwise.
pub fn signed_area<F: Float>(points: &[Point<F>]) -> F {
    let mut sum = F::ZERO;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * F::from_f32(0.5)
}

/// Returns true if `p` is inside the closed ring, using the even-odd rule.
///
/// Points exactly on the boundary may be classified either way.
pub fn contains<F: Float>(ring: &[Point<F>], p: &Point<F>) -> bool {
    let mut inside = false;
    for (i, a) in ring.iter().enumerate() {
        let b = &ring[(i + 1) % ring.len()];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (b.x - a.x) * (p.y - a.y) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Returns true if `p` lies on one of the edges of the closed ring, up to the usual
/// tolerances.
pub fn on_boundary<F: Float>(ring: &[Point<F>], p: &Point<F>) -> bool {
    ring.iter().enumerate().any(|(i, a)| {
        let b = &ring[(i + 1) % ring.len()];
        coincident(a, p)
            || (orientation(a, b, p) == F::ZERO
                && (*p - *a).dot(&(*b - *a)) >= F::ZERO
                && (*p - *b).dot(&(*a - *b)) >= F::ZERO)
    })
}

/// The number of times the closed ring winds counter-clockwise around `p`.
///
/// Points exactly on the boundary may be classified either way.
pub fn winding_number<F: Float>(ring: &[Point<F>], p: &Point<F>) -> i32 {
    let mut winding = 0;
    for (i, a) in ring.iter().enumerate() {
        let b = &ring[(i + 1) % ring.len()];
        if a.y <= p.y {
            if b.y > p.y && orientation(a, b, p) > F::ZERO {
                winding += 1;
            }
        } else if b.y <= p.y && orientation(a, b, p) < F::ZERO {
            winding -= 1;
        }
    }
    winding
}

/// The counter-clockwise angle, in `[0, 2pi)`, that takes direction `from` to direction `to`.
///
/// With `direction = -1`, the clockwise angle instead.
pub fn turn<F: Float>(from: F, to: F, direction: F) -> F {
    ((to - from) * direction).rem_euclid(F::TAU)
}

/// Which side of the path `a -> x -> b` the point `p` lies on, seen from `x`.
///
/// Returns `1` if the direction `x -> p` lies strictly inside the wedge on the left of the
/// path, `-1` if it lies strictly inside the wedge on the right, and `0` if it points
/// along one of the two path edges.
pub fn side_of_path<F: Float>(a: &Point<F>, x: &Point<F>, b: &Point<F>, p: &Point<F>) -> i8 {
    let along =
        |q: &Point<F>| orientation(x, q, p) == F::ZERO && (*q - *x).dot(&(*p - *x)) > F::ZERO;
    if along(a) || along(b) {
        return 0;
    }
    // The left wedge sweeps counter-clockwise from the outgoing edge to the (reversed)
    // incoming edge.
    let out = (*b - *x).angle();
    let back = (*a - *x).angle();
    let dir = (*p - *x).angle();
    if turn(out, dir, F::ONE) < turn(out, back, F::ONE) {
        1
    } else {
        -1
    }
}

//! A thin abstraction over the different numerical types we support.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

/// A trait for abstracting over the properties we need from numerical types.
///
/// This is implemented for `f32` and `f64`. Every tolerance in the engine is derived
/// from [`Float::EPSILON`], so the two types merge slightly different sets of
/// near-degenerate inputs.
pub trait Float:
    Sized
    + Copy
    + Default
    + PartialEq
    + PartialOrd
    + std::ops::Add<Self, Output = Self>
    + std::ops::Sub<Self, Output = Self>
    + std::ops::Mul<Self, Output = Self>
    + std::ops::Div<Self, Output = Self>
    + std::ops::Neg<Output = Self>
    + std::ops::AddAssign
    + std::fmt::Debug
    + std::fmt::Display
    + serde::Serialize
    + 'static
{
    /// Additive identity.
    const ZERO: Self;
    /// Multiplicative identity.
    const ONE: Self;
    /// Machine epsilon of this type.
    const EPSILON: Self;
    /// A full turn, in radians.
    const TAU: Self;

    /// Converts from an `f32`, which all our types can represent exactly.
    fn from_f32(x: f32) -> Self;

    /// The absolute value.
    fn abs(self) -> Self;

    /// The larger of `self` and `other`.
    fn max(self, other: Self) -> Self;

    /// The smaller of `self` and `other`.
    fn min(self, other: Self) -> Self;

    /// The four-quadrant arctangent of `self` (the `y` coordinate) and `x`.
    fn atan2(self, x: Self) -> Self;

    /// The least non-negative remainder of `self` modulo `rhs`.
    fn rem_euclid(self, rhs: Self) -> Self;

    /// Returns true if this value is neither infinite nor NaN.
    fn is_finite(self) -> bool;

    /// Returns true if this value is NaN.
    fn is_nan(self) -> bool;

    /// A total order on our values. `-0.0` and `0.0` compare as equal.
    fn total_cmp(&self, other: &Self) -> Ordering;

    /// The sign of this value as `-1`, `0` or `1`.
    fn sign(self) -> i8 {
        if self > Self::ZERO {
            1
        } else if self < Self::ZERO {
            -1
        } else {
            0
        }
    }

    /// The tolerance used by the sweep padding and the coincidence collapse.
    fn eps() -> Self {
        Self::from_f32(10.0) * Self::EPSILON
    }
}

macro_rules! impl_float {
    ($t:ident) => {
        impl Float for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const EPSILON: Self = $t::EPSILON;
            const TAU: Self = std::$t::consts::TAU;

            fn from_f32(x: f32) -> Self {
                x.into()
            }

            fn abs(self) -> Self {
                $t::abs(self)
            }

            fn max(self, other: Self) -> Self {
                $t::max(self, other)
            }

            fn min(self, other: Self) -> Self {
                $t::min(self, other)
            }

            fn atan2(self, x: Self) -> Self {
                $t::atan2(self, x)
            }

            fn rem_euclid(self, rhs: Self) -> Self {
                $t::rem_euclid(self, rhs)
            }

            fn is_finite(self) -> bool {
                $t::is_finite(self)
            }

            fn is_nan(self) -> bool {
                $t::is_nan(self)
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                OrderedFloat(*self).cmp(&OrderedFloat(*other))
            }
        }
    };
}

impl_float!(f32);
impl_float!(f64);

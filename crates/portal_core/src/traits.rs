use crate::portal::World;
use nalgebra::Vector3;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the polynomial solvers.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Converts an f64 constant into the solver's scalar type.
pub(crate) fn constant<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap()
}

/// Something that occupies one of the six worlds and moves through space in
/// straight segments.
pub trait Traveler {
    /// Current position in the knot's coordinate frame.
    fn position(&self) -> Vector3<f64>;

    /// World the traveler currently occupies.
    fn world(&self) -> World;

    /// Moves to `target` along a straight segment.
    /// Implementations thread their world through `portal::travel` so that
    /// consecutive moves compose the same way the two-hop sample does.
    fn move_to(&mut self, target: Vector3<f64>);
}

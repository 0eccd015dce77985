//! Positions in physical space.

use nalgebra::Point as NaPoint;
use serde::{Deserialize, Serialize};

use super::Vector;

/// A position in D-dimensional physical space (millimetres for NIfTI data).
///
/// Also used for continuous indices, where each coordinate is a fractional
/// voxel position along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<const D: usize>(pub NaPoint<f64, D>);

impl<const D: usize> Point<D> {
    pub fn new(coords: [f64; D]) -> Self {
        Self(NaPoint::from(coords))
    }

    pub fn origin() -> Self {
        Self(NaPoint::origin())
    }

    pub fn to_array(&self) -> [f64; D] {
        let mut out = [0.0; D];
        for (i, value) in out.iter_mut().enumerate() {
            *value = self.0.coords[i];
        }
        out
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0.coords - other.0.coords)
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, offset: Vector<D>) -> Self::Output {
        Self(self.0 + offset.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_offset_arithmetic() {
        let p = Point::<3>::new([1.0, 2.0, 3.0]);
        let q = p + Vector::new([0.5, -1.0, 2.0]);
        assert_eq!(q, Point::new([1.5, 1.0, 5.0]));
        assert_eq!(q - p, Vector::new([0.5, -1.0, 2.0]));
    }

    #[test]
    fn test_point_to_array() {
        let p = Point::<3>::new([4.0, 5.0, 6.0]);
        assert_eq!(p.to_array(), [4.0, 5.0, 6.0]);
        assert_eq!(Point::<3>::origin().to_array(), [0.0; 3]);
    }
}

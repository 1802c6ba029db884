// point.rs - fixed-dimension coordinate tuples
//
// A `Point<DIM>` is a plain `[f64; DIM]` plus the coordinate system its
// components are expressed in. Arithmetic between points keeps the tag of
// the left operand; mixing frames is a logic error caught in debug builds.

use crate::coordinate_systems::CoordinateSystemKind;
use std::fmt;
use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<const DIM: usize> {
    coordinates: [f64; DIM],
    coordinate_system: CoordinateSystemKind,
}

impl<const DIM: usize> Point<DIM> {
    /// Cartesian point.
    pub const fn new(coordinates: [f64; DIM]) -> Self {
        Point {
            coordinates,
            coordinate_system: CoordinateSystemKind::Cartesian,
        }
    }

    pub const fn with_coordinate_system(
        coordinates: [f64; DIM],
        coordinate_system: CoordinateSystemKind,
    ) -> Self {
        Point {
            coordinates,
            coordinate_system,
        }
    }

    pub const fn zero() -> Self {
        Self::new([0.0; DIM])
    }

    #[inline]
    pub fn coordinates(&self) -> [f64; DIM] {
        self.coordinates
    }

    #[inline]
    pub fn coordinate_system(&self) -> CoordinateSystemKind {
        self.coordinate_system
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.coordinates
            .iter()
            .zip(other.coordinates.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    #[inline]
    pub fn norm_square(&self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm_square().sqrt()
    }

    /// Euclidean distance, only meaningful for Cartesian-like frames.
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).norm()
    }

    fn zip_with(self, rhs: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        debug_assert_eq!(
            self.coordinate_system, rhs.coordinate_system,
            "arithmetic between points in different coordinate systems"
        );
        let mut out = self;
        for (o, r) in out.coordinates.iter_mut().zip(rhs.coordinates.iter()) {
            *o = f(*o, *r);
        }
        out
    }
}

impl Point<2> {
    /// Rotate counter-clockwise by `angle` radians around `center`.
    pub fn rotate_around(&self, center: &Point<2>, angle: f64) -> Point<2> {
        let (sin, cos) = angle.sin_cos();
        let dx = self[0] - center[0];
        let dy = self[1] - center[1];
        Point::with_coordinate_system(
            [
                center[0] + cos * dx - sin * dy,
                center[1] + sin * dx + cos * dy,
            ],
            self.coordinate_system,
        )
    }

    /// 2-D cross product (z component of the 3-D cross product).
    #[inline]
    pub fn cross(&self, other: &Point<2>) -> f64 {
        self[0] * other[1] - self[1] * other[0]
    }
}

impl Point<3> {
    /// The two surface components of a natural point: (x, y) for Cartesian,
    /// (longitude, latitude) for spherical.
    pub fn surface(&self) -> Point<2> {
        match self.coordinate_system {
            CoordinateSystemKind::Cartesian => {
                Point::with_coordinate_system([self[0], self[1]], self.coordinate_system)
            }
            CoordinateSystemKind::Spherical => {
                Point::with_coordinate_system([self[1], self[2]], self.coordinate_system)
            }
        }
    }

    /// Replace the surface components, keeping the vertical one.
    pub fn with_surface(&self, surface: Point<2>) -> Point<3> {
        let mut out = *self;
        match self.coordinate_system {
            CoordinateSystemKind::Cartesian => {
                out.coordinates[0] = surface[0];
                out.coordinates[1] = surface[1];
            }
            CoordinateSystemKind::Spherical => {
                out.coordinates[1] = surface[0];
                out.coordinates[2] = surface[1];
            }
        }
        out
    }
}

impl<const DIM: usize> Default for Point<DIM> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const DIM: usize> From<[f64; DIM]> for Point<DIM> {
    fn from(coordinates: [f64; DIM]) -> Self {
        Point::new(coordinates)
    }
}

impl<const DIM: usize> Index<usize> for Point<DIM> {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        &self.coordinates[index]
    }
}

impl<const DIM: usize> IndexMut<usize> for Point<DIM> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.coordinates[index]
    }
}

impl<const DIM: usize> Add for Point<DIM> {
    type Output = Point<DIM>;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<const DIM: usize> Sub for Point<DIM> {
    type Output = Point<DIM>;

    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl<const DIM: usize> Mul<f64> for Point<DIM> {
    type Output = Point<DIM>;

    fn mul(mut self, rhs: f64) -> Self {
        for c in self.coordinates.iter_mut() {
            *c *= rhs;
        }
        self
    }
}

impl<const DIM: usize> Neg for Point<DIM> {
    type Output = Point<DIM>;

    fn neg(self) -> Self {
        self * -1.0
    }
}

impl<const DIM: usize> fmt::Display for Point<DIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.coordinates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn arithmetic() {
        let a = Point::new([1.0, 2.0, 3.0]);
        let b = Point::new([4.0, 6.0, 8.0]);
        assert_eq!((b - a).coordinates(), [3.0, 4.0, 5.0]);
        assert_eq!((a + b).coordinates(), [5.0, 8.0, 11.0]);
        assert_eq!((a * 2.0).coordinates(), [2.0, 4.0, 6.0]);
        assert_eq!((-a).coordinates(), [-1.0, -2.0, -3.0]);
    }

    #[test]
    fn norm_and_distance() {
        let p = Point::new([3.0, 4.0]);
        assert!((p.norm() - 5.0).abs() < 1e-12);
        assert!((p.distance(&Point::zero()) - 5.0).abs() < 1e-12);
        assert!((Point::new([1.0, 0.0]).cross(&Point::new([0.0, 1.0])) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rotation_quarter_turn() {
        let p = Point::new([2.0, 1.0]);
        let r = p.rotate_around(&Point::new([1.0, 1.0]), FRAC_PI_2);
        assert!((r[0] - 1.0).abs() < 1e-12, "got {}", r[0]);
        assert!((r[1] - 2.0).abs() < 1e-12, "got {}", r[1]);
    }

    #[test]
    fn surface_components_follow_frame() {
        let cart = Point::new([1.0, 2.0, 3.0]);
        assert_eq!(cart.surface().coordinates(), [1.0, 2.0]);

        let sph = Point::with_coordinate_system([6.0, 0.5, 0.25], CoordinateSystemKind::Spherical);
        assert_eq!(sph.surface().coordinates(), [0.5, 0.25]);
        let moved = sph.with_surface(Point::with_coordinate_system(
            [0.1, 0.2],
            CoordinateSystemKind::Spherical,
        ));
        assert_eq!(moved.coordinates(), [6.0, 0.1, 0.2]);
    }
}

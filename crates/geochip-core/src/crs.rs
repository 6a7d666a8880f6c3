use nalgebra::{Matrix3, Point2, Vector3};
use std::fmt;

/// Bidirectional pixel ↔ map coordinate mapping.
///
/// The projection math behind it is owned by whoever builds the transform;
/// this crate treats it as opaque.
pub trait CrsTransform: Send + Sync + fmt::Debug {
    fn pixel_to_map(&self, p: Point2<f64>) -> Point2<f64>;
    fn map_to_pixel(&self, p: Point2<f64>) -> Point2<f64>;
}

/// Pixel space and map space coincide.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTransform;

impl CrsTransform for IdentityTransform {
    fn pixel_to_map(&self, p: Point2<f64>) -> Point2<f64> {
        p
    }

    fn map_to_pixel(&self, p: Point2<f64>) -> Point2<f64> {
        p
    }
}

/// Affine geotransform in GDAL order:
/// `x_map = c0 + col * c1 + row * c2`, `y_map = c3 + col * c4 + row * c5`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    pixel_to_map: Matrix3<f64>,
    map_to_pixel: Matrix3<f64>,
}

impl AffineTransform {
    /// Returns `None` for a singular transform.
    pub fn from_gdal(gt: [f64; 6]) -> Option<Self> {
        let pixel_to_map = Matrix3::new(
            gt[1], gt[2], gt[0], //
            gt[4], gt[5], gt[3], //
            0.0, 0.0, 1.0,
        );
        let map_to_pixel = pixel_to_map.try_inverse()?;
        Some(Self {
            pixel_to_map,
            map_to_pixel,
        })
    }

    /// North-up transform with square pixels of `pixel_size` map units.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size: f64) -> Option<Self> {
        Self::from_gdal([origin_x, pixel_size, 0.0, origin_y, 0.0, -pixel_size])
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        let m = &self.pixel_to_map;
        [
            m[(0, 2)],
            m[(0, 0)],
            m[(0, 1)],
            m[(1, 2)],
            m[(1, 0)],
            m[(1, 1)],
        ]
    }
}

#[inline]
fn apply(m: &Matrix3<f64>, p: Point2<f64>) -> Point2<f64> {
    let v = m * Vector3::new(p.x, p.y, 1.0);
    Point2::new(v[0], v[1])
}

impl CrsTransform for AffineTransform {
    fn pixel_to_map(&self, p: Point2<f64>) -> Point2<f64> {
        apply(&self.pixel_to_map, p)
    }

    fn map_to_pixel(&self, p: Point2<f64>) -> Point2<f64> {
        apply(&self.map_to_pixel, p)
    }
}

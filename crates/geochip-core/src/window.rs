use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Window construction errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("empty window: xmin={xmin} must be < xmax={xmax} and ymin={ymin} must be < ymax={ymax}")]
    Empty {
        xmin: i64,
        ymin: i64,
        xmax: i64,
        ymax: i64,
    },
    #[error("window size and stride must be > 0 (size={size}, stride={stride})")]
    InvalidTiling { size: i64, stride: i64 },
    #[error("pixel coordinate overflow: {base} + {offset} does not fit in i64")]
    Overflow { base: i64, offset: i64 },
}

#[inline]
fn add(base: i64, offset: i64) -> Result<i64, WindowError> {
    base.checked_add(offset).ok_or(WindowError::Overflow { base, offset })
}

/// Axis-aligned pixel rectangle `[xmin, xmax) × [ymin, ymax)`.
///
/// The addressing unit for every raster and vector read. Serialized as
/// `[xmin, ymin, xmax, ymax]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "[i64; 4]", into = "[i64; 4]")]
pub struct Window {
    xmin: i64,
    ymin: i64,
    xmax: i64,
    ymax: i64,
}

impl Window {
    pub fn new(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Result<Self, WindowError> {
        if xmin >= xmax || ymin >= ymax {
            return Err(WindowError::Empty {
                xmin,
                ymin,
                xmax,
                ymax,
            });
        }
        Ok(Self {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }

    /// Window of `height × width` pixels with its top-left corner at the origin.
    pub fn from_size(height: usize, width: usize) -> Result<Self, WindowError> {
        Self::new(0, 0, width as i64, height as i64)
    }

    #[inline]
    pub fn xmin(&self) -> i64 {
        self.xmin
    }

    #[inline]
    pub fn ymin(&self) -> i64 {
        self.ymin
    }

    #[inline]
    pub fn xmax(&self) -> i64 {
        self.xmax
    }

    #[inline]
    pub fn ymax(&self) -> i64 {
        self.ymax
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.xmax.abs_diff(self.xmin) as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.ymax.abs_diff(self.ymin) as usize
    }

    /// `(height, width)`, the spatial shape of a chip read through this window.
    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Same window shifted by `(dx, dy)`.
    pub fn translate(&self, dx: i64, dy: i64) -> Result<Self, WindowError> {
        Ok(Self {
            xmin: add(self.xmin, dx)?,
            ymin: add(self.ymin, dy)?,
            xmax: add(self.xmax, dx)?,
            ymax: add(self.ymax, dy)?,
        })
    }

    /// Overlap of two windows, `None` when they share no pixel.
    pub fn intersection(&self, other: &Window) -> Option<Window> {
        Window::new(
            self.xmin.max(other.xmin),
            self.ymin.max(other.ymin),
            self.xmax.min(other.xmax),
            self.ymax.min(other.ymax),
        )
        .ok()
    }

    #[inline]
    pub fn intersects(&self, other: &Window) -> bool {
        self.intersection(other).is_some()
    }

    /// True if the (continuous) point lies inside the closed rectangle.
    #[inline]
    pub fn contains_point(&self, p: Point2<f64>) -> bool {
        p.x >= self.xmin as f64
            && p.x <= self.xmax as f64
            && p.y >= self.ymin as f64
            && p.y <= self.ymax as f64
    }

    /// Corners in `(TL, TR, BR, BL)` order, pixel space.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let (x0, y0) = (self.xmin as f64, self.ymin as f64);
        let (x1, y1) = (self.xmax as f64, self.ymax as f64);
        [
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    /// Square windows of side `size` tiling this window with step `stride`.
    ///
    /// Windows start at `xmin`/`ymin` and keep a fixed size, so the last row
    /// and column may extend past `xmax`/`ymax`; the raster source defines
    /// what lies outside its extent. A tile whose far edge would not fit in
    /// `i64` is an error.
    pub fn sliding_windows(&self, size: i64, stride: i64) -> Result<Vec<Window>, WindowError> {
        if size <= 0 || stride <= 0 {
            return Err(WindowError::InvalidTiling { size, stride });
        }
        let mut out = Vec::new();
        let mut y = self.ymin;
        while y < self.ymax {
            let mut x = self.xmin;
            while x < self.xmax {
                out.push(Window {
                    xmin: x,
                    ymin: y,
                    xmax: add(x, size)?,
                    ymax: add(y, size)?,
                });
                // a step past i64::MAX is past xmax too
                match x.checked_add(stride) {
                    Some(next) => x = next,
                    None => break,
                }
            }
            match y.checked_add(stride) {
                Some(next) => y = next,
                None => break,
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Window(xmin={}, ymin={}, xmax={}, ymax={})",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

impl TryFrom<[i64; 4]> for Window {
    type Error = WindowError;

    fn try_from(v: [i64; 4]) -> Result<Self, Self::Error> {
        Window::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Window> for [i64; 4] {
    fn from(w: Window) -> Self {
        [w.xmin, w.ymin, w.xmax, w.ymax]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn w(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Window {
        Window::new(xmin, ymin, xmax, ymax).expect("valid window")
    }

    #[test]
    fn rejects_empty_windows() {
        assert!(Window::new(0, 0, 0, 4).is_err());
        assert!(Window::new(0, 5, 4, 4).is_err());
    }

    #[test]
    fn size_is_height_then_width() {
        let win = w(2, 3, 12, 7);
        assert_eq!(win.width(), 10);
        assert_eq!(win.height(), 4);
        assert_eq!(win.size(), (4, 10));
        assert_eq!(win.area(), 40);
    }

    #[test]
    fn intersection_of_overlapping_and_disjoint_windows() {
        let a = w(0, 0, 10, 10);
        let b = w(5, 8, 20, 20);
        assert_eq!(a.intersection(&b), Some(w(5, 8, 10, 10)));
        // touching edges share no pixel
        assert_eq!(a.intersection(&w(10, 0, 20, 10)), None);
    }

    #[test]
    fn translate_is_pure() {
        let a = w(1, 2, 3, 4);
        let b = a.translate(-1, 10).expect("translate");
        assert_eq!(a, w(1, 2, 3, 4));
        assert_eq!(b, w(0, 12, 2, 14));
    }

    #[test]
    fn translate_past_i64_range_is_an_error() {
        let a = w(0, 0, 4, 4);
        assert_eq!(
            a.translate(i64::MAX - 2, 0),
            Err(WindowError::Overflow {
                base: 4,
                offset: i64::MAX - 2
            })
        );
        assert!(a.translate(0, i64::MIN).is_ok());
        assert!(w(-1, 0, 4, 4).translate(i64::MIN, 0).is_err());
    }

    #[test]
    fn extreme_windows_report_their_size() {
        let wide = w(i64::MIN, 0, i64::MAX, 1);
        assert_eq!(wide.width(), usize::MAX);
        assert_eq!(wide.height(), 1);
    }

    #[test]
    fn usable_as_map_key() {
        let mut m = HashMap::new();
        m.insert(w(0, 0, 4, 4), "a");
        m.insert(w(0, 0, 4, 4), "b");
        assert_eq!(m.len(), 1);
        assert_eq!(m[&w(0, 0, 4, 4)], "b");
    }

    #[test]
    fn serde_uses_flat_array_and_validates() {
        let json = serde_json::to_string(&w(1, 2, 3, 4)).expect("serialize");
        assert_eq!(json, "[1,2,3,4]");
        let back: Window = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, w(1, 2, 3, 4));
        assert!(serde_json::from_str::<Window>("[4,0,1,1]").is_err());
    }

    #[test]
    fn sliding_windows_cover_extent() {
        let extent = w(0, 0, 10, 6);
        let tiles = extent.sliding_windows(4, 4).expect("tiles");
        assert_eq!(tiles.len(), 3 * 2);
        assert_eq!(tiles[0], w(0, 0, 4, 4));
        assert_eq!(tiles[2], w(8, 0, 12, 4));
        assert_eq!(tiles[5], w(8, 4, 12, 8));
        assert!(extent.sliding_windows(0, 1).is_err());
    }

    #[test]
    fn sliding_windows_near_i64_max() {
        let edge = w(i64::MAX - 4, 0, i64::MAX, 2);
        assert!(matches!(
            edge.sliding_windows(8, 8),
            Err(WindowError::Overflow { .. })
        ));
        // tiles that fit, with a stride that steps past i64::MAX
        let tiles = w(i64::MAX - 4, 0, i64::MAX - 2, 2)
            .sliding_windows(2, i64::MAX)
            .expect("tiles");
        assert_eq!(tiles, vec![w(i64::MAX - 4, 0, i64::MAX - 2, 2)]);
    }
}

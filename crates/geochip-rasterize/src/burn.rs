//! Scan conversion of polygons into a `u8` grid.
//!
//! Coordinates are translated into the window's local frame on the fly, so
//! pixel `(col, row)` covers `[col, col + 1) × [row, row + 1)` after
//! subtracting the window origin.

use geochip_core::{Chip, Geometry, Polygon, Window};
use log::warn;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Integer pixel index of an already rounded coordinate, clamped one pixel
/// past `[0, len]` so far-away vertices cannot saturate the cast.
#[inline]
fn pixel_index(v: f64, len: usize) -> i64 {
    if v.is_nan() {
        return -1;
    }
    v.clamp(-1.0, len as f64 + 1.0) as i64
}

/// Mutable `width × height` single-band grid plus the window origin.
struct Canvas<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    ox: f64,
    oy: f64,
}

impl Canvas<'_> {
    #[inline]
    fn local(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(p.x - self.ox, p.y - self.oy)
    }

    /// Fill columns `c0..=c1` (clipped) of `row`.
    #[inline]
    fn fill_span(&mut self, row: i64, c0: i64, c1: i64, value: u8) {
        if row < 0 || row >= self.height as i64 {
            return;
        }
        let c0 = c0.max(0);
        let c1 = c1.min(self.width as i64 - 1);
        if c0 > c1 {
            return;
        }
        let start = row as usize * self.width;
        self.data[start + c0 as usize..=start + c1 as usize].fill(value);
    }

    /// Pixels whose centre lies inside the polygon (even-odd, half-open crossings).
    fn burn_centers(&mut self, poly: &Polygon, value: u8) {
        let edges: Vec<(Point2<f64>, Point2<f64>)> = poly
            .edges()
            .map(|(a, b)| (self.local(a), self.local(b)))
            .collect();
        let (min_y, max_y) = edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, (a, _)| {
            (acc.0.min(a.y), acc.1.max(a.y))
        });
        if !min_y.is_finite() || !max_y.is_finite() {
            return;
        }

        let row_start = pixel_index((min_y - 0.5).ceil(), self.height).max(0);
        let row_end = pixel_index((max_y - 0.5).ceil(), self.height).min(self.height as i64);
        let mut xs = Vec::new();
        for row in row_start..row_end {
            let y = row as f64 + 0.5;
            xs.clear();
            for &(a, b) in &edges {
                if (a.y <= y && b.y > y) || (b.y <= y && a.y > y) {
                    xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            xs.sort_by(f64::total_cmp);
            for pair in xs.chunks_exact(2) {
                // centre c + 0.5 in [x0, x1)
                let c0 = pixel_index((pair[0] - 0.5).ceil(), self.width);
                let c1 = pixel_index((pair[1] - 0.5).ceil(), self.width) - 1;
                self.fill_span(row, c0, c1, value);
            }
        }
    }

    /// Pixels whose open footprint is crossed by any ring segment.
    fn burn_edges(&mut self, poly: &Polygon, value: u8) {
        for (a, b) in poly.edges() {
            let (a, b) = (self.local(a), self.local(b));
            self.burn_segment(a, b, value);
        }
    }

    fn burn_segment(&mut self, a: Point2<f64>, b: Point2<f64>, value: u8) {
        let (a, b) = if a.y <= b.y { (a, b) } else { (b, a) };

        if a.y == b.y {
            // on a row boundary the segment crosses no open footprint
            if a.y.fract() == 0.0 {
                return;
            }
            let row = pixel_index(a.y.floor(), self.height);
            self.burn_x_range(row, a.x.min(b.x), a.x.max(b.x), value);
            return;
        }

        let row_start = pixel_index(a.y.floor(), self.height).max(0);
        let row_end = (pixel_index(b.y.ceil(), self.height) - 1).min(self.height as i64 - 1);
        let inv_slope = (b.x - a.x) / (b.y - a.y);
        for row in row_start..=row_end {
            let y0 = a.y.max(row as f64);
            let y1 = b.y.min(row as f64 + 1.0);
            if y1 <= y0 {
                continue;
            }
            let x0 = a.x + (y0 - a.y) * inv_slope;
            let x1 = a.x + (y1 - a.y) * inv_slope;
            self.burn_x_range(row, x0.min(x1), x0.max(x1), value);
        }
    }

    fn burn_x_range(&mut self, row: i64, lo: f64, hi: f64, value: u8) {
        if lo == hi {
            // vertical piece on a column boundary touches no open footprint
            if lo.fract() == 0.0 {
                return;
            }
            let c = pixel_index(lo.floor(), self.width);
            self.fill_span(row, c, c, value);
            return;
        }
        let c0 = pixel_index(lo.floor(), self.width);
        let c1 = pixel_index(hi.ceil(), self.width) - 1;
        self.fill_span(row, c0, c1, value);
    }
}

/// Burn `shapes` into a `window.size()` chip with one channel.
///
/// Pixels not covered by any shape get `fill`. Shapes are burned in iteration
/// order, so a later shape overwrites an earlier one where they overlap.
/// With `all_touched`, every pixel touched by a shape is burned; otherwise
/// only pixels whose centre lies inside it. Non-polygonal shapes are skipped.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(shapes), fields(window = %window))
)]
pub fn rasterize<'a>(
    shapes: impl IntoIterator<Item = (&'a Geometry, u8)>,
    window: &Window,
    fill: u8,
    all_touched: bool,
) -> Chip<u8> {
    let (height, width) = window.size();
    let mut chip = Chip::filled(height, width, 1, fill);
    let mut canvas = Canvas {
        data: chip.data_mut(),
        width,
        height,
        ox: window.xmin() as f64,
        oy: window.ymin() as f64,
    };

    for (geometry, value) in shapes {
        let polygons = geometry.polygons();
        if polygons.is_empty() {
            warn!("skipping {} geometry during rasterization", geometry.kind());
            continue;
        }
        for poly in polygons {
            canvas.burn_centers(poly, value);
            if all_touched {
                canvas.burn_edges(poly, value);
            }
        }
    }
    chip
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Window {
        Window::new(xmin, ymin, xmax, ymax).expect("window")
    }

    fn rows(chip: &Chip<u8>) -> Vec<Vec<u8>> {
        chip.data().chunks(chip.width()).map(<[u8]>::to_vec).collect()
    }

    fn poly(p: Polygon) -> Geometry {
        Geometry::Polygon(p)
    }

    #[test]
    fn center_policy_on_half_pixel_square() {
        // covers centres of cols 1..=2, rows 1..=2 exactly at their edges
        let g = poly(Polygon::rect(1.0, 1.0, 3.0, 3.0));
        let chip = rasterize([(&g, 1)], &win(0, 0, 4, 4), 0, false);
        assert_eq!(
            rows(&chip),
            vec![
                vec![0, 0, 0, 0],
                vec![0, 1, 1, 0],
                vec![0, 1, 1, 0],
                vec![0, 0, 0, 0],
            ]
        );
    }

    #[test]
    fn grid_aligned_square_touches_same_pixels() {
        let g = poly(Polygon::rect(1.0, 1.0, 3.0, 3.0));
        let center = rasterize([(&g, 1)], &win(0, 0, 4, 4), 0, false);
        let touched = rasterize([(&g, 1)], &win(0, 0, 4, 4), 0, true);
        assert_eq!(center, touched);
    }

    #[test]
    fn sub_pixel_polygon_only_burns_when_touched() {
        let g = poly(Polygon::rect(1.1, 1.1, 1.3, 1.3));
        let center = rasterize([(&g, 7)], &win(0, 0, 3, 3), 0, false);
        assert_eq!(center.count_eq(7), 0);
        let touched = rasterize([(&g, 7)], &win(0, 0, 3, 3), 0, true);
        assert_eq!(touched.count_eq(7), 1);
        assert_eq!(touched.get(1, 1, 0), Some(7));
    }

    #[test]
    fn diagonal_edge_touches_more_than_centres() {
        let tri = poly(Polygon::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(0.0, 4.0),
            ],
            Vec::new(),
        ));
        let center = rasterize([(&tri, 1)], &win(0, 0, 4, 4), 0, false);
        let touched = rasterize([(&tri, 1)], &win(0, 0, 4, 4), 0, true);
        // centres strictly below the anti-diagonal x + y < 4
        assert_eq!(
            rows(&center),
            vec![
                vec![1, 1, 1, 0],
                vec![1, 1, 0, 0],
                vec![1, 0, 0, 0],
                vec![0, 0, 0, 0],
            ]
        );
        assert_eq!(touched.count_eq(1), 10);
        for (c, t) in center.data().iter().zip(touched.data()) {
            assert!(*c == 0 || *t == 1);
        }
    }

    #[test]
    fn holes_are_left_as_fill() {
        let donut = poly(Polygon::new(
            Polygon::rect(0.0, 0.0, 5.0, 5.0).exterior,
            vec![Polygon::rect(2.0, 2.0, 3.0, 3.0).exterior],
        ));
        let chip = rasterize([(&donut, 3)], &win(0, 0, 5, 5), 9, false);
        assert_eq!(chip.count_eq(3), 24);
        assert_eq!(chip.get(2, 2, 0), Some(9));
    }

    #[test]
    fn later_shapes_win_overlaps() {
        let a = poly(Polygon::rect(0.0, 0.0, 3.0, 3.0));
        let b = poly(Polygon::rect(1.0, 1.0, 4.0, 4.0));
        let chip = rasterize([(&a, 1), (&b, 2)], &win(0, 0, 4, 4), 0, false);
        assert_eq!(
            rows(&chip),
            vec![
                vec![1, 1, 1, 0],
                vec![1, 2, 2, 2],
                vec![1, 2, 2, 2],
                vec![0, 2, 2, 2],
            ]
        );
        let swapped = rasterize([(&b, 2), (&a, 1)], &win(0, 0, 4, 4), 0, false);
        assert_eq!(swapped.get(1, 1, 0), Some(1));
    }

    #[test]
    fn window_offset_is_subtracted() {
        let g = poly(Polygon::rect(101.0, 51.0, 102.0, 52.0));
        let chip = rasterize([(&g, 4)], &win(100, 50, 103, 53), 0, false);
        assert_eq!(chip.count_eq(4), 1);
        assert_eq!(chip.get(1, 1, 0), Some(4));
    }

    #[test]
    fn polygon_larger_than_window_fills_everything() {
        let g = poly(Polygon::rect(-1e6, -1e6, 1e6, 1e6));
        for all_touched in [false, true] {
            let chip = rasterize([(&g, 2)], &win(10, 10, 14, 13), 0, all_touched);
            assert_eq!(chip.shape(), (3, 4, 1));
            assert_eq!(chip.count_eq(2), 12);
        }
    }

    #[test]
    fn far_away_multipolygon_part_burns_nothing() {
        // the second part lies beyond the i64 range of pixel indices
        let g = Geometry::MultiPolygon(vec![
            Polygon::rect(0.0, 0.0, 1.0, 1.0),
            Polygon::rect(-3e19, 0.0, -2e19, 4.0),
            Polygon::rect(2e19, 0.5, 3e19, 2.5),
        ]);
        for all_touched in [false, true] {
            let chip = rasterize([(&g, 1)], &win(0, 0, 4, 4), 0, all_touched);
            assert_eq!(chip.count_eq(1), 1, "all_touched={all_touched}");
            assert_eq!(chip.get(0, 0, 0), Some(1));
        }
    }

    #[test]
    fn huge_span_is_clipped_to_the_window() {
        let g = poly(Polygon::new(
            vec![
                Point2::new(-1e300, 0.2),
                Point2::new(1e300, 0.2),
                Point2::new(1e300, 1.7),
                Point2::new(-1e300, 1.7),
            ],
            Vec::new(),
        ));
        for all_touched in [false, true] {
            let chip = rasterize([(&g, 5)], &win(0, 0, 3, 3), 0, all_touched);
            assert_eq!(rows(&chip)[0], vec![5, 5, 5]);
            assert_eq!(rows(&chip)[2], vec![0, 0, 0]);
        }
    }

    #[test]
    fn non_polygonal_shapes_are_skipped() {
        let p = Geometry::Point(Point2::new(0.5, 0.5));
        let chip = rasterize([(&p, 1)], &win(0, 0, 2, 2), 0, true);
        assert_eq!(chip.count_eq(0), 4);
    }
}

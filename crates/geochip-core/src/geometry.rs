//! Planar label geometries.
//!
//! Serialized in GeoJSON geometry layout (`{"type": ..., "coordinates": ...}`)
//! so tables can be exchanged as JSON. Coordinates are `(x, y)` in whatever
//! space the owner declares (pixel or map).

use crate::Window;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Ring = Vec<Point2<f64>>;

/// Polygon with an exterior ring and optional holes. Rings may be open or closed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Ring>", into = "Vec<Ring>")]
pub struct Polygon {
    pub exterior: Ring,
    pub interiors: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, interiors: Vec<Ring>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    /// Axis-aligned rectangle `[x0, x1] × [y0, y1]`.
    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(
            vec![
                Point2::new(x0, y0),
                Point2::new(x1, y0),
                Point2::new(x1, y1),
                Point2::new(x0, y1),
            ],
            Vec::new(),
        )
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    /// Every ring edge `(a, b)`, closing open rings.
    pub fn edges(&self) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
        self.rings().flat_map(ring_edges)
    }

    /// Even-odd point containment over all rings.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn map_points(&self, f: &impl Fn(Point2<f64>) -> Point2<f64>) -> Self {
        Self {
            exterior: self.exterior.iter().map(|&p| f(p)).collect(),
            interiors: self
                .interiors
                .iter()
                .map(|r| r.iter().map(|&p| f(p)).collect())
                .collect(),
        }
    }
}

impl From<Vec<Ring>> for Polygon {
    fn from(mut rings: Vec<Ring>) -> Self {
        if rings.is_empty() {
            return Self::new(Vec::new(), Vec::new());
        }
        let exterior = rings.remove(0);
        Self::new(exterior, rings)
    }
}

impl From<Polygon> for Vec<Ring> {
    fn from(p: Polygon) -> Self {
        let mut rings = Vec::with_capacity(1 + p.interiors.len());
        rings.push(p.exterior);
        rings.extend(p.interiors);
        rings
    }
}

pub(crate) fn ring_edges(ring: &Ring) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Geometry kind, named as in GeoJSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryKind {
    /// Area geometries, the only kinds that can be burned into a raster.
    pub fn is_polygonal(self) -> bool {
        matches!(self, GeometryKind::Polygon | GeometryKind::MultiPolygon)
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Point2<f64>),
    LineString(Vec<Point2<f64>>),
    Polygon(Polygon),
    MultiPoint(Vec<Point2<f64>>),
    MultiLineString(Vec<Vec<Point2<f64>>>),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }

    /// Polygon parts; empty for non-area geometries.
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Geometry::Polygon(p) => std::slice::from_ref(p),
            Geometry::MultiPolygon(ps) => ps,
            _ => &[],
        }
    }

    fn points(&self) -> Box<dyn Iterator<Item = Point2<f64>> + '_> {
        match self {
            Geometry::Point(p) => Box::new(std::iter::once(*p)),
            Geometry::LineString(ps) | Geometry::MultiPoint(ps) => Box::new(ps.iter().copied()),
            Geometry::MultiLineString(ls) => Box::new(ls.iter().flatten().copied()),
            Geometry::Polygon(p) => Box::new(p.rings().flatten().copied()),
            Geometry::MultiPolygon(ps) => {
                Box::new(ps.iter().flat_map(|p| p.rings().flatten().copied()))
            }
        }
    }

    /// Bounding box, `None` when the geometry has no coordinates.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut it = self.points();
        let first = it.next()?;
        let mut b = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in it {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    /// Apply `f` to every coordinate.
    pub fn map_points(&self, f: impl Fn(Point2<f64>) -> Point2<f64>) -> Geometry {
        let line = |ps: &Vec<Point2<f64>>| ps.iter().map(|&p| f(p)).collect::<Vec<_>>();
        match self {
            Geometry::Point(p) => Geometry::Point(f(*p)),
            Geometry::LineString(ps) => Geometry::LineString(line(ps)),
            Geometry::MultiPoint(ps) => Geometry::MultiPoint(line(ps)),
            Geometry::MultiLineString(ls) => Geometry::MultiLineString(ls.iter().map(line).collect()),
            Geometry::Polygon(p) => Geometry::Polygon(p.map_points(&f)),
            Geometry::MultiPolygon(ps) => {
                Geometry::MultiPolygon(ps.iter().map(|p| p.map_points(&f)).collect())
            }
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Geometry {
        self.map_points(|p| Point2::new(p.x + dx, p.y + dy))
    }

    /// True if the geometry shares at least one point with the closed window rectangle.
    pub fn intersects_window(&self, window: &Window) -> bool {
        match self.bounds() {
            Some(b) if b.intersects_window(window) => {}
            _ => return false,
        }
        match self {
            Geometry::Point(p) => window.contains_point(*p),
            Geometry::MultiPoint(ps) => ps.iter().any(|&p| window.contains_point(p)),
            Geometry::LineString(ps) => line_intersects_window(ps, window),
            Geometry::MultiLineString(ls) => ls.iter().any(|ps| line_intersects_window(ps, window)),
            Geometry::Polygon(p) => polygon_intersects_window(p, window),
            Geometry::MultiPolygon(ps) => ps.iter().any(|p| polygon_intersects_window(p, window)),
        }
    }
}

impl From<Polygon> for Geometry {
    fn from(p: Polygon) -> Self {
        Geometry::Polygon(p)
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Closed overlap test against a window.
    #[inline]
    pub fn intersects_window(&self, w: &Window) -> bool {
        self.min_x <= w.xmax() as f64
            && self.max_x >= w.xmin() as f64
            && self.min_y <= w.ymax() as f64
            && self.max_y >= w.ymin() as f64
    }
}

fn window_edges(w: &Window) -> [(Point2<f64>, Point2<f64>); 4] {
    let [tl, tr, br, bl] = w.corners();
    [(tl, tr), (tr, br), (br, bl), (bl, tl)]
}

fn line_intersects_window(ps: &[Point2<f64>], w: &Window) -> bool {
    if ps.iter().any(|&p| w.contains_point(p)) {
        return true;
    }
    let edges = window_edges(w);
    ps.windows(2)
        .any(|s| edges.iter().any(|&(a, b)| segments_intersect(s[0], s[1], a, b)))
}

fn polygon_intersects_window(poly: &Polygon, w: &Window) -> bool {
    if poly.rings().flatten().any(|&p| w.contains_point(p)) {
        return true;
    }
    if w.corners().iter().any(|&c| poly.contains(c)) {
        return true;
    }
    let edges = window_edges(w);
    poly.edges()
        .any(|(p, q)| edges.iter().any(|&(a, b)| segments_intersect(p, q, a, b)))
}

fn orient(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point2<f64>, b: Point2<f64>, p: Point2<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed segment intersection, collinear overlaps included.
pub(crate) fn segments_intersect(
    p1: Point2<f64>,
    p2: Point2<f64>,
    q1: Point2<f64>,
    q2: Point2<f64>,
) -> bool {
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

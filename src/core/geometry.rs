//! Observer geometry analysis: representative point (area-weighted centroid)
//! and max diameter (apparent-size proxy) for point, polygon and multipolygon
//! features.
use thiserror::Error;

use crate::types::Point;

/// Rings longer than this are searched on their convex hull only.
const HULL_SEARCH_THRESHOLD: usize = 64;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Unsupported geometry type: {0}")]
    Unsupported(String),
    #[error("Ring has {0} distinct vertices, at least 3 required")]
    TooFewVertices(usize),
    #[error("Geometry has zero area")]
    ZeroArea,
    #[error("Multipolygon has no parts")]
    EmptyMultiPolygon,
    #[error("Non-finite coordinate: {0}")]
    NonFinite(Point),
    #[error("Feature has no geometry")]
    Missing,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub interiors: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>) -> Self {
        Self {
            exterior,
            interiors: Vec::new(),
        }
    }

    pub fn with_interiors(exterior: Vec<Point>, interiors: Vec<Vec<Point>>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Geometry {
    Point(Point),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Geometry::Point(p) => check_finite(std::slice::from_ref(p)),
            Geometry::Polygon(poly) => validate_polygon(poly),
            Geometry::MultiPolygon(parts) => {
                if parts.is_empty() {
                    return Err(GeometryError::EmptyMultiPolygon);
                }
                parts.iter().try_for_each(validate_polygon)
            }
        }
    }
}

fn check_finite(points: &[Point]) -> Result<(), GeometryError> {
    match points.iter().find(|p| !p.is_finite()) {
        Some(p) => Err(GeometryError::NonFinite(*p)),
        None => Ok(()),
    }
}

/// Ring vertices without the closing duplicate.
fn open_ring(ring: &[Point]) -> &[Point] {
    match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

fn validate_ring(ring: &[Point]) -> Result<(), GeometryError> {
    check_finite(ring)?;
    let open = open_ring(ring);
    let mut distinct: Vec<Point> = Vec::with_capacity(open.len());
    for p in open {
        if !distinct.contains(p) {
            distinct.push(*p);
            if distinct.len() >= 3 {
                return Ok(());
            }
        }
    }
    Err(GeometryError::TooFewVertices(distinct.len()))
}

fn validate_polygon(poly: &Polygon) -> Result<(), GeometryError> {
    validate_ring(&poly.exterior)?;
    poly.interiors.iter().try_for_each(|r| validate_ring(r))
}

/// Signed area and centroid moment sums (shoelace) of a ring.
fn ring_moments(ring: &[Point]) -> (f64, f64, f64) {
    let open = open_ring(ring);
    let n = open.len();
    // Shift to the first vertex to keep large projected coordinates well conditioned.
    let base = open[0];
    let (mut a, mut cx, mut cy) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let p = open[i];
        let q = open[(i + 1) % n];
        let (px, py) = (p.x - base.x, p.y - base.y);
        let (qx, qy) = (q.x - base.x, q.y - base.y);
        let cross = px * qy - qx * py;
        a += cross;
        cx += (px + qx) * cross;
        cy += (py + qy) * cross;
    }
    // Moments are about `base`; translate back to world coordinates.
    let area = a / 2.0;
    (area, cx / 6.0 + base.x * area, cy / 6.0 + base.y * area)
}

/// Unsigned area and area-weighted moments with holes subtracted.
fn polygon_moments(poly: &Polygon) -> (f64, f64, f64) {
    let orient = |(a, mx, my): (f64, f64, f64)| {
        if a < 0.0 { (-a, -mx, -my) } else { (a, mx, my) }
    };
    let (mut area, mut mx, mut my) = orient(ring_moments(&poly.exterior));
    for hole in &poly.interiors {
        let (ha, hx, hy) = orient(ring_moments(hole));
        area -= ha;
        mx -= hx;
        my -= hy;
    }
    (area, mx, my)
}

/// Geometric centroid of the geometry.
pub fn representative_point(geometry: &Geometry) -> Result<Point, GeometryError> {
    geometry.validate()?;
    let (area, mx, my) = match geometry {
        Geometry::Point(p) => return Ok(*p),
        Geometry::Polygon(poly) => polygon_moments(poly),
        Geometry::MultiPolygon(parts) => parts
            .iter()
            .map(polygon_moments)
            .fold((0.0, 0.0, 0.0), |acc, m| (acc.0 + m.0, acc.1 + m.1, acc.2 + m.2)),
    };
    if !(area > 0.0 && area.is_finite()) {
        return Err(GeometryError::ZeroArea);
    }
    Ok(Point::new(mx / area, my / area))
}

/// Largest pairwise vertex distance within one polygon's exterior ring, or the
/// largest such value over the parts of a multipolygon. Points have diameter 0.
pub fn max_diameter(geometry: &Geometry) -> Result<f64, GeometryError> {
    geometry.validate()?;
    Ok(match geometry {
        Geometry::Point(_) => 0.0,
        Geometry::Polygon(poly) => ring_diameter(&poly.exterior),
        Geometry::MultiPolygon(parts) => parts
            .iter()
            .map(|p| ring_diameter(&p.exterior))
            .fold(0.0, f64::max),
    })
}

fn ring_diameter(ring: &[Point]) -> f64 {
    let open = open_ring(ring);
    if open.len() > HULL_SEARCH_THRESHOLD {
        all_pairs_max(&convex_hull(open))
    } else {
        all_pairs_max(open)
    }
}

fn all_pairs_max(points: &[Point]) -> f64 {
    let mut best = 0.0f64;
    for (i, p) in points.iter().enumerate() {
        for q in &points[i + 1..] {
            best = best.max(p.distance(q));
        }
    }
    best
}

/// Andrew's monotone chain; returns hull vertices without repetition.
pub(crate) fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: &Point, a: &Point, b: &Point| {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };

    let mut hull: Vec<Point> = Vec::with_capacity(pts.len() * 2);
    for p in &pts {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

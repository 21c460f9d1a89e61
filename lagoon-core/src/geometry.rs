//! Planar geometry primitives on lat/lng coordinates
//!
//! All tests work in degree space (x = lng, y = lat), which is accurate enough
//! at city scale. Distances are always geodesic meters.

use geo::Coord;

use crate::model::{LatLng, Parcel, ParcelIndex, Point};

/// Share of the segment length around an attachment endpoint where boundary
/// crossings are tolerated
const ENDPOINT_TOLERANCE: f64 = 0.01;

/// Ray-casting parity test. The ring is closed implicitly.
pub fn point_in_polygon(point: LatLng, ring: &[LatLng]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].lng, ring[i].lat);
        let (xj, yj) = (ring[j].lng, ring[j].lat);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Parametric positions `(t, u)` of the intersection along `a1-a2` and `b1-b2`.
///
/// Parallel and collinear segments yield `None`.
pub fn segment_intersection(a1: LatLng, a2: LatLng, b1: LatLng, b2: LatLng) -> Option<(f64, f64)> {
    let r = a2.coord() - a1.coord();
    let s = b2.coord() - b1.coord();
    let denom = cross(r, s);
    let scale = (r.x.hypot(r.y)) * (s.x.hypot(s.y));
    if denom.abs() <= f64::EPSILON * scale || scale == 0.0 {
        return None;
    }

    let offset = b1.coord() - a1.coord();
    let t = cross(offset, s) / denom;
    let u = cross(offset, r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, u))
    } else {
        None
    }
}

/// Determinant based segment intersection test
pub fn segments_intersect(a1: LatLng, a2: LatLng, b1: LatLng, b2: LatLng) -> bool {
    segment_intersection(a1, a2, b1, b2).is_some()
}

/// `true` if segment `p1-p2` crosses the land of any parcel.
///
/// When both endpoints are attachment points, crossings at the endpoints
/// themselves do not count.
pub fn line_crosses_land(p1: &Point, p2: &Point, parcels: &[Parcel]) -> bool {
    let tolerant = p1.is_attachment() && p2.is_attachment();
    parcels
        .iter()
        .any(|parcel| segment_crosses_parcel(p1.position(), p2.position(), tolerant, parcel))
}

/// Same as [`line_crosses_land`], restricted to parcels whose bounding box
/// touches the segment
pub fn line_crosses_land_indexed(
    p1: &Point,
    p2: &Point,
    parcels: &[Parcel],
    index: &ParcelIndex,
) -> bool {
    let tolerant = p1.is_attachment() && p2.is_attachment();
    let (a, b) = (p1.position(), p2.position());
    index
        .near_segment(a, b)
        .any(|idx| segment_crosses_parcel(a, b, tolerant, &parcels[idx]))
}

fn segment_crosses_parcel(a: LatLng, b: LatLng, tolerant: bool, parcel: &Parcel) -> bool {
    for (e1, e2) in parcel.boundary_edges() {
        if let Some((t, _)) = segment_intersection(a, b, e1, e2) {
            if tolerant && !(ENDPOINT_TOLERANCE..=1.0 - ENDPOINT_TOLERANCE).contains(&t) {
                continue;
            }
            return true;
        }
    }
    parcel.contains(a.midpoint(b))
}

/// `segments + 1` evenly spaced points from `a` to `b`, both included
pub fn interpolate(a: LatLng, b: LatLng, segments: usize) -> Vec<LatLng> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let f = i as f64 / segments as f64;
            LatLng::new(a.lat + (b.lat - a.lat) * f, a.lng + (b.lng - a.lng) * f)
        })
        .collect()
}

/// Sum of geodesic segment lengths in meters
pub fn polyline_length(points: &[LatLng]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(pair[1]))
        .sum()
}

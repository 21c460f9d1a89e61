//! Geographic points and the tags attached to them along a path

use geo::{Coord, Distance, Haversine, Point as GeoPoint};
use serde::{Deserialize, Serialize};

/// Two coordinates closer than this (in degrees) are the same location
pub const COORD_EPSILON: f64 = 1e-9;

/// Bare latitude/longitude pair as delivered by the data providers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within the WGS84 range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn to_geo(self) -> GeoPoint<f64> {
        GeoPoint::new(self.lng, self.lat)
    }

    pub fn coord(self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }

    /// Great-circle distance in meters
    pub fn distance_to(self, other: LatLng) -> f64 {
        Haversine.distance(self.to_geo(), other.to_geo())
    }

    pub fn midpoint(self, other: LatLng) -> LatLng {
        LatLng::new((self.lat + other.lat) / 2.0, (self.lng + other.lng) / 2.0)
    }

    pub fn approx_eq(self, other: LatLng) -> bool {
        (self.lat - other.lat).abs() < COORD_EPSILON && (self.lng - other.lng).abs() < COORD_EPSILON
    }

    /// Planar key used by the spatial indices (x = lng, y = lat)
    pub(crate) fn as_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// What a point represents in the city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Building,
    Bridge,
    Center,
    Canal,
    Water,
}

impl PointKind {
    /// Bridge and water attachment points may sit on a parcel boundary
    pub fn is_attachment(self) -> bool {
        matches!(self, PointKind::Bridge | PointKind::Canal | PointKind::Water)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walking,
    Gondola,
}

impl TransportMode {
    /// Travel speed in km/h
    pub fn speed_kmh(self) -> f64 {
        match self {
            TransportMode::Walking => crate::WALKING_SPEED_KMH,
            TransportMode::Gondola => crate::WATER_SPEED_KMH,
        }
    }
}

/// A point of a route request or of a computed path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PointKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_mode: Option<TransportMode>,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            kind: None,
            polygon_id: None,
            transport_mode: None,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: PointKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_polygon(mut self, polygon_id: impl Into<String>) -> Self {
        self.polygon_id = Some(polygon_id.into());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: TransportMode) -> Self {
        self.transport_mode = Some(mode);
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn is_valid(&self) -> bool {
        self.position().is_valid()
    }

    pub fn is_attachment(&self) -> bool {
        self.kind.is_some_and(PointKind::is_attachment)
    }

    pub fn same_location(&self, other: &Point) -> bool {
        self.position().approx_eq(other.position())
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        self.position().distance_to(other.position())
    }
}

impl From<LatLng> for Point {
    fn from(value: LatLng) -> Self {
        Point::new(value.lat, value.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_tags() {
        let point = Point::new(45.43, 12.33)
            .with_kind(PointKind::Canal)
            .with_polygon("polygon-1")
            .with_mode(TransportMode::Gondola);
        let json = serde_json::to_value(&point).unwrap();

        assert_eq!(json["type"], "canal");
        assert_eq!(json["polygonId"], "polygon-1");
        assert_eq!(json["transportMode"], "gondola");
    }

    #[test]
    fn untagged_point_omits_optional_fields() {
        let json = serde_json::to_string(&Point::new(1.0, 2.0)).unwrap();
        assert_eq!(json, r#"{"lat":1.0,"lng":2.0}"#);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(LatLng::new(45.0, 12.0).is_valid());
        assert!(!LatLng::new(f64::NAN, 12.0).is_valid());
        assert!(!LatLng::new(95.0, 12.0).is_valid());
    }

    #[test]
    fn distance_of_one_millidegree_latitude() {
        let d = LatLng::new(45.0, 12.0).distance_to(LatLng::new(45.001, 12.0));
        assert!((d - 111.2).abs() < 0.5, "got {d}");
    }
}

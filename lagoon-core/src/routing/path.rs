//! Route result shape shared by the local routers, the engine and the
//! remote fallback contract

use serde::{Deserialize, Serialize};

use crate::model::{Point, TransportMode};
use crate::{WALKING_SPEED_KMH, WATER_SPEED_KMH};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walking_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_trip: Option<Vec<Point>>,
    /// Set when the path is a synthetic straight line rather than a routed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

/// Distance and travel time split by transport mode
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathSummary {
    pub walking_distance: f64,
    pub water_distance: f64,
    pub estimated_time_minutes: f64,
}

impl PathSummary {
    pub fn distance(&self) -> f64 {
        self.walking_distance + self.water_distance
    }
}

impl PathResult {
    /// Successful result with distances and time measured on `path`
    pub fn from_path(path: Vec<Point>) -> Self {
        let path = dedup_points(path);
        let summary = summarize(&path);
        Self {
            success: true,
            distance: Some(summary.distance()),
            walking_distance: Some(summary.walking_distance),
            water_distance: Some(summary.water_distance),
            estimated_time_minutes: Some(summary.estimated_time_minutes),
            water_only: Some(false),
            path: Some(path),
            ..Self::default()
        }
    }

    /// Water-only result; the round trip is the path followed by its return leg
    pub fn water_only(path: Vec<Point>) -> Self {
        let mut result = Self::from_path(path);
        result.water_only = Some(true);
        result.round_trip = result.path.as_deref().map(round_trip);
        result
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn points(&self) -> &[Point] {
        self.path.as_deref().unwrap_or_default()
    }

    pub fn is_water_only(&self) -> bool {
        self.water_only.unwrap_or(false)
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.unwrap_or(false)
    }
}

/// Transport mode of the segment between two consecutive points
pub fn segment_mode(a: &Point, b: &Point) -> TransportMode {
    if a.transport_mode == Some(TransportMode::Gondola)
        && b.transport_mode == Some(TransportMode::Gondola)
    {
        TransportMode::Gondola
    } else {
        TransportMode::Walking
    }
}

pub fn summarize(path: &[Point]) -> PathSummary {
    path.windows(2).fold(PathSummary::default(), |mut summary, pair| {
        let distance = pair[0].distance_to(&pair[1]);
        let mode = segment_mode(&pair[0], &pair[1]);
        match mode {
            TransportMode::Walking => summary.walking_distance += distance,
            TransportMode::Gondola => summary.water_distance += distance,
        }
        summary.estimated_time_minutes += minutes(distance, mode);
        summary
    })
}

fn minutes(distance_m: f64, mode: TransportMode) -> f64 {
    let speed_kmh = match mode {
        TransportMode::Walking => WALKING_SPEED_KMH,
        TransportMode::Gondola => WATER_SPEED_KMH,
    };
    distance_m / 1000.0 / speed_kmh * 60.0
}

/// Drops consecutive points equal in coordinates, transport mode and kind
pub fn dedup_points(mut path: Vec<Point>) -> Vec<Point> {
    path.dedup_by(|b, a| {
        a.same_location(b) && a.transport_mode == b.transport_mode && a.kind == b.kind
    });
    path
}

fn round_trip(path: &[Point]) -> Vec<Point> {
    let mut points = path.to_vec();
    points.extend(path.iter().rev().skip(1).cloned());
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PointKind;

    fn walk(lat: f64) -> Point {
        Point::new(lat, 12.0).with_mode(TransportMode::Walking)
    }

    fn boat(lat: f64) -> Point {
        Point::new(lat, 12.0).with_mode(TransportMode::Gondola)
    }

    #[test]
    fn splits_distance_by_mode() {
        let result = PathResult::from_path(vec![walk(45.0), boat(45.001), boat(45.002), walk(45.003)]);

        let water = Point::new(45.001, 12.0).distance_to(&Point::new(45.002, 12.0));
        let total = Point::new(45.0, 12.0).distance_to(&Point::new(45.003, 12.0));
        assert!((result.water_distance.unwrap() - water).abs() < 1e-6);
        assert!((result.distance.unwrap() - total).abs() < 1e-6);

        let expected = (total - water) / 1000.0 / 3.5 * 60.0 + water / 1000.0 / 10.0 * 60.0;
        assert!((result.estimated_time_minutes.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn dedup_keeps_mode_changes() {
        let dock = Point::new(45.0, 12.0).with_kind(PointKind::Canal);
        let path = dedup_points(vec![
            dock.clone().with_mode(TransportMode::Walking),
            dock.clone().with_mode(TransportMode::Walking),
            dock.with_mode(TransportMode::Gondola),
        ]);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn water_only_round_trip_returns_to_start() {
        let result = PathResult::water_only(vec![boat(45.0), boat(45.001), boat(45.002)]);
        let trip = result.round_trip.unwrap();
        assert_eq!(trip.len(), 5);
        assert_eq!(trip.first(), trip.last());
        assert_eq!(result.water_only, Some(true));
    }

    #[test]
    fn failure_serializes_sparse() {
        let json = serde_json::to_value(PathResult::failure("no path")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "no path"}));
    }
}

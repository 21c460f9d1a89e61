use geo::{Coord, LineString, Point as GeoPoint};
use geojson::{Feature, FeatureCollection, Geometry, GeometryValue};
use serde_json::json;

use super::path::{PathResult, segment_mode};
use crate::Error;
use crate::model::{Point, TransportMode};

impl PathResult {
    /// Converts the route to a `GeoJSON` `FeatureCollection` with one
    /// `LineString` feature per transport-mode leg.
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let path = self.points();
        if !self.success || path.is_empty() {
            return Err(Error::InvalidData(
                self.error.clone().unwrap_or_else(|| "route has no path".into()),
            ));
        }

        let features = if let [only] = path {
            vec![point_feature(only)?]
        } else {
            legs(path)
                .into_iter()
                .enumerate()
                .map(|(idx, (mode, points))| leg_feature(idx, mode, points))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

/// Splits the path into maximal runs of segments sharing a transport mode
fn legs(path: &[Point]) -> Vec<(TransportMode, &[Point])> {
    let mut legs = Vec::new();
    let mut start = 0;
    for idx in 1..path.len() {
        let mode = segment_mode(&path[idx - 1], &path[idx]);
        let next = path.get(idx + 1).map(|p| segment_mode(&path[idx], p));
        if next != Some(mode) {
            legs.push((mode, &path[start..=idx]));
            start = idx;
        }
    }
    legs
}

fn leg_feature(idx: usize, mode: TransportMode, points: &[Point]) -> Result<Feature, Error> {
    let coords: Vec<Coord<f64>> = points.iter().map(|p| p.position().coord()).collect();
    let line = LineString::new(coords);
    let distance: f64 = points.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
    let geometry = Geometry::new(GeometryValue::from(&line));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "leg_type": mode,
            "leg_index": idx,
            "distance": distance,
            "minutes": distance / 1000.0 / mode.speed_kmh() * 60.0,
            "from_polygon": points.first().and_then(|p| p.polygon_id.clone()),
            "to_polygon": points.last().and_then(|p| p.polygon_id.clone()),
        }
    });

    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

fn point_feature(point: &Point) -> Result<Feature, Error> {
    let geometry = Geometry::new(GeometryValue::from(&GeoPoint::from(point.position().coord())));
    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "leg_type": point.transport_mode.unwrap_or(TransportMode::Walking),
            "leg_index": 0,
            "distance": 0.0,
        }
    });
    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

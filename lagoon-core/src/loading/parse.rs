//! Lenient decoding of provider JSON
//!
//! A malformed record only drops itself: the offending parcel or point is
//! logged and skipped while the rest of the payload is kept.

use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    Error,
    model::{
        Bridge, BridgePoint, BuildingPoint, CanalPoint, Dataset, Dock, LandGroup, LatLng, Parcel,
        RawWaterGraph, RawWaterPoint,
    },
};

/// Unwraps `{"<key>": [...]}` envelopes, returns bare arrays as is
fn records<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(items) = value.as_array() {
        return items;
    }
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .map_or(&[], Vec::as_slice)
}

/// Strictly numeric, finite, in-range `{lat, lng}`
fn lat_lng(value: &Value) -> Option<LatLng> {
    let lat = value.get("lat")?.as_f64()?;
    let lng = value.get("lng")?.as_f64()?;
    let position = LatLng::new(lat, lng);
    position.is_valid().then_some(position)
}

fn string_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decodes the parcel list, dropping parcels with fewer than three valid vertices
pub fn parse_parcels(value: &Value) -> Vec<Parcel> {
    let items = records(value, &["polygons", "parcels", "lands"]);
    let parcels: Vec<Parcel> = items.iter().filter_map(parse_parcel).collect();
    if parcels.len() < items.len() {
        warn!(
            "Dropped {} of {} parcels with malformed geometry",
            items.len() - parcels.len(),
            items.len()
        );
    }
    parcels
}

fn parse_parcel(value: &Value) -> Option<Parcel> {
    let Some(id) = string_id(value.get("id")) else {
        warn!("Skipping parcel without id");
        return None;
    };

    let raw_coordinates = value
        .get("coordinates")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    let coordinates: Vec<LatLng> = raw_coordinates.iter().filter_map(lat_lng).collect();
    if coordinates.len() < raw_coordinates.len() {
        warn!(
            "Parcel {id}: dropped {} invalid coordinates",
            raw_coordinates.len() - coordinates.len()
        );
    }
    if coordinates.len() < 3 {
        warn!("Skipping parcel {id}: only {} valid coordinates", coordinates.len());
        return None;
    }

    let center = match value.get("center").or_else(|| value.get("centroid")) {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let center = lat_lng(raw);
            if center.is_none() {
                warn!("Parcel {id}: ignoring invalid center");
            }
            center
        }
    };

    Some(Parcel {
        building_points: points(value, "buildingPoints", &id, |raw| {
            let position = lat_lng(raw)?;
            Some(BuildingPoint {
                id: string_id(raw.get("id")),
                lat: position.lat,
                lng: position.lng,
            })
        }),
        bridge_points: points(value, "bridgePoints", &id, |raw| {
            let point: BridgePoint = typed(raw)?;
            let connection_ok = point
                .connection
                .as_ref()
                .is_none_or(|c| c.target_point.is_valid());
            (point.edge.is_valid() && connection_ok).then_some(point)
        }),
        canal_points: points(value, "canalPoints", &id, |raw| {
            let point: CanalPoint = typed(raw)?;
            point.edge.is_valid().then_some(point)
        }),
        id,
        coordinates,
        center,
    })
}

fn points<T>(
    value: &Value,
    key: &str,
    parcel_id: &str,
    parse: impl Fn(&Value) -> Option<T>,
) -> Vec<T> {
    let raw = value
        .get(key)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    let parsed: Vec<T> = raw.iter().filter_map(parse).collect();
    if parsed.len() < raw.len() {
        warn!(
            "Parcel {parcel_id}: dropped {} malformed {key}",
            raw.len() - parsed.len()
        );
    }
    parsed
}

fn typed<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

/// Decodes a list of records, dropping the ones that do not deserialize or
/// fail `valid`
pub fn parse_records<T: DeserializeOwned>(
    value: &Value,
    keys: &[&str],
    what: &str,
    valid: impl Fn(&T) -> bool,
) -> Vec<T> {
    let items = records(value, keys);
    let parsed: Vec<T> = items
        .iter()
        .filter_map(typed::<T>)
        .filter(|record| valid(record))
        .collect();
    if parsed.len() < items.len() {
        warn!("Dropped {} of {} malformed {what}", items.len() - parsed.len(), items.len());
    }
    parsed
}

pub fn parse_bridges(value: &Value) -> Vec<Bridge> {
    parse_records(value, &["bridges"], "bridges", |b: &Bridge| b.position.is_valid())
}

pub fn parse_docks(value: &Value) -> Vec<Dock> {
    parse_records(value, &["docks"], "docks", |d: &Dock| d.position.is_valid())
}

pub fn parse_land_groups(value: &Value) -> Vec<LandGroup> {
    parse_records(value, &["landGroups", "groups"], "land groups", |_| true)
}

/// Decodes the precomputed water graph; points with invalid positions are dropped
///
/// # Errors
///
/// Returns an error if the payload is not a water graph at all
pub fn parse_water_graph(value: &Value) -> Result<RawWaterGraph, Error> {
    let body = value.get("waterGraph").unwrap_or(value);
    if body.get("waterPoints").and_then(Value::as_array).is_none() {
        return Err(Error::InvalidData(
            "water graph payload has no waterPoints array".to_string(),
        ));
    }
    let water_points = parse_records(body, &["waterPoints"], "water points", |p: &RawWaterPoint| {
        p.position.is_valid()
    });
    Ok(RawWaterGraph { water_points })
}

/// Decodes a combined `{parcels, bridges, docks, landGroups, waterGraph}` document
///
/// # Errors
///
/// Returns an error if the document holds no valid parcel
pub fn parse_dataset(value: &Value) -> Result<Dataset, Error> {
    let parcels = value
        .get("parcels")
        .or_else(|| value.get("polygons"))
        .map(parse_parcels)
        .unwrap_or_default();
    if parcels.is_empty() {
        return Err(Error::InvalidData("dataset contains no valid parcels".to_string()));
    }

    let water_graph = match value.get("waterGraph") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(parse_water_graph(raw)?),
    };

    Ok(Dataset {
        parcels,
        bridges: value.get("bridges").map(parse_bridges).unwrap_or_default(),
        docks: value.get("docks").map(parse_docks).unwrap_or_default(),
        land_groups: value.get("landGroups").map(parse_land_groups).unwrap_or_default(),
        water_graph,
    })
}

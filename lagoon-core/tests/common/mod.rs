#![allow(dead_code)]

use lagoon_core::model::{
    BridgeConnection, BridgePoint, BuildingPoint, CanalPoint, LandGroup, LatLng, Parcel,
};
use lagoon_core::Dataset;

pub fn rectangle(id: &str, south: f64, west: f64, north: f64, east: f64) -> Parcel {
    let mut parcel = Parcel::new(
        id,
        vec![
            LatLng::new(south, west),
            LatLng::new(south, east),
            LatLng::new(north, east),
            LatLng::new(north, west),
        ],
    );
    parcel.center = Some(LatLng::new((south + north) / 2.0, (west + east) / 2.0));
    parcel
}

pub fn building(id: &str, lat: f64, lng: f64) -> BuildingPoint {
    BuildingPoint {
        id: Some(id.into()),
        lat,
        lng,
    }
}

pub fn canal(id: &str, lat: f64, lng: f64, constructed: Option<bool>) -> CanalPoint {
    CanalPoint {
        id: Some(id.into()),
        edge: LatLng::new(lat, lng),
        is_constructed: constructed,
    }
}

pub fn bridge(
    id: &str,
    at: LatLng,
    target_polygon: &str,
    target: LatLng,
    constructed: Option<bool>,
) -> BridgePoint {
    BridgePoint {
        id: Some(id.into()),
        edge: at,
        connection: Some(BridgeConnection {
            target_polygon_id: target_polygon.into(),
            target_point: target,
            distance: None,
        }),
        is_constructed: constructed,
    }
}

/// Two islands 0.001 degrees apart in different land groups, each with a
/// constructed dock facing the channel between them
pub fn two_islands() -> Dataset {
    let mut north = rectangle("north", 45.002, 12.0, 45.004, 12.002);
    let mut south = rectangle("south", 45.0, 12.0, 45.001, 12.002);
    north.building_points.push(building("n1", 45.003, 12.0005));
    south.building_points.push(building("s1", 45.0005, 12.0015));
    north.canal_points.push(canal("north-dock", 45.002, 12.001, Some(true)));
    south.canal_points.push(canal("south-dock", 45.001, 12.001, Some(true)));

    let mut dataset = Dataset::from_parcels(vec![north, south]);
    dataset.land_groups = vec![
        LandGroup {
            group_id: "g-north".into(),
            lands: vec!["north".into()],
        },
        LandGroup {
            group_id: "g-south".into(),
            lands: vec!["south".into()],
        },
    ];
    dataset
}

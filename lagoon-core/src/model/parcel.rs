//! Land parcels and their attachment points

use rstar::{AABB, RTree, primitives::GeomWithData, primitives::Rectangle};
use serde::{Deserialize, Serialize};

use super::LatLng;
use crate::geometry::point_in_polygon;

/// A closed land boundary with interior anchors and edge attachments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub id: String,
    pub coordinates: Vec<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLng>,
    #[serde(default)]
    pub building_points: Vec<BuildingPoint>,
    #[serde(default)]
    pub bridge_points: Vec<BridgePoint>,
    #[serde(default)]
    pub canal_points: Vec<CanalPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl BuildingPoint {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Edge point where a bridge lands, optionally linked to a point of another parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgePoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub edge: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<BridgeConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_constructed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConnection {
    pub target_polygon_id: String,
    pub target_point: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Edge point marking a dock location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanalPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub edge: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_constructed: Option<bool>,
}

impl Parcel {
    pub fn new(id: impl Into<String>, coordinates: Vec<LatLng>) -> Self {
        Self {
            id: id.into(),
            coordinates,
            center: None,
            building_points: Vec::new(),
            bridge_points: Vec::new(),
            canal_points: Vec::new(),
        }
    }

    pub fn contains(&self, point: LatLng) -> bool {
        point_in_polygon(point, &self.coordinates)
    }

    /// Boundary edges, including the closing edge from the last vertex to the first
    pub fn boundary_edges(&self) -> impl Iterator<Item = (LatLng, LatLng)> + '_ {
        let n = self.coordinates.len();
        (0..n).map(move |i| (self.coordinates[i], self.coordinates[(i + 1) % n]))
    }

    /// `[min_lng, min_lat]`, `[max_lng, max_lat]`
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        self.coordinates.iter().fold(
            ([f64::INFINITY, f64::INFINITY], [f64::NEG_INFINITY, f64::NEG_INFINITY]),
            |(min, max), c| {
                (
                    [min[0].min(c.lng), min[1].min(c.lat)],
                    [max[0].max(c.lng), max[1].max(c.lat)],
                )
            },
        )
    }
}

type ParcelEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// R-tree over parcel bounding boxes
#[derive(Debug, Clone)]
pub struct ParcelIndex {
    tree: RTree<ParcelEnvelope>,
}

impl ParcelIndex {
    pub fn new(parcels: &[Parcel]) -> Self {
        let entries = parcels
            .iter()
            .enumerate()
            .filter(|(_, parcel)| parcel.coordinates.len() >= 3)
            .map(|(idx, parcel)| {
                let (min, max) = parcel.bounds();
                GeomWithData::new(Rectangle::from_corners(min, max), idx)
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Index of the first parcel whose boundary contains `point`
    pub fn containing(&self, parcels: &[Parcel], point: LatLng) -> Option<usize> {
        let envelope = AABB::from_point(point.as_array());
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .find(|&idx| parcels[idx].contains(point))
    }

    /// Parcels whose bounding box intersects the bounding box of segment `a`-`b`
    pub fn near_segment(&self, a: LatLng, b: LatLng) -> impl Iterator<Item = usize> + '_ {
        let envelope = AABB::from_corners(a.as_array(), b.as_array());
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
    }
}

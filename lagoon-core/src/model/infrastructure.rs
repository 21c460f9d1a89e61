//! Authoritative bridge and dock records and land group clustering

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::LatLng;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bridge {
    pub building_id: String,
    pub position: LatLng,
    #[serde(default)]
    pub is_constructed: bool,
    /// Parcel ids this bridge lands on
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dock {
    pub building_id: String,
    pub position: LatLng,
    #[serde(default)]
    pub is_constructed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_id: Option<String>,
}

/// Parcels physically connected by constructed bridges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandGroup {
    pub group_id: String,
    #[serde(default)]
    pub lands: Vec<String>,
}

/// Parcel id to land group lookup
#[derive(Debug, Clone, Default)]
pub struct LandGroups {
    by_land: HashMap<String, String>,
}

impl LandGroups {
    pub fn new(groups: &[LandGroup]) -> Self {
        let mut by_land = HashMap::new();
        for group in groups {
            for land in &group.lands {
                if let Some(previous) = by_land.insert(land.clone(), group.group_id.clone()) {
                    log::warn!(
                        "Parcel {land} listed in land groups {previous} and {}, keeping the latter",
                        group.group_id
                    );
                }
            }
        }
        Self { by_land }
    }

    pub fn is_empty(&self) -> bool {
        self.by_land.is_empty()
    }

    pub fn group_of(&self, land_id: &str) -> Option<&str> {
        self.by_land.get(land_id).map(String::as_str)
    }

    /// Two parcels are walkable from one another unless both have a known,
    /// different group. Unknown membership is resolved optimistically since a
    /// failed land search still falls back to water routing.
    pub fn same_group(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        match (self.group_of(a), self.group_of(b)) {
            (Some(group_a), Some(group_b)) => group_a == group_b,
            _ => true,
        }
    }
}

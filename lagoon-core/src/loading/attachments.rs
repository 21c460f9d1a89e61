//! Merges per-parcel bridge/canal points with the authoritative bridge and
//! dock lists into one set of attachment points.
//!
//! Both graph modes select from this set, which keeps the `real` node set a
//! subset of the `all` node set for the same input.

use hashbrown::HashMap;
use log::{debug, warn};

use crate::model::{BridgeConnection, Dataset, LatLng, ParcelIndex, PathfindingMode, PointKind};

/// Authoritative records closer than this to a parcel point describe that point
const MATCH_RADIUS_M: f64 = 1.0;

#[derive(Debug, Clone)]
pub(crate) struct Attachment {
    pub node_id: String,
    /// `Bridge` or `Canal`
    pub kind: PointKind,
    pub parcel_id: String,
    pub position: LatLng,
    pub constructed: bool,
    /// Backed by a record of the bridges or docks list
    pub authoritative: bool,
    pub connection: Option<BridgeConnection>,
    pub links: Vec<String>,
}

impl Attachment {
    /// Whether the attachment becomes a graph node in `mode`
    pub fn selected(&self, mode: PathfindingMode, authoritative_list_present: bool) -> bool {
        match mode {
            PathfindingMode::All => true,
            PathfindingMode::Real if authoritative_list_present => {
                self.authoritative && self.constructed
            }
            PathfindingMode::Real => self.constructed,
        }
    }
}

/// All bridge and canal attachments of the dataset.
///
/// Constructed state: the authoritative record wins when there is one, then
/// the explicit per-point flag, otherwise the point is only potential.
pub(crate) fn resolve_attachments(dataset: &Dataset) -> Vec<Attachment> {
    let mut attachments = Vec::new();

    for parcel in &dataset.parcels {
        for (idx, point) in parcel.bridge_points.iter().enumerate() {
            let key = point.id.clone().unwrap_or_else(|| format!("{}:{idx}", parcel.id));
            attachments.push(Attachment {
                node_id: format!("bridge:{key}"),
                kind: PointKind::Bridge,
                parcel_id: parcel.id.clone(),
                position: point.edge,
                constructed: point.is_constructed.unwrap_or(false),
                authoritative: false,
                connection: point.connection.clone(),
                links: Vec::new(),
            });
        }
        for (idx, point) in parcel.canal_points.iter().enumerate() {
            let key = point.id.clone().unwrap_or_else(|| format!("{}:{idx}", parcel.id));
            attachments.push(Attachment {
                node_id: format!("canal:{key}"),
                kind: PointKind::Canal,
                parcel_id: parcel.id.clone(),
                position: point.edge,
                constructed: point.is_constructed.unwrap_or(false),
                authoritative: false,
                connection: None,
                links: Vec::new(),
            });
        }
    }

    let index = ParcelIndex::new(&dataset.parcels);
    let mut by_key: HashMap<String, usize> = attachments
        .iter()
        .enumerate()
        .map(|(idx, a)| (a.node_id.clone(), idx))
        .collect();

    let records = dataset
        .bridges
        .iter()
        .map(|b| {
            (
                PointKind::Bridge,
                &b.building_id,
                b.position,
                b.is_constructed,
                b.land_id.as_deref().or(b.links.first().map(String::as_str)),
                b.links.as_slice(),
            )
        })
        .chain(dataset.docks.iter().map(|d| {
            (
                PointKind::Canal,
                &d.building_id,
                d.position,
                d.is_constructed,
                d.land_id.as_deref(),
                &[][..],
            )
        }));

    for (kind, building_id, position, constructed, land_id, links) in records {
        let prefix = if kind == PointKind::Bridge { "bridge" } else { "canal" };
        let node_id = format!("{prefix}:{building_id}");

        let matched = by_key.get(&node_id).copied().or_else(|| {
            attachments
                .iter()
                .enumerate()
                .filter(|(_, a)| a.kind == kind && !a.authoritative)
                .filter(|(_, a)| land_id.is_none_or(|land| land == a.parcel_id))
                .map(|(idx, a)| (idx, a.position.distance_to(position)))
                .filter(|&(_, d)| d <= MATCH_RADIUS_M)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(idx, _)| idx)
        });

        if let Some(idx) = matched {
            let attachment = &mut attachments[idx];
            attachment.authoritative = true;
            attachment.constructed = constructed;
            attachment.links = links.to_vec();
            continue;
        }

        let parcel_id = land_id.map(str::to_owned).or_else(|| {
            index
                .containing(&dataset.parcels, position)
                .map(|idx| dataset.parcels[idx].id.clone())
        });
        let Some(parcel_id) = parcel_id else {
            warn!("{prefix} {building_id} is not attached to any parcel, skipping");
            continue;
        };

        debug!("{prefix} {building_id} has no matching parcel point, adding it on {parcel_id}");
        by_key.insert(node_id.clone(), attachments.len());
        attachments.push(Attachment {
            node_id,
            kind,
            parcel_id,
            position,
            constructed,
            authoritative: true,
            connection: None,
            links: links.to_vec(),
        });
    }

    attachments
}

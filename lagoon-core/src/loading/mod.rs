//! This module is responsible for decoding provider data and building the
//! land graph and water network from it.

mod attachments;
mod land_graph;
mod parse;
mod water_network;

pub use land_graph::build_land_graph;
pub use parse::{
    parse_bridges, parse_dataset, parse_docks, parse_land_groups, parse_parcels, parse_records,
    parse_water_graph,
};
pub use water_network::{
    SYNTHETIC_LINK_M, load_water_network, synthesize_water_network, water_network_for,
};

pub(crate) use attachments::resolve_attachments;

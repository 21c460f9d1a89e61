//! Asynchronous routing engine for a city of land parcels and canals.
//!
//! Wraps the algorithms of [`lagoon_core`] with data loading, snapshot
//! management, remote fallback and route notifications.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod init;
pub mod provider;
pub mod remote;
pub mod retry;

pub use config::{EngineConfig, ProviderConfig, RemoteConfig};
pub use engine::{EngineState, RoutingEngine};
pub use error::EngineError;
pub use events::{RouteEvent, Severity};
pub use init::Initializer;
pub use provider::{DataProvider, HttpDataProvider, StaticDataProvider};
pub use remote::{HttpRemoteRouter, RemoteRouter, RouteRequest};
pub use retry::RetryPolicy;

pub use lagoon_core;
pub use lagoon_core::routing::RouteStage;
pub use lagoon_core::{Dataset, Parcel, PathResult, PathfindingMode, Point};

//! Route orchestration over copy-on-write routing snapshots

use std::sync::Arc;

use lagoon_core::routing::RouteStage;
use lagoon_core::{Dataset, Parcel, PathResult, PathfindingMode, Point, RoutingNetwork};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};

use crate::config::EngineConfig;
use crate::events::{RouteEvent, Severity};
use crate::init::Initializer;
use crate::provider::{DataProvider, HttpDataProvider};
use crate::remote::{HttpRemoteRouter, RemoteRouter};
use crate::EngineError;

/// Snapshot of the last route calculation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub start_point: Option<Point>,
    pub end_point: Option<Point>,
    pub path: Option<PathResult>,
    pub calculating_path: bool,
    pub water_only_mode: bool,
    pub stage: RouteStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Route,
    WaterOnly,
}

/// Routing engine shared by reference between callers.
///
/// Routes are computed on an immutable [`RoutingNetwork`] snapshot. Mode
/// switches rebuild the snapshot one at a time and publish it by swapping an
/// `Arc`, so in-flight routes keep the snapshot they started with.
pub struct RoutingEngine {
    init: Initializer,
    remote: Option<Arc<dyn RemoteRouter>>,
    /// Active mode, also serializes snapshot rebuilds
    mode: Mutex<PathfindingMode>,
    snapshot: RwLock<Option<Arc<RoutingNetwork>>>,
    state: Mutex<EngineState>,
    events: broadcast::Sender<RouteEvent>,
}

impl RoutingEngine {
    pub fn new(config: &EngineConfig, provider: Arc<dyn DataProvider>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            init: Initializer::new(provider, config.retry),
            remote: None,
            mode: Mutex::new(config.mode),
            snapshot: RwLock::new(None),
            state: Mutex::new(EngineState::default()),
            events,
        }
    }

    /// Engine with HTTP data provider and, when configured, HTTP remote fallback
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration or if an HTTP client
    /// cannot be created
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let provider = Arc::new(HttpDataProvider::new(config.provider.clone())?);
        let engine = Self::new(config, provider);
        Ok(match &config.remote {
            Some(remote) => engine.with_remote(Arc::new(HttpRemoteRouter::new(remote.clone())?)),
            None => engine,
        })
    }

    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteRouter>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouteEvent> {
        self.events.subscribe()
    }

    pub async fn pathfinding_mode(&self) -> PathfindingMode {
        *self.mode.lock().await
    }

    pub async fn get_state(&self) -> EngineState {
        self.state.lock().await.clone()
    }

    /// Switches the active mode and rebuilds the snapshot if data is loaded
    pub async fn set_pathfinding_mode(&self, mode: PathfindingMode) {
        let mut active = self.mode.lock().await;
        if *active == mode {
            debug!("Pathfinding mode already {mode}");
            return;
        }
        info!("Switching pathfinding mode {} -> {mode}", *active);
        *active = mode;

        if let Some(dataset) = self.init.loaded().await {
            match build(dataset, mode).await {
                Ok(network) => *self.snapshot.write().await = Some(network),
                Err(err) => {
                    warn!("Rebuild for {mode} failed, clearing snapshot: {err}");
                    *self.snapshot.write().await = None;
                }
            }
        }
        drop(active);

        self.emit(RouteEvent::ModeChanged(mode));
    }

    /// Loads the data (retrying a memoized failure) and warms the snapshot
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DataUnavailable`] if the data cannot be loaded
    pub async fn preload_polygons(&self) -> Result<(), EngineError> {
        self.init.reset().await;
        self.network_for(None).await.map(|_| ())
    }

    /// Uses `parcels` as the dataset without contacting the provider
    pub async fn initialize_with_polygon_data(&self, parcels: Vec<Parcel>) {
        self.init.inject(parcels).await;
        *self.snapshot.write().await = None;
    }

    /// Same as [`RoutingEngine::initialize_with_polygon_data`] with bridges,
    /// docks, land groups and water graph
    pub async fn initialize_with_dataset(&self, dataset: Dataset) {
        self.init.inject_dataset(dataset).await;
        *self.snapshot.write().await = None;
    }

    /// Computes a route and reports it through [`RouteEvent`]s
    pub async fn calculate_route(&self, start: Point, end: Point, mode: Option<PathfindingMode>) {
        {
            let mut state = self.state.lock().await;
            *state = EngineState {
                start_point: Some(start.clone()),
                end_point: Some(end.clone()),
                path: None,
                calculating_path: true,
                water_only_mode: false,
                stage: RouteStage::Resolving,
            };
        }
        self.emit(RouteEvent::Calculating(true));

        let (stage, result) = self.resolve(&start, &end, mode, Request::Route, true).await;
        let terminal = if result.success {
            RouteStage::Resolved
        } else {
            RouteStage::Failed
        };
        debug!("Route resolved by {stage}: {terminal}");

        {
            let mut state = self.state.lock().await;
            state.calculating_path = false;
            state.water_only_mode = result.is_water_only();
            state.stage = terminal;
            state.path = Some(result.clone());
        }

        if result.is_fallback() {
            self.emit(RouteEvent::Error {
                message: "No route found, showing a direct line".to_string(),
                severity: Severity::Warning,
            });
        }
        if result.success {
            let water_only = result.is_water_only();
            self.emit(RouteEvent::Calculated {
                path: result,
                water_only,
            });
        } else {
            self.emit(RouteEvent::Error {
                message: result
                    .error
                    .unwrap_or_else(|| "Route calculation failed".to_string()),
                severity: Severity::Error,
            });
        }
        self.emit(RouteEvent::Calculating(false));
    }

    /// Route between two points. Never errors: failures are reported in the result.
    pub async fn find_path(&self, start: &Point, end: &Point, mode: Option<PathfindingMode>) -> PathResult {
        self.resolve(start, end, mode, Request::Route, false).await.1
    }

    pub async fn find_water_only_path(
        &self,
        start: &Point,
        end: &Point,
        mode: Option<PathfindingMode>,
    ) -> PathResult {
        self.resolve(start, end, mode, Request::WaterOnly, false).await.1
    }

    async fn resolve(
        &self,
        start: &Point,
        end: &Point,
        mode: Option<PathfindingMode>,
        request: Request,
        track: bool,
    ) -> (RouteStage, PathResult) {
        let local = match self.network_for(mode).await {
            Ok(network) => {
                let (stage, result) = match request {
                    Request::Route => network.route(start, end),
                    Request::WaterOnly => (RouteStage::LocalWater, network.find_water_only_path(start, end)),
                };
                if track {
                    self.state.lock().await.stage = stage;
                }
                if result.success {
                    return (stage, result);
                }
                debug!("Local routing failed at {stage}: {:?}", result.error);
                result
            }
            Err(err) => {
                warn!("Routing network unavailable: {err}");
                PathResult::failure(err.to_string())
            }
        };

        if self.remote.is_none() {
            return (RouteStage::Failed, local);
        }
        if track {
            self.state.lock().await.stage = RouteStage::RemoteFallback;
        }
        match self.remote_fallback(start, end, request).await {
            Some(result) => (RouteStage::RemoteFallback, result),
            None => (RouteStage::Failed, local),
        }
    }

    /// Remote route endpoint, then the remote water-only endpoint
    async fn remote_fallback(&self, start: &Point, end: &Point, request: Request) -> Option<PathResult> {
        let remote = self.remote.as_ref()?;

        if request == Request::Route {
            match remote.route(start, end).await {
                Ok(result) if result.success => return Some(result),
                Ok(result) => debug!("Remote route failed: {:?}", result.error),
                Err(err) => warn!("Remote route request failed: {err}"),
            }
        }
        match remote.water_only_route(start, end).await {
            Ok(result) if result.success => Some(result),
            Ok(result) => {
                debug!("Remote water-only route failed: {:?}", result.error);
                None
            }
            Err(err) => {
                warn!("Remote water-only request failed: {err}");
                None
            }
        }
    }

    /// Snapshot for `requested` (the active mode when `None`). A mode other
    /// than the active one gets a transient snapshot that is not published.
    async fn network_for(&self, requested: Option<PathfindingMode>) -> Result<Arc<RoutingNetwork>, EngineError> {
        let dataset = self.init.dataset().await?;
        if let Some(network) = self.current(&dataset, requested).await {
            return Ok(network);
        }

        let active = self.mode.lock().await;
        let mode = requested.unwrap_or(*active);
        if mode != *active {
            drop(active);
            debug!("Building transient {mode} network");
            return build(dataset, mode).await;
        }

        // another caller may have rebuilt while we waited
        if let Some(network) = self.current(&dataset, Some(mode)).await {
            return Ok(network);
        }
        let network = build(dataset, mode).await?;
        *self.snapshot.write().await = Some(Arc::clone(&network));
        drop(active);
        Ok(network)
    }

    async fn current(
        &self,
        dataset: &Arc<Dataset>,
        requested: Option<PathfindingMode>,
    ) -> Option<Arc<RoutingNetwork>> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .filter(|network| {
                Arc::ptr_eq(network.dataset(), dataset)
                    && requested.is_none_or(|mode| network.mode() == mode)
            })
            .cloned()
    }

    fn emit(&self, event: RouteEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

async fn build(dataset: Arc<Dataset>, mode: PathfindingMode) -> Result<Arc<RoutingNetwork>, EngineError> {
    tokio::task::spawn_blocking(move || Arc::new(RoutingNetwork::build(dataset, mode)))
        .await
        .map_err(|err| EngineError::Build(err.to_string()))
}

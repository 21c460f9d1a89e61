//! Single-flight loading of the routing dataset

use std::sync::Arc;

use lagoon_core::{Dataset, Parcel};
use log::{info, warn};
use tokio::sync::{Mutex, watch};

use crate::EngineError;
use crate::provider::DataProvider;
use crate::retry::RetryPolicy;

type Outcome = Option<Result<Arc<Dataset>, String>>;

enum LoadState {
    Idle,
    Loading(watch::Receiver<Outcome>),
    Ready(Arc<Dataset>),
    /// Memoized until [`Initializer::reset`]
    Failed(String),
}

struct Shared {
    provider: Arc<dyn DataProvider>,
    retry: RetryPolicy,
    state: Mutex<LoadState>,
}

/// Loads the dataset at most once; concurrent callers share the pending load
#[derive(Clone)]
pub struct Initializer {
    shared: Arc<Shared>,
}

impl Initializer {
    pub fn new(provider: Arc<dyn DataProvider>, retry: RetryPolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                provider,
                retry,
                state: Mutex::new(LoadState::Idle),
            }),
        }
    }

    /// The loaded dataset, loading it first if needed
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DataUnavailable`] when parcels could not be loaded
    pub async fn dataset(&self) -> Result<Arc<Dataset>, EngineError> {
        let mut pending = {
            let mut state = self.shared.state.lock().await;
            let in_flight = match &*state {
                LoadState::Ready(dataset) => return Ok(Arc::clone(dataset)),
                LoadState::Failed(reason) => {
                    return Err(EngineError::DataUnavailable(reason.clone()));
                }
                LoadState::Loading(pending) if !abandoned(pending) => Some(pending.clone()),
                LoadState::Idle | LoadState::Loading(_) => None,
            };
            match in_flight {
                Some(pending) => pending,
                None => {
                    let (tx, rx) = watch::channel(None);
                    *state = LoadState::Loading(rx.clone());
                    tokio::spawn(load(Arc::clone(&self.shared), tx));
                    rx
                }
            }
        };

        let outcome = pending
            .wait_for(Option::is_some)
            .await
            .map(|outcome| outcome.clone())
            .map_err(|_| EngineError::DataUnavailable("initialization was interrupted".into()))?;

        match outcome {
            Some(Ok(dataset)) => Ok(dataset),
            Some(Err(reason)) => Err(EngineError::DataUnavailable(reason)),
            None => Err(EngineError::DataUnavailable("initialization was interrupted".into())),
        }
    }

    /// The dataset if it is already loaded, without triggering a load
    pub async fn loaded(&self) -> Option<Arc<Dataset>> {
        match &*self.shared.state.lock().await {
            LoadState::Ready(dataset) => Some(Arc::clone(dataset)),
            _ => None,
        }
    }

    /// Forgets a memoized failure so the next call loads again
    pub async fn reset(&self) {
        let mut state = self.shared.state.lock().await;
        if matches!(*state, LoadState::Failed(_)) {
            *state = LoadState::Idle;
        }
    }

    /// Uses already available parcels instead of the provider
    pub async fn inject(&self, parcels: Vec<Parcel>) -> Arc<Dataset> {
        self.inject_dataset(Dataset::from_parcels(parcels)).await
    }

    pub async fn inject_dataset(&self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        info!("Injected dataset with {} parcels", dataset.parcels.len());
        *self.shared.state.lock().await = LoadState::Ready(Arc::clone(&dataset));
        dataset
    }
}

/// The loading task ended without publishing an outcome
fn abandoned(pending: &watch::Receiver<Outcome>) -> bool {
    pending.borrow().is_none() && pending.has_changed().is_err()
}

async fn load(shared: Arc<Shared>, tx: watch::Sender<Outcome>) {
    let outcome = fetch_dataset(shared.provider.as_ref(), &shared.retry).await;

    {
        let mut state = shared.state.lock().await;
        // an injected dataset takes precedence
        if matches!(*state, LoadState::Loading(_)) {
            *state = match &outcome {
                Ok(dataset) => LoadState::Ready(Arc::clone(dataset)),
                Err(err) => LoadState::Failed(err.to_string()),
            };
        }
    }

    let _ = tx.send(Some(outcome.map_err(|err| err.to_string())));
}

/// Parcels are mandatory, everything else degrades to empty data
async fn fetch_dataset(
    provider: &dyn DataProvider,
    retry: &RetryPolicy,
) -> Result<Arc<Dataset>, EngineError> {
    let (parcels, bridges, docks, land_groups, water_graph) = tokio::join!(
        retry.run("parcels", || provider.parcels()),
        retry.run("bridges", || provider.bridges()),
        retry.run("docks", || provider.docks()),
        retry.run("land groups", || provider.land_groups()),
        retry.run("water graph", || provider.water_graph()),
    );

    let dataset = Dataset {
        parcels: parcels?,
        bridges: optional("bridges", bridges),
        docks: optional("docks", docks),
        land_groups: optional("land groups", land_groups),
        water_graph: optional("water graph", water_graph),
    };
    if dataset.is_empty() {
        return Err(EngineError::DataUnavailable("provider returned no parcels".into()));
    }
    info!(
        "Loaded {} parcels, {} bridges, {} docks, {} land groups, {} water points",
        dataset.parcels.len(),
        dataset.bridges.len(),
        dataset.docks.len(),
        dataset.land_groups.len(),
        dataset
            .water_graph
            .as_ref()
            .map_or(0, |graph| graph.water_points.len())
    );
    Ok(Arc::new(dataset))
}

fn optional<T: Default>(what: &str, result: Result<T, EngineError>) -> T {
    result.unwrap_or_else(|err| {
        warn!("Continuing without {what}: {err}");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use lagoon_core::model::{Bridge, Dock, LandGroup, LatLng, RawWaterGraph};

    use super::*;

    /// Fails the first `failures` parcel requests, counts every request
    struct Flaky {
        failures: u32,
        parcel_calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                failures,
                parcel_calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl DataProvider for Flaky {
        async fn parcels(&self) -> Result<Vec<Parcel>, EngineError> {
            let call = self.parcel_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            if call < self.failures {
                return Err(EngineError::DataUnavailable("flaky".into()));
            }
            Ok(vec![Parcel::new(
                "p",
                vec![
                    LatLng::new(45.0, 12.0),
                    LatLng::new(45.0, 12.001),
                    LatLng::new(45.001, 12.001),
                ],
            )])
        }

        async fn bridges(&self) -> Result<Vec<Bridge>, EngineError> {
            Err(EngineError::DataUnavailable("no bridges today".into()))
        }

        async fn docks(&self) -> Result<Vec<Dock>, EngineError> {
            Ok(Vec::new())
        }

        async fn land_groups(&self) -> Result<Vec<LandGroup>, EngineError> {
            Ok(Vec::new())
        }

        async fn water_graph(&self) -> Result<Option<RawWaterGraph>, EngineError> {
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_load() {
        let provider = Flaky::new(2);
        let init = Initializer::new(provider.clone(), RetryPolicy::default());

        let (a, b, c) = tokio::join!(init.dataset(), init.dataset(), init.dataset());

        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
        assert_eq!(provider.parcel_calls.load(Ordering::SeqCst), 3);
        assert!(a.bridges.is_empty());

        init.dataset().await.unwrap();
        assert_eq!(provider.parcel_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_memoized_until_reset() {
        let provider = Flaky::new(5);
        let init = Initializer::new(provider.clone(), RetryPolicy::default());

        assert!(matches!(init.dataset().await, Err(EngineError::DataUnavailable(_))));
        assert!(init.dataset().await.is_err());
        assert_eq!(provider.parcel_calls.load(Ordering::SeqCst), 5);

        init.reset().await;
        assert!(init.dataset().await.is_ok());
        assert_eq!(provider.parcel_calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn injected_parcels_skip_the_provider() {
        let provider = Flaky::new(0);
        let init = Initializer::new(provider.clone(), RetryPolicy::none());

        init.inject(Vec::new()).await;

        assert!(init.loaded().await.is_some());
        assert!(init.dataset().await.unwrap().parcels.is_empty());
        assert_eq!(provider.parcel_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_without_parcels_is_unavailable() {
        let init = Initializer::new(
            Arc::new(crate::StaticDataProvider::default()),
            RetryPolicy::none(),
        );

        let err = init.dataset().await.unwrap_err();

        assert!(matches!(err, EngineError::DataUnavailable(reason) if reason.contains("no parcels")));
        assert!(init.loaded().await.is_none());
    }
}

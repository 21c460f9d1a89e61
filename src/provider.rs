//! Sources of parcel, infrastructure and water data

use std::time::Duration;

use async_trait::async_trait;
use lagoon_core::loading::{
    parse_bridges, parse_docks, parse_land_groups, parse_parcels, parse_water_graph,
};
use lagoon_core::model::{Bridge, Dock, LandGroup, RawWaterGraph};
use lagoon_core::{Dataset, Parcel};
use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::EngineError;
use crate::config::ProviderConfig;

/// Read-only provider of the routing data. Every call is independent and may
/// be retried.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn parcels(&self) -> Result<Vec<Parcel>, EngineError>;

    async fn bridges(&self) -> Result<Vec<Bridge>, EngineError>;

    async fn docks(&self) -> Result<Vec<Dock>, EngineError>;

    async fn land_groups(&self) -> Result<Vec<LandGroup>, EngineError>;

    /// `None` when no precomputed water graph exists
    async fn water_graph(&self) -> Result<Option<RawWaterGraph>, EngineError>;
}

/// Fetches JSON payloads over HTTP
#[derive(Debug, Clone)]
pub struct HttpDataProvider {
    client: Client,
    config: ProviderConfig,
}

impl HttpDataProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: ProviderConfig) -> Result<Self, EngineError> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    async fn fetch(&self, path: &str, timeout: Duration) -> Result<Value, EngineError> {
        let url = self.config.url(path);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| classify(err, &url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                url,
                status: status.as_u16(),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| classify(err, &url, timeout))
    }
}

fn classify(err: reqwest::Error, url: &str, timeout: Duration) -> EngineError {
    if err.is_timeout() {
        EngineError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        EngineError::Http(err)
    }
}

#[async_trait]
impl DataProvider for HttpDataProvider {
    async fn parcels(&self) -> Result<Vec<Parcel>, EngineError> {
        let body = self
            .fetch(&self.config.parcels_path, self.config.parcels_timeout())
            .await?;
        Ok(parse_parcels(&body))
    }

    async fn bridges(&self) -> Result<Vec<Bridge>, EngineError> {
        let body = self
            .fetch(&self.config.bridges_path, self.config.timeout())
            .await?;
        Ok(parse_bridges(&body))
    }

    async fn docks(&self) -> Result<Vec<Dock>, EngineError> {
        let body = self.fetch(&self.config.docks_path, self.config.timeout()).await?;
        Ok(parse_docks(&body))
    }

    async fn land_groups(&self) -> Result<Vec<LandGroup>, EngineError> {
        let body = self
            .fetch(&self.config.land_groups_path, self.config.timeout())
            .await?;
        Ok(parse_land_groups(&body))
    }

    async fn water_graph(&self) -> Result<Option<RawWaterGraph>, EngineError> {
        let body = self
            .fetch(&self.config.water_graph_path, self.config.water_graph_timeout())
            .await?;
        if body.is_null() {
            return Ok(None);
        }
        Ok(Some(parse_water_graph(&body)?))
    }
}

/// Serves an in-memory dataset
#[derive(Debug, Clone, Default)]
pub struct StaticDataProvider {
    dataset: Dataset,
}

impl StaticDataProvider {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn from_parcels(parcels: Vec<Parcel>) -> Self {
        Self::new(Dataset::from_parcels(parcels))
    }
}

#[async_trait]
impl DataProvider for StaticDataProvider {
    async fn parcels(&self) -> Result<Vec<Parcel>, EngineError> {
        Ok(self.dataset.parcels.clone())
    }

    async fn bridges(&self) -> Result<Vec<Bridge>, EngineError> {
        Ok(self.dataset.bridges.clone())
    }

    async fn docks(&self) -> Result<Vec<Dock>, EngineError> {
        Ok(self.dataset.docks.clone())
    }

    async fn land_groups(&self) -> Result<Vec<LandGroup>, EngineError> {
        Ok(self.dataset.land_groups.clone())
    }

    async fn water_graph(&self) -> Result<Option<RawWaterGraph>, EngineError> {
        Ok(self.dataset.water_graph.clone())
    }
}

#[cfg(test)]
mod tests {
    use lagoon_core::model::LatLng;

    use super::*;

    #[tokio::test]
    async fn static_provider_serves_its_dataset() {
        let parcel = Parcel::new(
            "p",
            vec![
                LatLng::new(45.0, 12.0),
                LatLng::new(45.0, 12.001),
                LatLng::new(45.001, 12.001),
            ],
        );
        let provider = StaticDataProvider::from_parcels(vec![parcel]);

        assert_eq!(provider.parcels().await.unwrap().len(), 1);
        assert!(provider.bridges().await.unwrap().is_empty());
        assert!(provider.water_graph().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreachable_provider_reports_an_error() {
        let config = ProviderConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..ProviderConfig::default()
        };
        let provider = HttpDataProvider::new(config).unwrap();

        let err = provider.parcels().await.unwrap_err();
        assert!(matches!(err, EngineError::Http(_) | EngineError::Timeout { .. }));
    }
}

//! Remote routing service used as the last fallback

use async_trait::async_trait;
use lagoon_core::{PathResult, PathfindingMode, Point};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::EngineError;
use crate::config::RemoteConfig;

/// Body of a route request, shared with the HTTP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub start_point: Point,
    pub end_point: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<PathfindingMode>,
}

impl RouteRequest {
    pub fn new(start_point: Point, end_point: Point) -> Self {
        Self {
            start_point,
            end_point,
            mode: None,
        }
    }
}

#[async_trait]
pub trait RemoteRouter: Send + Sync {
    async fn route(&self, start: &Point, end: &Point) -> Result<PathResult, EngineError>;

    async fn water_only_route(&self, start: &Point, end: &Point) -> Result<PathResult, EngineError>;
}

#[derive(Debug, Clone)]
pub struct HttpRemoteRouter {
    client: Client,
    config: RemoteConfig,
}

impl HttpRemoteRouter {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: RemoteConfig) -> Result<Self, EngineError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    async fn post(&self, url: String, start: &Point, end: &Point) -> Result<PathResult, EngineError> {
        debug!("POST {url}");
        let request = RouteRequest::new(start.clone(), end.clone());
        let response = self.client.post(&url).json(&request).send().await.map_err(|err| {
            if err.is_timeout() {
                EngineError::Timeout {
                    url: url.clone(),
                    timeout: self.config.timeout(),
                }
            } else {
                EngineError::Http(err)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.json::<PathResult>().await?)
    }
}

#[async_trait]
impl RemoteRouter for HttpRemoteRouter {
    async fn route(&self, start: &Point, end: &Point) -> Result<PathResult, EngineError> {
        self.post(self.config.route_url(), start, end).await
    }

    async fn water_only_route(&self, start: &Point, end: &Point) -> Result<PathResult, EngineError> {
        self.post(self.config.water_only_url(), start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case() {
        let request = RouteRequest::new(Point::new(45.0, 12.0), Point::new(45.1, 12.1));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["startPoint"]["lat"], 45.0);
        assert_eq!(json["endPoint"]["lng"], 12.1);
        assert!(json.get("mode").is_none());
    }
}

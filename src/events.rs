use lagoon_core::{PathResult, PathfindingMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Notifications published to route subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum RouteEvent {
    Calculating(bool),
    #[serde(rename_all = "camelCase")]
    Calculated {
        path: PathResult,
        water_only: bool,
    },
    Error {
        message: String,
        severity: Severity,
    },
    ModeChanged(PathfindingMode),
}

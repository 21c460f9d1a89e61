use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No nearby points found for snapping")]
    NoPointsFound,
    #[error("Point ({lat}, {lng}) is not within any parcel")]
    PointOutsideParcels { lat: f64, lng: f64 },
    #[error("No path found between {from} and {to}")]
    NoPathFound { from: String, to: String },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}

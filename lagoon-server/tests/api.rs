use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use lagoon::lagoon_core::model::{CanalPoint, LandGroup, LatLng};
use lagoon::{Dataset, EngineConfig, Parcel, RetryPolicy, RoutingEngine, StaticDataProvider};
use lagoon_server::{ServerConfig, router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn rectangle(id: &str, south: f64, west: f64, north: f64, east: f64) -> Parcel {
    let mut parcel = Parcel::new(
        id,
        vec![
            LatLng::new(south, west),
            LatLng::new(south, east),
            LatLng::new(north, east),
            LatLng::new(north, west),
        ],
    );
    parcel.center = Some(LatLng::new((south + north) / 2.0, (west + east) / 2.0));
    parcel
}

fn dock(id: &str, lat: f64, lng: f64) -> CanalPoint {
    CanalPoint {
        id: Some(id.into()),
        edge: LatLng::new(lat, lng),
        is_constructed: Some(true),
    }
}

fn islands() -> Dataset {
    let mut north = rectangle("north", 45.002, 12.0, 45.004, 12.002);
    let mut south = rectangle("south", 45.0, 12.0, 45.001, 12.002);
    north.canal_points.push(dock("north-dock", 45.002, 12.001));
    south.canal_points.push(dock("south-dock", 45.001, 12.001));
    let mut dataset = Dataset::from_parcels(vec![north, south]);
    dataset.land_groups = vec![
        LandGroup {
            group_id: "n".into(),
            lands: vec!["north".into()],
        },
        LandGroup {
            group_id: "s".into(),
            lands: vec!["south".into()],
        },
    ];
    dataset
}

fn app() -> Router {
    let config = ServerConfig {
        engine: EngineConfig {
            retry: RetryPolicy::none(),
            ..EngineConfig::default()
        },
        ..ServerConfig::default()
    };
    let engine = RoutingEngine::new(&config.engine, Arc::new(StaticDataProvider::new(islands())));
    router(Arc::new(engine), &config)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn crossing() -> Value {
    json!({
        "startPoint": { "lat": 45.003, "lng": 12.0005 },
        "endPoint": { "lat": 45.0005, "lng": 12.0015 }
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn route_between_islands_goes_over_water() {
    let (status, body) = send(app(), Method::POST, "/api/v1/route", Some(crossing())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["waterOnly"], json!(true));
    let path = body["path"].as_array().unwrap();
    assert!(path.len() >= 2);
    assert!(path.iter().any(|p| p["transportMode"] == json!("gondola")));
}

#[tokio::test]
async fn water_only_route_returns_round_trip() {
    let (status, body) = send(app(), Method::POST, "/api/v1/route/water-only", Some(crossing())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["roundTrip"].is_array());
}

#[tokio::test]
async fn malformed_request_is_rejected() {
    let (status, _) = send(
        app(),
        Method::POST,
        "/api/v1/route",
        Some(json!({ "startPoint": { "lat": 45.0 } })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn mode_can_be_read_and_switched() {
    let app = app();

    let (status, body) = send(app.clone(), Method::GET, "/api/v1/mode", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "mode": "real" }));

    let (status, body) = send(
        app.clone(),
        Method::PUT,
        "/api/v1/mode",
        Some(json!({ "mode": "exhaustive" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "mode": "all" }));

    let (_, body) = send(app, Method::GET, "/api/v1/mode", None).await;
    assert_eq!(body, json!({ "mode": "all" }));
}

#[tokio::test]
async fn calculate_is_accepted_and_state_settles() {
    let app = app();

    let (status, _) = send(app.clone(), Method::POST, "/api/v1/calculate", Some(crossing())).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let mut state = Value::Null;
    for _ in 0..100 {
        let (_, body) = send(app.clone(), Method::GET, "/api/v1/state", None).await;
        state = body;
        if state["path"].is_object() && state["calculatingPath"] == json!(false) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    assert_eq!(state["path"]["success"], json!(true));
    assert_eq!(state["waterOnlyMode"], json!(true));
    assert_eq!(state["stage"], json!("resolved"));
}

//! HTTP API for browser dispatch and ambulance clients.

mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    // The live slot must never be served from a cache.
    let track = Router::new()
        .route(
            "/api/track",
            get(handlers::current_track)
                .post(handlers::publish_track)
                .delete(handlers::clear_track),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/api/hospitals", get(handlers::hospitals))
        .route("/api/nearest", get(handlers::nearest))
        .merge(track)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: AppState) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("ambutrack server listening on http://{}", addr);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::{builtin_facilities, FacilityResolver};
    use crate::tracking::TrackingStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app() -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = TrackingStore::load_from(dir.path().join("slot.json"));
        let resolver = FacilityResolver::new(builtin_facilities()).unwrap();
        (build_router(AppState::new(resolver, store, chrono_tz::UTC)), dir)
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_track(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/track")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_hospitals() {
        let (app, _dir) = app();
        let resp = app.oneshot(get_req("/api/hospitals")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["name"], "Apollo Hospital");
    }

    #[tokio::test]
    async fn test_nearest() {
        let (app, _dir) = app();
        let resp = app.oneshot(get_req("/api/nearest?lat=17.385&lng=78.4867")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["facility"]["name"], "City Hospital");
        assert_eq!(body["distance_km"], 0.0);
        assert_eq!(body["eta_minutes"], 0.0);
    }

    #[tokio::test]
    async fn test_nearest_bad_coordinates() {
        let (app, _dir) = app();
        let resp = app.clone().oneshot(get_req("/api/nearest?lat=91&lng=0")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["code"], 400);

        let resp = app.oneshot(get_req("/api/nearest?lat=17.0")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_nearest_unparsable_query_is_json() {
        let (app, _dir) = app();
        let resp = app.oneshot(get_req("/api/nearest?lat=abc&lng=78.4")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["code"], 400);
        assert!(body["error"].as_str().unwrap().contains("query string"));
    }

    #[tokio::test]
    async fn test_track_lifecycle() {
        let (app, _dir) = app();

        let resp = app.clone().oneshot(get_req("/api/track")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");

        let resp = app
            .clone()
            .oneshot(post_track(r#"{"id": "AMB-9", "lat": 17.40, "lng": 78.40}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["hospital"]["name"], "Apollo Hospital");
        assert_eq!(body["seq"], 1);

        let resp = app.clone().oneshot(get_req("/api/track")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["id"], "AMB-9");

        let resp = app
            .clone()
            .oneshot(Request::builder().method("DELETE").uri("/api/track").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app.oneshot(get_req("/api/track")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_track_rejects_bad_input() {
        let (app, _dir) = app();
        let resp = app
            .clone()
            .oneshot(post_track(r#"{"id": " ", "lat": 17.40, "lng": 78.40}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(post_track(r#"{"id": "AMB-1", "lat": 17.40, "lng": 200.0}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

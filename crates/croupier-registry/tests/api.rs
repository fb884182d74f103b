#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use croupier_core::config::RegistryConfig;
use croupier_crypto::CasinoKeyPair;
use croupier_registry::api::{AppState, build_router};
use croupier_registry::storage::{MemoryStore, RegistryDatabase, SharedStore};

fn app_with(store: SharedStore) -> axum::Router {
    build_router(Arc::new(AppState::new(store, &RegistryConfig::default())))
}

fn app() -> axum::Router {
    app_with(Arc::new(MemoryStore::new()))
}

/// Send a request and return (status, parsed envelope).
async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

fn registration(key: &CasinoKeyPair, name: &str, games: &[&str]) -> Value {
    key.sign_request(json!({
        "name": name,
        "url": format!("https://{}.example", name.to_lowercase().replace(' ', "-")),
        "publicKey": key.public_key_base58(),
        "metadata": {
            "description": format!("{name} casino"),
            "games": games,
            "socialLinks": { "twitter": "https://x.com/casino" }
        }
    }))
    .unwrap()
}

async fn register(
    app: &axum::Router,
    key: &CasinoKeyPair,
    name: &str,
    games: &[&str],
) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/casinos",
        Some(registration(key, name, games)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

fn heartbeat_body(key: &CasinoKeyPair, status: &str) -> Value {
    key.sign_request(json!({
        "status": status,
        "timestamp": 1_700_000_000,
        "metrics": { "activePlayers": 7, "betVolume24h": 125.5 }
    }))
    .unwrap()
}

#[tokio::test]
async fn health_endpoints_answer() {
    let app = app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = get(&app, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ready");
}

#[tokio::test]
async fn end_to_end_register_heartbeat_update() {
    let app = app();
    let key = CasinoKeyPair::generate();
    let id = register(&app, &key, "Lucky Star", &["slots", "dice"]).await;

    let (_, registered) = get(&app, &format!("/api/v1/casinos/{id}")).await;
    assert_eq!(registered["data"]["status"], "online");
    assert!(registered["data"]["lastSeenAt"].is_null());
    assert_eq!(registered["data"]["protocolVersion"], "1.0");

    let (status, ack) = send(
        &app,
        Method::POST,
        &format!("/api/v1/casinos/{id}/heartbeat"),
        Some(heartbeat_body(&key, "maintenance")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {ack}");
    assert_eq!(ack["data"]["acknowledged"], true);
    assert_eq!(ack["data"]["nextHeartbeatInSecs"], 60);

    let (_, after_heartbeat) = get(&app, &format!("/api/v1/casinos/{id}")).await;
    assert_eq!(after_heartbeat["data"]["status"], "maintenance");
    assert!(after_heartbeat["data"]["lastSeenAt"].is_i64());

    let update = key.sign_request(json!({ "name": "Lucky Star Deluxe" })).unwrap();
    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/casinos/{id}"),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after_update) = get(&app, &format!("/api/v1/casinos/{id}")).await;
    assert_eq!(after_update["data"]["name"], "Lucky Star Deluxe");
    assert_eq!(after_update["data"]["url"], registered["data"]["url"]);
    assert_eq!(after_update["data"]["metadata"], registered["data"]["metadata"]);

    let (_, history) = get(&app, &format!("/api/v1/casinos/{id}/heartbeats")).await;
    assert_eq!(history["data"].as_array().unwrap().len(), 1);
    assert_eq!(history["data"][0]["status"], "maintenance");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    let key = CasinoKeyPair::generate();
    register(&app, &key, "Lucky Star", &[]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/casinos",
        Some(registration(&key, "Lucky Star", &[])),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn forged_registration_is_unauthorized() {
    let app = app();
    let owner = CasinoKeyPair::generate();
    let forger = CasinoKeyPair::generate();
    let mut body = registration(&owner, "Lucky Star", &[]);
    body["signature"] = json!(forger.sign_payload(&body));

    let (status, body) = send(&app, Method::POST, "/api/v1/casinos", Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");
}

#[tokio::test]
async fn heartbeat_for_unknown_casino_is_not_found() {
    let app = app();
    let key = CasinoKeyPair::generate();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/casinos/does-not-exist/heartbeat",
        Some(heartbeat_body(&key, "online")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn validation_failures_list_fields() {
    let app = app();
    let key = CasinoKeyPair::generate();
    let body = key
        .sign_request(json!({
            "name": "",
            "url": "https://ok.example",
            "publicKey": key.public_key_base58(),
            "metadata": { "minBetAmount": 5.0, "maxBetAmount": 1.0 }
        }))
        .unwrap();

    let (status, body) = send(&app, Method::POST, "/api/v1/casinos", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<_> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "metadata.minBetAmount"]);
}

#[tokio::test]
async fn malformed_bodies_are_invalid_requests() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/casinos")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    let key = CasinoKeyPair::generate();
    let unknown_game = key
        .sign_request(json!({
            "name": "Lucky",
            "url": "https://lucky.example",
            "publicKey": key.public_key_base58(),
            "metadata": { "games": ["keno"] }
        }))
        .unwrap();
    let (status, body) =
        send(&app, Method::POST, "/api/v1/casinos", Some(unknown_game)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn list_filters_by_game_and_paginates() {
    let app = app();
    for (name, games) in [
        ("Spin City", vec!["slots"]),
        ("Dice Den", vec!["dice"]),
        ("Mixed Bag", vec!["slots", "dice"]),
        ("Card Room", vec!["poker"]),
    ] {
        register(&app, &CasinoKeyPair::generate(), name, &games).await;
    }

    let (status, body) = get(&app, "/api/v1/casinos?games=slots").await;
    assert_eq!(status, StatusCode::OK);
    let mut names: Vec<_> = body["data"]["casinos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Mixed Bag", "Spin City"]);
    assert_eq!(body["data"]["total"], 2);

    let (_, first) = get(&app, "/api/v1/casinos?limit=2&offset=0").await;
    let (_, second) = get(&app, "/api/v1/casinos?limit=2&offset=2").await;
    assert_eq!(first["data"]["total"], 4);
    assert_eq!(second["data"]["total"], 4);
    let mut ids: Vec<_> = first["data"]["casinos"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second["data"]["casinos"].as_array().unwrap())
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);

    let (status, body) = get(&app, "/api/v1/casinos?games=keno").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    let (status, _) = get(&app, "/api/v1/casinos?offset=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, clamped) = get(&app, "/api/v1/casinos?limit=500").await;
    assert_eq!(clamped["data"]["limit"], 100);
}

#[tokio::test]
async fn lookup_by_public_key() {
    let app = app();
    let key = CasinoKeyPair::generate();
    let id = register(&app, &key, "Lucky Star", &[]).await;

    let (status, body) = get(
        &app,
        &format!("/api/v1/casinos/by-key/{}", key.public_key_base58()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    let (status, body) = get(&app, "/api/v1/casinos/by-key/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn stats_reflect_registry() {
    let app = app();
    let key = CasinoKeyPair::generate();
    let id = register(&app, &key, "Lucky Star", &[]).await;
    register(&app, &CasinoKeyPair::generate(), "Quiet One", &[]).await;

    send(
        &app,
        Method::POST,
        &format!("/api/v1/casinos/{id}/heartbeat"),
        Some(heartbeat_body(&key, "offline")),
    )
    .await;

    let (status, body) = get(&app, "/api/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalCasinos"], 2);
    assert_eq!(body["data"]["onlineCasinos"], 1);
    assert_eq!(body["data"]["heartbeatsLast24h"], 1);
    assert_eq!(body["data"]["protocolVersion"], "1.0");
}

#[tokio::test]
async fn unknown_route_uses_envelope() {
    let (status, body) = get(&app(), "/api/v2/nothing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn sqlite_backed_router_serves_same_flow() {
    let db = RegistryDatabase::open_in_memory().await.unwrap();
    let app = app_with(Arc::new(db));
    let key = CasinoKeyPair::generate();
    let id = register(&app, &key, "Lucky Star", &["roulette"]).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/casinos/{id}/heartbeat"),
        Some(heartbeat_body(&key, "online")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, "/api/v1/casinos?games=roulette&status=online").await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["casinos"][0]["id"], id.as_str());
}

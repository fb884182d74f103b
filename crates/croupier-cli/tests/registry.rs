#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use croupier_cli::client::{CasinoChanges, ClientError, ListFilter, Registration, RegistryClient};
use croupier_core::config::RegistryConfig;
use croupier_crypto::CasinoKeyPair;
use croupier_registry::api::{AppState, ErrorCode, build_router};
use croupier_registry::storage::MemoryStore;
use croupier_registry::types::{CasinoStatus, GameType};

/// Serve a fresh in-memory registry on an ephemeral port.
async fn spawn_registry() -> RegistryClient {
    let state = AppState::new(Arc::new(MemoryStore::new()), &RegistryConfig::default());
    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    RegistryClient::new(&format!("http://{addr}")).unwrap()
}

fn lucky_star() -> Registration {
    Registration {
        name: "Lucky Star".into(),
        url: "https://lucky.example".into(),
        description: Some("Provably fair slots".into()),
        games: vec![GameType::Slots, GameType::Dice],
        tokens: Vec::new(),
    }
}

#[tokio::test]
async fn client_drives_full_lifecycle() {
    let client = spawn_registry().await;
    let key = CasinoKeyPair::generate();

    let casino = client.register(&key, &lucky_star()).await.unwrap();
    assert_eq!(casino.status, CasinoStatus::Online);
    assert_eq!(casino.metadata.supported_tokens, vec!["SOL"]);

    let ack = client
        .heartbeat(&key, &casino.id, CasinoStatus::Maintenance, None)
        .await
        .unwrap();
    assert!(ack.acknowledged);

    let updated = client
        .update(
            &key,
            &casino.id,
            &CasinoChanges {
                name: Some("Lucky Star II".into()),
                ..CasinoChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Lucky Star II");
    assert_eq!(updated.status, CasinoStatus::Maintenance);
    assert_eq!(updated.metadata.description.as_deref(), Some("Provably fair slots"));

    let by_key = client
        .get_by_public_key(&key.public_key_base58())
        .await
        .unwrap();
    assert_eq!(by_key.id, casino.id);

    let history = client.heartbeats(&casino.id, Some(5)).await.unwrap();
    assert_eq!(history.len(), 1);

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.total_casinos, 1);
    assert_eq!(stats.online_casinos, 0);
    assert_eq!(stats.heartbeats_last_24h, 1);
}

#[tokio::test]
async fn list_filter_reaches_the_server() {
    let client = spawn_registry().await;
    client
        .register(&CasinoKeyPair::generate(), &lucky_star())
        .await
        .unwrap();
    client
        .register(
            &CasinoKeyPair::generate(),
            &Registration {
                name: "Poker Palace".into(),
                url: "https://poker.example".into(),
                games: vec![GameType::Poker],
                ..Registration::default()
            },
        )
        .await
        .unwrap();

    let poker = client
        .list(&ListFilter {
            games: vec![GameType::Poker],
            ..ListFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(poker.total, 1);
    assert_eq!(poker.casinos[0].name, "Poker Palace");

    let page = client
        .list(&ListFilter {
            limit: Some(1),
            offset: Some(1),
            ..ListFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.casinos.len(), 1);
    assert_eq!(page.offset, 1);
}

#[tokio::test]
async fn registry_rejections_surface_as_api_errors() {
    let client = spawn_registry().await;
    let key = CasinoKeyPair::generate();
    client.register(&key, &lucky_star()).await.unwrap();

    let err = client.register(&key, &lucky_star()).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api {
            status: 409,
            code: Some(ErrorCode::AlreadyExists),
            ..
        }
    ));
    assert!(!err.is_retryable());

    let err = client.get_casino("missing").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api {
            code: Some(ErrorCode::NotFound),
            ..
        }
    ));
}

#[tokio::test]
async fn heartbeat_with_wrong_key_is_rejected() {
    let client = spawn_registry().await;
    let owner = CasinoKeyPair::generate();
    let casino = client.register(&owner, &lucky_star()).await.unwrap();

    let err = client
        .heartbeat(&CasinoKeyPair::generate(), &casino.id, CasinoStatus::Online, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api {
            status: 401,
            code: Some(ErrorCode::InvalidSignature),
            ..
        }
    ));
}

//! Registry REST client.
//!
//! Uses reqwest to call the registry's `/api/v1` endpoints. Mutating calls are
//! signed locally with the casino's key before they leave the process.

use std::fmt::Write as _;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;

use croupier_core::db::unix_timestamp;
use croupier_crypto::{CasinoKeyPair, CryptoError};
use croupier_registry::api::{Envelope, ErrorCode};
use croupier_registry::discovery::CasinoList;
use croupier_registry::protocol::HeartbeatAck;
use croupier_registry::types::{
    Casino, CasinoStatus, GameType, Heartbeat, HeartbeatMetrics, NetworkStats,
};
use croupier_registry::validation::FieldError;

/// Registry client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Malformed registry response: {0}")]
    Malformed(String),

    #[error("Signing failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether retrying the same request later could succeed.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::Malformed(_) | Self::Crypto(_) | Self::Config(_) => false,
        }
    }
}

/// Fields for a new registration. Empty lists are left out of the request so
/// the registry applies its defaults.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub games: Vec<GameType>,
    pub tokens: Vec<String>,
}

/// Fields to change on an existing casino.
#[derive(Debug, Clone, Default)]
pub struct CasinoChanges {
    pub name: Option<String>,
    pub url: Option<String>,
    pub status: Option<CasinoStatus>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<CasinoStatus>,
    pub games: Vec<GameType>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Signed registration body for `key`.
pub fn registration_body(key: &CasinoKeyPair, reg: &Registration) -> Result<Value, CryptoError> {
    let mut metadata = Map::new();
    if let Some(description) = &reg.description {
        metadata.insert("description".into(), json!(description));
    }
    if !reg.games.is_empty() {
        metadata.insert("games".into(), json!(reg.games));
    }
    if !reg.tokens.is_empty() {
        metadata.insert("supportedTokens".into(), json!(reg.tokens));
    }
    key.sign_request(json!({
        "name": reg.name,
        "url": reg.url,
        "publicKey": key.public_key_base58(),
        "metadata": metadata,
    }))
}

/// Signed heartbeat body stamped with the local clock.
pub fn heartbeat_body(
    key: &CasinoKeyPair,
    status: CasinoStatus,
    metrics: Option<&HeartbeatMetrics>,
) -> Result<Value, CryptoError> {
    let mut body = json!({
        "status": status,
        "timestamp": unix_timestamp(),
    });
    if let Some(metrics) = metrics {
        body["metrics"] = json!(metrics);
    }
    key.sign_request(body)
}

/// Signed update body carrying only the fields being changed.
pub fn update_body(key: &CasinoKeyPair, changes: &CasinoChanges) -> Result<Value, CryptoError> {
    let mut body = Map::new();
    if let Some(name) = &changes.name {
        body.insert("name".into(), json!(name));
    }
    if let Some(url) = &changes.url {
        body.insert("url".into(), json!(url));
    }
    if let Some(status) = changes.status {
        body.insert("status".into(), json!(status));
    }
    if let Some(description) = &changes.description {
        body.insert("metadata".into(), json!({ "description": description }));
    }
    key.sign_request(Value::Object(body))
}

/// Unwrap a registry envelope, turning failures into [`ClientError::Api`].
pub fn decode_envelope<T: DeserializeOwned>(status: u16, bytes: &[u8]) -> Result<T, ClientError> {
    let Ok(envelope) = serde_json::from_slice::<Envelope<T>>(bytes) else {
        if (200..300).contains(&status) {
            return Err(ClientError::Malformed(
                "response is not a registry envelope".into(),
            ));
        }
        return Err(ClientError::Api {
            status,
            code: None,
            message: String::from_utf8_lossy(bytes).trim().to_string(),
            details: Vec::new(),
        });
    };

    match envelope {
        Envelope {
            success: true,
            data: Some(data),
            ..
        } => Ok(data),
        Envelope {
            error: Some(error), ..
        } => Err(ClientError::Api {
            status,
            code: Some(error.code),
            message: error.message,
            details: error.details.unwrap_or_default(),
        }),
        _ => Err(ClientError::Malformed(
            "envelope carries neither data nor error".into(),
        )),
    }
}

/// Registry API client.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    /// Create a client for the registry at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ClientError::Config("server URL is empty".into()));
        }

        // reqwest is built with rustls-no-provider. `Err` means a provider
        // is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .user_agent(concat!("croupier/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the API v1 URL for a given path.
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;
        decode_envelope(status, &bytes)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let resp = self.http.get(url).send().await?;
        Self::read(resp).await
    }

    // =========================================================================
    // Signed operations
    // =========================================================================

    pub async fn register(
        &self,
        key: &CasinoKeyPair,
        registration: &Registration,
    ) -> Result<Casino, ClientError> {
        let body = registration_body(key, registration)?;
        let resp = self
            .http
            .post(self.api_url("/casinos"))
            .json(&body)
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn heartbeat(
        &self,
        key: &CasinoKeyPair,
        casino_id: &str,
        status: CasinoStatus,
        metrics: Option<&HeartbeatMetrics>,
    ) -> Result<HeartbeatAck, ClientError> {
        let body = heartbeat_body(key, status, metrics)?;
        let resp = self
            .http
            .post(self.api_url(&format!("/casinos/{casino_id}/heartbeat")))
            .json(&body)
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn update(
        &self,
        key: &CasinoKeyPair,
        casino_id: &str,
        changes: &CasinoChanges,
    ) -> Result<Casino, ClientError> {
        let body = update_body(key, changes)?;
        let resp = self
            .http
            .patch(self.api_url(&format!("/casinos/{casino_id}")))
            .json(&body)
            .send()
            .await?;
        Self::read(resp).await
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    pub async fn list(&self, filter: &ListFilter) -> Result<CasinoList, ClientError> {
        let mut url = self.api_url("/casinos");
        let mut sep = '?';
        if let Some(status) = filter.status {
            let _ = write!(url, "{sep}status={status}");
            sep = '&';
        }
        if !filter.games.is_empty() {
            let games: Vec<&str> = filter.games.iter().map(|g| g.as_str()).collect();
            let _ = write!(url, "{sep}games={}", games.join(","));
            sep = '&';
        }
        if let Some(limit) = filter.limit {
            let _ = write!(url, "{sep}limit={limit}");
            sep = '&';
        }
        if let Some(offset) = filter.offset {
            let _ = write!(url, "{sep}offset={offset}");
        }
        self.get(&url).await
    }

    pub async fn get_casino(&self, casino_id: &str) -> Result<Casino, ClientError> {
        self.get(&self.api_url(&format!("/casinos/{casino_id}")))
            .await
    }

    pub async fn get_by_public_key(&self, public_key: &str) -> Result<Casino, ClientError> {
        self.get(&self.api_url(&format!("/casinos/by-key/{public_key}")))
            .await
    }

    pub async fn heartbeats(
        &self,
        casino_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Heartbeat>, ClientError> {
        let mut url = self.api_url(&format!("/casinos/{casino_id}/heartbeats"));
        if let Some(limit) = limit {
            let _ = write!(url, "?limit={limit}");
        }
        self.get(&url).await
    }

    pub async fn stats(&self) -> Result<NetworkStats, ClientError> {
        self.get(&self.api_url("/stats")).await
    }
}

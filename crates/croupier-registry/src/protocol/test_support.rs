//! Shared fixtures for protocol tests.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use croupier_crypto::CasinoKeyPair;

use super::{RegisterRequest, RegistrationProtocol, SignedRequest};
use crate::storage::{MemoryStore, SharedStore};
use crate::types::Casino;

pub fn store() -> SharedStore {
    Arc::new(MemoryStore::new())
}

/// Sign `body` with `key` and parse it as a request.
pub fn signed<T: DeserializeOwned>(key: &CasinoKeyPair, body: Value) -> SignedRequest<T> {
    SignedRequest::from_value(key.sign_request(body).unwrap()).unwrap()
}

/// Flip one byte of a base-58 signature, keeping it decodable.
pub fn flip_signature_byte(signature: &str) -> String {
    let mut bytes = bs58::decode(signature).into_vec().unwrap();
    bytes[10] ^= 0x01;
    bs58::encode(bytes).into_string()
}

/// A casino operator holding its own key pair.
pub struct TestCasino {
    pub key: CasinoKeyPair,
}

impl TestCasino {
    pub fn new() -> Self {
        Self {
            key: CasinoKeyPair::generate(),
        }
    }

    pub fn public_key(&self) -> String {
        self.key.public_key_base58()
    }

    pub fn registration(&self, name: &str) -> SignedRequest<RegisterRequest> {
        signed(
            &self.key,
            json!({
                "name": name,
                "url": "https://lucky.example",
                "publicKey": self.public_key(),
                "metadata": {
                    "description": "Provably fair slots",
                    "games": ["slots", "dice"],
                    "socialLinks": {
                        "twitter": "https://x.com/lucky",
                        "discord": "https://discord.gg/lucky"
                    },
                    "minBetAmount": 0.01,
                    "maxBetAmount": 50.0
                }
            }),
        )
    }

    pub async fn register(&self, store: &SharedStore) -> Casino {
        RegistrationProtocol::new(store.clone())
            .register(self.registration("Lucky Star"))
            .await
            .unwrap()
    }

    pub fn heartbeat<T: DeserializeOwned>(&self, status: &str) -> SignedRequest<T> {
        signed(
            &self.key,
            json!({
                "status": status,
                "timestamp": croupier_core::db::unix_timestamp(),
                "metrics": { "activePlayers": 42, "uptimeSecs": 3600 }
            }),
        )
    }
}

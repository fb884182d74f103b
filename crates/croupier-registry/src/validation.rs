//! Shape checks run on every write before any protocol step.
//!
//! All violations are collected so the client sees every bad field at once.

use serde::{Deserialize, Serialize};

use crate::protocol::{HeartbeatRequest, RegisterRequest, UpdateRequest};
use crate::types::{HeartbeatMetrics, MetadataPatch};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_URL_LEN: usize = 2048;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_GAMES: usize = 20;
pub const MAX_TOKENS: usize = 20;
pub const MAX_TOKEN_LEN: usize = 16;

/// One rejected field, reported in the error envelope's `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Default)]
struct Violations(Vec<FieldError>);

impl Violations {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn name(&mut self, field: &str, value: &str) {
        let len = value.trim().chars().count();
        if len == 0 {
            self.push(field, "must not be empty");
        } else if len > MAX_NAME_LEN {
            self.push(field, format!("must be at most {MAX_NAME_LEN} characters"));
        }
    }

    fn url(&mut self, field: &str, value: &str) {
        if !(value.starts_with("https://") || value.starts_with("http://")) {
            self.push(field, "must be an http(s) URL");
        } else if value.len() > MAX_URL_LEN {
            self.push(field, format!("must be at most {MAX_URL_LEN} bytes"));
        } else if value.chars().any(char::is_whitespace) {
            self.push(field, "must not contain whitespace");
        }
    }

    fn positive_amount(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value <= 0.0 {
            self.push(field, "must be a positive number");
        }
    }

    fn non_negative(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value < 0.0 {
            self.push(field, "must be a non-negative number");
        }
    }

    fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "is required");
        }
    }

    fn metadata(&mut self, metadata: &MetadataPatch) {
        if let Some(description) = &metadata.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                self.push(
                    "metadata.description",
                    format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
                );
            }
        }
        if let Some(games) = &metadata.games {
            if games.len() > MAX_GAMES {
                self.push("metadata.games", format!("must list at most {MAX_GAMES} games"));
            }
        }
        if let Some(url) = &metadata.logo_url {
            self.url("metadata.logoUrl", url);
        }
        if let Some(url) = &metadata.banner_url {
            self.url("metadata.bannerUrl", url);
        }
        if let Some(links) = &metadata.social_links {
            for (name, url) in links.entries() {
                self.url(&format!("metadata.socialLinks.{name}"), url);
            }
        }
        if let Some(min) = metadata.min_bet_amount {
            self.positive_amount("metadata.minBetAmount", min);
        }
        if let Some(max) = metadata.max_bet_amount {
            self.positive_amount("metadata.maxBetAmount", max);
        }
        if let (Some(min), Some(max)) = (metadata.min_bet_amount, metadata.max_bet_amount) {
            if min > max {
                self.push(
                    "metadata.minBetAmount",
                    "must not exceed metadata.maxBetAmount",
                );
            }
        }
        if let Some(tokens) = &metadata.supported_tokens {
            if tokens.is_empty() {
                self.push("metadata.supportedTokens", "must not be empty");
            } else if tokens.len() > MAX_TOKENS {
                self.push(
                    "metadata.supportedTokens",
                    format!("must list at most {MAX_TOKENS} tokens"),
                );
            }
            for token in tokens {
                let len = token.trim().chars().count();
                if len == 0 || len > MAX_TOKEN_LEN {
                    self.push(
                        "metadata.supportedTokens",
                        format!("token symbols must be 1-{MAX_TOKEN_LEN} characters"),
                    );
                    break;
                }
            }
        }
    }

    fn metrics(&mut self, metrics: &HeartbeatMetrics) {
        if let Some(volume) = metrics.bet_volume_24h {
            self.non_negative("metrics.betVolume24h", volume);
        }
        if let Some(latency) = metrics.avg_response_time_ms {
            self.non_negative("metrics.avgResponseTimeMs", latency);
        }
    }

    fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

pub fn validate_registration(request: &RegisterRequest) -> Result<(), Vec<FieldError>> {
    let mut v = Violations::default();
    v.name("name", &request.name);
    v.url("url", &request.url);
    v.required("publicKey", &request.public_key);
    v.required("signature", &request.signature);
    v.metadata(&request.metadata);
    v.finish()
}

pub fn validate_heartbeat(request: &HeartbeatRequest) -> Result<(), Vec<FieldError>> {
    let mut v = Violations::default();
    if request.timestamp <= 0 {
        v.push("timestamp", "must be a positive Unix timestamp");
    }
    if let Some(metrics) = &request.metrics {
        v.metrics(metrics);
    }
    v.required("signature", &request.signature);
    v.finish()
}

pub fn validate_update(request: &UpdateRequest) -> Result<(), Vec<FieldError>> {
    let mut v = Violations::default();
    if let Some(name) = &request.name {
        v.name("name", name);
    }
    if let Some(url) = &request.url {
        v.url("url", url);
    }
    if let Some(metadata) = &request.metadata {
        v.metadata(metadata);
    }
    v.required("signature", &request.signature);
    v.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CasinoStatus, SocialLinks};

    fn registration() -> RegisterRequest {
        RegisterRequest {
            name: "Lucky Star".into(),
            url: "https://lucky.example".into(),
            public_key: "key".into(),
            metadata: MetadataPatch::default(),
            signature: "sig".into(),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn accepts_minimal_registration() {
        assert!(validate_registration(&registration()).is_ok());
    }

    #[test]
    fn reports_every_bad_field() {
        let mut request = registration();
        request.name = "   ".into();
        request.url = "ftp://lucky.example".into();
        request.signature = String::new();

        let errors = validate_registration(&request).unwrap_err();
        assert_eq!(fields(&errors), vec!["name", "url", "signature"]);
    }

    #[test]
    fn rejects_overlong_name() {
        let mut request = registration();
        request.name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_registration(&request).is_err());
    }

    #[test]
    fn rejects_min_bet_above_max_bet() {
        let mut request = registration();
        request.metadata.min_bet_amount = Some(10.0);
        request.metadata.max_bet_amount = Some(1.0);
        let errors = validate_registration(&request).unwrap_err();
        assert_eq!(fields(&errors), vec!["metadata.minBetAmount"]);
    }

    #[test]
    fn rejects_non_positive_bets() {
        let mut request = registration();
        request.metadata.min_bet_amount = Some(0.0);
        request.metadata.max_bet_amount = Some(f64::NAN);
        let errors = validate_registration(&request).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec!["metadata.minBetAmount", "metadata.maxBetAmount"]
        );
    }

    #[test]
    fn rejects_empty_token_list() {
        let mut request = registration();
        request.metadata.supported_tokens = Some(Vec::new());
        assert!(validate_registration(&request).is_err());
    }

    #[test]
    fn rejects_bad_social_link() {
        let mut request = registration();
        request.metadata.social_links = Some(SocialLinks {
            discord: Some("discord.gg/lucky".into()),
            ..SocialLinks::default()
        });
        let errors = validate_registration(&request).unwrap_err();
        assert_eq!(fields(&errors), vec!["metadata.socialLinks.discord"]);
    }

    #[test]
    fn heartbeat_requires_positive_timestamp_and_metrics() {
        let request = HeartbeatRequest {
            status: CasinoStatus::Online,
            timestamp: 0,
            metrics: Some(HeartbeatMetrics {
                bet_volume_24h: Some(-1.0),
                ..HeartbeatMetrics::default()
            }),
            signature: "sig".into(),
        };
        let errors = validate_heartbeat(&request).unwrap_err();
        assert_eq!(fields(&errors), vec!["timestamp", "metrics.betVolume24h"]);
    }

    #[test]
    fn empty_update_is_valid() {
        let request = UpdateRequest {
            name: None,
            url: None,
            status: None,
            metadata: None,
            signature: "sig".into(),
        };
        assert!(validate_update(&request).is_ok());
    }
}

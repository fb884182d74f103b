//! Domain types shared by the store, the protocols and the HTTP API.
//!
//! Everything serializes with camelCase keys, the shape clients see on the
//! wire and sign over.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Compatibility tag stamped on every casino at registration.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Token list applied when a registration names none.
pub const DEFAULT_TOKEN: &str = "SOL";

/// Returned by `FromStr` impls for the closed enumerations below.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Lifecycle status of a registered casino.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasinoStatus {
    Online,
    Offline,
    Maintenance,
    Suspended,
}

impl CasinoStatus {
    pub const ALL: [Self; 4] = [
        Self::Online,
        Self::Offline,
        Self::Maintenance,
        Self::Suspended,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Maintenance => "maintenance",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for CasinoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CasinoStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// Game categories a casino can advertise. One spelling per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Slots,
    Dice,
    Roulette,
    Blackjack,
    Poker,
    Baccarat,
    Crash,
    Plinko,
    Mines,
    Coinflip,
    Lottery,
    Sports,
    Other,
}

impl GameType {
    pub const ALL: [Self; 13] = [
        Self::Slots,
        Self::Dice,
        Self::Roulette,
        Self::Blackjack,
        Self::Poker,
        Self::Baccarat,
        Self::Crash,
        Self::Plinko,
        Self::Mines,
        Self::Coinflip,
        Self::Lottery,
        Self::Sports,
        Self::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slots => "slots",
            Self::Dice => "dice",
            Self::Roulette => "roulette",
            Self::Blackjack => "blackjack",
            Self::Poker => "poker",
            Self::Baccarat => "baccarat",
            Self::Crash => "crash",
            Self::Plinko => "plinko",
            Self::Mines => "mines",
            Self::Coinflip => "coinflip",
            Self::Lottery => "lottery",
            Self::Sports => "sports",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|game| game.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "game type",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl SocialLinks {
    /// `(field name, value)` for every link that is set.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("twitter", self.twitter.as_deref()),
            ("discord", self.discord.as_deref()),
            ("telegram", self.telegram.as_deref()),
            ("website", self.website.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

/// Published, mutable description of a casino.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasinoMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub games: Vec<GameType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bet_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bet_amount: Option<f64>,
    #[serde(default = "default_tokens")]
    pub supported_tokens: Vec<String>,
}

fn default_tokens() -> Vec<String> {
    vec![DEFAULT_TOKEN.to_string()]
}

impl Default for CasinoMetadata {
    fn default() -> Self {
        Self {
            description: None,
            games: Vec::new(),
            logo_url: None,
            banner_url: None,
            social_links: SocialLinks::default(),
            min_bet_amount: None,
            max_bet_amount: None,
            supported_tokens: default_tokens(),
        }
    }
}

/// Metadata as submitted by a client: every field optional.
///
/// At registration absent fields take their defaults; on update absent
/// fields keep the stored value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games: Option<Vec<GameType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bet_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bet_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_tokens: Option<Vec<String>>,
}

impl MetadataPatch {
    /// Reconcile this patch onto `base`, one field at a time.
    ///
    /// A present field replaces the stored one wholesale (so `socialLinks`
    /// is replaced as a unit); an absent field leaves it untouched.
    pub fn apply_to(&self, base: &CasinoMetadata) -> CasinoMetadata {
        CasinoMetadata {
            description: self
                .description
                .clone()
                .or_else(|| base.description.clone()),
            games: self.games.clone().unwrap_or_else(|| base.games.clone()),
            logo_url: self.logo_url.clone().or_else(|| base.logo_url.clone()),
            banner_url: self.banner_url.clone().or_else(|| base.banner_url.clone()),
            social_links: self
                .social_links
                .clone()
                .unwrap_or_else(|| base.social_links.clone()),
            min_bet_amount: self.min_bet_amount.or(base.min_bet_amount),
            max_bet_amount: self.max_bet_amount.or(base.max_bet_amount),
            supported_tokens: self
                .supported_tokens
                .clone()
                .unwrap_or_else(|| base.supported_tokens.clone()),
        }
    }

    /// Metadata for a new casino: this patch over the defaults.
    pub fn into_metadata(self) -> CasinoMetadata {
        self.apply_to(&CasinoMetadata::default())
    }
}

/// A registered casino.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Casino {
    pub id: String,
    pub name: String,
    pub url: String,
    pub public_key: String,
    pub status: CasinoStatus,
    pub metadata: CasinoMetadata,
    pub protocol_version: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_seen_at: Option<i64>,
}

/// Optional operational snapshot attached to a heartbeat.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_players: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_volume_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_response_time_ms: Option<f64>,
}

/// One accepted heartbeat, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    pub id: String,
    pub casino_id: String,
    pub status: CasinoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<HeartbeatMetrics>,
    pub signature: String,
    /// Server clock at acceptance, not the client-claimed time.
    pub observed_at: i64,
}

/// Aggregate network statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub total_casinos: u64,
    pub online_casinos: u64,
    pub heartbeats_last_24h: u64,
    pub protocol_version: String,
}

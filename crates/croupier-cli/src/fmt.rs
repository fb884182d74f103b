//! Plain-text rendering of registry responses.

use std::fmt::Write as _;

use croupier_registry::discovery::CasinoList;
use croupier_registry::types::{Casino, Heartbeat, NetworkStats};

/// Truncate `s` to at most `max` characters, marking the cut with `~`.
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('~');
    out
}

fn games(casino: &Casino) -> String {
    casino
        .metadata
        .games
        .iter()
        .map(|g| g.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_casino_list(list: &CasinoList) -> String {
    let mut out = String::new();
    if list.casinos.is_empty() {
        let _ = writeln!(out, "No casinos found");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<36}  {:<24}  {:<11}  {}",
        "ID", "NAME", "STATUS", "GAMES"
    );
    for casino in &list.casinos {
        let _ = writeln!(
            out,
            "{:<36}  {:<24}  {:<11}  {}",
            casino.id,
            clip(&casino.name, 24),
            casino.status,
            games(casino)
        );
    }
    let shown = u64::try_from(list.casinos.len()).unwrap_or(u64::MAX);
    let first = u64::from(list.offset) + 1;
    let last = u64::from(list.offset).saturating_add(shown);
    let _ = writeln!(out, "\nShowing {first}-{last} of {}", list.total);
    out
}

pub fn format_casino(casino: &Casino) -> String {
    let mut out = String::new();
    let meta = &casino.metadata;
    let _ = writeln!(out, "ID:          {}", casino.id);
    let _ = writeln!(out, "Name:        {}", casino.name);
    let _ = writeln!(out, "URL:         {}", casino.url);
    let _ = writeln!(out, "Public key:  {}", casino.public_key);
    let _ = writeln!(out, "Status:      {}", casino.status);
    if let Some(description) = &meta.description {
        let _ = writeln!(out, "Description: {description}");
    }
    if !meta.games.is_empty() {
        let _ = writeln!(out, "Games:       {}", games(casino));
    }
    let _ = writeln!(out, "Tokens:      {}", meta.supported_tokens.join(","));
    match (meta.min_bet_amount, meta.max_bet_amount) {
        (Some(min), Some(max)) => {
            let _ = writeln!(out, "Bets:        {min} - {max}");
        }
        (Some(min), None) => {
            let _ = writeln!(out, "Min bet:     {min}");
        }
        (None, Some(max)) => {
            let _ = writeln!(out, "Max bet:     {max}");
        }
        (None, None) => {}
    }
    for (network, link) in meta.social_links.entries() {
        let _ = writeln!(out, "{:<13}{link}", format!("{network}:"));
    }
    let _ = writeln!(out, "Protocol:    {}", casino.protocol_version);
    let _ = writeln!(out, "Registered:  {}", casino.created_at);
    match casino.last_seen_at {
        Some(seen) => {
            let _ = writeln!(out, "Last seen:   {seen}");
        }
        None => {
            let _ = writeln!(out, "Last seen:   never");
        }
    }
    out
}

pub fn format_heartbeats(history: &[Heartbeat]) -> String {
    let mut out = String::new();
    if history.is_empty() {
        let _ = writeln!(out, "No heartbeats recorded");
        return out;
    }
    let _ = writeln!(out, "{:<12}  {:<11}  {:<8}  {}", "OBSERVED", "STATUS", "PLAYERS", "UPTIME");
    for beat in history {
        let metrics = beat.metrics.as_ref();
        let players = metrics
            .and_then(|m| m.active_players)
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        let uptime = metrics
            .and_then(|m| m.uptime_secs)
            .map_or_else(|| "-".to_string(), |s| format!("{s}s"));
        let _ = writeln!(
            out,
            "{:<12}  {:<11}  {players:<8}  {uptime}",
            beat.observed_at, beat.status
        );
    }
    out
}

pub fn format_stats(stats: &NetworkStats) -> String {
    format!(
        "Casinos:        {}\nOnline:         {}\nHeartbeats/24h: {}\nProtocol:       {}\n",
        stats.total_casinos, stats.online_casinos, stats.heartbeats_last_24h, stats.protocol_version
    )
}

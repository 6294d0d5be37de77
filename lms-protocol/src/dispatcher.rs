//! Classification of inbound lines into typed events
//!
//! Lines carry no framing beyond the newline and no request tags, so each
//! one is matched against a fixed vocabulary. Classification runs in a
//! strict priority order and the first match wins:
//!
//! 1. global keyword rules ([`GLOBAL_RULES`], in table order)
//! 2. client lifecycle notifications (`<id> client new`, ...)
//! 3. per-player rules for every registered address
//! 4. anything else is [`ProtocolEvent::Unmatched`]
//!
//! A reply that arrives out of order is indistinguishable from an
//! unsolicited notification of the same shape; both map to the same event.

use percent_encoding::percent_decode;

use crate::error::ProtocolError;
use crate::event::{ClientChange, PlayerEvent, ProtocolEvent, VolumeChange};
use crate::player_id::PlayerId;
use crate::syncgroups::parse_sync_groups;

/// A line that matched a global keyword
#[derive(Debug, Clone, Copy)]
pub struct KeywordMatch<'a> {
    /// Full decoded line
    pub line: &'a str,
    /// Decoded text after the keyword and its separator
    pub remainder: &'a str,
    /// The same remainder before percent-decoding
    pub raw_remainder: &'a str,
}

/// Entry in the global rule table
pub struct GlobalRule {
    pub keyword: &'static str,
    /// Whether the keyword alone, with no remainder, is a valid line
    pub allow_bare: bool,
    pub decode: fn(KeywordMatch<'_>) -> ProtocolEvent,
}

/// Global rules in priority order
pub const GLOBAL_RULES: &[GlobalRule] = &[
    GlobalRule {
        keyword: "player count",
        allow_bare: false,
        decode: decode_player_count,
    },
    GlobalRule {
        keyword: "player id",
        allow_bare: false,
        decode: decode_player_id,
    },
    GlobalRule {
        keyword: "syncgroups",
        allow_bare: true,
        decode: decode_sync_groups,
    },
    GlobalRule {
        keyword: "listen",
        allow_bare: false,
        decode: decode_listen,
    },
];

const CLIENT_KEYWORD: &str = "client";

/// Routes inbound lines to global or per-player events
///
/// Holds player addresses only. Addresses are registered as soon as an
/// identity is learned and an unregistered address can never match.
#[derive(Debug, Default, Clone)]
pub struct Dispatcher {
    known: Vec<PlayerId>,
}

impl Dispatcher {
    /// Create a dispatcher with no known players
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an address for per-player matching
    ///
    /// Returns `false` if it was already registered.
    pub fn register(&mut self, player: &PlayerId) -> bool {
        if self.is_known(player) {
            return false;
        }
        self.known.push(player.clone());
        true
    }

    /// Stop matching lines for an address
    pub fn forget(&mut self, player: &PlayerId) -> bool {
        let before = self.known.len();
        self.known.retain(|p| p != player);
        before != self.known.len()
    }

    /// Forget every address
    pub fn clear(&mut self) {
        self.known.clear();
    }

    /// Check whether an address is registered
    pub fn is_known(&self, player: &PlayerId) -> bool {
        self.known.iter().any(|p| p == player)
    }

    /// Registered addresses in registration order
    pub fn known_players(&self) -> &[PlayerId] {
        &self.known
    }

    /// Decode and classify one raw line
    pub fn dispatch(&self, raw: &[u8]) -> ProtocolEvent {
        let raw_text = String::from_utf8_lossy(raw);
        let line = decode_line(raw);
        tracing::trace!("< {}", line);

        if let Some(event) = match_global(&line, &raw_text) {
            return event;
        }

        if let Some(event) = match_client(&line) {
            return event;
        }

        if let Some(event) = self.match_player(&line) {
            return event;
        }

        ProtocolEvent::Unmatched { player: None, line }
    }

    fn match_player(&self, line: &str) -> Option<ProtocolEvent> {
        self.known.iter().find_map(|player| {
            let rest = strip_keyword(line, player.as_str(), false)?;
            Some(classify_player_line(player, rest, line))
        })
    }
}

/// Percent-decode a raw line, replacing invalid UTF-8
pub fn decode_line(raw: &[u8]) -> String {
    percent_decode(raw).decode_utf8_lossy().into_owned()
}

/// Strip `keyword` plus one whitespace separator from the start of `text`
///
/// With `allow_bare`, the keyword alone matches with an empty remainder.
fn strip_keyword<'a>(text: &'a str, keyword: &str, allow_bare: bool) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    if rest.is_empty() {
        return allow_bare.then_some(rest);
    }
    let mut chars = rest.chars();
    chars.next().filter(|c| c.is_whitespace())?;
    Some(chars.as_str())
}

fn match_global(line: &str, raw_text: &str) -> Option<ProtocolEvent> {
    GLOBAL_RULES.iter().find_map(|rule| {
        let remainder = strip_keyword(line, rule.keyword, rule.allow_bare)?;
        let raw_remainder =
            strip_keyword(raw_text, rule.keyword, rule.allow_bare).unwrap_or(remainder);
        Some((rule.decode)(KeywordMatch {
            line,
            remainder,
            raw_remainder,
        }))
    })
}

fn match_client(line: &str) -> Option<ProtocolEvent> {
    let (id, rest) = line.split_once(char::is_whitespace)?;
    let action = strip_keyword(rest, CLIENT_KEYWORD, false)?;
    let change: ClientChange = action.split_whitespace().next()?.parse().ok()?;
    Some(ProtocolEvent::Client {
        player: PlayerId::new(id),
        change,
    })
}

fn classify_player_line(player: &PlayerId, rest: &str, line: &str) -> ProtocolEvent {
    let event = if let Some(token) = strip_keyword(rest, "mixer volume", false) {
        token.parse::<VolumeChange>().map(PlayerEvent::Volume)
    } else if let Some(name) = strip_keyword(rest, "name", false) {
        Ok(PlayerEvent::Name(name.to_string()))
    } else if let Some(flag) = strip_keyword(rest, "connected", false) {
        parse_flag(flag).map(PlayerEvent::Connected)
    } else if let Some(args) = rest.strip_prefix("sync ") {
        Ok(PlayerEvent::SyncChanged(args.to_string()))
    } else {
        return ProtocolEvent::Unmatched {
            player: Some(player.clone()),
            line: line.to_string(),
        };
    };

    match event {
        Ok(event) => ProtocolEvent::Player {
            player: player.clone(),
            event,
        },
        Err(error) => malformed(line, error),
    }
}

fn parse_flag(flag: &str) -> Result<bool, ProtocolError> {
    match flag.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(ProtocolError::InvalidFlag(other.to_string())),
    }
}

fn malformed(line: &str, error: ProtocolError) -> ProtocolEvent {
    ProtocolEvent::Malformed {
        line: line.to_string(),
        error,
    }
}

fn decode_player_count(m: KeywordMatch<'_>) -> ProtocolEvent {
    let value = m.remainder.trim();
    match value.parse() {
        Ok(count) => ProtocolEvent::PlayerCount(count),
        Err(_) => malformed(
            m.line,
            ProtocolError::InvalidNumber {
                field: "player count",
                value: value.to_string(),
            },
        ),
    }
}

fn decode_player_id(m: KeywordMatch<'_>) -> ProtocolEvent {
    let mut parts = m.remainder.split_whitespace();
    let index_token = parts.next().unwrap_or_default();

    let index = match index_token.parse() {
        Ok(index) => index,
        Err(_) => {
            return malformed(
                m.line,
                ProtocolError::InvalidNumber {
                    field: "player index",
                    value: index_token.to_string(),
                },
            )
        }
    };

    match parts.next() {
        Some(address) => ProtocolEvent::PlayerId {
            index,
            player: PlayerId::new(address),
        },
        None => malformed(m.line, ProtocolError::MissingAddress(m.line.to_string())),
    }
}

fn decode_sync_groups(m: KeywordMatch<'_>) -> ProtocolEvent {
    match parse_sync_groups(m.raw_remainder) {
        Ok(groups) => ProtocolEvent::SyncGroups(groups),
        Err(error) => malformed(m.line, error),
    }
}

fn decode_listen(m: KeywordMatch<'_>) -> ProtocolEvent {
    ProtocolEvent::ListenAck(m.remainder.to_string())
}

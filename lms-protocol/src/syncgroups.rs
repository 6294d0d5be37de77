//! Sync group listing grammar
//!
//! A `syncgroups` reply carries a flat sequence of `key:value[,value...]`
//! tokens. Every group contributes a fixed-size record of two consecutive
//! pairs, `sync_members` and `sync_member_names`:
//!
//! ```text
//! syncgroups sync_members%3Aaa%3A...%2Cbb%3A... sync_member_names%3AKitchen%2CLiving%20Room
//! ```
//!
//! Tokens are split on whitespace while still encoded so that names with
//! encoded spaces stay inside their token; each token is decoded afterwards.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};
use crate::player_id::PlayerId;

/// Number of key/value pairs that describe one group
pub const FIELDS_PER_GROUP: usize = 2;

/// Key whose values list the group's member addresses
pub const MEMBERS_KEY: &str = "sync_members";

/// An ordered set of players playing in unison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncGroup {
    members: Vec<PlayerId>,
}

impl SyncGroup {
    /// Create a group from its ordered members
    pub fn new(members: Vec<PlayerId>) -> Self {
        Self { members }
    }

    /// A group containing a single, ungrouped player
    pub fn standalone(player: PlayerId) -> Self {
        Self {
            members: vec![player],
        }
    }

    /// Members in server order
    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the group has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True for a group of one
    pub fn is_standalone(&self) -> bool {
        self.members.len() == 1
    }

    /// Check if a player is in this group
    pub fn contains(&self, player: &PlayerId) -> bool {
        self.members.iter().any(|m| m == player)
    }
}

/// Parse the remainder of a `syncgroups` reply
///
/// An empty remainder means the server reports no groups. Any grammar
/// violation rejects the whole reply so callers never see a partial listing.
pub fn parse_sync_groups(raw_remainder: &str) -> Result<Vec<SyncGroup>> {
    let mut groups = Vec::new();
    let mut record: Vec<(String, Vec<String>)> = Vec::with_capacity(FIELDS_PER_GROUP);

    for token in raw_remainder.split_whitespace() {
        record.push(parse_token(token)?);
        if record.len() == FIELDS_PER_GROUP {
            groups.push(group_from_record(groups.len(), &record)?);
            record.clear();
        }
    }

    if !record.is_empty() {
        return Err(ProtocolError::IncompleteRecord {
            fields: record.len(),
            expected: FIELDS_PER_GROUP,
        });
    }

    Ok(groups)
}

fn parse_token(token: &str) -> Result<(String, Vec<String>)> {
    let decoded = percent_decode_str(token).decode_utf8_lossy();
    let (key, values) = decoded
        .split_once(':')
        .ok_or_else(|| ProtocolError::MalformedToken(decoded.to_string()))?;

    if key.is_empty() {
        return Err(ProtocolError::MalformedToken(decoded.to_string()));
    }

    let values = values.split(',').map(str::to_string).collect();
    Ok((key.to_string(), values))
}

fn group_from_record(index: usize, record: &[(String, Vec<String>)]) -> Result<SyncGroup> {
    let members: Vec<PlayerId> = record
        .iter()
        .find(|(key, _)| key == MEMBERS_KEY)
        .ok_or(ProtocolError::MissingMembers { record: index })?
        .1
        .iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| PlayerId::new(v.as_str()))
        .collect();

    if members.is_empty() {
        return Err(ProtocolError::MissingMembers { record: index });
    }

    Ok(SyncGroup::new(members))
}

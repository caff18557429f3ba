//! Room-level types that travel on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

use partyroom_modes::{GameMode, PlayerId};

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The short code players type to find a room, e.g. `"K7MPX"`.
///
/// Codes are [`RoomCode::LEN`] characters from [`RoomCode::ALPHABET`],
/// which leaves out `I`, `O`, `0` and `1` so a code read aloud or copied
/// off a screen can't be misread. Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    pub const LEN: usize = 5;

    /// Parses user input into a code.
    ///
    /// Surrounding whitespace is ignored and letters are upper-cased.
    /// Returns `None` unless the result is a well-formed code.
    pub fn parse(input: &str) -> Option<Self> {
        let code = input.trim().to_ascii_uppercase();
        Self::is_well_formed(&code).then_some(Self(code))
    }

    /// True if `code` has the right length and only alphabet characters.
    pub fn is_well_formed(code: &str) -> bool {
        code.len() == Self::LEN && code.bytes().all(|b| Self::ALPHABET.contains(&b))
    }

    /// Builds a code from alphabet indices. Indices wrap around the alphabet.
    pub fn from_indices(indices: [usize; Self::LEN]) -> Self {
        let code = indices
            .iter()
            .map(|&i| Self::ALPHABET[i % Self::ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Room snapshots
// ---------------------------------------------------------------------------

/// A room member as shown in lobbies: who they are, nothing about the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub id: PlayerId,
    pub username: String,
}

/// Everything a joining client needs to render the lobby.
///
/// `players` is in join order; the first entry is the room owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_code: RoomCode,
    pub mode: GameMode,
    pub players: Vec<MemberInfo>,
    pub is_playing: bool,
}

impl RoomSnapshot {
    pub fn owner(&self) -> Option<PlayerId> {
        self.players.first().map(|m| m.id)
    }
}

/// Why a create/join request was refused. Sent only to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomErrorKind {
    RoomNotFound,
    RoomFull,
    GameInProgress,
}

//! Wire types: everything that crosses the socket.
//!
//! Both directions use flat JSON objects discriminated by a `cmd` field.
//! Field names here are the wire contract with the rendering client, so
//! renames are deliberate and covered by tests below.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Server-generated identifier for a connected participant.
///
/// On the wire it is an 8-character lowercase hex string (`"0a1b2c3d"`),
/// which keeps it opaque to clients while staying a cheap `Copy` key on
/// the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 {
            return Err(ProtocolError::InvalidMessage(format!(
                "player id must be 8 hex digits, got {s:?}"
            )));
        }
        u32::from_str_radix(s, 16)
            .map(PlayerId)
            .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))
    }
}

impl Serialize for PlayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The match's coarse mode. Exactly one is active at a time.
///
/// Serialized with the short names clients switch on:
/// `"lobby"`, `"countdown"`, `"playing"`, `"await"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Lobby,
    Countdown,
    Playing,
    #[serde(rename = "await")]
    AwaitingRestart,
}

impl Phase {
    /// Returns `true` while a round is set up or running, i.e. every phase
    /// in which snapshots (rather than lobby payloads) describe the world.
    pub fn is_in_match(&self) -> bool {
        !matches!(self, Self::Lobby)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Countdown => write!(f, "countdown"),
            Self::Playing => write!(f, "playing"),
            Self::AwaitingRestart => write!(f, "await"),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Commands a client may send.
///
/// `#[serde(tag = "cmd")]` makes the discriminator a sibling field:
/// `{"cmd":"SET_NAME","name":"ann"}`. Missing booleans default to `false`
/// and unknown extra fields are ignored; an unknown `cmd` fails to decode
/// and the server drops the frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCommand {
    /// Announce a display name. Same effect as `SET_NAME`.
    Join {
        #[serde(default)]
        name: Option<String>,
    },

    /// Current key state. Level-triggered: resending the same flags is a
    /// no-op.
    Input {
        #[serde(default)]
        left: bool,
        #[serde(default)]
        right: bool,
        #[serde(default)]
        up: bool,
    },

    /// Vote to restart after everyone died.
    Respawn,

    SetName {
        #[serde(default)]
        name: String,
    },

    /// `color` is `"#RRGGBB"`.
    SetColor {
        #[serde(default)]
        color: String,
    },

    Ready {
        #[serde(default)]
        ready: bool,
    },

    /// Step out of the running match into a personal lobby.
    LeaveToLobby,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Sent once, first, on every connection.
    Welcome {
        id: PlayerId,
        seed: u32,
        tick_hz: u32,
        snapshot_hz: u32,
    },

    /// Lobby roster, pushed on every lobby-relevant event.
    Lobby(LobbyState),

    /// Full world state, sent at the broadcast rate outside the lobby.
    Snapshot(Snapshot),
}

/// One row of the lobby roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub id: PlayerId,
    pub name: String,
    /// `"#RRGGBB"`.
    pub color: String,
    pub ready: bool,
}

/// Body of a `LOBBY` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyState {
    /// Always [`Phase::Lobby`]; kept on the wire so clients can switch
    /// screens on `phase` alone.
    pub phase: Phase,
    pub players: Vec<LobbyPlayer>,
    pub need_count: usize,
    pub ready_count: usize,
}

/// A player as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPlayer {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub alive: bool,
    pub score: u32,
}

/// An obstacle as seen in a snapshot. `k` is the kind code
/// (0 blade, 1 bomb, 2 flame, 3 explosion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotObstacle {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub k: u8,
}

/// Accumulated score of one player across the rounds of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTotal {
    pub id: PlayerId,
    pub name: String,
    pub total: u64,
}

/// Body of a `SNAPSHOT` message.
///
/// The optional fields are only present while the table is waiting for
/// restart votes; clients must tolerate their absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub round: u32,
    pub phase: Phase,
    pub countdown_ms: u32,
    pub need_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<usize>,
    pub players: Vec<SnapshotPlayer>,
    pub obstacles: Vec<SnapshotObstacle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_round: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<Vec<MatchTotal>>,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> ClientCommand {
        serde_json::from_str(json).unwrap()
    }

    // -- PlayerId --

    #[test]
    fn test_player_id_serializes_as_padded_hex() {
        let json = serde_json::to_string(&PlayerId(0x1f)).unwrap();
        assert_eq!(json, r#""0000001f""#);
    }

    #[test]
    fn test_player_id_parses_back() {
        let id: PlayerId = serde_json::from_str(r#""deadbeef""#).unwrap();
        assert_eq!(id, PlayerId(0xdead_beef));
    }

    #[test]
    fn test_player_id_rejects_wrong_length() {
        assert!("abc".parse::<PlayerId>().is_err());
        assert!(serde_json::from_str::<PlayerId>(r#""123456789""#).is_err());
    }

    // -- Phase --

    #[test]
    fn test_phase_wire_names() {
        let names: Vec<String> = [
            Phase::Lobby,
            Phase::Countdown,
            Phase::Playing,
            Phase::AwaitingRestart,
        ]
        .iter()
        .map(|p| serde_json::to_string(p).unwrap())
        .collect();
        assert_eq!(
            names,
            [r#""lobby""#, r#""countdown""#, r#""playing""#, r#""await""#]
        );
    }

    #[test]
    fn test_phase_display_matches_wire() {
        assert_eq!(Phase::AwaitingRestart.to_string(), "await");
        assert!(Phase::Countdown.is_in_match());
        assert!(!Phase::Lobby.is_in_match());
    }

    // -- ClientCommand --

    #[test]
    fn test_decode_every_command() {
        assert_eq!(
            decode(r#"{"cmd":"JOIN","name":"ann"}"#),
            ClientCommand::Join { name: Some("ann".into()) }
        );
        assert_eq!(
            decode(r#"{"cmd":"INPUT","left":false,"right":true,"up":true}"#),
            ClientCommand::Input { left: false, right: true, up: true }
        );
        assert_eq!(decode(r#"{"cmd":"RESPAWN"}"#), ClientCommand::Respawn);
        assert_eq!(
            decode(r#"{"cmd":"SET_NAME","name":"bo"}"#),
            ClientCommand::SetName { name: "bo".into() }
        );
        assert_eq!(
            decode(r##"{"cmd":"SET_COLOR","color":"#A0B0C0"}"##),
            ClientCommand::SetColor { color: "#A0B0C0".into() }
        );
        assert_eq!(
            decode(r#"{"cmd":"READY","ready":true}"#),
            ClientCommand::Ready { ready: true }
        );
        assert_eq!(
            decode(r#"{"cmd":"LEAVE_TO_LOBBY"}"#),
            ClientCommand::LeaveToLobby
        );
    }

    #[test]
    fn test_input_missing_flags_default_false() {
        assert_eq!(
            decode(r#"{"cmd":"INPUT","up":true}"#),
            ClientCommand::Input { left: false, right: false, up: true }
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        assert_eq!(
            decode(r#"{"cmd":"RESPAWN","seq":9}"#),
            ClientCommand::Respawn
        );
    }

    #[test]
    fn test_unknown_cmd_fails() {
        assert!(serde_json::from_str::<ClientCommand>(r#"{"cmd":"FLY"}"#).is_err());
        assert!(serde_json::from_str::<ClientCommand>(r#"{"name":"x"}"#).is_err());
    }

    // -- ServerMessage --

    #[test]
    fn test_lobby_json_shape() {
        let msg = ServerMessage::Lobby(LobbyState {
            phase: Phase::Lobby,
            players: vec![LobbyPlayer {
                id: PlayerId(1),
                name: "guest".into(),
                color: "#39A9F9".into(),
                ready: false,
            }],
            need_count: 1,
            ready_count: 0,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["cmd"], "LOBBY");
        assert_eq!(json["phase"], "lobby");
        assert_eq!(json["players"][0]["id"], "00000001");
        assert_eq!(json["players"][0]["color"], "#39A9F9");
        assert_eq!(json["need_count"], 1);
        assert_eq!(json["ready_count"], 0);
    }

    #[test]
    fn test_snapshot_omits_absent_optionals() {
        let msg = ServerMessage::Snapshot(Snapshot {
            tick: 3,
            round: 1,
            phase: Phase::Playing,
            countdown_ms: 0,
            need_count: 2,
            vote_count: None,
            players: vec![],
            obstacles: vec![SnapshotObstacle { x: 1.0, y: 2.0, w: 24.0, h: 24.0, k: 0 }],
            match_round: None,
            match_total: None,
            totals: None,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["cmd"], "SNAPSHOT");
        assert_eq!(json["phase"], "playing");
        assert!(json.get("vote_count").is_none());
        assert!(json.get("totals").is_none());
        assert_eq!(json["obstacles"][0]["k"], 0);
    }

    #[test]
    fn test_snapshot_decodes_without_optionals() {
        let json = r#"{"cmd":"SNAPSHOT","tick":1,"round":1,"phase":"countdown",
            "countdown_ms":2500,"need_count":1,"players":[],"obstacles":[]}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        match msg {
            ServerMessage::Snapshot(s) => {
                assert_eq!(s.phase, Phase::Countdown);
                assert_eq!(s.countdown_ms, 2500);
                assert!(s.vote_count.is_none());
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }
}

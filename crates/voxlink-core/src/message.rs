//! Peer wire message schema.
//!
//! The relay and its TCP peer exchange length-prefixed frames whose payload
//! is a JSON object tagged by a `type` field. The schema is deliberately a
//! closed tagged union rather than an arbitrary object graph: the relay
//! only ever emits `text` and only ever acts on `speak`.

use serde::{Deserialize, Serialize};

/// A message exchanged with the TCP peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PeerMessage {
    /// Recognized speech text, relay → peer.
    Text {
        /// The recognized utterance.
        text: String,
    },

    /// Text the peer wants surfaced to the user, peer → relay.
    Speak {
        /// The text to display.
        text: String,
    },

    /// Any other tag. Accepted and ignored so a newer peer can introduce
    /// message kinds without tearing the link down.
    #[serde(other)]
    Unknown,
}

impl PeerMessage {
    /// Classify a decoded JSON value.
    ///
    /// A `speak` object carrying a string `text` field becomes
    /// [`PeerMessage::Speak`]; every other well-formed value — wrong tag,
    /// missing field, non-object — is [`PeerMessage::Unknown`]. Only
    /// malformed JSON is an error, and that is the caller's to detect
    /// before this point.
    pub fn classify(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or(Self::Unknown)
    }
}

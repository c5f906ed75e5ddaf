use crate::model::user::UserId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;
use std::fmt;

/// The `type` field of a signaling frame.
///
/// Unknown types are kept verbatim so newer clients can negotiate things the
/// relay has never heard of.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    Offer,
    Answer,
    IceCandidate,
    UserJoined,
    UserLeft,
    Other(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
            Self::UserJoined => "user-joined",
            Self::UserLeft => "user-left",
            Self::Other(kind) => kind,
        }
    }

    /// Presence events are only ever produced by the server.
    pub fn is_presence(&self) -> bool {
        matches!(self, Self::UserJoined | Self::UserLeft)
    }
}

/// A frame without `type` decodes to the empty type and is still relayed.
impl Default for MessageType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for MessageType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "offer" => Self::Offer,
            "answer" => Self::Answer,
            "ice-candidate" => Self::IceCandidate,
            "user-joined" => Self::UserJoined,
            "user-left" => Self::UserLeft,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<MessageType> for String {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::Other(kind) => kind,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire envelope relayed between peers of one room.
///
/// `data` is kept as raw JSON and written back out byte-for-byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    #[serde(rename = "type", default)]
    pub kind: MessageType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub from: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub to: String,
    /// `None` only when the key is absent; an explicit `null` is kept.
    #[serde(
        default,
        deserialize_with = "raw_keep_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Box<RawValue>>,
}

impl SignalMessage {
    pub fn new(kind: impl Into<MessageType>) -> Self {
        Self {
            kind: kind.into(),
            from: String::new(),
            to: String::new(),
            data: None,
        }
    }

    pub fn user_joined(user_id: UserId) -> Self {
        Self::new(MessageType::UserJoined).with_from(user_id)
    }

    pub fn user_left(user_id: UserId) -> Self {
        Self::new(MessageType::UserLeft).with_from(user_id)
    }

    pub fn with_from(mut self, user_id: UserId) -> Self {
        self.stamp_from(user_id);
        self
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    pub fn with_data(mut self, data: Box<RawValue>) -> Self {
        self.data = Some(data);
        self
    }

    /// Overwrites whatever `from` the client put in the frame.
    pub fn stamp_from(&mut self, user_id: UserId) {
        self.from = user_id.to_string();
    }

    /// `None` means broadcast to the rest of the room.
    pub fn recipient(&self) -> Option<&str> {
        (!self.to.is_empty()).then_some(self.to.as_str())
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn raw_keep_null<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

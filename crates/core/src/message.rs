//! Conversation turns and their parts.
//!
//! These are the value objects that flow from the caller through the cascade
//! to the provider. Turns are never mutated once built.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The model
    Model,
}

/// One piece of a turn: text or an inline binary attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        mime_type: String,
        /// Raw bytes, base64 on the wire
        #[serde(serialize_with = "to_base64", deserialize_with = "from_base64")]
        data: Vec<u8>,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// The text of a text part, `None` for attachments.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::InlineData { .. } => None,
        }
    }
}

fn to_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(data))
}

fn from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl ConversationTurn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// A user turn with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    /// A model turn with a single text part.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    /// Concatenated text of all text parts, attachments skipped.
    pub fn text(&self) -> String {
        joined_text(&self.parts)
    }
}

/// Concatenate the text parts of `parts`, skipping attachments.
pub fn joined_text(parts: &[Part]) -> String {
    parts.iter().filter_map(Part::as_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_text_skips_attachments() {
        let turn = ConversationTurn::new(
            Role::User,
            vec![
                Part::text("Look at "),
                Part::inline("image/png", vec![0x89, 0x50]),
                Part::text("this fuse box"),
            ],
        );
        assert_eq!(turn.text(), "Look at this fuse box");
    }

    #[test]
    fn inline_data_travels_as_base64() {
        let part = Part::inline("image/jpeg", b"abc".to_vec());
        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains(r#""type":"inline_data""#));
        assert!(json.contains(r#""data":"YWJj""#));

        let back: Part = serde_json::from_str(&json).unwrap();
        assert_eq!(back, part);
    }

    #[test]
    fn rejects_invalid_base64() {
        let json = r#"{"type":"inline_data","mime_type":"image/png","data":"!!!"}"#;
        assert!(serde_json::from_str::<Part>(json).is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let turn = ConversationTurn::model("Done.");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains(r#""role":"model""#));
    }
}

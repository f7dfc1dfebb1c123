//! Scannable code payload
//!
//! QR labels carry a small JSON object naming the record and its studio.
//! Anything that does not parse as such an object is treated as a bare unit
//! code.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadType {
    Equipment,
    Item,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPayload {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: PayloadType,
    pub studio_id: Uuid,
}

/// Decoded scanner text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePayload {
    Structured(LabelPayload),
    Bare(String),
}

impl CodePayload {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match serde_json::from_str::<LabelPayload>(trimmed) {
            Ok(payload) => CodePayload::Structured(payload),
            Err(_) => CodePayload::Bare(trimmed.to_string()),
        }
    }
}

impl LabelPayload {
    pub fn to_text(&self) -> String {
        // Serializing a struct of uuids and a unit enum cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_payload() {
        let id = Uuid::new_v4();
        let studio_id = Uuid::new_v4();
        let text = format!(r#"{{"id":"{}","type":"item","studio_id":"{}"}}"#, id, studio_id);

        assert_eq!(
            CodePayload::parse(&text),
            CodePayload::Structured(LabelPayload { id, kind: PayloadType::Item, studio_id })
        );
    }

    #[test]
    fn test_non_json_is_bare() {
        assert_eq!(CodePayload::parse(" CAM-001-AB12\n"), CodePayload::Bare("CAM-001-AB12".to_string()));
    }

    #[test]
    fn test_json_with_unknown_type_is_bare() {
        let text = r#"{"id":"x","type":"box","studio_id":"y"}"#;
        assert_eq!(CodePayload::parse(text), CodePayload::Bare(text.to_string()));
    }
}

//! Extracted document tree
//!
//! Mirrors the subset of the Document AI `Document` resource the pipeline
//! consumes. Field names follow the REST (camelCase) encoding so a
//! `process` response can be deserialized directly.

use serde::{Deserialize, Deserializer, Serialize};

/// Output of the extraction service for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full recognized text; every [`TextSegment`] indexes into it.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Document {
    pub fn new(text: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            text: text.into(),
            entities,
        }
    }

    /// Number of entities that will each emit one record.
    pub fn composite_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_composite()).count()
    }
}

/// A recognized field, possibly carrying nested property entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub mention_text: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub text_anchor: TextAnchor,
    #[serde(default)]
    pub properties: Vec<Entity>,
}

impl Entity {
    /// Leaf entity whose value is already materialized.
    pub fn leaf(entity_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            mention_text: text.into(),
            confidence: 1.0,
            ..Default::default()
        }
    }

    /// Leaf entity whose value has to be resolved from the document text.
    pub fn anchored(entity_type: impl Into<String>, segments: Vec<TextSegment>) -> Self {
        Self {
            entity_type: entity_type.into(),
            confidence: 1.0,
            text_anchor: TextAnchor {
                text_segments: segments,
                content: String::new(),
            },
            ..Default::default()
        }
    }

    pub fn composite(entity_type: impl Into<String>, properties: Vec<Entity>) -> Self {
        Self {
            entity_type: entity_type.into(),
            confidence: 1.0,
            properties,
            ..Default::default()
        }
    }

    /// Composite entities are decided by property count, never by type label.
    pub fn is_composite(&self) -> bool {
        !self.properties.is_empty()
    }

    /// Text already present on the entity: the anchor content, then the
    /// mention text. `None` when both are empty and the value must come from
    /// the anchor's segments.
    pub fn materialized_text(&self) -> Option<&str> {
        [self.text_anchor.content.as_str(), self.mention_text.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

/// Reference into [`Document::text`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnchor {
    #[serde(default)]
    pub text_segments: Vec<TextSegment>,
    #[serde(default)]
    pub content: String,
}

/// Half-open `[start_index, end_index)` range, counted in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    #[serde(default, deserialize_with = "int64")]
    pub start_index: u64,
    #[serde(default, deserialize_with = "int64")]
    pub end_index: u64,
}

impl TextSegment {
    pub fn new(start_index: u64, end_index: u64) -> Self {
        Self {
            start_index,
            end_index,
        }
    }
}

/// The REST encoding renders int64 fields as JSON strings.
fn int64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => s
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid int64 offset: {}", s))),
    }
}

//! Entity flattening
//!
//! Walks a document's top-level entities in order. Leaf entities accumulate
//! into the `primary` record; each composite entity closes a row made of
//! every primary field seen so far overlaid with the composite's own
//! properties.

use crate::span::{DocumentText, SpanError};
use docflow_core::{Document, Entity, Record};

/// Fold state of [`flatten`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenState {
    /// Leaf fields seen so far. Never cleared within a document.
    pub primary: Record,
    /// Properties of the composite currently being assembled.
    pub secondary: Record,
    /// Emitted rows, one per composite entity.
    pub output: Vec<Record>,
}

impl FlattenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one top-level entity.
    pub fn step(&mut self, entity: &Entity, text: &DocumentText<'_>) -> Result<(), SpanError> {
        if !entity.is_composite() {
            let value = entity_value(entity, text)?;
            self.primary.insert(entity.entity_type.clone(), value);
            return Ok(());
        }

        for property in &entity.properties {
            let value = entity_value(property, text)?;
            self.secondary.insert(property.entity_type.clone(), value);
        }
        self.output
            .push(Record::merged(&self.primary, &self.secondary));
        self.secondary.clear();
        Ok(())
    }

    pub fn into_records(self) -> Vec<Record> {
        self.output
    }
}

/// Materialized text when present, otherwise the resolved anchor.
fn entity_value(entity: &Entity, text: &DocumentText<'_>) -> Result<String, SpanError> {
    match entity.materialized_text() {
        Some(value) => Ok(value.to_string()),
        None => text.resolve(&entity.text_anchor.text_segments),
    }
}

/// Flatten a document into one record per composite entity, in order.
pub fn flatten(document: &Document) -> Result<Vec<Record>, SpanError> {
    let text = DocumentText::new(&document.text);
    let mut state = FlattenState::new();
    for entity in &document.entities {
        state.step(entity, &text)?;
    }

    tracing::debug!(
        entities = document.entities.len(),
        records = state.output.len(),
        primary_fields = state.primary.len(),
        "Document flattened"
    );

    Ok(state.into_records())
}

//! Built-in document factory.
//!
//! # Responsibility
//! - Build brand-new document values from creation parameters for
//!   `Create` intents.
//!
//! # Invariants
//! - The produced document carries the requested title, the declared
//!   `type` and the creating user's `creator` stamp.
//! - Blank field names in the creation input are dropped, never stored.

use crate::model::document::{Document, FIELD_CREATOR, FIELD_TYPE};
use crate::store::contracts::DocumentFactory;
use crate::store::error::StoreResult;
use std::collections::BTreeMap;

/// Default factory used when no external document construction policy is
/// wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDocumentFactory;

impl StandardDocumentFactory {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentFactory for StandardDocumentFactory {
    fn create(
        &self,
        user: &str,
        title: &str,
        kind: &str,
        fields: &BTreeMap<String, String>,
    ) -> StoreResult<Document> {
        let mut document = Document::new(title);
        for (name, value) in fields {
            if name.trim().is_empty() {
                continue;
            }
            document.fields.insert(name.clone(), value.clone());
        }
        document
            .fields
            .insert(FIELD_TYPE.to_string(), kind.to_string());
        document
            .fields
            .insert(FIELD_CREATOR.to_string(), user.to_string());
        Ok(document)
    }
}

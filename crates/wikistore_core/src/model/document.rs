//! Document domain model.
//!
//! # Responsibility
//! - Define the canonical titled field-map record stored in bags.
//! - Provide validation gates used by every write path.
//!
//! # Invariants
//! - `title` is never blank for a persisted document.
//! - Field names are never blank; field values are free-form text.
//! - The declared content type lives in the reserved `type` field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reserved field holding the declared content type.
pub const FIELD_TYPE: &str = "type";

/// Reserved field holding the creating user.
pub const FIELD_CREATOR: &str = "creator";

/// Content type assumed when a document declares none.
pub const DEFAULT_DOCUMENT_KIND: &str = "text/vnd.wiki";

/// One titled unit of wiki content: a flat map of named text fields.
///
/// Documents are deliberately schema-free beyond the title; projections
/// (rendering, search, policy) interpret individual fields themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Title, unique within one bag.
    pub title: String,
    /// Named text fields, including the reserved `type`/`creator` entries.
    pub fields: BTreeMap<String, String>,
}

/// Validation failures for document shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    BlankTitle,
    BlankFieldName { title: String },
}

impl Display for DocumentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "document title must not be blank"),
            Self::BlankFieldName { title } => {
                write!(f, "document `{title}` contains a blank field name")
            }
        }
    }
}

impl Error for DocumentValidationError {}

impl Document {
    /// Creates a document with the given title and no fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Creates a document from a prepared field map.
    pub fn with_fields(title: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }

    /// Builder-style helper used by tests and seed code.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the declared content type, falling back to the default.
    pub fn kind(&self) -> &str {
        self.fields
            .get(FIELD_TYPE)
            .map(String::as_str)
            .unwrap_or(DEFAULT_DOCUMENT_KIND)
    }

    /// Checks shape invariants. Write paths must call this before any
    /// persistence mutation.
    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        if self.title.trim().is_empty() {
            return Err(DocumentValidationError::BlankTitle);
        }
        if self.fields.keys().any(|name| name.trim().is_empty()) {
            return Err(DocumentValidationError::BlankFieldName {
                title: self.title.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentValidationError, DEFAULT_DOCUMENT_KIND};

    #[test]
    fn kind_falls_back_to_default_content_type() {
        let doc = Document::new("Index");
        assert_eq!(doc.kind(), DEFAULT_DOCUMENT_KIND);

        let typed = Document::new("Index").field("type", "text/markdown");
        assert_eq!(typed.kind(), "text/markdown");
    }

    #[test]
    fn validate_rejects_blank_title() {
        let doc = Document::new("   ");
        assert_eq!(
            doc.validate().unwrap_err(),
            DocumentValidationError::BlankTitle
        );
    }

    #[test]
    fn validate_rejects_blank_field_name() {
        let doc = Document::new("Index").field("  ", "value");
        assert!(matches!(
            doc.validate().unwrap_err(),
            DocumentValidationError::BlankFieldName { .. }
        ));
    }

    #[test]
    fn validate_accepts_regular_document() {
        let doc = Document::new("Index").field("text", "hello");
        assert!(doc.validate().is_ok());
    }
}

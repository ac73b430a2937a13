//! Storage keys, revisions and update intents.
//!
//! # Responsibility
//! - Define fully-qualified bag/recipe keys and their naming rules.
//! - Define the opaque optimistic-concurrency revision token.
//! - Define the tagged update/create intent applied by write operations.
//!
//! # Invariants
//! - Wiki, bag and recipe names are non-blank, contain no control
//!   characters and no `/` separator.
//! - `Revision` is equality-comparable only; ordering two revisions is
//!   meaningless and deliberately unsupported.

use crate::model::document::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static VALID_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^/\x00-\x1f\x7f]+$").expect("valid name regex"));

/// Naming-rule violations for wiki/bag/recipe identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValidationError {
    BlankName { role: &'static str },
    InvalidName { role: &'static str, value: String },
}

impl Display for KeyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName { role } => write!(f, "{role} name must not be blank"),
            Self::InvalidName { role, value } => {
                write!(f, "{role} name is invalid: `{value}`")
            }
        }
    }
}

impl Error for KeyValidationError {}

fn validate_name(role: &'static str, value: &str) -> Result<(), KeyValidationError> {
    if value.trim().is_empty() {
        return Err(KeyValidationError::BlankName { role });
    }
    if !VALID_NAME_RE.is_match(value) {
        return Err(KeyValidationError::InvalidName {
            role,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Fully-qualified partition key: one named bag inside one wiki.
///
/// The bag is the atomic unit of both storage and permission evaluation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BagKey {
    pub wiki: String,
    pub bag: String,
}

impl BagKey {
    pub fn new(wiki: impl Into<String>, bag: impl Into<String>) -> Self {
        Self {
            wiki: wiki.into(),
            bag: bag.into(),
        }
    }

    /// Checks naming rules for both components.
    pub fn validate(&self) -> Result<(), KeyValidationError> {
        validate_name("wiki", &self.wiki)?;
        validate_name("bag", &self.bag)
    }
}

impl Display for BagKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.wiki, self.bag)
    }
}

/// Fully-qualified recipe key: one named bag layering inside one wiki.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeKey {
    pub wiki: String,
    pub recipe: String,
}

impl RecipeKey {
    pub fn new(wiki: impl Into<String>, recipe: impl Into<String>) -> Self {
        Self {
            wiki: wiki.into(),
            recipe: recipe.into(),
        }
    }

    /// Checks naming rules for both components.
    pub fn validate(&self) -> Result<(), KeyValidationError> {
        validate_name("wiki", &self.wiki)?;
        validate_name("recipe", &self.recipe)
    }
}

impl Display for RecipeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.wiki, self.recipe)
    }
}

/// Opaque optimistic-concurrency version token.
///
/// Only equality is meaningful. Two tokens from different (bag, title)
/// pairs never relate to each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision(String);

impl Revision {
    /// Wraps a stored token read back from persistence.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Mints a fresh token for a newly committed document version.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully-addressed document plus the revision that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedRecord {
    /// Bag that holds the document.
    pub bag: BagKey,
    /// Document value; its `title` addresses it within the bag.
    pub document: Document,
    /// Revision of this exact stored version.
    pub revision: Revision,
}

impl QualifiedRecord {
    pub fn title(&self) -> &str {
        &self.document.title
    }
}

/// Access mode a recipe is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

impl AccessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Tagged mutation applied by write operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateIntent {
    /// Shallow top-level merge into an existing document. Fails when the
    /// target does not exist. The expected revision, when present, gates
    /// the commit inside persistence.
    Update {
        fields: BTreeMap<String, String>,
        expected_revision: Option<Revision>,
    },
    /// Factory-built brand-new document, replacing any existing one of the
    /// same title. Always a blind write.
    Create {
        kind: String,
        fields: BTreeMap<String, String>,
    },
}

impl UpdateIntent {
    /// Candidate content handed to content-sensitive write policy.
    pub fn candidate_fields(&self) -> &BTreeMap<String, String> {
        match self {
            Self::Update { fields, .. } => fields,
            Self::Create { fields, .. } => fields,
        }
    }

    /// Expected-revision gate for the compare-and-swap; `Create` intents
    /// are unconditional.
    pub fn expected_revision(&self) -> Option<&Revision> {
        match self {
            Self::Update {
                expected_revision, ..
            } => expected_revision.as_ref(),
            Self::Create { .. } => None,
        }
    }
}

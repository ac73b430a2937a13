//! Store boundary error taxonomy.
//!
//! # Responsibility
//! - Define the status-coded failure kinds every store operation can
//!   surface: BadRequest, Forbidden, NotFound, Conflict.
//! - Keep internal invariant violations distinct from user-facing errors.
//!
//! # Invariants
//! - Policy denials and revision conflicts propagate unmodified through
//!   the transaction boundary; nothing is swallowed or retried here.
//! - A committed write path that yields no record is `InconsistentState`,
//!   never a silent empty success.

use crate::db::DbError;
use crate::model::document::DocumentValidationError;
use crate::model::keys::KeyValidationError;
use crate::store::contracts::AccessDecision;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure kinds surfaced by store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Malformed request, e.g. an update intent against a missing document.
    BadRequest(String),
    /// Permission denial; carries every collaborator-supplied reason
    /// aggregated into one message.
    Forbidden(String),
    /// Missing document or unresolvable recipe.
    NotFound(String),
    /// Expected-revision mismatch detected at commit time.
    Conflict(String),
    /// Committed transaction yielded no usable result on a write path.
    InconsistentState(&'static str),
    /// Corrupt persisted state; surfaced instead of masked.
    InvalidData(String),
    /// Storage transport failure, re-thrown verbatim.
    Db(DbError),
}

impl StoreError {
    /// Builds one `Forbidden` error aggregating every denied decision.
    ///
    /// Decisions that were allowed are ignored; denied decisions without a
    /// collaborator reason fall back to naming the bag.
    pub fn forbidden(decisions: &[AccessDecision]) -> Self {
        let reasons: Vec<String> = decisions
            .iter()
            .filter(|decision| !decision.allowed)
            .map(|decision| match &decision.reason {
                Some(reason) => reason.clone(),
                None => format!("access denied for bag `{}`", decision.bag),
            })
            .collect();
        Self::Forbidden(reasons.join("; "))
    }

    /// Stable status label used in logs and outer transports.
    pub fn status(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::InconsistentState(_) => "inconsistent_state",
            Self::InvalidData(_) => "invalid_data",
            Self::Db(_) => "db_error",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::Forbidden(reasons) => write!(f, "forbidden: {reasons}"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent store state: {details}")
            }
            Self::InvalidData(message) => {
                write!(f, "invalid persisted document data: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<KeyValidationError> for StoreError {
    fn from(value: KeyValidationError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

impl From<DocumentValidationError> for StoreError {
    fn from(value: DocumentValidationError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::StoreError;
    use crate::model::keys::BagKey;
    use crate::store::contracts::AccessDecision;

    #[test]
    fn forbidden_aggregates_only_denied_reasons() {
        let decisions = vec![
            AccessDecision {
                bag: BagKey::new("docs", "content"),
                allowed: true,
                reason: None,
            },
            AccessDecision {
                bag: BagKey::new("docs", "private"),
                allowed: false,
                reason: Some("private bag is owner-only".to_string()),
            },
            AccessDecision {
                bag: BagKey::new("docs", "archive"),
                allowed: false,
                reason: None,
            },
        ];

        let err = StoreError::forbidden(&decisions);
        let message = err.to_string();
        assert!(message.contains("private bag is owner-only"));
        assert!(message.contains("access denied for bag `docs/archive`"));
        assert!(!message.contains("docs/content"));
    }
}

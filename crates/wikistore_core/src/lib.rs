//! Document-access core for a layered wiki content store.
//!
//! Bags hold titled documents; recipes layer bags into named views. The
//! `DocumentStore` facade resolves recipes, evaluates per-bag access
//! policy and performs optimistic-concurrency compare-and-swap writes,
//! all against pluggable collaborator contracts.

pub mod db;
pub mod logging;
pub mod model;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{
    Document, DocumentValidationError, DEFAULT_DOCUMENT_KIND, FIELD_CREATOR, FIELD_TYPE,
};
pub use model::keys::{
    AccessMode, BagKey, KeyValidationError, QualifiedRecord, RecipeKey, Revision, UpdateIntent,
};
pub use store::bound::{BoundReadOutcome, BoundRecord, BoundStore};
pub use store::contracts::{
    AccessDecision, DocumentFactory, Persistence, PolicyChecker, RecipeResolver,
    TransactionRunner, Updater,
};
pub use store::error::{StoreError, StoreResult};
pub use store::facade::{DocumentStore, ReadOutcome};
pub use store::factory::StandardDocumentFactory;
pub use store::policy::OpenAccessPolicy;
pub use store::resolver::{RecipeRegistrationError, StaticRecipeResolver};
pub use store::sqlite::{SqlitePersistence, SqliteTransactionRunner};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

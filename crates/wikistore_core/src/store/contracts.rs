//! Collaborator contracts required by the document store facade.
//!
//! # Responsibility
//! - Define the persistence, transaction, policy, resolver and factory
//!   interfaces the facade orchestrates.
//! - Keep the facade decoupled from any concrete storage or policy engine.
//!
//! # Invariants
//! - `read_many` returns records grouped in exactly the supplied bag
//!   order; first-occurrence-wins merging depends on it.
//! - The expected-revision gate is enforced inside `compare_and_swap`,
//!   never by the updater function itself.
//! - Policy decision lists are parallel to the bag list they were asked
//!   about.

use crate::model::document::Document;
use crate::model::keys::{AccessMode, BagKey, QualifiedRecord, RecipeKey, Revision};
use crate::store::error::StoreResult;
use std::collections::BTreeMap;

/// Pure mutation applied under compare-and-swap: current value in,
/// next value out. `None` means absence on either side.
pub type Updater<'a> = dyn FnMut(Option<Document>) -> StoreResult<Option<Document>> + 'a;

/// Transaction-scoped document access keyed by (bag, title).
pub trait Persistence {
    /// Reads one record, or `None` when the title is absent from the bag.
    fn read_one(&self, bag: &BagKey, title: &str) -> StoreResult<Option<QualifiedRecord>>;

    /// Reads every record of every listed bag. Records are grouped by bag
    /// in exactly the order the bags were supplied; order within one bag
    /// is unspecified.
    fn read_many(&self, bags: &[BagKey]) -> StoreResult<Vec<QualifiedRecord>>;

    /// Runs `updater` against the current value and commits its output:
    /// `Some(document)` upserts under a fresh revision and returns the new
    /// record, `None` deletes and returns `None`.
    ///
    /// When `expected` is supplied and does not match the stored revision
    /// at commit time the whole swap fails `Conflict` and the updater
    /// output is discarded. When absent the write is unconditional.
    fn compare_and_swap(
        &self,
        bag: &BagKey,
        title: &str,
        updater: &mut Updater<'_>,
        expected: Option<&Revision>,
    ) -> StoreResult<Option<QualifiedRecord>>;
}

/// Executes one unit of work atomically against one persistence handle.
pub trait TransactionRunner {
    /// Runs `work` inside exactly one transaction scope. The handle is
    /// valid only for the callback's lifetime. Callback failures propagate
    /// unchanged and roll the transaction back; no retry happens here.
    fn run<T, W>(&self, user: &str, work: W) -> StoreResult<T>
    where
        W: FnOnce(&dyn Persistence) -> StoreResult<T>;
}

/// One per-bag permission verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub bag: BagKey,
    pub allowed: bool,
    /// Collaborator-supplied denial reason; meaningful when `!allowed`.
    pub reason: Option<String>,
}

/// Yields allow/deny decisions per bag for read/write/remove intents.
///
/// Implementations may consult persistence (ACL documents and the like)
/// through the supplied handle, and may be content-sensitive via
/// `candidate_fields` on write checks.
pub trait PolicyChecker {
    fn check_read(
        &self,
        db: &dyn Persistence,
        user: &str,
        bags: &[BagKey],
        title: Option<&str>,
    ) -> StoreResult<Vec<AccessDecision>>;

    fn check_write(
        &self,
        db: &dyn Persistence,
        user: &str,
        bags: &[BagKey],
        title: Option<&str>,
        candidate_fields: Option<&BTreeMap<String, String>>,
    ) -> StoreResult<Vec<AccessDecision>>;

    fn check_remove(
        &self,
        db: &dyn Persistence,
        user: &str,
        bags: &[BagKey],
        title: Option<&str>,
    ) -> StoreResult<Vec<AccessDecision>>;
}

/// Expands a named recipe into an ordered bag list for one access mode.
pub trait RecipeResolver {
    /// Returns the authoritative bag order for one operation. An empty
    /// list is the "recipe not found" sentinel.
    fn resolve(
        &self,
        user: &str,
        mode: AccessMode,
        db: &dyn Persistence,
        recipe: &RecipeKey,
    ) -> StoreResult<Vec<BagKey>>;
}

/// Builds a brand-new document value from creation parameters.
pub trait DocumentFactory {
    fn create(
        &self,
        user: &str,
        title: &str,
        kind: &str,
        fields: &BTreeMap<String, String>,
    ) -> StoreResult<Document>;
}

//! Session-bound store adapter.
//!
//! # Responsibility
//! - Curry a fixed (user, wiki) pair over every facade operation.
//! - Convert fully-qualified records into simplified (bag, document,
//!   revision) triples with the wiki wrapper dropped.
//!
//! # Invariants
//! - Result cardinality is preserved exactly: a single record maps to a
//!   single record, a collection maps elementwise to a collection. No
//!   promotion or demotion ever happens here.

use crate::model::document::Document;
use crate::model::keys::{BagKey, QualifiedRecord, RecipeKey, Revision, UpdateIntent};
use crate::store::contracts::{
    DocumentFactory, PolicyChecker, RecipeResolver, TransactionRunner,
};
use crate::store::facade::{DocumentStore, ReadOutcome};
use crate::store::error::StoreResult;

/// Record shape handed to session callers: the wiki component is implied
/// by the binding and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRecord {
    /// Bare bag name within the bound wiki.
    pub bag: String,
    pub document: Document,
    pub revision: Revision,
}

/// Read result with the facade's cardinality preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundReadOutcome {
    Single(BoundRecord),
    Collection(Vec<BoundRecord>),
}

/// Facade wrapper currying one (user, wiki) pair for a session.
pub struct BoundStore<'a, R, P, Q, F> {
    store: &'a DocumentStore<R, P, Q, F>,
    user: String,
    wiki: String,
}

impl<'a, R, P, Q, F> BoundStore<'a, R, P, Q, F>
where
    R: TransactionRunner,
    P: PolicyChecker,
    Q: RecipeResolver,
    F: DocumentFactory,
{
    pub fn new(
        store: &'a DocumentStore<R, P, Q, F>,
        user: impl Into<String>,
        wiki: impl Into<String>,
    ) -> Self {
        Self {
            store,
            user: user.into(),
            wiki: wiki.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn wiki(&self) -> &str {
        &self.wiki
    }

    pub fn read_from_bag(&self, bag: &str, title: Option<&str>) -> StoreResult<BoundReadOutcome> {
        let key = self.bag_key(bag);
        let outcome = self.store.read_from_bag(&self.user, &key, title)?;
        Ok(simplify_outcome(outcome))
    }

    pub fn read_from_recipe(
        &self,
        recipe: &str,
        title: Option<&str>,
    ) -> StoreResult<BoundReadOutcome> {
        let key = self.recipe_key(recipe);
        let outcome = self.store.read_from_recipe(&self.user, &key, title)?;
        Ok(simplify_outcome(outcome))
    }

    pub fn write_to_bag(
        &self,
        bag: &str,
        title: &str,
        intent: &UpdateIntent,
    ) -> StoreResult<BoundRecord> {
        let key = self.bag_key(bag);
        let record = self.store.write_to_bag(&self.user, &key, title, intent)?;
        Ok(simplify_record(record))
    }

    pub fn write_to_recipe(
        &self,
        recipe: &str,
        title: &str,
        intent: &UpdateIntent,
    ) -> StoreResult<BoundRecord> {
        let key = self.recipe_key(recipe);
        let record = self.store.write_to_recipe(&self.user, &key, title, intent)?;
        Ok(simplify_record(record))
    }

    pub fn remove_from_bag(
        &self,
        bag: &str,
        title: &str,
        expected: Option<&Revision>,
    ) -> StoreResult<bool> {
        let key = self.bag_key(bag);
        self.store.remove_from_bag(&self.user, &key, title, expected)
    }

    fn bag_key(&self, bag: &str) -> BagKey {
        BagKey::new(self.wiki.clone(), bag)
    }

    fn recipe_key(&self, recipe: &str) -> RecipeKey {
        RecipeKey::new(self.wiki.clone(), recipe)
    }
}

fn simplify_record(record: QualifiedRecord) -> BoundRecord {
    BoundRecord {
        bag: record.bag.bag,
        document: record.document,
        revision: record.revision,
    }
}

fn simplify_outcome(outcome: ReadOutcome) -> BoundReadOutcome {
    match outcome {
        ReadOutcome::Single(record) => BoundReadOutcome::Single(simplify_record(record)),
        ReadOutcome::Collection(records) => BoundReadOutcome::Collection(
            records.into_iter().map(simplify_record).collect(),
        ),
    }
}

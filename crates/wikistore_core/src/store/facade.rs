//! Document store facade: the orchestration core.
//!
//! # Responsibility
//! - Tie recipe resolution, policy evaluation and compare-and-swap
//!   read/modify/write together into bag- and recipe-level operations.
//! - Build the updater functions handed to persistence for each intent.
//!
//! # Invariants
//! - Every operation runs inside exactly one transaction scope; the
//!   facade never retries and takes no locks of its own.
//! - Recipe resolution order is authoritative for the whole call; recipe
//!   reads dedupe by title keeping the first occurrence in that order.
//! - Recipe reads require every resolved bag to be readable; recipe
//!   writes take the first writable bag. The asymmetry is deliberate
//!   observed behavior and must not be unified.

use crate::model::document::Document;
use crate::model::keys::{
    AccessMode, BagKey, QualifiedRecord, RecipeKey, Revision, UpdateIntent,
};
use crate::store::contracts::{
    AccessDecision, DocumentFactory, Persistence, PolicyChecker, RecipeResolver,
    TransactionRunner,
};
use crate::store::error::{StoreError, StoreResult};
use std::collections::HashSet;
use std::slice;

const WRITE_YIELDED_NO_RECORD: &str = "committed write compare-and-swap yielded no record";
const DECISION_LIST_MISMATCH: &str = "policy decision list is not parallel to the bag list";

/// Result of a read operation: one addressed record, or a bag/recipe
/// collection. The distinction is preserved all the way to adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Single(QualifiedRecord),
    Collection(Vec<QualifiedRecord>),
}

/// Orchestration facade over the four collaborator contracts.
///
/// Assembled once at the composition root with explicit constructor
/// arguments; no runtime wiring beyond that.
pub struct DocumentStore<R, P, Q, F> {
    runner: R,
    policy: P,
    resolver: Q,
    factory: F,
}

impl<R, P, Q, F> DocumentStore<R, P, Q, F>
where
    R: TransactionRunner,
    P: PolicyChecker,
    Q: RecipeResolver,
    F: DocumentFactory,
{
    pub fn new(runner: R, policy: P, resolver: Q, factory: F) -> Self {
        Self {
            runner,
            policy,
            resolver,
            factory,
        }
    }

    /// Reads one titled document, or the whole collection, from a single
    /// bag. Read permission for the bag is required either way.
    pub fn read_from_bag(
        &self,
        user: &str,
        bag: &BagKey,
        title: Option<&str>,
    ) -> StoreResult<ReadOutcome> {
        bag.validate()?;
        self.runner.run(user, |db| {
            let decisions = self
                .policy
                .check_read(db, user, slice::from_ref(bag), title)?;
            require_all_allowed(&decisions, 1)?;

            match title {
                Some(title) => {
                    let record = db.read_one(bag, title)?.ok_or_else(|| {
                        StoreError::NotFound(format!(
                            "document `{title}` not found in bag `{bag}`"
                        ))
                    })?;
                    Ok(ReadOutcome::Single(record))
                }
                None => {
                    let records = db.read_many(slice::from_ref(bag))?;
                    Ok(ReadOutcome::Collection(records))
                }
            }
        })
    }

    /// Reads through a recipe's layered bags. Every resolved bag must be
    /// readable; any denial fails the whole call. With a title the bags
    /// are scanned in resolution order and the first match wins; without
    /// one the collections are merged, earlier bags shadowing later ones.
    pub fn read_from_recipe(
        &self,
        user: &str,
        recipe: &RecipeKey,
        title: Option<&str>,
    ) -> StoreResult<ReadOutcome> {
        recipe.validate()?;
        self.runner.run(user, |db| {
            let bags = self.resolver.resolve(user, AccessMode::Read, db, recipe)?;
            if bags.is_empty() {
                return Err(StoreError::NotFound(format!("recipe not found: `{recipe}`")));
            }

            let decisions = self.policy.check_read(db, user, &bags, title)?;
            require_all_allowed(&decisions, bags.len())?;

            match title {
                Some(title) => {
                    for bag in &bags {
                        if let Some(record) = db.read_one(bag, title)? {
                            return Ok(ReadOutcome::Single(record));
                        }
                    }
                    Err(StoreError::NotFound(format!(
                        "document `{title}` not found in recipe `{recipe}`"
                    )))
                }
                None => {
                    let records = db.read_many(&bags)?;
                    Ok(ReadOutcome::Collection(merge_first_occurrence(records)))
                }
            }
        })
    }

    /// Applies an update/create intent to one bag. Write policy sees the
    /// candidate content, so it may be content-sensitive.
    pub fn write_to_bag(
        &self,
        user: &str,
        bag: &BagKey,
        title: &str,
        intent: &UpdateIntent,
    ) -> StoreResult<QualifiedRecord> {
        bag.validate()?;
        self.runner.run(user, |db| {
            let decisions = self.policy.check_write(
                db,
                user,
                slice::from_ref(bag),
                Some(title),
                Some(intent.candidate_fields()),
            )?;
            require_all_allowed(&decisions, 1)?;
            self.swap_with_intent(db, user, bag, title, intent)
        })
    }

    /// Applies an update/create intent through a recipe: bags are checked
    /// for write permission in resolution order and the FIRST allowed one
    /// receives the write. Only when no bag allows it does the call fail,
    /// aggregating every denial reason.
    pub fn write_to_recipe(
        &self,
        user: &str,
        recipe: &RecipeKey,
        title: &str,
        intent: &UpdateIntent,
    ) -> StoreResult<QualifiedRecord> {
        recipe.validate()?;
        self.runner.run(user, |db| {
            let bags = self.resolver.resolve(user, AccessMode::Write, db, recipe)?;
            if bags.is_empty() {
                return Err(StoreError::NotFound(format!("recipe not found: `{recipe}`")));
            }

            let decisions = self.policy.check_write(
                db,
                user,
                &bags,
                Some(title),
                Some(intent.candidate_fields()),
            )?;
            if decisions.len() != bags.len() {
                return Err(StoreError::InconsistentState(DECISION_LIST_MISMATCH));
            }

            let target = match decisions.iter().find(|decision| decision.allowed) {
                Some(decision) => decision.bag.clone(),
                None => return Err(StoreError::forbidden(&decisions)),
            };
            self.swap_with_intent(db, user, &target, title, intent)
        })
    }

    /// Removes one titled document, gated by an optional expected
    /// revision. Returns whether a document existed immediately before
    /// removal, independent of the deletion being a no-op.
    pub fn remove_from_bag(
        &self,
        user: &str,
        bag: &BagKey,
        title: &str,
        expected: Option<&Revision>,
    ) -> StoreResult<bool> {
        bag.validate()?;
        self.runner.run(user, |db| {
            let decisions = self
                .policy
                .check_remove(db, user, slice::from_ref(bag), Some(title))?;
            require_all_allowed(&decisions, 1)?;

            let mut existed = false;
            let mut updater = |current: Option<Document>| -> StoreResult<Option<Document>> {
                existed = current.is_some();
                Ok(None)
            };
            db.compare_and_swap(bag, title, &mut updater, expected)?;
            Ok(existed)
        })
    }

    fn swap_with_intent(
        &self,
        db: &dyn Persistence,
        user: &str,
        bag: &BagKey,
        title: &str,
        intent: &UpdateIntent,
    ) -> StoreResult<QualifiedRecord> {
        let mut updater = intent_updater(&self.factory, user, title, intent);
        let record = db.compare_and_swap(bag, title, &mut updater, intent.expected_revision())?;
        record.ok_or(StoreError::InconsistentState(WRITE_YIELDED_NO_RECORD))
    }
}

/// Builds the optional-document-to-optional-document function handed to
/// persistence for one write intent.
///
/// - `Update`: requires a current value and shallow-merges the supplied
///   fields over it; same-named top-level fields are replaced, everything
///   else is retained. Not a deep merge.
/// - `Create`: ignores any current value and asks the factory for a
///   brand-new document, replacing an existing one of the same title.
fn intent_updater<'a, F: DocumentFactory>(
    factory: &'a F,
    user: &'a str,
    title: &'a str,
    intent: &'a UpdateIntent,
) -> impl FnMut(Option<Document>) -> StoreResult<Option<Document>> + 'a {
    move |current| match intent {
        UpdateIntent::Update { fields, .. } => {
            let mut document = current.ok_or_else(|| {
                StoreError::BadRequest(format!(
                    "update targets nonexistent document `{title}`"
                ))
            })?;
            for (name, value) in fields {
                document.fields.insert(name.clone(), value.clone());
            }
            Ok(Some(document))
        }
        UpdateIntent::Create { kind, fields } => {
            let document = factory.create(user, title, kind, fields)?;
            Ok(Some(document))
        }
    }
}

/// Deduplicates merged recipe records by title, keeping only the first
/// occurrence. Relies on `read_many` preserving resolver bag order.
fn merge_first_occurrence(records: Vec<QualifiedRecord>) -> Vec<QualifiedRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.title().to_string()) {
            merged.push(record);
        }
    }
    merged
}

fn require_all_allowed(decisions: &[AccessDecision], expected_len: usize) -> StoreResult<()> {
    if decisions.len() != expected_len {
        return Err(StoreError::InconsistentState(DECISION_LIST_MISMATCH));
    }
    if decisions.iter().any(|decision| !decision.allowed) {
        return Err(StoreError::forbidden(decisions));
    }
    Ok(())
}

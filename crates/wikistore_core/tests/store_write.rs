use std::collections::BTreeMap;

use wikistore_core::db::open_db_in_memory;
use wikistore_core::{
    AccessDecision, BagKey, DocumentStore, Persistence, PolicyChecker, ReadOutcome, RecipeKey,
    SqliteTransactionRunner, StandardDocumentFactory, StaticRecipeResolver, StoreError,
    StoreResult, UpdateIntent,
};

/// Policy mock denying writes on listed bag names. Reads are always
/// allowed; write denial can also be triggered by candidate content
/// carrying a `quarantine` field.
struct WriteDenials {
    denied: BTreeMap<String, String>,
}

impl WriteDenials {
    fn none() -> Self {
        Self {
            denied: BTreeMap::new(),
        }
    }

    fn deny(mut self, bag: &str, reason: &str) -> Self {
        self.denied.insert(bag.to_string(), reason.to_string());
        self
    }
}

impl PolicyChecker for WriteDenials {
    fn check_read(
        &self,
        _db: &dyn Persistence,
        _user: &str,
        bags: &[BagKey],
        _title: Option<&str>,
    ) -> StoreResult<Vec<AccessDecision>> {
        Ok(bags
            .iter()
            .map(|bag| AccessDecision {
                bag: bag.clone(),
                allowed: true,
                reason: None,
            })
            .collect())
    }

    fn check_write(
        &self,
        _db: &dyn Persistence,
        _user: &str,
        bags: &[BagKey],
        _title: Option<&str>,
        candidate_fields: Option<&BTreeMap<String, String>>,
    ) -> StoreResult<Vec<AccessDecision>> {
        let quarantined = candidate_fields
            .map(|fields| fields.contains_key("quarantine"))
            .unwrap_or(false);

        Ok(bags
            .iter()
            .map(|bag| {
                if quarantined {
                    return AccessDecision {
                        bag: bag.clone(),
                        allowed: false,
                        reason: Some("quarantined content is not writable".to_string()),
                    };
                }
                match self.denied.get(&bag.bag) {
                    Some(reason) => AccessDecision {
                        bag: bag.clone(),
                        allowed: false,
                        reason: Some(reason.clone()),
                    },
                    None => AccessDecision {
                        bag: bag.clone(),
                        allowed: true,
                        reason: None,
                    },
                }
            })
            .collect())
    }

    fn check_remove(
        &self,
        _db: &dyn Persistence,
        _user: &str,
        bags: &[BagKey],
        _title: Option<&str>,
    ) -> StoreResult<Vec<AccessDecision>> {
        Ok(bags
            .iter()
            .map(|bag| AccessDecision {
                bag: bag.clone(),
                allowed: true,
                reason: None,
            })
            .collect())
    }
}

type TestStore = DocumentStore<
    SqliteTransactionRunner,
    WriteDenials,
    StaticRecipeResolver,
    StandardDocumentFactory,
>;

fn store_with_policy(policy: WriteDenials) -> TestStore {
    let conn = open_db_in_memory().unwrap();
    let runner = SqliteTransactionRunner::try_new(conn).unwrap();

    let mut resolver = StaticRecipeResolver::new();
    resolver
        .register(
            RecipeKey::new("docs", "main"),
            vec![BagKey::new("docs", "user"), BagKey::new("docs", "site")],
        )
        .unwrap();

    DocumentStore::new(runner, policy, resolver, StandardDocumentFactory::new())
}

fn create_intent(text: &str) -> UpdateIntent {
    let mut fields = BTreeMap::new();
    fields.insert("text".to_string(), text.to_string());
    UpdateIntent::Create {
        kind: "text/vnd.wiki".to_string(),
        fields,
    }
}

fn update_intent(fields: &[(&str, &str)]) -> UpdateIntent {
    UpdateIntent::Update {
        fields: fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        expected_revision: None,
    }
}

#[test]
fn recipe_write_falls_back_to_first_allowed_bag() {
    let store = store_with_policy(WriteDenials::none().deny("user", "user bag is read-only"));

    let record = store
        .write_to_recipe(
            "alice",
            &RecipeKey::new("docs", "main"),
            "Index",
            &create_intent("hello"),
        )
        .unwrap();
    assert_eq!(record.bag.bag, "site");

    // The write landed only in the selected bag.
    let err = store
        .read_from_bag("alice", &BagKey::new("docs", "user"), Some("Index"))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn recipe_write_with_all_denied_aggregates_every_reason() {
    let store = store_with_policy(
        WriteDenials::none()
            .deny("user", "user bag is read-only")
            .deny("site", "site bag is frozen"),
    );

    let err = store
        .write_to_recipe(
            "alice",
            &RecipeKey::new("docs", "main"),
            "Index",
            &create_intent("hello"),
        )
        .unwrap_err();
    match err {
        StoreError::Forbidden(message) => {
            assert!(message.contains("user bag is read-only"));
            assert!(message.contains("site bag is frozen"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn recipe_write_prefers_earliest_allowed_bag() {
    let store = store_with_policy(WriteDenials::none());

    let record = store
        .write_to_recipe(
            "alice",
            &RecipeKey::new("docs", "main"),
            "Index",
            &create_intent("hello"),
        )
        .unwrap();
    assert_eq!(record.bag.bag, "user");
}

#[test]
fn unknown_recipe_write_fails_not_found() {
    let store = store_with_policy(WriteDenials::none());

    let err = store
        .write_to_recipe(
            "alice",
            &RecipeKey::new("docs", "nope"),
            "Index",
            &create_intent("hello"),
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn update_intent_against_missing_title_is_bad_request() {
    let store = store_with_policy(WriteDenials::none());

    let err = store
        .write_to_bag(
            "alice",
            &BagKey::new("docs", "user"),
            "Missing",
            &update_intent(&[("text", "new")]),
        )
        .unwrap_err();
    match err {
        StoreError::BadRequest(message) => {
            assert!(message.contains("nonexistent document"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn update_intent_merges_shallowly_and_retains_other_fields() {
    let store = store_with_policy(WriteDenials::none());
    let bag = BagKey::new("docs", "user");
    store
        .write_to_bag("alice", &bag, "Index", &create_intent("original"))
        .unwrap();

    let record = store
        .write_to_bag(
            "alice",
            &bag,
            "Index",
            &update_intent(&[("text", "edited"), ("tags", "home")]),
        )
        .unwrap();

    assert_eq!(record.document.fields["text"], "edited");
    assert_eq!(record.document.fields["tags"], "home");
    // Fields stamped at creation survive the merge untouched.
    assert_eq!(record.document.fields["creator"], "alice");
    assert_eq!(record.document.kind(), "text/vnd.wiki");
}

#[test]
fn create_intent_replaces_existing_document_entirely() {
    let store = store_with_policy(WriteDenials::none());
    let bag = BagKey::new("docs", "user");
    store
        .write_to_bag("alice", &bag, "Index", &create_intent("original"))
        .unwrap();
    store
        .write_to_bag(
            "alice",
            &bag,
            "Index",
            &update_intent(&[("extra", "sticky")]),
        )
        .unwrap();

    let mut fields = BTreeMap::new();
    fields.insert("body".to_string(), "rebuilt".to_string());
    let record = store
        .write_to_bag(
            "bob",
            &bag,
            "Index",
            &UpdateIntent::Create {
                kind: "text/markdown".to_string(),
                fields,
            },
        )
        .unwrap();

    // Factory output replaces the stored value wholesale.
    assert_eq!(record.document.fields["body"], "rebuilt");
    assert_eq!(record.document.fields["creator"], "bob");
    assert_eq!(record.document.kind(), "text/markdown");
    assert!(!record.document.fields.contains_key("extra"));
    assert!(!record.document.fields.contains_key("text"));
}

#[test]
fn write_policy_sees_candidate_content() {
    let store = store_with_policy(WriteDenials::none());

    let err = store
        .write_to_bag(
            "alice",
            &BagKey::new("docs", "user"),
            "Index",
            &update_intent(&[("quarantine", "yes")]),
        )
        .unwrap_err();
    match err {
        StoreError::Forbidden(message) => {
            assert!(message.contains("quarantined content is not writable"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn write_returns_record_readable_in_same_store() {
    let store = store_with_policy(WriteDenials::none());
    let bag = BagKey::new("docs", "user");

    let written = store
        .write_to_bag("alice", &bag, "Index", &create_intent("hello"))
        .unwrap();

    let outcome = store.read_from_bag("alice", &bag, Some("Index")).unwrap();
    match outcome {
        ReadOutcome::Single(read_back) => {
            assert_eq!(read_back.document, written.document);
            assert_eq!(read_back.revision, written.revision);
        }
        ReadOutcome::Collection(_) => panic!("titled read must return a single record"),
    }
}

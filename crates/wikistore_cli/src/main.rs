//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire the full store stack against an in-memory database and walk one
//!   write/read cycle through a layered recipe.
//! - Keep output deterministic for quick local sanity checks.

use std::collections::BTreeMap;
use std::process::ExitCode;

use wikistore_core::db::open_db_in_memory;
use wikistore_core::{
    core_version, BagKey, DocumentStore, OpenAccessPolicy, ReadOutcome, RecipeKey,
    SqliteTransactionRunner, StandardDocumentFactory, StaticRecipeResolver, StoreError,
    UpdateIntent,
};

fn main() -> ExitCode {
    println!("wikistore_core version={}", core_version());

    match probe() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn probe() -> Result<(), StoreError> {
    let conn = open_db_in_memory()?;
    let runner = SqliteTransactionRunner::try_new(conn)?;

    let mut resolver = StaticRecipeResolver::new();
    resolver
        .register(
            RecipeKey::new("docs", "main"),
            vec![BagKey::new("docs", "user"), BagKey::new("docs", "site")],
        )
        .map_err(|err| StoreError::BadRequest(err.to_string()))?;

    let store = DocumentStore::new(
        runner,
        OpenAccessPolicy::new(),
        resolver,
        StandardDocumentFactory::new(),
    );

    let mut fields = BTreeMap::new();
    fields.insert("text".to_string(), "welcome".to_string());
    let intent = UpdateIntent::Create {
        kind: "text/vnd.wiki".to_string(),
        fields,
    };
    let record = store.write_to_recipe("probe", &RecipeKey::new("docs", "main"), "Index", &intent)?;
    println!("wrote Index to bag={}", record.bag);

    match store.read_from_recipe("probe", &RecipeKey::new("docs", "main"), Some("Index"))? {
        ReadOutcome::Single(record) => {
            println!("read Index text={}", record.document.fields["text"]);
        }
        ReadOutcome::Collection(_) => {
            return Err(StoreError::InconsistentState(
                "titled read returned a collection",
            ));
        }
    }

    Ok(())
}

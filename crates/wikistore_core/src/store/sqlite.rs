//! SQLite implementation of the persistence and transaction contracts.
//!
//! # Responsibility
//! - Provide transaction-scoped document access over one `documents`
//!   table keyed (wiki, bag, title).
//! - Enforce the expected-revision gate at commit time inside
//!   `compare_and_swap`.
//!
//! # Invariants
//! - `read_many` issues one query per bag, in the supplied order, so the
//!   resolver's ordering survives end to end.
//! - Every upsert mints a fresh revision token; revisions are never
//!   reused.
//! - Corrupt persisted rows are rejected (`InvalidData`), never masked.

use crate::db::migrations::latest_version;
use crate::model::document::Document;
use crate::model::keys::{BagKey, QualifiedRecord, Revision};
use crate::store::contracts::{Persistence, TransactionRunner, Updater};
use crate::store::error::{StoreError, StoreResult};
use log::{info, warn};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::time::Instant;

const DOCUMENT_SELECT_SQL: &str = "SELECT title, fields, revision FROM documents";

/// Owns one migrated connection and runs each unit of work inside one
/// IMMEDIATE transaction.
#[derive(Debug)]
pub struct SqliteTransactionRunner {
    conn: Connection,
}

impl SqliteTransactionRunner {
    /// Wraps a migrated/ready connection.
    ///
    /// Rejects connections whose schema version does not match this
    /// binary or that lack the `documents` table.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if version != latest_version() {
            return Err(StoreError::InvalidData(format!(
                "connection schema version {version} does not match supported {}",
                latest_version()
            )));
        }

        let has_table: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'documents'
            );",
            [],
            |row| row.get(0),
        )?;
        if has_table != 1 {
            return Err(StoreError::InvalidData(
                "connection is missing the `documents` table".to_string(),
            ));
        }

        Ok(Self { conn })
    }
}

impl TransactionRunner for SqliteTransactionRunner {
    fn run<T, W>(&self, _user: &str, work: W) -> StoreResult<T>
    where
        W: FnOnce(&dyn Persistence) -> StoreResult<T>,
    {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let handle = SqlitePersistence { conn: &tx };

        match work(&handle) {
            Ok(value) => {
                tx.commit()?;
                info!(
                    "event=txn module=store status=committed duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                // Dropping the transaction rolls it back.
                warn!(
                    "event=txn module=store status=rolled_back duration_ms={} error_status={}",
                    started_at.elapsed().as_millis(),
                    err.status()
                );
                Err(err)
            }
        }
    }
}

/// Transaction-scoped persistence handle over the `documents` table.
pub struct SqlitePersistence<'a> {
    conn: &'a Connection,
}

impl Persistence for SqlitePersistence<'_> {
    fn read_one(&self, bag: &BagKey, title: &str) -> StoreResult<Option<QualifiedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL} WHERE wiki = ?1 AND bag = ?2 AND title = ?3;"
        ))?;

        let mut rows = stmt.query(params![bag.wiki, bag.bag, title])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(bag, row)?));
        }

        Ok(None)
    }

    fn read_many(&self, bags: &[BagKey]) -> StoreResult<Vec<QualifiedRecord>> {
        let mut records = Vec::new();

        // One query per bag, in the supplied order. First-occurrence-wins
        // merging upstream depends on this grouping.
        for bag in bags {
            let mut stmt = self.conn.prepare(&format!(
                "{DOCUMENT_SELECT_SQL} WHERE wiki = ?1 AND bag = ?2 ORDER BY title ASC;"
            ))?;
            let mut rows = stmt.query(params![bag.wiki, bag.bag])?;
            while let Some(row) = rows.next()? {
                records.push(parse_document_row(bag, row)?);
            }
        }

        Ok(records)
    }

    fn compare_and_swap(
        &self,
        bag: &BagKey,
        title: &str,
        updater: &mut Updater<'_>,
        expected: Option<&Revision>,
    ) -> StoreResult<Option<QualifiedRecord>> {
        let current = self.read_one(bag, title)?;

        if let Some(expected) = expected {
            let stored = current.as_ref().map(|record| &record.revision);
            if stored != Some(expected) {
                return Err(StoreError::Conflict(format!(
                    "revision mismatch for `{title}` in bag `{bag}`"
                )));
            }
        }

        match updater(current.map(|record| record.document))? {
            Some(document) => {
                document.validate()?;
                if document.title != title {
                    return Err(StoreError::InconsistentState(
                        "updater produced a document with a mismatched title",
                    ));
                }

                let revision = Revision::fresh();
                self.conn.execute(
                    "INSERT INTO documents (wiki, bag, title, fields, revision)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (wiki, bag, title) DO UPDATE SET
                        fields = excluded.fields,
                        revision = excluded.revision,
                        updated_at = (strftime('%s', 'now') * 1000);",
                    params![
                        bag.wiki,
                        bag.bag,
                        title,
                        encode_fields(&document.fields)?,
                        revision.as_str(),
                    ],
                )?;

                Ok(Some(QualifiedRecord {
                    bag: bag.clone(),
                    document,
                    revision,
                }))
            }
            None => {
                self.conn.execute(
                    "DELETE FROM documents WHERE wiki = ?1 AND bag = ?2 AND title = ?3;",
                    params![bag.wiki, bag.bag, title],
                )?;
                Ok(None)
            }
        }
    }
}

fn parse_document_row(bag: &BagKey, row: &Row<'_>) -> StoreResult<QualifiedRecord> {
    let title: String = row.get("title")?;
    let fields_text: String = row.get("fields")?;
    let revision: String = row.get("revision")?;

    let fields = decode_fields(&title, &fields_text)?;
    let document = Document::with_fields(title, fields);
    document
        .validate()
        .map_err(|err| StoreError::InvalidData(err.to_string()))?;

    Ok(QualifiedRecord {
        bag: bag.clone(),
        document,
        revision: Revision::from_token(revision),
    })
}

fn encode_fields(fields: &BTreeMap<String, String>) -> StoreResult<String> {
    serde_json::to_string(fields)
        .map_err(|err| StoreError::InvalidData(format!("field map failed to encode: {err}")))
}

fn decode_fields(title: &str, raw: &str) -> StoreResult<BTreeMap<String, String>> {
    serde_json::from_str(raw).map_err(|err| {
        StoreError::InvalidData(format!(
            "invalid field map stored for document `{title}`: {err}"
        ))
    })
}

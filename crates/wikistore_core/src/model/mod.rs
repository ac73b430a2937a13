//! Domain model for layered wiki document storage.
//!
//! # Responsibility
//! - Define the canonical document, key and revision shapes used by the
//!   store facade and its collaborators.
//!
//! # Invariants
//! - A document title is unique within one (wiki, bag) pair.
//! - A revision token is only meaningful for the (bag, title) that
//!   produced it.

pub mod document;
pub mod keys;

//! Document store: contracts, orchestration facade and adapters.
//!
//! # Responsibility
//! - Define the collaborator contracts the facade depends on.
//! - Orchestrate policy, recipe resolution and compare-and-swap writes.
//!
//! # Invariants
//! - Boundary failures use the four-kind taxonomy (BadRequest, Forbidden,
//!   NotFound, Conflict); internal invariant violations stay distinct.

pub mod bound;
pub mod contracts;
pub mod error;
pub mod facade;
pub mod factory;
pub mod policy;
pub mod resolver;
pub mod sqlite;

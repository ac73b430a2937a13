//! Built-in policy checker for unrestricted deployments.
//!
//! Real access policy engines live outside this crate and implement
//! `PolicyChecker` themselves; this one allows everything and exists for
//! composition-root wiring, probes and tests.

use crate::model::keys::BagKey;
use crate::store::contracts::{AccessDecision, Persistence, PolicyChecker};
use crate::store::error::StoreResult;
use std::collections::BTreeMap;

/// Allow-all policy checker.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAccessPolicy;

impl OpenAccessPolicy {
    pub fn new() -> Self {
        Self
    }

    fn allow_all(bags: &[BagKey]) -> Vec<AccessDecision> {
        bags.iter()
            .map(|bag| AccessDecision {
                bag: bag.clone(),
                allowed: true,
                reason: None,
            })
            .collect()
    }
}

impl PolicyChecker for OpenAccessPolicy {
    fn check_read(
        &self,
        _db: &dyn Persistence,
        _user: &str,
        bags: &[BagKey],
        _title: Option<&str>,
    ) -> StoreResult<Vec<AccessDecision>> {
        Ok(Self::allow_all(bags))
    }

    fn check_write(
        &self,
        _db: &dyn Persistence,
        _user: &str,
        bags: &[BagKey],
        _title: Option<&str>,
        _candidate_fields: Option<&BTreeMap<String, String>>,
    ) -> StoreResult<Vec<AccessDecision>> {
        Ok(Self::allow_all(bags))
    }

    fn check_remove(
        &self,
        _db: &dyn Persistence,
        _user: &str,
        bags: &[BagKey],
        _title: Option<&str>,
    ) -> StoreResult<Vec<AccessDecision>> {
        Ok(Self::allow_all(bags))
    }
}

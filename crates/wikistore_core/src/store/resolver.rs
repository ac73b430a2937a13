//! In-process recipe table and resolver implementation.
//!
//! # Responsibility
//! - Hold named recipes as ordered bag layerings, per access mode.
//! - Serve the `RecipeResolver` contract for deployments that define
//!   recipes statically at the composition root.
//!
//! # Invariants
//! - Registration rejects blank names and empty layer lists.
//! - Resolution returns the registered order untouched; an unknown recipe
//!   resolves to the empty "not found" sentinel.

use crate::model::keys::{AccessMode, BagKey, RecipeKey};
use crate::store::contracts::{Persistence, RecipeResolver};
use crate::store::error::StoreResult;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Recipe registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeRegistrationError {
    InvalidRecipeKey(String),
    EmptyLayerList(String),
    DuplicateRecipe(String),
}

impl Display for RecipeRegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRecipeKey(value) => write!(f, "recipe key is invalid: {value}"),
            Self::EmptyLayerList(value) => {
                write!(f, "recipe must layer at least one bag: {value}")
            }
            Self::DuplicateRecipe(value) => write!(f, "recipe already registered: {value}"),
        }
    }
}

impl Error for RecipeRegistrationError {}

/// One registered recipe: ordered bag layers per access mode.
///
/// Read layers define shadowing (earlier bags win); write layers define
/// fallback (first writable bag receives the write).
#[derive(Debug, Clone, PartialEq, Eq)]
struct RecipeEntry {
    read_layers: Vec<BagKey>,
    write_layers: Vec<BagKey>,
}

/// Static recipe table implementing `RecipeResolver`.
#[derive(Debug, Default)]
pub struct StaticRecipeResolver {
    recipes: BTreeMap<RecipeKey, RecipeEntry>,
}

impl StaticRecipeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one recipe with the same layer list for both modes.
    pub fn register(
        &mut self,
        recipe: RecipeKey,
        layers: Vec<BagKey>,
    ) -> Result<(), RecipeRegistrationError> {
        self.register_split(recipe, layers.clone(), layers)
    }

    /// Registers one recipe with distinct read and write layer lists.
    pub fn register_split(
        &mut self,
        recipe: RecipeKey,
        read_layers: Vec<BagKey>,
        write_layers: Vec<BagKey>,
    ) -> Result<(), RecipeRegistrationError> {
        if recipe.validate().is_err() {
            return Err(RecipeRegistrationError::InvalidRecipeKey(
                recipe.to_string(),
            ));
        }
        if read_layers.is_empty() || write_layers.is_empty() {
            return Err(RecipeRegistrationError::EmptyLayerList(recipe.to_string()));
        }
        if self.recipes.contains_key(&recipe) {
            return Err(RecipeRegistrationError::DuplicateRecipe(recipe.to_string()));
        }

        self.recipes.insert(
            recipe,
            RecipeEntry {
                read_layers,
                write_layers,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl RecipeResolver for StaticRecipeResolver {
    fn resolve(
        &self,
        _user: &str,
        mode: AccessMode,
        _db: &dyn Persistence,
        recipe: &RecipeKey,
    ) -> StoreResult<Vec<BagKey>> {
        let layers = self.recipes.get(recipe).map(|entry| match mode {
            AccessMode::Read => entry.read_layers.clone(),
            AccessMode::Write => entry.write_layers.clone(),
        });
        Ok(layers.unwrap_or_default())
    }
}

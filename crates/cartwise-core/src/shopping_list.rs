//! The shopper's list of canonical item codes and quantities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListEntry {
    /// Cross-store canonical identity, reconciled before optimization.
    pub item_code: String,
    /// Always positive.
    pub quantity: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShoppingListError {
    #[error("item {0} is already in the shopping list")]
    AlreadyPresent(String),

    #[error("item {0} is not in the shopping list")]
    NotPresent(String),

    #[error("quantity for item {item_code} must be positive, got {quantity}")]
    InvalidQuantity { item_code: String, quantity: Decimal },
}

/// Ordered list of entries, at most one per item code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingList {
    entries: Vec<ShoppingListEntry>,
}

impl ShoppingList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from raw entries, applying the same rules as [`Self::add`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ShoppingListError`] encountered.
    pub fn from_entries(
        entries: impl IntoIterator<Item = ShoppingListEntry>,
    ) -> Result<Self, ShoppingListError> {
        let mut list = Self::new();
        for entry in entries {
            list.add(entry.item_code, entry.quantity)?;
        }
        Ok(list)
    }

    /// Appends an item. A zero quantity means "one of".
    ///
    /// # Errors
    ///
    /// [`ShoppingListError::AlreadyPresent`] for a repeated code,
    /// [`ShoppingListError::InvalidQuantity`] for a negative quantity.
    pub fn add(
        &mut self,
        item_code: impl Into<String>,
        quantity: Decimal,
    ) -> Result<(), ShoppingListError> {
        let item_code = item_code.into();
        if self.contains(&item_code) {
            return Err(ShoppingListError::AlreadyPresent(item_code));
        }
        let quantity = normalize_quantity(&item_code, quantity)?;
        self.entries.push(ShoppingListEntry {
            item_code,
            quantity,
        });
        Ok(())
    }

    /// # Errors
    ///
    /// [`ShoppingListError::NotPresent`] if the code is not listed, or
    /// [`ShoppingListError::InvalidQuantity`] for a negative quantity.
    pub fn update_quantity(
        &mut self,
        item_code: &str,
        quantity: Decimal,
    ) -> Result<(), ShoppingListError> {
        let quantity = normalize_quantity(item_code, quantity)?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.item_code == item_code)
            .ok_or_else(|| ShoppingListError::NotPresent(item_code.to_string()))?;
        entry.quantity = quantity;
        Ok(())
    }

    /// # Errors
    ///
    /// [`ShoppingListError::NotPresent`] if the code is not listed.
    pub fn remove(&mut self, item_code: &str) -> Result<ShoppingListEntry, ShoppingListError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.item_code == item_code)
            .ok_or_else(|| ShoppingListError::NotPresent(item_code.to_string()))?;
        Ok(self.entries.remove(idx))
    }

    #[must_use]
    pub fn contains(&self, item_code: &str) -> bool {
        self.entries.iter().any(|e| e.item_code == item_code)
    }

    #[must_use]
    pub fn entries(&self) -> &[ShoppingListEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_quantity(item_code: &str, quantity: Decimal) -> Result<Decimal, ShoppingListError> {
    if quantity.is_zero() {
        return Ok(Decimal::ONE);
    }
    if quantity.is_sign_negative() {
        return Err(ShoppingListError::InvalidQuantity {
            item_code: item_code.to_string(),
            quantity,
        });
    }
    Ok(quantity)
}

//! Owned items and their liquidation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::catalog::Rarity;
use super::error::GameError;
use super::money::round_cents;

/// A drawn item with its rolled price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub min: f64,
    pub max: f64,
    pub rarity: Rarity,
    pub img: String,
    #[serde(default)]
    pub created_at_ms: i64,
}

impl InventoryItem {
    /// Where the rolled price sits inside its range, 0.0..=1.0.
    pub fn roll_quality(&self) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 1.0;
        }
        ((self.price - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Items the player owns, in the order they were obtained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventoryStore {
    items: Vec<InventoryItem>,
    /// Running sum of `items[..].price`, kept so `remove_all` needs no scan.
    total: f64,
}

impl InventoryStore {
    /// Rebuild a store from persisted items, keeping their order.
    pub fn from_items(items: Vec<InventoryItem>) -> Self {
        let total = round_cents(items.iter().map(|it| it.price).sum());
        Self { items, total }
    }

    pub fn add(&mut self, item: InventoryItem) {
        self.total = round_cents(self.total + item.price);
        self.items.push(item);
    }

    /// Remove every listed item, or none of them.
    ///
    /// Returns the summed price of the removed items. Fails with
    /// `ItemNotFound` naming the first id that is not present.
    pub fn remove_many(&mut self, ids: &[String]) -> Result<f64, GameError> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        for id in ids {
            if self.get(id).is_none() {
                return Err(GameError::ItemNotFound(id.clone()));
            }
        }

        let mut removed = 0.0;
        self.items.retain(|it| {
            if wanted.contains(it.id.as_str()) {
                removed += it.price;
                false
            } else {
                true
            }
        });
        let removed = round_cents(removed);
        self.total = round_cents(self.total - removed).max(0.0);
        if self.items.is_empty() {
            self.total = 0.0;
        }
        Ok(removed)
    }

    /// Clear the store and return what it was worth.
    pub fn remove_all(&mut self) -> f64 {
        self.items.clear();
        std::mem::take(&mut self.total)
    }

    pub fn list(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|it| it.id == id)
    }

    pub fn total_value(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn sample_item(id: &str, price: f64) -> InventoryItem {
    InventoryItem {
        id: id.to_string(),
        name: format!("Item {id}"),
        price,
        min: 0.0,
        max: 1000.0,
        rarity: Rarity::Common,
        img: String::new(),
        created_at_ms: 0,
    }
}

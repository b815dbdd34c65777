//! Error kinds for the case-opening core.

use chrono::NaiveDate;
use thiserror::Error;

/// Everything an action on the session can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("case \"{0}\" has nothing to drop")]
    InvalidCase(String),

    #[error("not enough money: need {needed:.2}, have {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("item {0} is no longer in the inventory")]
    ItemNotFound(String),

    #[error("clock moved backwards: last claim {last}, today {today}")]
    ClockSkew { last: NaiveDate, today: NaiveDate },

    #[error("unknown case \"{0}\"")]
    UnknownCase(String),

    #[error("a case is already being opened")]
    SessionBusy,

    #[error("select items first")]
    NothingSelected,

    #[error("no items to sell")]
    InventoryEmpty,
}

/// How the front-end should treat an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Shown as a transient notice; play continues.
    Notice,
    /// A broken contract inside the core. Still never crashes the session.
    Bug,
}

impl GameError {
    pub fn severity(&self) -> Severity {
        match self {
            GameError::InvalidAmount(_) => Severity::Bug,
            _ => Severity::Notice,
        }
    }

    /// Text for the notice log.
    pub fn notice(&self) -> String {
        match self {
            GameError::InsufficientFunds { .. } => "Not enough money".to_string(),
            GameError::NothingSelected => "Select items first.".to_string(),
            GameError::InventoryEmpty => "No items.".to_string(),
            GameError::ItemNotFound(_) => {
                "Selection is out of date, please select again.".to_string()
            }
            GameError::ClockSkew { .. } => {
                "Daily bonus skipped: system clock went backwards.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Failures of the key/value storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,

    #[error("failed to write \"{key}\": {reason}")]
    Write { key: String, reason: String },

    #[error("failed to serialize save data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Problems found while loading or validating a case catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("case \"{0}\" has no items")]
    Empty(String),

    #[error("case key \"{0}\" is used more than once")]
    DuplicateKey(String),

    #[error("case \"{key}\" has invalid price {price}")]
    InvalidPrice { key: String, price: f64 },

    #[error("item \"{item}\" in case \"{key}\" has invalid range {min}..{max}")]
    InvalidRange {
        key: String,
        item: String,
        min: f64,
        max: f64,
    },
}

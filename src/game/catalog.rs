//! Static case configuration: rarities, item templates and cases.

use std::collections::HashSet;

use log::error;
use serde::{Deserialize, Serialize};

use super::error::CatalogError;

/// Case data shipped with the game, editable without touching code.
pub const BUNDLED_CASES: &str = include_str!("../../assets/cases.json");

/// Fallback image used when an entry has none.
pub const PLACEHOLDER_IMG: &str = "assets/ui/logo.png";

/// Rarity tier. Controls draw weight and display colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Superrare,
    Legendary,
}

impl Rarity {
    /// All rarities from most to least common.
    pub fn all() -> &'static [Rarity] {
        &[
            Rarity::Common,
            Rarity::Uncommon,
            Rarity::Rare,
            Rarity::Superrare,
            Rarity::Legendary,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Superrare => "superrare",
            Rarity::Legendary => "legendary",
        }
    }
}

/// One possible drop of a case, before its price is rolled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub name: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default = "placeholder_img")]
    pub img: String,
}

/// A purchasable case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub key: String,
    pub title: String,
    pub price: f64,
    #[serde(default = "placeholder_img")]
    pub img: String,
    pub items: Vec<ItemTemplate>,
}

fn placeholder_img() -> String {
    PLACEHOLDER_IMG.to_string()
}

/// The full list of cases for a session. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    cases: Vec<Case>,
}

impl Catalog {
    /// Build a catalog, rejecting anything a draw could not handle.
    pub fn new(cases: Vec<Case>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for case in &cases {
            if !seen.insert(case.key.as_str()) {
                return Err(CatalogError::DuplicateKey(case.key.clone()));
            }
            if !(case.price.is_finite() && case.price > 0.0) {
                return Err(CatalogError::InvalidPrice {
                    key: case.key.clone(),
                    price: case.price,
                });
            }
            if case.items.is_empty() {
                return Err(CatalogError::Empty(case.key.clone()));
            }
            for item in &case.items {
                let ok = item.min.is_finite()
                    && item.max.is_finite()
                    && item.min >= 0.0
                    && item.min <= item.max;
                if !ok {
                    return Err(CatalogError::InvalidRange {
                        key: case.key.clone(),
                        item: item.name.clone(),
                        min: item.min,
                        max: item.max,
                    });
                }
            }
        }
        Ok(Self { cases })
    }

    /// Parse a JSON array of cases.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let cases: Vec<Case> = serde_json::from_str(json)?;
        Self::new(cases)
    }

    /// The shipped catalog. Falls back to [`builtin_cases`] if the bundled
    /// data does not parse or validate.
    pub fn bundled() -> Self {
        match Self::from_json(BUNDLED_CASES) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!("bundled catalog rejected, using built-in cases: {e}");
                Self::default()
            }
        }
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn get(&self, key: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.key == key)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            cases: builtin_cases(),
        }
    }
}

fn item(name: &str, min: f64, max: f64, rarity: Rarity, img: &str) -> ItemTemplate {
    ItemTemplate {
        name: name.to_string(),
        min,
        max,
        rarity,
        img: format!("assets/items/{img}.png"),
    }
}

/// Cases shipped with the game.
pub fn builtin_cases() -> Vec<Case> {
    use Rarity::*;
    vec![Case {
        key: "resources".to_string(),
        title: "Resources Case".to_string(),
        price: 12.0,
        img: "assets/cases/resources.png".to_string(),
        items: vec![
            item("Coil", 2.0, 6.0, Common, "resources/coil"),
            item("Flint", 3.0, 8.0, Common, "resources/flint"),
            item("Iron", 10.0, 16.0, Uncommon, "resources/iron"),
            item("Slimeball", 10.0, 16.0, Uncommon, "resources/slimeball"),
            item("Redstone", 12.0, 22.0, Uncommon, "resources/redstone"),
            item("Lapis Lazuli", 20.0, 28.0, Rare, "resources/lapis"),
            item("Glowstone", 30.0, 43.0, Rare, "resources/glowstone"),
            item("Gold", 70.0, 110.0, Rare, "resources/gold"),
            item("Diamond", 280.0, 450.0, Superrare, "resources/diamond"),
            item("Emerald", 380.0, 600.0, Superrare, "resources/emerald"),
            item("Nether Star", 400.0, 750.0, Legendary, "resources/nether_star"),
        ],
    }]
}

//! Weighted reward draws.
//!
//! Each item's chance is `weight(rarity) / Σ weights` over the case. The
//! table is cumulative and searched with `partition_point`, so large weights
//! cost nothing extra.

use rand::Rng;

use super::catalog::{Case, Rarity};
use super::error::GameError;
use super::inventory::InventoryItem;
use super::money::round_cents;

/// Draw weight per rarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RarityWeights {
    pub common: u32,
    pub uncommon: u32,
    pub rare: u32,
    pub superrare: u32,
    pub legendary: u32,
}

impl RarityWeights {
    pub fn weight(&self, rarity: Rarity) -> u32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Superrare => self.superrare,
            Rarity::Legendary => self.legendary,
        }
    }
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self {
            common: 40,
            uncommon: 30,
            rare: 15,
            superrare: 10,
            legendary: 5,
        }
    }
}

/// Result of a draw: the new item plus which template it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Draw {
    pub item: InventoryItem,
    pub template_index: usize,
}

#[derive(Clone, Debug, Default)]
pub struct RewardPool {
    weights: RarityWeights,
}

impl RewardPool {
    pub fn new(weights: RarityWeights) -> Self {
        Self { weights }
    }

    /// Cumulative weight per item, in case order.
    fn cumulative(&self, case: &Case) -> Vec<u64> {
        let mut acc = 0u64;
        case.items
            .iter()
            .map(|it| {
                acc += u64::from(self.weights.weight(it.rarity));
                acc
            })
            .collect()
    }

    /// Pick a template and roll its price.
    ///
    /// `minted_at_ms` becomes the item's creation time and part of its id.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        case: &Case,
        rng: &mut R,
        minted_at_ms: i64,
    ) -> Result<Draw, GameError> {
        let cumulative = self.cumulative(case);
        let total = cumulative.last().copied().unwrap_or(0);
        if total == 0 {
            return Err(GameError::InvalidCase(case.key.clone()));
        }

        let roll = rng.gen_range(0..total);
        let template_index = cumulative.partition_point(|&c| c <= roll);
        let template = &case.items[template_index];

        let span = template.max - template.min;
        if !(template.min.is_finite() && span.is_finite() && span >= 0.0) {
            return Err(GameError::InvalidCase(case.key.clone()));
        }
        // `gen::<f64>()` is in [0, 1), so any finite span stays finite.
        let raw = template.min + rng.gen::<f64>() * span;
        let price = round_cents(raw).clamp(template.min, template.max);

        let item = InventoryItem {
            id: format!("it_{}_{:08x}", minted_at_ms, rng.gen::<u32>()),
            name: template.name.clone(),
            price,
            min: template.min,
            max: template.max,
            rarity: template.rarity,
            img: template.img.clone(),
            created_at_ms: minted_at_ms,
        };
        Ok(Draw {
            item,
            template_index,
        })
    }

    /// Chance of each item in `case`, in case order. Empty when nothing can drop.
    pub fn drop_rates(&self, case: &Case) -> Vec<f64> {
        let total: u64 = case
            .items
            .iter()
            .map(|it| u64::from(self.weights.weight(it.rarity)))
            .sum();
        if total == 0 {
            return Vec::new();
        }
        case.items
            .iter()
            .map(|it| f64::from(self.weights.weight(it.rarity)) / total as f64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{builtin_cases, ItemTemplate};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn template(name: &str, min: f64, max: f64, rarity: Rarity) -> ItemTemplate {
        ItemTemplate {
            name: name.to_string(),
            min,
            max,
            rarity,
            img: String::new(),
        }
    }

    fn one_per_rarity() -> Case {
        Case {
            key: "mix".to_string(),
            title: "Mix".to_string(),
            price: 1.0,
            img: String::new(),
            items: Rarity::all()
                .iter()
                .map(|r| template(r.name(), 1.0, 2.0, *r))
                .collect(),
        }
    }

    #[test]
    fn empty_case_is_invalid() {
        let case = Case {
            key: "empty".to_string(),
            title: "Empty".to_string(),
            price: 1.0,
            img: String::new(),
            items: vec![],
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let err = RewardPool::default().draw(&case, &mut rng, 0).unwrap_err();
        assert_eq!(err, GameError::InvalidCase("empty".to_string()));
    }

    #[test]
    fn all_zero_weights_is_invalid() {
        let pool = RewardPool::new(RarityWeights {
            common: 0,
            uncommon: 0,
            rare: 0,
            superrare: 0,
            legendary: 0,
        });
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(pool.draw(&one_per_rarity(), &mut rng, 0).is_err());
        assert!(pool.drop_rates(&one_per_rarity()).is_empty());
    }

    #[test]
    fn zero_weight_items_never_drop() {
        let pool = RewardPool::new(RarityWeights {
            legendary: 0,
            ..RarityWeights::default()
        });
        let case = one_per_rarity();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..5_000 {
            let d = pool.draw(&case, &mut rng, 0).unwrap();
            assert_ne!(d.item.rarity, Rarity::Legendary);
        }
    }

    #[test]
    fn draw_is_deterministic_for_a_seed() {
        let case = &builtin_cases()[0];
        let pool = RewardPool::default();
        let a = pool
            .draw(case, &mut SmallRng::seed_from_u64(99), 1_700_000_000_000)
            .unwrap();
        let b = pool
            .draw(case, &mut SmallRng::seed_from_u64(99), 1_700_000_000_000)
            .unwrap();
        assert_eq!(a, b);
        assert!(a.item.id.starts_with("it_1700000000000_"));
        assert_eq!(a.item.created_at_ms, 1_700_000_000_000);
        assert_eq!(case.items[a.template_index].name, a.item.name);
    }

    #[test]
    fn fixed_range_item_gets_exact_price() {
        let case = Case {
            key: "flat".to_string(),
            title: "Flat".to_string(),
            price: 1.0,
            img: String::new(),
            items: vec![template("Stone", 3.5, 3.5, Rarity::Common)],
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let d = RewardPool::default().draw(&case, &mut rng, 0).unwrap();
        assert_eq!(d.item.price, 3.5);
    }

    #[test]
    fn unusable_price_ranges_are_refused() {
        let mut rng = SmallRng::seed_from_u64(5);
        for (min, max) in [(-f64::MAX, f64::MAX), (f64::NAN, 1.0), (4.0, 2.0)] {
            let case = Case {
                key: "odd".to_string(),
                title: "Odd".to_string(),
                price: 1.0,
                img: String::new(),
                items: vec![template("Void", min, max, Rarity::Common)],
            };
            assert_eq!(
                RewardPool::default().draw(&case, &mut rng, 0),
                Err(GameError::InvalidCase("odd".to_string())),
                "range {min}..={max}"
            );
        }
    }

    #[test]
    fn widest_valid_range_still_draws_inside_it() {
        let case = Case {
            key: "huge".to_string(),
            title: "Huge".to_string(),
            price: 1.0,
            img: String::new(),
            items: vec![template("Everything", 0.0, f64::MAX, Rarity::Legendary)],
        };
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..100 {
            let d = RewardPool::default().draw(&case, &mut rng, 0).unwrap();
            assert!(d.item.price >= 0.0 && d.item.price <= f64::MAX);
        }
    }

    #[test]
    fn empirical_distribution_matches_weights() {
        let case = one_per_rarity();
        let pool = RewardPool::default();
        let mut rng = SmallRng::seed_from_u64(2024);
        let n = 100_000;
        let mut counts = [0usize; 5];
        for _ in 0..n {
            let d = pool.draw(&case, &mut rng, 0).unwrap();
            // One template per rarity, in `Rarity::all()` order.
            counts[d.template_index] += 1;
        }
        let expected = [0.40, 0.30, 0.15, 0.10, 0.05];
        for (i, e) in expected.iter().enumerate() {
            let observed = counts[i] as f64 / n as f64;
            assert!(
                (observed - e).abs() < 0.01,
                "rarity {} observed {:.4}, expected {:.2}",
                i,
                observed,
                e
            );
        }
    }

    #[test]
    fn distribution_accounts_for_items_sharing_a_rarity() {
        // Builtin case: 2 common, 3 uncommon, 3 rare, 2 superrare, 1 legendary.
        let case = &builtin_cases()[0];
        let pool = RewardPool::default();
        let total = 2.0 * 40.0 + 3.0 * 30.0 + 3.0 * 15.0 + 2.0 * 10.0 + 5.0;
        let rates = pool.drop_rates(case);
        assert!((rates.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((rates[0] - 40.0 / total).abs() < 1e-9);
        assert!((rates[10] - 5.0 / total).abs() < 1e-9);

        let mut rng = SmallRng::seed_from_u64(5);
        let n = 100_000;
        let mut legendary = 0;
        for _ in 0..n {
            if pool.draw(case, &mut rng, 0).unwrap().template_index == 10 {
                legendary += 1;
            }
        }
        let observed = legendary as f64 / n as f64;
        assert!((observed - 5.0 / total).abs() < 0.005, "got {observed}");
    }

    #[test]
    fn scaled_weights_keep_ratios() {
        let pool = RewardPool::new(RarityWeights {
            common: 40_000_000,
            uncommon: 30_000_000,
            rare: 15_000_000,
            superrare: 10_000_000,
            legendary: 5_000_000,
        });
        let case = one_per_rarity();
        assert_eq!(pool.drop_rates(&case), RewardPool::default().drop_rates(&case));
    }
}

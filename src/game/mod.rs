//! Case-opening core: catalog, draws, economy, daily bonus and the session
//! that ties them together.
//!
//! Nothing in here touches the DOM. The front-end sends an [`Action`] to
//! [`GameSession::handle`] and redraws from [`GameSession::snapshot`].

pub mod catalog;
pub mod clock;
pub mod daily;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod reel;
pub mod reward;
pub mod save;
pub mod storage;

use log::{error, info, warn};
use rand::rngs::SmallRng;

use catalog::{Catalog, Rarity};
use clock::Clock;
use daily::{ClaimKind, DailyState};
use error::{GameError, Severity};
use inventory::{InventoryItem, InventoryStore};
use ledger::EconomyLedger;
use money::format_money;
use reel::Reel;
use reward::{RarityWeights, RewardPool};
use save::Record;
use storage::Storage;

/// Tunables for a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub weights: RarityWeights,
    /// Oldest notices are dropped past this count.
    pub max_notices: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            weights: RarityWeights::default(),
            max_notices: 50,
        }
    }
}

/// Something the player asked for.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    OpenCase { case_key: String },
    /// The reveal animation has landed; a new case may be opened.
    FinishReveal,
    SellSelected { ids: Vec<String> },
    SellAll,
    ClaimDaily,
}

/// What an action changed, for the renderer to react to.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    CaseOpened {
        item: InventoryItem,
        reel: Reel,
        balance: f64,
    },
    RevealFinished,
    ItemsSold {
        count: usize,
        total: f64,
        balance: f64,
    },
    DailyClaimed {
        bonus: f64,
        streak: u32,
        kind: ClaimKind,
    },
}

/// A message for the notice log.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub text: String,
    pub is_important: bool,
}

/// Read-only view handed to the renderer.
pub struct Snapshot<'a> {
    pub catalog: &'a Catalog,
    pub balance: f64,
    pub inventory: &'a [InventoryItem],
    pub inventory_total: f64,
    pub daily: &'a DailyState,
    pub last_win: Option<&'a InventoryItem>,
    pub busy: bool,
    pub persistent: bool,
    pub notices: &'a [Notice],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SaveKey {
    Balance,
    Inventory,
    Daily,
}

pub struct GameSession {
    catalog: Catalog,
    pool: RewardPool,
    ledger: EconomyLedger,
    inventory: InventoryStore,
    daily: DailyState,
    last_win: Option<InventoryItem>,
    storage: Box<dyn Storage>,
    /// Cleared after the first failed write; the session then runs in memory.
    persistent: bool,
    clock: Box<dyn Clock>,
    rng: SmallRng,
    busy: bool,
    notices: Vec<Notice>,
    config: SessionConfig,
}

impl GameSession {
    /// Load saved state and claim today's bonus.
    pub fn start(
        catalog: Catalog,
        mut storage: Box<dyn Storage>,
        clock: Box<dyn Clock>,
        rng: SmallRng,
        config: SessionConfig,
    ) -> Self {
        let saved = save::load_all(storage.as_mut());
        info!(
            "session start: balance={}, items={}, streak={}",
            saved.balance,
            saved.inventory.len(),
            saved.daily.streak
        );
        let mut session = Self {
            catalog,
            pool: RewardPool::new(config.weights),
            ledger: EconomyLedger::new(saved.balance),
            inventory: InventoryStore::from_items(saved.inventory),
            daily: saved.daily,
            last_win: None,
            storage,
            persistent: true,
            clock,
            rng,
            busy: false,
            notices: Vec::new(),
            config,
        };
        // Errors are already recorded as notices by `handle`.
        let _ = session.handle(Action::ClaimDaily);
        session
    }

    pub fn handle(&mut self, action: Action) -> Result<StateChange, GameError> {
        let result = match action {
            Action::OpenCase { case_key } => self.open_case(&case_key),
            Action::FinishReveal => {
                self.busy = false;
                Ok(StateChange::RevealFinished)
            }
            Action::SellSelected { ids } => self.sell_selected(&ids),
            Action::SellAll => self.sell_all(),
            Action::ClaimDaily => self.claim_daily(),
        };
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    fn open_case(&mut self, case_key: &str) -> Result<StateChange, GameError> {
        if self.busy {
            return Err(GameError::SessionBusy);
        }
        let case = self
            .catalog
            .get(case_key)
            .ok_or_else(|| GameError::UnknownCase(case_key.to_string()))?;

        self.ledger.debit(case.price)?;
        let draw = match self.pool.draw(case, &mut self.rng, self.clock.now_ms()) {
            Ok(d) => d,
            Err(e) => {
                self.ledger.credit(case.price)?;
                return Err(e);
            }
        };
        let reel = Reel::build(case.items.len(), draw.template_index, &mut self.rng);
        let title = case.title.clone();

        let item = draw.item;
        self.inventory.add(item.clone());
        self.last_win = Some(item.clone());
        self.busy = true;
        self.persist(&[SaveKey::Inventory, SaveKey::Balance]);

        info!("opened {case_key}: {} for {}", item.name, item.price);
        self.push_notice(
            format!(
                "{title}: {} ({}) worth {}",
                item.name,
                item.rarity.name(),
                format_money(item.price)
            ),
            matches!(item.rarity, Rarity::Superrare | Rarity::Legendary),
        );
        Ok(StateChange::CaseOpened {
            item,
            reel,
            balance: self.ledger.balance(),
        })
    }

    fn sell_selected(&mut self, ids: &[String]) -> Result<StateChange, GameError> {
        if ids.is_empty() {
            return Err(GameError::NothingSelected);
        }
        let before = self.inventory.len();
        let total = self.inventory.remove_many(ids)?;
        let count = before - self.inventory.len();
        self.finish_sale(count, total)
    }

    fn sell_all(&mut self) -> Result<StateChange, GameError> {
        if self.inventory.is_empty() {
            return Err(GameError::InventoryEmpty);
        }
        let count = self.inventory.len();
        let total = self.inventory.remove_all();
        self.finish_sale(count, total)
    }

    fn finish_sale(&mut self, count: usize, total: f64) -> Result<StateChange, GameError> {
        let balance = self.ledger.credit(total)?;
        self.persist(&[SaveKey::Balance, SaveKey::Inventory]);
        info!("sold {count} items for {total}");
        self.push_notice(
            format!("Sold {count} item(s) for {}", format_money(total)),
            false,
        );
        Ok(StateChange::ItemsSold {
            count,
            total,
            balance,
        })
    }

    fn claim_daily(&mut self) -> Result<StateChange, GameError> {
        let claim = daily::claim(self.clock.today(), &self.daily)?;
        if claim.kind != ClaimKind::AlreadyClaimed {
            self.ledger.credit(claim.bonus)?;
            self.daily = claim.state;
            self.persist(&[SaveKey::Balance, SaveKey::Daily]);

            let bonus = format_money(claim.bonus);
            let text = match claim.kind {
                ClaimKind::Reset => format!("Daily bonus: {bonus} (streak reset)"),
                _ => format!("Daily bonus: {bonus} (streak {})", self.daily.streak),
            };
            self.push_notice(text, true);
        }
        Ok(StateChange::DailyClaimed {
            bonus: claim.bonus,
            streak: self.daily.streak,
            kind: claim.kind,
        })
    }

    /// Write `keys` as one batch, in the given order. Callers list what the
    /// player receives first, so a half-finished batch never loses it.
    fn persist(&mut self, keys: &[SaveKey]) {
        if !self.persistent {
            return;
        }
        let result = {
            let records: Vec<Record> = keys
                .iter()
                .map(|key| match key {
                    SaveKey::Balance => Record::Balance(self.ledger.balance()),
                    SaveKey::Inventory => Record::Inventory(self.inventory.list()),
                    SaveKey::Daily => Record::Daily(&self.daily),
                })
                .collect();
            save::save_records(self.storage.as_mut(), &records)
        };
        if let Err(e) = result {
            warn!("save failed, continuing without persistence: {e}");
            self.persistent = false;
            self.push_notice(
                "Saving failed; progress from now on will not be kept.".to_string(),
                true,
            );
        }
    }

    fn report(&mut self, e: &GameError) {
        match e.severity() {
            Severity::Bug => error!("internal error: {e}"),
            Severity::Notice => info!("action refused: {e}"),
        }
        self.push_notice(e.notice(), false);
    }

    fn push_notice(&mut self, text: String, is_important: bool) {
        self.notices.push(Notice { text, is_important });
        if self.notices.len() > self.config.max_notices {
            let excess = self.notices.len() - self.config.max_notices;
            self.notices.drain(..excess);
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            catalog: &self.catalog,
            balance: self.ledger.balance(),
            inventory: self.inventory.list(),
            inventory_total: self.inventory.total_value(),
            daily: &self.daily,
            last_win: self.last_win.as_ref(),
            busy: self.busy,
            persistent: self.persistent,
            notices: &self.notices,
        }
    }

    /// Chance of each item in a case, in case order.
    pub fn drop_rates(&self, case_key: &str) -> Vec<f64> {
        self.catalog
            .get(case_key)
            .map(|c| self.pool.drop_rates(c))
            .unwrap_or_default()
    }

    #[cfg(test)]
    fn into_storage(self) -> Box<dyn Storage> {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::clock::FixedClock;
    use crate::game::error::StorageError;
    use crate::game::storage::MemoryStorage;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn start_on(date: &str, storage: MemoryStorage) -> GameSession {
        GameSession::start(
            Catalog::default(),
            Box::new(storage),
            Box::new(FixedClock::on(date)),
            SmallRng::seed_from_u64(42),
            SessionConfig::default(),
        )
    }

    fn open(s: &mut GameSession) -> Result<StateChange, GameError> {
        s.handle(Action::OpenCase {
            case_key: "resources".to_string(),
        })
    }

    #[test]
    fn start_claims_first_daily_bonus() {
        let s = start_on("2024-01-01", MemoryStorage::new());
        let snap = s.snapshot();
        assert_eq!(snap.balance, 1050.0);
        assert_eq!(snap.daily.streak, 1);
        assert_eq!(snap.notices.last().unwrap().text, "Daily bonus: $50 (streak 1)");
    }

    #[test]
    fn daily_streak_across_sessions() {
        let s = start_on("2024-01-01", MemoryStorage::new());
        let storage = s.into_storage();

        let mut mem = MemoryStorage::new();
        for key in [save::MONEY_KEY, save::INVENTORY_KEY, save::DAILY_KEY] {
            if let Some(v) = storage.load(key).unwrap() {
                mem.save(key, &v).unwrap();
            }
        }
        let s = start_on("2024-01-01", mem.clone());
        assert_eq!(s.snapshot().balance, 1050.0);

        let s = start_on("2024-01-02", mem);
        assert_eq!(s.snapshot().balance, 1150.0);
        assert_eq!(s.snapshot().daily.streak, 2);
    }

    #[test]
    fn open_case_debits_and_adds_item() {
        let mut s = start_on("2024-01-01", MemoryStorage::new());
        let change = open(&mut s).unwrap();
        let StateChange::CaseOpened {
            item,
            reel,
            balance,
        } = change
        else {
            panic!("expected CaseOpened");
        };
        assert_eq!(balance, 1038.0);
        assert!(item.price >= item.min && item.price <= item.max);
        let case = s.snapshot().catalog.get("resources").unwrap().clone();
        assert_eq!(case.items[reel.winner().unwrap()].name, item.name);

        let snap = s.snapshot();
        assert_eq!(snap.inventory.len(), 1);
        assert_eq!(snap.inventory[0], item);
        assert_eq!(snap.last_win, Some(&item));
        assert!(snap.busy);
    }

    #[test]
    fn open_case_is_blocked_until_reveal_finishes() {
        let mut s = start_on("2024-01-01", MemoryStorage::new());
        open(&mut s).unwrap();
        assert_eq!(open(&mut s), Err(GameError::SessionBusy));
        assert_eq!(s.snapshot().inventory.len(), 1);
        assert_eq!(s.snapshot().balance, 1038.0);

        assert_eq!(s.handle(Action::FinishReveal), Ok(StateChange::RevealFinished));
        open(&mut s).unwrap();
        assert_eq!(s.snapshot().inventory.len(), 2);
    }

    #[test]
    fn open_case_without_money_changes_nothing() {
        let mut storage = MemoryStorage::new();
        let daily = DailyState {
            last_claim_date: Some(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            streak: 1,
        };
        save::save_records(&mut storage, &[Record::Balance(5.0), Record::Daily(&daily)]).unwrap();
        let mut s = start_on("2024-01-01", storage);
        assert_eq!(s.snapshot().balance, 5.0);

        let err = open(&mut s).unwrap_err();
        assert!(matches!(err, GameError::InsufficientFunds { .. }));
        let snap = s.snapshot();
        assert_eq!(snap.balance, 5.0);
        assert!(snap.inventory.is_empty());
        assert!(!snap.busy);
        assert_eq!(snap.notices.last().unwrap().text, "Not enough money");
    }

    #[test]
    fn unknown_case_is_refused() {
        let mut s = start_on("2024-01-01", MemoryStorage::new());
        let err = s
            .handle(Action::OpenCase {
                case_key: "nope".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, GameError::UnknownCase("nope".to_string()));
        assert_eq!(s.snapshot().balance, 1050.0);
    }

    #[test]
    fn sell_selected_credits_total() {
        let mut s = start_on("2024-01-01", MemoryStorage::new());
        for _ in 0..3 {
            open(&mut s).unwrap();
            s.handle(Action::FinishReveal).unwrap();
        }
        let items = s.snapshot().inventory.to_vec();
        let before = s.snapshot().balance;
        let ids = vec![items[0].id.clone(), items[2].id.clone()];
        let expected = money::round_cents(items[0].price + items[2].price);

        let change = s.handle(Action::SellSelected { ids }).unwrap();
        assert_eq!(
            change,
            StateChange::ItemsSold {
                count: 2,
                total: expected,
                balance: money::round_cents(before + expected),
            }
        );
        assert_eq!(s.snapshot().inventory, &items[1..2]);
    }

    #[test]
    fn stale_selection_sells_nothing() {
        let mut s = start_on("2024-01-01", MemoryStorage::new());
        open(&mut s).unwrap();
        let id = s.snapshot().inventory[0].id.clone();
        let err = s
            .handle(Action::SellSelected {
                ids: vec![id, "it_gone".to_string()],
            })
            .unwrap_err();
        assert_eq!(err, GameError::ItemNotFound("it_gone".to_string()));
        assert_eq!(s.snapshot().inventory.len(), 1);
        assert_eq!(s.snapshot().balance, 1038.0);
    }

    #[test]
    fn empty_sales_are_refused() {
        let mut s = start_on("2024-01-01", MemoryStorage::new());
        assert_eq!(
            s.handle(Action::SellSelected { ids: vec![] }),
            Err(GameError::NothingSelected)
        );
        assert_eq!(s.handle(Action::SellAll), Err(GameError::InventoryEmpty));
    }

    #[test]
    fn sell_all_clears_inventory() {
        let mut s = start_on("2024-01-01", MemoryStorage::new());
        for _ in 0..5 {
            open(&mut s).unwrap();
            s.handle(Action::FinishReveal).unwrap();
        }
        let worth = s.snapshot().inventory_total;
        let before = s.snapshot().balance;
        let change = s.handle(Action::SellAll).unwrap();
        assert!(matches!(change, StateChange::ItemsSold { count: 5, .. }));
        assert!(s.snapshot().inventory.is_empty());
        assert!((s.snapshot().balance - (before + worth)).abs() < 0.001);
    }

    #[test]
    fn state_survives_reload() {
        let mut s = start_on("2024-01-01", MemoryStorage::new());
        open(&mut s).unwrap();
        s.handle(Action::FinishReveal).unwrap();
        open(&mut s).unwrap();
        let balance = s.snapshot().balance;
        let items = s.snapshot().inventory.to_vec();
        let daily = s.snapshot().daily.clone();

        let mut storage = s.into_storage();
        let loaded = save::load_all(storage.as_mut());
        assert_eq!(loaded.balance, balance);
        assert_eq!(loaded.inventory, items);
        assert_eq!(loaded.daily, daily);
    }

    #[test]
    fn clock_skew_skips_bonus_and_keeps_streak() {
        let mut storage = MemoryStorage::new();
        let daily = DailyState {
            last_claim_date: Some(chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()),
            streak: 4,
        };
        save::save_records(&mut storage, &[Record::Daily(&daily)]).unwrap();
        let s = start_on("2024-03-08", storage);
        let snap = s.snapshot();
        assert_eq!(snap.balance, 1000.0);
        assert_eq!(snap.daily, &daily);
        assert!(snap.notices.last().unwrap().text.contains("clock"));
    }

    #[test]
    fn failed_writes_degrade_to_memory() {
        let mut s = start_on("2024-01-01", MemoryStorage::failing());
        assert!(!s.snapshot().persistent);
        // Play goes on.
        open(&mut s).unwrap();
        assert_eq!(s.snapshot().inventory.len(), 1);
        let warnings = s
            .snapshot()
            .notices
            .iter()
            .filter(|n| n.text.starts_with("Saving failed"))
            .count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn failed_open_save_keeps_money_and_items_in_step() {
        // The daily claim takes two writes; the open's inventory write is the
        // last one that succeeds.
        let mut s = start_on("2024-01-01", MemoryStorage::failing_after(3));
        assert!(s.snapshot().persistent);
        open(&mut s).unwrap();
        assert!(!s.snapshot().persistent);
        assert_eq!(s.snapshot().inventory.len(), 1);

        let mut storage = s.into_storage();
        let loaded = save::load_all(storage.as_mut());
        assert_eq!(loaded.balance, 1050.0);
        assert!(loaded.inventory.is_empty());
    }

    /// Passes writes through and records their keys in order.
    struct WriteLog {
        inner: MemoryStorage,
        keys: Rc<RefCell<Vec<String>>>,
    }

    impl Storage for WriteLog {
        fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.load(key)
        }

        fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.keys.borrow_mut().push(key.to_string());
            self.inner.save(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn writes_put_the_players_side_first() {
        let keys = Rc::new(RefCell::new(Vec::new()));
        let mut s = GameSession::start(
            Catalog::default(),
            Box::new(WriteLog {
                inner: MemoryStorage::new(),
                keys: keys.clone(),
            }),
            Box::new(FixedClock::on("2024-01-01")),
            SmallRng::seed_from_u64(42),
            SessionConfig::default(),
        );
        assert_eq!(*keys.borrow(), [save::MONEY_KEY, save::DAILY_KEY]);

        keys.borrow_mut().clear();
        open(&mut s).unwrap();
        assert_eq!(*keys.borrow(), [save::INVENTORY_KEY, save::MONEY_KEY]);

        keys.borrow_mut().clear();
        s.handle(Action::SellAll).unwrap();
        assert_eq!(*keys.borrow(), [save::MONEY_KEY, save::INVENTORY_KEY]);
    }

    #[test]
    fn notices_are_bounded() {
        let mut s = GameSession::start(
            Catalog::default(),
            Box::new(MemoryStorage::new()),
            Box::new(FixedClock::on("2024-01-01")),
            SmallRng::seed_from_u64(1),
            SessionConfig {
                max_notices: 3,
                ..SessionConfig::default()
            },
        );
        for _ in 0..10 {
            let _ = s.handle(Action::SellAll);
        }
        assert_eq!(s.snapshot().notices.len(), 3);
    }

    #[test]
    fn drop_rates_for_known_and_unknown_cases() {
        let s = start_on("2024-01-01", MemoryStorage::new());
        let rates = s.drop_rates("resources");
        assert_eq!(rates.len(), 11);
        assert!((rates.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(s.drop_rates("nope").is_empty());
    }
}

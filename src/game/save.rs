//! セーブ/ロード機能。
//!
//! 残高・インベントリ・デイリー状態をそれぞれ別キーに JSON で保存する。
//! 値は `{"version": N, "data": ...}` のエンベロープで包む。
//!
//! ## バージョニング方針
//!
//! - `SAVE_VERSION`: 現在のセーブ形式バージョン。フィールド追加時にインクリメントする。
//! - `MIN_COMPATIBLE_VERSION`: 互換性を維持できる最小バージョン。
//!   既存フィールドの意味変更や削除など破壊的変更を行った場合のみインクリメントする。
//!
//! エンベロープ導入前の旧形式（残高は数値文字列、インベントリは配列、
//! デイリーは `{"lastDate": "2024-1-2", "streak": 2}`）も読み込める。

use chrono::NaiveDate;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::daily::DailyState;
use super::error::StorageError;
use super::inventory::InventoryItem;
use super::ledger::STARTING_BALANCE;
use super::storage::Storage;

/// セーブデータのフォーマットバージョン。
const SAVE_VERSION: u32 = 1;

/// 互換性を維持できる最小バージョン。
const MIN_COMPATIBLE_VERSION: u32 = 1;

/// 残高のキー。
pub const MONEY_KEY: &str = "mc_money_v1";
/// インベントリのキー。
pub const INVENTORY_KEY: &str = "mc_inv_v1";
/// デイリーボーナス状態のキー。
pub const DAILY_KEY: &str = "mc_daily_v1";

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct MoneySave {
    balance: f64,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct InventorySave {
    /// 取得順。表示順をそのまま保つ。
    items: Vec<InventoryItem>,
}

/// 旧形式のデイリー状態。日付はゼロ埋めなし (`2024-1-2`)。
#[derive(Deserialize)]
struct LegacyDaily {
    #[serde(rename = "lastDate")]
    last_date: Option<String>,
    streak: Option<u32>,
}

/// ロード結果。壊れていたキーはデフォルト値になる。
#[derive(Clone, Debug, PartialEq)]
pub struct SavedState {
    pub balance: f64,
    pub inventory: Vec<InventoryItem>,
    pub daily: DailyState,
}

impl Default for SavedState {
    fn default() -> Self {
        Self {
            balance: STARTING_BALANCE,
            inventory: Vec::new(),
            daily: DailyState::default(),
        }
    }
}

/// 書き込む 1 レコード。
#[derive(Clone, Copy, Debug)]
pub enum Record<'a> {
    Balance(f64),
    Inventory(&'a [InventoryItem]),
    Daily(&'a DailyState),
}

impl Record<'_> {
    pub fn key(&self) -> &'static str {
        match self {
            Record::Balance(_) => MONEY_KEY,
            Record::Inventory(_) => INVENTORY_KEY,
            Record::Daily(_) => DAILY_KEY,
        }
    }

    fn encode(&self) -> Result<String, StorageError> {
        match *self {
            Record::Balance(balance) => encode(MoneySave { balance }),
            Record::Inventory(items) => encode(InventorySave {
                items: items.to_vec(),
            }),
            Record::Daily(daily) => encode(daily),
        }
    }
}

fn encode<T: Serialize>(data: T) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&Envelope {
        version: SAVE_VERSION,
        data,
    })?)
}

/// レコードをまとめて書き込む。
///
/// 先に全件をシリアライズしてから `records` の順に書く。途中の書き込みが
/// 失敗した場合は、それまでに書いたキーを元の値に戻してからエラーを返す。
/// 書き戻しまで失敗したときに備え、呼び出し側はプレイヤーが受け取る側の
/// レコードを先に並べる。
pub fn save_records(storage: &mut dyn Storage, records: &[Record<'_>]) -> Result<(), StorageError> {
    let encoded = records
        .iter()
        .map(|r| r.encode().map(|json| (r.key(), json)))
        .collect::<Result<Vec<_>, StorageError>>()?;
    let previous = encoded
        .iter()
        .map(|(key, _)| storage.load(key))
        .collect::<Result<Vec<_>, StorageError>>()?;

    for (i, (key, json)) in encoded.iter().enumerate() {
        if let Err(e) = storage.save(key, json) {
            restore(storage, &encoded[..i], &previous[..i]);
            return Err(e);
        }
    }
    Ok(())
}

fn restore(storage: &mut dyn Storage, written: &[(&str, String)], previous: &[Option<String>]) {
    for ((key, _), old) in written.iter().zip(previous).rev() {
        let res = match old {
            Some(v) => storage.save(key, v),
            None => storage.remove(key),
        };
        match res {
            Ok(()) => info!("{key}: 書き込み失敗のため元の値に戻しました"),
            Err(e) => warn!("{key}: 元の値への書き戻しに失敗: {e}"),
        }
    }
}

/// エンベロープを解釈する。バージョンが古すぎる場合は `None`。
fn decode_envelope<T: DeserializeOwned>(key: &str, json: &str) -> Option<Result<T, ()>> {
    let env: Envelope<T> = serde_json::from_str(json).ok()?;
    if env.version < MIN_COMPATIBLE_VERSION {
        info!(
            "{key}: セーブバージョンが古すぎます (saved={}, min_compatible={})。破棄します。",
            env.version, MIN_COMPATIBLE_VERSION
        );
        return Some(Err(()));
    }
    if env.version < SAVE_VERSION {
        info!(
            "{key}: 旧バージョンのセーブデータをマイグレーション (saved={}, current={})。",
            env.version, SAVE_VERSION
        );
    }
    Some(Ok(env.data))
}

fn decode_balance(json: &str) -> Option<f64> {
    let balance = match decode_envelope::<MoneySave>(MONEY_KEY, json) {
        Some(Ok(m)) => Some(m.balance),
        Some(Err(())) => None,
        None => json.trim().parse::<f64>().ok(),
    };
    balance.filter(|b| b.is_finite() && *b >= 0.0)
}

fn decode_inventory(json: &str) -> Option<Vec<InventoryItem>> {
    match decode_envelope::<InventorySave>(INVENTORY_KEY, json) {
        Some(Ok(s)) => Some(s.items),
        Some(Err(())) => None,
        None => serde_json::from_str::<Vec<InventoryItem>>(json).ok(),
    }
}

fn decode_daily(json: &str) -> Option<DailyState> {
    match decode_envelope::<DailyState>(DAILY_KEY, json) {
        Some(Ok(d)) => Some(d),
        Some(Err(())) => None,
        None => {
            let legacy: LegacyDaily = serde_json::from_str(json).ok()?;
            let last_claim_date = match legacy.last_date {
                Some(s) => Some(NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()?),
                None => None,
            };
            Some(DailyState {
                last_claim_date,
                streak: legacy.streak.unwrap_or(1).max(1),
            })
        }
    }
}

/// 1キー分を読み込む。読めないデータは削除してデフォルトに戻す。
fn load_key<T>(
    storage: &mut dyn Storage,
    key: &str,
    decode: fn(&str) -> Option<T>,
) -> Option<T> {
    let json = match storage.load(key) {
        Ok(Some(j)) => j,
        Ok(None) => return None,
        Err(e) => {
            warn!("{key}: 読み込みに失敗: {e}");
            return None;
        }
    };
    match decode(&json) {
        Some(v) => Some(v),
        None => {
            warn!("{key}: セーブデータのパースに失敗（破棄します）");
            let _ = storage.remove(key);
            None
        }
    }
}

/// すべてのキーを読み込む。無いキー・壊れたキーはデフォルト値。
pub fn load_all(storage: &mut dyn Storage) -> SavedState {
    let defaults = SavedState::default();
    SavedState {
        balance: load_key(storage, MONEY_KEY, decode_balance).unwrap_or(defaults.balance),
        inventory: load_key(storage, INVENTORY_KEY, decode_inventory)
            .unwrap_or(defaults.inventory),
        daily: load_key(storage, DAILY_KEY, decode_daily).unwrap_or(defaults.daily),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::Rarity;
    use crate::game::inventory::sample_item;
    use crate::game::storage::MemoryStorage;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn full_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut items = vec![
            sample_item("it_1", 4.37),
            sample_item("it_2", 512.06),
            sample_item("it_3", 20.1),
        ];
        items[1].rarity = Rarity::Superrare;
        items[2].created_at_ms = 1_704_153_600_000;
        let daily = DailyState {
            last_claim_date: Some(date("2024-01-02")),
            streak: 2,
        };

        save_records(
            &mut storage,
            &[
                Record::Balance(1234.5),
                Record::Inventory(&items),
                Record::Daily(&daily),
            ],
        )
        .unwrap();

        let loaded = load_all(&mut storage);
        assert_eq!(loaded.balance, 1234.5);
        assert_eq!(loaded.inventory, items);
        assert_eq!(loaded.daily, daily);
    }

    #[test]
    fn empty_storage_gives_defaults() {
        let mut storage = MemoryStorage::new();
        let loaded = load_all(&mut storage);
        assert_eq!(loaded, SavedState::default());
        assert_eq!(loaded.balance, 1000.0);
    }

    #[test]
    fn envelope_has_version() {
        let mut storage = MemoryStorage::new();
        save_records(&mut storage, &[Record::Balance(10.0)]).unwrap();
        let raw = storage.get(MONEY_KEY).unwrap();
        assert_eq!(raw, r#"{"version":1,"data":{"balance":10.0}}"#);
    }

    /// エンベロープ導入前の形式から読み込めることを検証。
    #[test]
    fn legacy_formats_are_migrated() {
        let mut storage = MemoryStorage::new();
        storage.save(MONEY_KEY, "850.25").unwrap();
        storage
            .save(
                INVENTORY_KEY,
                r#"[{"id":"it_1_42","name":"Gold","price":88.5,"min":70,"max":110,
                     "rarity":"rare","img":"assets/items/resources/gold.png"}]"#,
            )
            .unwrap();
        storage
            .save(DAILY_KEY, r#"{"lastDate":"2024-1-2","streak":3}"#)
            .unwrap();

        let loaded = load_all(&mut storage);
        assert_eq!(loaded.balance, 850.25);
        assert_eq!(loaded.inventory.len(), 1);
        assert_eq!(loaded.inventory[0].rarity, Rarity::Rare);
        assert_eq!(loaded.inventory[0].created_at_ms, 0);
        assert_eq!(loaded.daily.last_claim_date, Some(date("2024-01-02")));
        assert_eq!(loaded.daily.streak, 3);
    }

    #[test]
    fn legacy_empty_daily_is_unclaimed() {
        let mut storage = MemoryStorage::new();
        storage.save(DAILY_KEY, "{}").unwrap();
        assert_eq!(load_all(&mut storage).daily, DailyState::default());
    }

    #[test]
    fn corrupt_keys_are_discarded_independently() {
        let mut storage = MemoryStorage::new();
        save_records(&mut storage, &[Record::Balance(42.0)]).unwrap();
        storage.save(INVENTORY_KEY, "{not json").unwrap();
        storage.save(DAILY_KEY, r#"{"lastDate":"yesterday"}"#).unwrap();

        let loaded = load_all(&mut storage);
        assert_eq!(loaded.balance, 42.0);
        assert!(loaded.inventory.is_empty());
        assert_eq!(loaded.daily, DailyState::default());
        assert_eq!(storage.get(INVENTORY_KEY), None);
        assert_eq!(storage.get(DAILY_KEY), None);
    }

    #[test]
    fn negative_balance_is_rejected() {
        let mut storage = MemoryStorage::new();
        storage.save(MONEY_KEY, "-5").unwrap();
        assert_eq!(load_all(&mut storage).balance, STARTING_BALANCE);
    }

    #[test]
    fn version_below_min_compatible_is_rejected() {
        let mut storage = MemoryStorage::new();
        storage
            .save(MONEY_KEY, r#"{"version":0,"data":{"balance":5.0}}"#)
            .unwrap();
        assert_eq!(load_all(&mut storage).balance, STARTING_BALANCE);
        assert_eq!(storage.get(MONEY_KEY), None);
    }

    /// 未知の追加フィールドは無視される。
    #[test]
    fn unknown_fields_are_ignored() {
        let mut storage = MemoryStorage::new();
        storage
            .save(
                MONEY_KEY,
                r#"{"version":1,"data":{"balance":7.5,"future_field":true}}"#,
            )
            .unwrap();
        assert_eq!(load_all(&mut storage).balance, 7.5);
    }

    /// 1 つのキーだけ書き込みを拒否するストレージ。
    struct LockedKey {
        inner: MemoryStorage,
        locked: &'static str,
    }

    impl Storage for LockedKey {
        fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.load(key)
        }

        fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.locked {
                return Err(StorageError::Write {
                    key: key.to_string(),
                    reason: "locked".to_string(),
                });
            }
            self.inner.save(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_batch_restores_earlier_keys() {
        let old_items = vec![sample_item("it_1", 4.0)];
        let mut inner = MemoryStorage::new();
        save_records(
            &mut inner,
            &[Record::Inventory(&old_items), Record::Balance(100.0)],
        )
        .unwrap();
        let mut storage = LockedKey {
            inner,
            locked: MONEY_KEY,
        };

        let new_items = vec![sample_item("it_1", 4.0), sample_item("it_2", 9.0)];
        let res = save_records(
            &mut storage,
            &[Record::Inventory(&new_items), Record::Balance(88.0)],
        );
        assert!(matches!(res, Err(StorageError::Write { .. })));

        let loaded = load_all(&mut storage.inner);
        assert_eq!(loaded.inventory, old_items);
        assert_eq!(loaded.balance, 100.0);
    }

    #[test]
    fn failed_batch_removes_keys_that_were_absent() {
        let mut storage = MemoryStorage::failing_after(1);
        let items = vec![sample_item("it_1", 4.0)];
        let res = save_records(
            &mut storage,
            &[Record::Inventory(&items), Record::Balance(88.0)],
        );
        assert!(res.is_err());
        assert_eq!(storage.get(INVENTORY_KEY), None);
        assert_eq!(storage.get(MONEY_KEY), None);
    }
}

//! Semantic action IDs for click targets.
//!
//! Registered during render and dispatched via `InputEvent::Click`.

// ── Case page ───────────────────────────────────────────────────
pub const OPEN_CASE: u16 = 1;
pub const BACK: u16 = 2;
pub const CLOSE_POPUP: u16 = 3;

// ── Tab navigation ──────────────────────────────────────────────
pub const TAB_CASES: u16 = 10;
pub const TAB_INVENTORY: u16 = 11;

// ── Selling ─────────────────────────────────────────────────────
pub const SELL_SELECTED: u16 = 20;
pub const SELL_ALL: u16 = 21;
pub const CLEAR_SELECTION: u16 = 22;

// ── Case list (base + catalog index) ────────────────────────────
pub const VIEW_CASE_BASE: u16 = 100;
pub const VIEW_CASE_END: u16 = 999;

// ── Inventory toggle (base + inventory index) ───────────────────
pub const TOGGLE_ITEM_BASE: u16 = 1000;

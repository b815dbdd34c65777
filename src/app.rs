//! Front-end state: which screen is showing, what is selected, and the
//! mapping from input to session actions.

use std::collections::HashSet;

use log::debug;

use crate::actions::*;
use crate::anim::Reveal;
use crate::game::error::GameError;
use crate::game::inventory::InventoryItem;
use crate::game::{Action, GameSession, StateChange};
use crate::input::InputEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Cases,
    Inventory,
}

pub struct UiState {
    pub tab: Tab,
    /// Catalog index of the case page being shown.
    pub viewing: Option<usize>,
    pub selected: HashSet<String>,
    /// Highlighted inventory row for keyboard play.
    pub cursor: usize,
    pub reveal: Option<Reveal>,
    pub popup: Option<InventoryItem>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            tab: Tab::Cases,
            viewing: None,
            selected: HashSet::new(),
            cursor: 0,
            reveal: None,
            popup: None,
        }
    }
}

pub struct App {
    pub session: GameSession,
    pub ui: UiState,
}

impl App {
    pub fn new(session: GameSession) -> Self {
        Self {
            session,
            ui: UiState::new(),
        }
    }

    /// Handle an input event. Returns true if the event was consumed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Click(id) => self.handle_click(*id),
            InputEvent::Key(c) => self.handle_key(*c),
        }
    }

    fn handle_click(&mut self, id: u16) -> bool {
        match id {
            OPEN_CASE => self.open_case(),
            BACK => self.close_case_page(),
            CLOSE_POPUP => self.ui.popup = None,
            TAB_CASES => self.ui.tab = Tab::Cases,
            TAB_INVENTORY => self.switch_to_inventory(),
            SELL_SELECTED => self.sell_selected(),
            SELL_ALL => self.sell_all(),
            CLEAR_SELECTION => self.ui.selected.clear(),
            VIEW_CASE_BASE..=VIEW_CASE_END => self.view_case((id - VIEW_CASE_BASE) as usize),
            id if id >= TOGGLE_ITEM_BASE => self.toggle_item((id - TOGGLE_ITEM_BASE) as usize),
            _ => return false,
        }
        true
    }

    fn handle_key(&mut self, key: char) -> bool {
        if self.ui.popup.is_some() && matches!(key, 'x' | 'b') {
            self.ui.popup = None;
            return true;
        }
        match key {
            'i' => match self.ui.tab {
                Tab::Cases => self.switch_to_inventory(),
                Tab::Inventory => self.ui.tab = Tab::Cases,
            },
            'c' => self.ui.tab = Tab::Cases,
            's' => self.sell_selected(),
            'a' => self.sell_all(),
            'b' if self.ui.tab == Tab::Cases => self.close_case_page(),
            'o' if self.ui.tab == Tab::Cases && self.ui.viewing.is_some() => self.open_case(),
            '1'..='9' if self.ui.tab == Tab::Cases && self.ui.viewing.is_none() => {
                self.view_case((key as u8 - b'1') as usize)
            }
            'j' if self.ui.tab == Tab::Inventory => {
                let len = self.session.snapshot().inventory.len();
                if self.ui.cursor + 1 < len {
                    self.ui.cursor += 1;
                }
            }
            'k' if self.ui.tab == Tab::Inventory => {
                self.ui.cursor = self.ui.cursor.saturating_sub(1);
            }
            ' ' if self.ui.tab == Tab::Inventory => self.toggle_item(self.ui.cursor),
            _ => return false,
        }
        true
    }

    /// Advance the reveal animation. Call once per frame.
    pub fn tick(&mut self, now_ms: f64) {
        let landed = match self.ui.reveal.as_mut() {
            Some(r) => r.update(now_ms),
            None => false,
        };
        if landed {
            self.land_reveal();
        }
    }

    fn land_reveal(&mut self) {
        let _ = self.session.handle(Action::FinishReveal);
        if let Some(r) = &self.ui.reveal {
            self.ui.popup = Some(r.item.clone());
        }
    }

    fn view_case(&mut self, index: usize) {
        if index < self.session.snapshot().catalog.cases().len() {
            self.ui.viewing = Some(index);
            self.ui.reveal = None;
        }
    }

    fn close_case_page(&mut self) {
        // Leaving mid-spin lands the reel at once; the reward is already saved.
        let cut_short = self.ui.reveal.as_mut().map(Reveal::finish).unwrap_or(false);
        if cut_short {
            self.land_reveal();
        }
        self.ui.viewing = None;
        self.ui.reveal = None;
    }

    fn switch_to_inventory(&mut self) {
        self.ui.tab = Tab::Inventory;
        let len = self.session.snapshot().inventory.len();
        self.ui.cursor = self.ui.cursor.min(len.saturating_sub(1));
    }

    fn open_case(&mut self) {
        let Some(index) = self.ui.viewing else {
            return;
        };
        let Some(key) = self
            .session
            .snapshot()
            .catalog
            .cases()
            .get(index)
            .map(|c| c.key.clone())
        else {
            return;
        };
        if let Ok(StateChange::CaseOpened { item, reel, .. }) =
            self.session.handle(Action::OpenCase { case_key: key })
        {
            self.ui.popup = None;
            self.ui.reveal = Some(Reveal::new(reel, item));
        }
    }

    fn toggle_item(&mut self, index: usize) {
        let Some(id) = self
            .session
            .snapshot()
            .inventory
            .get(index)
            .map(|it| it.id.clone())
        else {
            return;
        };
        self.ui.cursor = index;
        if !self.ui.selected.remove(&id) {
            self.ui.selected.insert(id);
        }
    }

    fn sell_selected(&mut self) {
        // Keep inventory order so the sale is reported in display order.
        let ids: Vec<String> = self
            .session
            .snapshot()
            .inventory
            .iter()
            .filter(|it| self.ui.selected.contains(&it.id))
            .map(|it| it.id.clone())
            .collect();
        let stale = self.ui.selected.len() != ids.len();
        let result = if stale {
            // Something selected has vanished; let the session report it.
            let mut all: Vec<String> = self.ui.selected.iter().cloned().collect();
            all.sort();
            self.session.handle(Action::SellSelected { ids: all })
        } else {
            self.session.handle(Action::SellSelected { ids })
        };
        match result {
            Ok(_) | Err(GameError::ItemNotFound(_)) => self.ui.selected.clear(),
            Err(e) => debug!("sell refused: {e}"),
        }
        self.clamp_cursor();
    }

    fn sell_all(&mut self) {
        if self.session.handle(Action::SellAll).is_ok() {
            self.ui.selected.clear();
        }
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let len = self.session.snapshot().inventory.len();
        self.ui.cursor = self.ui.cursor.min(len.saturating_sub(1));
    }
}

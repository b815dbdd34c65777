//! Reel reveal animation.
//!
//! The reward is already in the inventory when this starts. The animation
//! only eases the strip from slot 0 to the landing slot over `REVEAL_MS`,
//! driven by the timestamps `draw_web()` hands us each frame.

use crate::game::inventory::InventoryItem;
use crate::game::reel::Reel;

/// Length of the spin.
pub const REVEAL_MS: f64 = 3000.0;

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

pub struct Reveal {
    pub reel: Reel,
    pub item: InventoryItem,
    /// Timestamp of the first frame, None until then.
    started_ms: Option<f64>,
    /// Linear progress 0.0..=1.0.
    progress: f64,
}

impl Reveal {
    pub fn new(reel: Reel, item: InventoryItem) -> Self {
        Self {
            reel,
            item,
            started_ms: None,
            progress: 0.0,
        }
    }

    /// Feed a frame timestamp. Returns true on the frame the strip lands.
    pub fn update(&mut self, now_ms: f64) -> bool {
        if self.is_done() {
            return false;
        }
        let start = *self.started_ms.get_or_insert(now_ms);
        self.progress = ((now_ms - start) / REVEAL_MS).clamp(0.0, 1.0);
        self.is_done()
    }

    /// Jump to the end, e.g. when the player leaves the case page mid-spin.
    /// Returns true if the reveal was still running.
    pub fn finish(&mut self) -> bool {
        let was_running = !self.is_done();
        self.progress = 1.0;
        was_running
    }

    pub fn is_done(&self) -> bool {
        self.progress >= 1.0
    }

    /// Fractional slot index currently under the pointer.
    pub fn position(&self) -> f64 {
        ease_out_cubic(self.progress) * self.reel.landing as f64
    }
}

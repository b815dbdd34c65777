//! Reveal strip shown while a case spins.
//!
//! The strip is cosmetic. It is built *from* an already resolved draw so the
//! landing slot always shows the item that was actually awarded.

use rand::Rng;

/// How many times the case contents repeat along the strip.
pub const REEL_REPEATS: usize = 6;

/// Landing window as a fraction of the strip length.
const LANDING_FROM: f64 = 0.4;
const LANDING_TO: f64 = 0.95;

#[derive(Clone, Debug, PartialEq)]
pub struct Reel {
    /// Template index shown in each slot.
    pub slots: Vec<usize>,
    /// Slot the strip stops on. `slots[landing]` is the winner.
    pub landing: usize,
}

impl Reel {
    /// Build a strip for a case with `item_count` templates that stops on
    /// `winner`.
    pub fn build<R: Rng + ?Sized>(item_count: usize, winner: usize, rng: &mut R) -> Self {
        if item_count == 0 {
            return Self {
                slots: Vec::new(),
                landing: 0,
            };
        }
        let slots: Vec<usize> = (0..REEL_REPEATS)
            .flat_map(|_| 0..item_count)
            .collect();
        let len = slots.len();
        let from = (len as f64 * LANDING_FROM).floor() as usize;
        let to = ((len as f64 * LANDING_TO).floor() as usize).min(len - 1);

        let candidates: Vec<usize> = (from..=to).filter(|&i| slots[i] == winner).collect();
        let landing = if candidates.is_empty() {
            // Window too narrow for this case size; use the last copy.
            (0..len).rev().find(|&i| slots[i] == winner).unwrap_or(0)
        } else {
            candidates[rng.gen_range(0..candidates.len())]
        };
        Self { slots, landing }
    }

    pub fn winner(&self) -> Option<usize> {
        self.slots.get(self.landing).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

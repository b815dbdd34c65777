//! Daily login bonus with a consecutive-day streak.
//!
//! | gap since last claim | streak      | bonus            |
//! |----------------------|-------------|------------------|
//! | never claimed        | 1           | 50               |
//! | 0 days               | unchanged   | 0                |
//! | 1 day                | streak + 1  | 50 × new streak  |
//! | 2+ days              | 1           | 50               |
//! | negative             | `ClockSkew` |                  |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::GameError;

/// Bonus per streak day.
pub const DAILY_BONUS_BASE: f64 = 50.0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyState {
    #[serde(default)]
    pub last_claim_date: Option<NaiveDate>,
    #[serde(default = "one")]
    pub streak: u32,
}

fn one() -> u32 {
    1
}

impl Default for DailyState {
    fn default() -> Self {
        Self {
            last_claim_date: None,
            streak: 1,
        }
    }
}

impl DailyState {
    pub fn has_claimed(&self) -> bool {
        self.last_claim_date.is_some()
    }

    /// Bonus shown on the badge for the current streak.
    pub fn badge_bonus(&self) -> f64 {
        DAILY_BONUS_BASE * f64::from(self.streak.max(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimKind {
    First,
    AlreadyClaimed,
    Continued,
    Reset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Claim {
    pub state: DailyState,
    pub bonus: f64,
    pub kind: ClaimKind,
}

/// Compute the claim for `today` without touching `state`.
pub fn claim(today: NaiveDate, state: &DailyState) -> Result<Claim, GameError> {
    let Some(last) = state.last_claim_date else {
        return Ok(fresh_streak(today, ClaimKind::First));
    };

    let gap = today.signed_duration_since(last).num_days();
    match gap {
        g if g < 0 => Err(GameError::ClockSkew { last, today }),
        0 => Ok(Claim {
            state: state.clone(),
            bonus: 0.0,
            kind: ClaimKind::AlreadyClaimed,
        }),
        1 => {
            let streak = state.streak.max(1).saturating_add(1);
            Ok(Claim {
                state: DailyState {
                    last_claim_date: Some(today),
                    streak,
                },
                bonus: DAILY_BONUS_BASE * f64::from(streak),
                kind: ClaimKind::Continued,
            })
        }
        _ => Ok(fresh_streak(today, ClaimKind::Reset)),
    }
}

fn fresh_streak(today: NaiveDate, kind: ClaimKind) -> Claim {
    Claim {
        state: DailyState {
            last_claim_date: Some(today),
            streak: 1,
        },
        bonus: DAILY_BONUS_BASE,
        kind,
    }
}

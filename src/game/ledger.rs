//! Player balance.

use super::error::GameError;
use super::money::round_cents;

/// Balance for a fresh save.
pub const STARTING_BALANCE: f64 = 1000.0;

/// The only place the balance changes. Never goes negative.
#[derive(Clone, Debug, PartialEq)]
pub struct EconomyLedger {
    balance: f64,
}

fn check_amount(amount: f64) -> Result<f64, GameError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(GameError::InvalidAmount(amount))
    }
}

impl EconomyLedger {
    /// Restore a ledger. Negative or non-finite input is treated as zero.
    pub fn new(balance: f64) -> Self {
        let balance = if balance.is_finite() && balance > 0.0 {
            round_cents(balance)
        } else {
            0.0
        };
        Self { balance }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Take `amount` out. On error the balance is untouched.
    pub fn debit(&mut self, amount: f64) -> Result<f64, GameError> {
        let amount = check_amount(amount)?;
        if amount > self.balance {
            return Err(GameError::InsufficientFunds {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance = round_cents(self.balance - amount).max(0.0);
        Ok(self.balance)
    }

    /// Add `amount`. Only fails for negative or non-finite input.
    pub fn credit(&mut self, amount: f64) -> Result<f64, GameError> {
        let amount = check_amount(amount)?;
        self.balance = round_cents(self.balance + amount);
        Ok(self.balance)
    }
}

impl Default for EconomyLedger {
    fn default() -> Self {
        Self::new(STARTING_BALANCE)
    }
}

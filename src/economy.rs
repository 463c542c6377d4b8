//! Currency balances
//!
//! Two currencies: grit (earned by pushing, spent on normal upgrades) and
//! favors (earned by prestiging, spent on prestige upgrades). Balances only
//! move through `credit`/`debit`, and a debit can never take a balance
//! negative - it fails without mutating instead.

use serde::{Deserialize, Serialize};

use crate::signal::Signal;

/// Currency kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Grit,
    Favors,
}

/// Holds the player's currency balances
pub struct Economy {
    grit: i64,
    favors: i64,
    /// Fired with the new grit total after any grit change
    pub grit_changed: Signal<i64>,
    /// Fired with the new favors total after any favors change
    pub favors_changed: Signal<i64>,
}

impl Default for Economy {
    fn default() -> Self {
        Self::new()
    }
}

impl Economy {
    pub fn new() -> Self {
        Self {
            grit: 0,
            favors: 0,
            grit_changed: Signal::new(),
            favors_changed: Signal::new(),
        }
    }

    pub fn grit(&self) -> i64 {
        self.grit
    }

    pub fn favors(&self) -> i64 {
        self.favors
    }

    pub fn balance(&self, kind: Currency) -> i64 {
        match kind {
            Currency::Grit => self.grit,
            Currency::Favors => self.favors,
        }
    }

    /// Add `amount` to a balance. Non-positive amounts are ignored.
    pub fn credit(&mut self, kind: Currency, amount: i64) {
        if amount <= 0 {
            return;
        }
        match kind {
            Currency::Grit => {
                self.grit += amount;
                self.grit_changed.emit(&self.grit);
            }
            Currency::Favors => {
                self.favors += amount;
                self.favors_changed.emit(&self.favors);
            }
        }
    }

    /// Remove `amount` from a balance. Fails (returning false, touching
    /// nothing) on non-positive amounts or insufficient funds.
    pub fn debit(&mut self, kind: Currency, amount: i64) -> bool {
        if amount <= 0 || self.balance(kind) < amount {
            return false;
        }
        match kind {
            Currency::Grit => {
                self.grit -= amount;
                self.grit_changed.emit(&self.grit);
            }
            Currency::Favors => {
                self.favors -= amount;
                self.favors_changed.emit(&self.favors);
            }
        }
        true
    }

    /// Replace both balances (snapshot load). Fires both change signals.
    pub fn load(&mut self, grit: i64, favors: i64) {
        self.grit = grit.max(0);
        self.favors = favors.max(0);
        self.grit_changed.emit(&self.grit);
        self.favors_changed.emit(&self.favors);
    }

    /// Back to a fresh game
    pub fn reset(&mut self) {
        self.load(0, 0);
    }
}

//! The prestige cycle
//!
//! Crossing the distance threshold makes a prestige available: trading all
//! base progress (distance, slope, combo, normal upgrade levels) for a
//! permanent favors payout. Currencies themselves are not reset - grit on
//! hand survives the cycle.

use crate::consts::PRESTIGE_THRESHOLD;
use crate::economy::{Currency, Economy};
use crate::ledger::{UnlockContext, UpgradeLedger};
use crate::signal::Signal;
use crate::sim::ProgressEngine;

/// Evaluates prestige eligibility and orchestrates the reset transaction
pub struct PrestigeController {
    count: u32,
    /// Edge-trigger cache for the availability signal
    was_available: bool,
    /// Fired once when prestige becomes available (false -> true transitions
    /// only)
    pub available: Signal<()>,
    /// Fired with the favors payout after a completed prestige
    pub completed: Signal<i64>,
}

impl Default for PrestigeController {
    fn default() -> Self {
        Self::new()
    }
}

impl PrestigeController {
    pub fn new() -> Self {
        Self {
            count: 0,
            was_available: false,
            available: Signal::new(),
            completed: Signal::new(),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> f32 {
        PRESTIGE_THRESHOLD
    }

    pub fn is_eligible(&self, engine: &ProgressEngine) -> bool {
        engine.distance() >= PRESTIGE_THRESHOLD
    }

    /// Favors paid out by a prestige right now: the squared whole multiple of
    /// the threshold, so overshooting pays superlinearly. Zero when not
    /// eligible.
    pub fn reward(&self, engine: &ProgressEngine) -> i64 {
        if !self.is_eligible(engine) {
            return 0;
        }
        let multiples = (engine.distance() / PRESTIGE_THRESHOLD).floor() as i64;
        multiples * multiples
    }

    /// Edge-triggered availability check, run once per tick by the host.
    /// Fires `available` only on the false -> true transition.
    pub fn check_availability(&mut self, engine: &ProgressEngine) {
        let now = self.is_eligible(engine);
        if now && !self.was_available {
            self.available.emit(&());
        }
        self.was_available = now;
    }

    /// Perform the prestige: credit favors, bump the count, reset progress
    /// and normal upgrade levels. No-op returning false when not eligible.
    pub fn execute(
        &mut self,
        economy: &mut Economy,
        engine: &mut ProgressEngine,
        ledger: &mut UpgradeLedger,
    ) -> bool {
        if !self.is_eligible(engine) {
            return false;
        }

        let favors = self.reward(engine);
        economy.credit(Currency::Favors, favors);
        self.count += 1;

        engine.reset_progress();
        let ctx = UnlockContext {
            distance: engine.distance(),
            prestige_count: self.count,
            grit: economy.grit(),
            favors: economy.favors(),
        };
        ledger.reset_primary(&ctx);

        self.was_available = false;
        self.completed.emit(&favors);
        log::info!("Prestige #{} complete: +{} favors", self.count, favors);
        true
    }

    /// Replace the count from a snapshot and re-baseline the availability
    /// edge trigger against the loaded distance.
    pub fn load(&mut self, count: u32, engine: &ProgressEngine) {
        self.count = count;
        self.was_available = self.is_eligible(engine);
    }

    /// Back to a fresh game
    pub fn reset(&mut self) {
        self.count = 0;
        self.was_available = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{UpgradeId, default_catalog};
    use std::cell::Cell;
    use std::rc::Rc;

    fn fixture() -> (Economy, ProgressEngine, UpgradeLedger, PrestigeController) {
        (
            Economy::new(),
            ProgressEngine::new(1),
            UpgradeLedger::new(default_catalog()),
            PrestigeController::new(),
        )
    }

    // Lump adjustment gets there without slope drift
    fn push_to_distance(engine: &mut ProgressEngine, distance: f32) {
        engine.apply_distance_lump(distance - engine.distance());
    }

    #[test]
    fn test_not_eligible_below_threshold() {
        let (_, mut engine, _, prestige) = fixture();
        push_to_distance(&mut engine, 9_999.0);

        assert!(!prestige.is_eligible(&engine));
        assert_eq!(prestige.reward(&engine), 0);
    }

    #[test]
    fn test_reward_is_squared_threshold_multiple() {
        let (_, mut engine, _, prestige) = fixture();
        push_to_distance(&mut engine, 25_000.0);

        // floor(25000 / 10000)^2 = 4
        assert_eq!(prestige.reward(&engine), 4);
    }

    #[test]
    fn test_execute_performs_full_reset() {
        let (mut economy, mut engine, mut ledger, mut prestige) = fixture();
        economy.credit(Currency::Grit, 500);
        ledger.load(&[(UpgradeId::Heave, 7)], &[], &Default::default());
        push_to_distance(&mut engine, 25_000.0);

        let expected = prestige.reward(&engine);
        assert!(prestige.execute(&mut economy, &mut engine, &mut ledger));

        assert_eq!(economy.favors(), expected);
        assert_eq!(prestige.count(), 1);
        assert_eq!(engine.distance(), 0.0);
        assert_eq!(engine.slope(), 1.0);
        assert!(!engine.combo().active);
        assert_eq!(ledger.level(UpgradeId::Heave), 0);
        // Grit on hand survives the cycle
        assert_eq!(economy.grit(), 500);
    }

    #[test]
    fn test_execute_below_threshold_is_noop() {
        let (mut economy, mut engine, mut ledger, mut prestige) = fixture();
        push_to_distance(&mut engine, 500.0);

        assert!(!prestige.execute(&mut economy, &mut engine, &mut ledger));
        assert_eq!(prestige.count(), 0);
        assert_eq!(economy.favors(), 0);
        assert_eq!(engine.distance(), 500.0);
    }

    #[test]
    fn test_second_execute_needs_fresh_eligibility() {
        let (mut economy, mut engine, mut ledger, mut prestige) = fixture();
        push_to_distance(&mut engine, 12_000.0);

        assert!(prestige.execute(&mut economy, &mut engine, &mut ledger));
        // Distance was reset, so an immediate repeat does nothing
        assert!(!prestige.execute(&mut economy, &mut engine, &mut ledger));
        assert_eq!(prestige.count(), 1);
        assert_eq!(economy.favors(), 1);
    }

    #[test]
    fn test_available_signal_is_edge_triggered() {
        let (mut economy, mut engine, mut ledger, mut prestige) = fixture();

        let fired = Rc::new(Cell::new(0u32));
        let sink = Rc::clone(&fired);
        prestige.available.connect(move |_| sink.set(sink.get() + 1));

        prestige.check_availability(&engine);
        assert_eq!(fired.get(), 0);

        push_to_distance(&mut engine, 11_000.0);
        prestige.check_availability(&engine);
        prestige.check_availability(&engine);
        prestige.check_availability(&engine);
        assert_eq!(fired.get(), 1);

        // Prestige, then crossing the threshold again re-arms the signal
        assert!(prestige.execute(&mut economy, &mut engine, &mut ledger));
        prestige.check_availability(&engine);
        assert_eq!(fired.get(), 1);

        push_to_distance(&mut engine, 10_500.0);
        prestige.check_availability(&engine);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_completed_signal_carries_payout() {
        let (mut economy, mut engine, mut ledger, mut prestige) = fixture();
        push_to_distance(&mut engine, 30_000.0);

        let payout = Rc::new(Cell::new(0i64));
        let sink = Rc::clone(&payout);
        prestige.completed.connect(move |favors| sink.set(*favors));

        assert!(prestige.execute(&mut economy, &mut engine, &mut ledger));
        assert_eq!(payout.get(), 9);
    }
}

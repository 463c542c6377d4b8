//! Composition root
//!
//! Owns the wired component graph and exposes the whole external surface:
//! action entry points, the read model and the change signals. External
//! drivers (UI, scheduler, persistence) talk to [`Game`] and never to the
//! components directly, so all cross-component orchestration lives here.

use crate::catalog::{PrestigeId, UpgradeCatalog, UpgradeId, default_catalog};
use crate::economy::{Currency, Economy};
use crate::ledger::{UnlockContext, UpgradeLedger};
use crate::prestige::PrestigeController;
use crate::save::{OfflineGain, SaveSnapshot, offline_gain};
use crate::signal::Signal;
use crate::sim::{ComboState, ProgressEngine, ProgressState};

/// The wired game core. One instance per run; the host serializes all calls
/// (single simulation clock, no internal timers or threads).
pub struct Game {
    economy: Economy,
    ledger: UpgradeLedger,
    engine: ProgressEngine,
    prestige: PrestigeController,
}

impl Game {
    pub fn new(seed: u64) -> Self {
        Self::with_catalog(default_catalog(), seed)
    }

    pub fn with_catalog(catalog: UpgradeCatalog, seed: u64) -> Self {
        let mut game = Self {
            economy: Economy::new(),
            ledger: UpgradeLedger::new(catalog),
            engine: ProgressEngine::new(seed),
            prestige: PrestigeController::new(),
        };
        let ctx = game.unlock_ctx();
        game.ledger.rebaseline_unlocks(&ctx);
        game
    }

    fn unlock_ctx(&self) -> UnlockContext {
        UnlockContext {
            distance: self.engine.distance(),
            prestige_count: self.prestige.count(),
            grit: self.economy.grit(),
            favors: self.economy.favors(),
        }
    }

    // --- Action entry points ---

    /// Player-triggered push
    pub fn manual_push(&mut self) {
        self.engine.manual_push(&self.ledger, &mut self.economy);
    }

    /// Scheduler-triggered push; call at `auto_push_rate()` pushes/second
    pub fn auto_push(&mut self) {
        self.engine.auto_push(&self.ledger, &mut self.economy);
    }

    /// Advance the simulation clock. Runs combo maintenance plus the
    /// edge-triggered unlock and prestige-availability scans.
    pub fn tick(&mut self, dt: f32) {
        self.engine.tick(dt);
        let ctx = self.unlock_ctx();
        self.ledger.check_unlocks(&ctx);
        self.prestige.check_availability(&self.engine);
    }

    pub fn purchase(&mut self, id: UpgradeId) -> bool {
        let ctx = self.unlock_ctx();
        self.ledger.purchase(id, &mut self.economy, &ctx)
    }

    pub fn purchase_prestige(&mut self, id: PrestigeId) -> bool {
        self.ledger.purchase_prestige(id, &mut self.economy)
    }

    pub fn execute_prestige(&mut self) -> bool {
        self.prestige
            .execute(&mut self.economy, &mut self.engine, &mut self.ledger)
    }

    // --- Persistence ---

    /// Produce the persisted artifact. `saved_at` is the caller's wall clock
    /// in unix seconds.
    pub fn snapshot(&self, saved_at: i64) -> SaveSnapshot {
        SaveSnapshot {
            version: crate::consts::SAVE_VERSION,
            grit: self.economy.grit(),
            favors: self.economy.favors(),
            upgrades: self.ledger.normal_levels_vec(),
            prestige_upgrades: self.ledger.prestige_levels_vec(),
            distance: self.engine.distance(),
            slope: self.engine.slope(),
            combo: self.engine.combo().clone(),
            prestige_count: self.prestige.count(),
            seed: self.engine.seed(),
            saved_at,
        }
    }

    /// Apply a snapshot wholesale. An invalid snapshot is never partially
    /// applied: the game falls back to a fresh default state and this
    /// returns false.
    pub fn load_snapshot(&mut self, snapshot: &SaveSnapshot) -> bool {
        if !snapshot.validate() {
            log::warn!("Snapshot failed validation, starting fresh");
            self.reset_to_defaults();
            return false;
        }

        self.economy.load(snapshot.grit, snapshot.favors);
        self.engine.load(
            ProgressState {
                distance: snapshot.distance,
                slope: snapshot.slope,
                combo: snapshot.combo.clone(),
            },
            snapshot.seed,
        );

        let ctx = UnlockContext {
            distance: snapshot.distance,
            prestige_count: snapshot.prestige_count,
            grit: snapshot.grit,
            favors: snapshot.favors,
        };
        self.ledger
            .load(&snapshot.upgrades, &snapshot.prestige_upgrades, &ctx);
        self.prestige.load(snapshot.prestige_count, &self.engine);

        log::info!(
            "Snapshot loaded: distance {:.1}, {} grit, {} favors, prestige {}",
            snapshot.distance,
            snapshot.grit,
            snapshot.favors,
            snapshot.prestige_count
        );
        true
    }

    /// Fresh game, keeping the catalog and every connected listener
    pub fn reset_to_defaults(&mut self) {
        self.economy.reset();
        self.engine.reset_progress();
        self.prestige.reset();
        let ctx = self.unlock_ctx();
        self.ledger.reset(&ctx);
    }

    /// Apply the offline lump for time spent away since `snapshot` was taken.
    /// Returns what was granted, or `None` when nothing applied.
    pub fn apply_offline_progress(
        &mut self,
        snapshot: &SaveSnapshot,
        elapsed_secs: i64,
    ) -> Option<OfflineGain> {
        let gain = offline_gain(snapshot, self.ledger.catalog(), elapsed_secs)?;
        self.engine.apply_distance_lump(gain.distance);
        self.economy.credit(Currency::Grit, gain.grit);
        Some(gain)
    }

    // --- Read model ---

    pub fn grit(&self) -> i64 {
        self.economy.grit()
    }

    pub fn favors(&self) -> i64 {
        self.economy.favors()
    }

    pub fn distance(&self) -> f32 {
        self.engine.distance()
    }

    pub fn slope(&self) -> f32 {
        self.engine.slope()
    }

    pub fn combo(&self) -> &ComboState {
        self.engine.combo()
    }

    pub fn prestige_count(&self) -> u32 {
        self.prestige.count()
    }

    pub fn level(&self, id: UpgradeId) -> u32 {
        self.ledger.level(id)
    }

    pub fn prestige_level(&self, id: PrestigeId) -> u32 {
        self.ledger.prestige_level(id)
    }

    pub fn cost(&self, id: UpgradeId) -> Option<i64> {
        self.ledger.cost(id)
    }

    pub fn prestige_cost(&self, id: PrestigeId) -> Option<i64> {
        self.ledger.prestige_cost(id)
    }

    pub fn is_unlocked(&self, id: UpgradeId) -> bool {
        self.ledger.is_unlocked(id, &self.unlock_ctx())
    }

    /// Auto pushes per second for the external scheduler; 0 means don't call
    /// `auto_push` at all
    pub fn auto_push_rate(&self) -> f32 {
        self.ledger.auto_push_rate()
    }

    pub fn prestige_eligible(&self) -> bool {
        self.prestige.is_eligible(&self.engine)
    }

    pub fn prestige_reward(&self) -> i64 {
        self.prestige.reward(&self.engine)
    }

    pub fn prestige_threshold(&self) -> f32 {
        self.prestige.threshold()
    }

    // --- Signals ---

    pub fn grit_changed(&mut self) -> &mut Signal<i64> {
        &mut self.economy.grit_changed
    }

    pub fn favors_changed(&mut self) -> &mut Signal<i64> {
        &mut self.economy.favors_changed
    }

    pub fn distance_changed(&mut self) -> &mut Signal<f32> {
        &mut self.engine.distance_changed
    }

    pub fn slope_changed(&mut self) -> &mut Signal<f32> {
        &mut self.engine.slope_changed
    }

    pub fn combo_changed(&mut self) -> &mut Signal<ComboState> {
        &mut self.engine.combo_changed
    }

    pub fn critical_hit(&mut self) -> &mut Signal<f32> {
        &mut self.engine.critical_hit
    }

    pub fn upgrade_purchased(&mut self) -> &mut Signal<(UpgradeId, u32)> {
        &mut self.ledger.purchased
    }

    pub fn prestige_upgrade_purchased(&mut self) -> &mut Signal<(PrestigeId, u32)> {
        &mut self.ledger.prestige_purchased
    }

    pub fn upgrade_unlocked(&mut self) -> &mut Signal<UpgradeId> {
        &mut self.ledger.unlocked
    }

    pub fn prestige_available(&mut self) -> &mut Signal<()> {
        &mut self.prestige.available
    }

    pub fn prestige_completed(&mut self) -> &mut Signal<i64> {
        &mut self.prestige.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Snapshot with a healthy mid-run state
    fn mid_run_snapshot() -> SaveSnapshot {
        SaveSnapshot {
            version: SAVE_VERSION,
            grit: 2_000,
            favors: 3,
            upgrades: vec![
                (UpgradeId::Heave, 6),
                (UpgradeId::Stamina, 2),
                (UpgradeId::Brawn, 1),
            ],
            prestige_upgrades: vec![(PrestigeId::Might, 1)],
            distance: 4_200.0,
            slope: 2.1,
            combo: ComboState::default(),
            prestige_count: 1,
            seed: 99,
            saved_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_fresh_game_defaults() {
        let game = Game::new(7);
        assert_eq!(game.grit(), 0);
        assert_eq!(game.favors(), 0);
        assert_eq!(game.distance(), 0.0);
        assert_eq!(game.slope(), 1.0);
        assert_eq!(game.prestige_count(), 0);
        assert!(game.is_unlocked(UpgradeId::Heave));
        assert!(!game.is_unlocked(UpgradeId::Stamina));
    }

    #[test]
    fn test_pushing_earns_grit_and_distance() {
        let mut game = Game::new(7);
        for _ in 0..10 {
            game.manual_push();
            game.tick(0.1);
        }
        assert!(game.distance() > 0.0);
        assert!(game.grit() > 0);
    }

    #[test]
    fn test_purchase_flow_through_game() {
        let mut game = Game::new(7);
        // Earn enough for the first Heave level
        while game.grit() < 10 {
            game.manual_push();
            game.tick(0.05);
        }
        let grit_before = game.grit();
        assert!(game.purchase(UpgradeId::Heave));
        assert_eq!(game.level(UpgradeId::Heave), 1);
        assert_eq!(game.grit(), grit_before - 10);

        // Locked upgrade is rejected even with funds
        assert!(!game.purchase(UpgradeId::Brawn));
    }

    #[test]
    fn test_snapshot_round_trip_reproduces_state() {
        let mut game = Game::new(7);
        assert!(game.load_snapshot(&mid_run_snapshot()));

        // Mutate a little so the snapshot isn't the fixture verbatim
        for _ in 0..25 {
            game.manual_push();
            game.tick(1.0 / 60.0);
        }

        let saved = game.snapshot(1_700_000_500);
        let mut restored = Game::new(0);
        assert!(restored.load_snapshot(&saved));

        assert_eq!(restored.grit(), game.grit());
        assert_eq!(restored.favors(), game.favors());
        assert_eq!(restored.distance(), game.distance());
        assert!((restored.slope() - game.slope()).abs() < 1e-5);
        assert_eq!(restored.prestige_count(), game.prestige_count());
        for id in UpgradeId::ALL {
            assert_eq!(restored.level(id), game.level(id));
        }
        for id in PrestigeId::ALL {
            assert_eq!(restored.prestige_level(id), game.prestige_level(id));
        }
        assert_eq!(restored.combo(), game.combo());
    }

    #[test]
    fn test_invalid_snapshot_falls_back_to_defaults() {
        let mut game = Game::new(7);
        assert!(game.load_snapshot(&mid_run_snapshot()));
        assert!(game.grit() > 0);

        let mut corrupt = mid_run_snapshot();
        corrupt.slope = -3.0;
        assert!(!game.load_snapshot(&corrupt));

        // Nothing of the corrupt snapshot stuck - full defaults
        assert_eq!(game.grit(), 0);
        assert_eq!(game.favors(), 0);
        assert_eq!(game.distance(), 0.0);
        assert_eq!(game.slope(), 1.0);
        assert_eq!(game.prestige_count(), 0);
        assert_eq!(game.level(UpgradeId::Heave), 0);
    }

    #[test]
    fn test_load_rebaselines_unlock_events() {
        let mut game = Game::new(7);

        let unlocks: Rc<RefCell<Vec<UpgradeId>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&unlocks);
        game.upgrade_unlocked()
            .connect(move |id| sink.borrow_mut().push(*id));

        // Loaded state already satisfies Stamina/Brawn/Momentum conditions;
        // none of them may announce as freshly unlocked afterwards
        assert!(game.load_snapshot(&mid_run_snapshot()));
        game.tick(1.0 / 60.0);
        assert!(unlocks.borrow().is_empty());
    }

    #[test]
    fn test_full_prestige_cycle_through_game() {
        let mut game = Game::new(7);
        let mut snapshot = mid_run_snapshot();
        snapshot.distance = 25_000.0;
        snapshot.slope = 12.0;
        assert!(game.load_snapshot(&snapshot));

        let completions = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&completions);
        game.prestige_completed()
            .connect(move |favors: &i64| sink.borrow_mut().push(*favors));

        assert!(game.prestige_eligible());
        assert_eq!(game.prestige_reward(), 4);
        assert!(game.execute_prestige());

        assert_eq!(game.favors(), 3 + 4);
        assert_eq!(game.prestige_count(), 2);
        assert_eq!(game.distance(), 0.0);
        assert_eq!(game.slope(), 1.0);
        assert_eq!(game.level(UpgradeId::Heave), 0);
        // Prestige track and grit survive
        assert_eq!(game.prestige_level(PrestigeId::Might), 1);
        assert_eq!(game.grit(), 2_000);
        assert_eq!(completions.borrow().as_slice(), &[4]);

        // Spend the favors
        assert!(game.purchase_prestige(PrestigeId::Grace));
        assert_eq!(game.prestige_level(PrestigeId::Grace), 1);
    }

    #[test]
    fn test_offline_progress_through_game() {
        let mut game = Game::new(7);
        let snapshot = mid_run_snapshot();
        assert!(game.load_snapshot(&snapshot));

        let distance_before = game.distance();
        let grit_before = game.grit();

        assert!(game.apply_offline_progress(&snapshot, 30).is_none());
        assert_eq!(game.distance(), distance_before);

        let gain = game.apply_offline_progress(&snapshot, 600).unwrap();
        assert!(gain.distance > 0.0);
        assert_eq!(game.distance(), distance_before + gain.distance);
        assert_eq!(game.grit(), grit_before + gain.grit);
    }

    #[test]
    fn test_distance_unlock_fires_on_tick() {
        let mut game = Game::new(7);

        let unlocks: Rc<RefCell<Vec<UpgradeId>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&unlocks);
        game.upgrade_unlocked()
            .connect(move |id| sink.borrow_mut().push(*id));

        // KeenEye needs distance 500 and 50 grit; cross both mid-run
        let mut snapshot = mid_run_snapshot();
        snapshot.distance = 499.0;
        snapshot.grit = 49;
        assert!(game.load_snapshot(&snapshot));
        game.tick(1.0 / 60.0);
        assert!(unlocks.borrow().is_empty());

        // A few strong pushes cross 500 distance and 50 grit
        for _ in 0..5 {
            game.manual_push();
            game.tick(1.0 / 60.0);
        }
        assert!(game.distance() >= 500.0);
        let keen_events = unlocks
            .borrow()
            .iter()
            .filter(|&&id| id == UpgradeId::KeenEye)
            .count();
        assert_eq!(keen_events, 1);
    }
}

//! The push pipeline
//!
//! Each push runs the same stages in order: slope resistance, critical roll,
//! combo window update, streak multiplier, distance advance, slope smoothing,
//! grit reward. `tick(dt)` is the only place time passes - it ages the combo
//! window and decays the streak timer.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::state::{ComboState, ProgressState, PushSample};
use crate::consts::*;
use crate::economy::{Currency, Economy};
use crate::ledger::UpgradeLedger;
use crate::lerp;
use crate::signal::Signal;

/// Owns the progression state and drives the push pipeline
pub struct ProgressEngine {
    state: ProgressState,
    /// Run seed, persisted so a reload reproduces the roll stream
    seed: u64,
    rng: Pcg32,
    /// Most recent tick dt - the slope smoothing fraction
    tick_dt: f32,
    /// Fired with the new total after every distance change
    pub distance_changed: Signal<f32>,
    /// Fired with the new slope after a meaningful slope change
    pub slope_changed: Signal<f32>,
    /// Fired whenever the combo state mutates, including the Idle transition
    pub combo_changed: Signal<ComboState>,
    /// Fired with the post-multiplier power of a critical push
    pub critical_hit: Signal<f32>,
}

impl ProgressEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            state: ProgressState::default(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tick_dt: DEFAULT_TICK_DT,
            distance_changed: Signal::new(),
            slope_changed: Signal::new(),
            combo_changed: Signal::new(),
            critical_hit: Signal::new(),
        }
    }

    pub fn distance(&self) -> f32 {
        self.state.distance
    }

    pub fn slope(&self) -> f32 {
        self.state.slope
    }

    pub fn combo(&self) -> &ComboState {
        &self.state.combo
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A player-triggered push: base power plus the Heave bonus, scaled by
    /// the prestige power multiplier.
    pub fn manual_push(&mut self, ledger: &UpgradeLedger, economy: &mut Economy) {
        let raw = (BASE_PUSH_POWER + ledger.manual_push_power()) * ledger.prestige_power_multiplier();
        self.process_push(raw, true, ledger, economy);
    }

    /// A scheduler-triggered push: Brawn power scaled by the prestige power
    /// multiplier. The external scheduler fires these at `auto_push_rate()`
    /// pushes per second.
    pub fn auto_push(&mut self, ledger: &UpgradeLedger, economy: &mut Economy) {
        let raw = ledger.auto_push_power() * ledger.prestige_power_multiplier();
        self.process_push(raw, false, ledger, economy);
    }

    fn process_push(
        &mut self,
        raw_power: f32,
        is_manual: bool,
        ledger: &UpgradeLedger,
        economy: &mut Economy,
    ) {
        // Slope resistance
        let mut effective = raw_power / self.state.slope;

        // Critical roll, uniform over [0, 100)
        let roll: f32 = self.rng.random_range(0.0..100.0);
        if roll < ledger.critical_chance() {
            effective *= ledger.critical_multiplier();
            self.critical_hit.emit(&effective);
        }

        // Combo window: record this push, drop stale samples, and (re)enter
        // the streak whenever recent throughput clears the threshold. Exit
        // only ever happens via timer decay in tick().
        self.state.combo.window.push(PushSample {
            power: effective,
            age: 0.0,
        });
        self.state.combo.prune();
        if self.state.combo.windowed_power() >= SPEED_THRESHOLD {
            self.state.combo.active = true;
            self.state.combo.timer = MAX_COMBO_TIME;
            self.state.combo.multiplier = ledger.combo_multiplier_base();
        }
        self.combo_changed.emit(&self.state.combo);

        if self.state.combo.active {
            effective *= self.state.combo.multiplier;
        }

        self.state.distance += effective;
        self.update_slope(ledger);

        // Grit reward scales with how far up the hill the boulder already is
        let reward = (effective
            * GRIT_RATE
            * (1.0 + self.state.distance / REWARD_DISTANCE_SCALE)
            * ledger.grit_multiplier())
        .round() as i64;
        economy.credit(Currency::Grit, reward);

        log::trace!(
            "{} push: raw {:.2} -> effective {:.2}, distance {:.1}",
            if is_manual { "manual" } else { "auto" },
            raw_power,
            effective,
            self.state.distance
        );

        self.distance_changed.emit(&self.state.distance);
    }

    /// Smooth the slope toward its distance-derived target. The lerp fraction
    /// is the host's tick dt, so the slope ramps instead of stepping.
    fn update_slope(&mut self, ledger: &UpgradeLedger) {
        let target = (1.0 + (self.state.distance / SLOPE_INTERVAL) * SLOPE_RATE)
            * (1.0 - ledger.slope_reduction());
        if (target - self.state.slope).abs() > SLOPE_EPSILON {
            self.state.slope = lerp(self.state.slope, target, self.tick_dt);
            self.slope_changed.emit(&self.state.slope);
        }
    }

    /// Advance simulation time: age the combo window and decay the streak
    /// timer. The Streaking -> Idle transition fires `combo_changed` exactly
    /// once per expiry.
    pub fn tick(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.tick_dt = dt;

        for sample in &mut self.state.combo.window {
            sample.age += dt;
        }
        self.state.combo.prune();

        if self.state.combo.active {
            self.state.combo.timer -= dt;
            if self.state.combo.timer <= 0.0 {
                self.state.combo.reset();
                self.combo_changed.emit(&self.state.combo);
                log::debug!("streak expired");
            }
        }
    }

    /// Back to the bottom of the hill. Used by the prestige cycle and on new
    /// game.
    pub fn reset_progress(&mut self) {
        self.state = ProgressState::default();
        self.distance_changed.emit(&self.state.distance);
        self.slope_changed.emit(&self.state.slope);
        self.combo_changed.emit(&self.state.combo);
    }

    /// Replace state from a snapshot and reseed the roll stream
    pub fn load(&mut self, state: ProgressState, seed: u64) {
        self.state = state;
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.distance_changed.emit(&self.state.distance);
        self.slope_changed.emit(&self.state.slope);
        self.combo_changed.emit(&self.state.combo);
    }

    /// One lump distance adjustment, used for offline progress. Slope is left
    /// to catch up through normal smoothing.
    pub fn apply_distance_lump(&mut self, delta: f32) {
        if delta <= 0.0 {
            return;
        }
        self.state.distance += delta;
        self.distance_changed.emit(&self.state.distance);
    }
}

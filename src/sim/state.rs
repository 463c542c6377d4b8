//! Progression state and combo tracking
//!
//! All state that must be persisted for save/load lives here as plain data.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// One push's contribution to the combo window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PushSample {
    pub power: f32,
    /// Seconds since the push landed
    pub age: f32,
}

/// Streak state. Two implicit phases: Idle (inactive, multiplier 1) and
/// Streaking (active, timer > 0, multiplier from the Momentum upgrade).
/// Whenever the timer hits zero the state is back to Idle - `multiplier == 1`
/// and `active == false` always hold together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub multiplier: f32,
    /// Seconds left before the streak expires
    pub timer: f32,
    pub active: bool,
    /// Recent push powers, oldest first; only samples younger than
    /// `COMBO_WINDOW` are kept
    #[serde(default)]
    pub window: Vec<PushSample>,
}

impl Default for ComboState {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            timer: 0.0,
            active: false,
            window: Vec::new(),
        }
    }
}

impl ComboState {
    /// Sum of push power inside the recency window
    pub fn windowed_power(&self) -> f32 {
        self.window.iter().map(|sample| sample.power).sum()
    }

    /// Drop samples that aged out of the window
    pub fn prune(&mut self) {
        self.window.retain(|sample| sample.age < COMBO_WINDOW);
    }

    /// Forced return to Idle
    pub fn reset(&mut self) {
        *self = ComboState::default();
    }
}

/// Everything the push pipeline mutates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Cumulative distance pushed; only a prestige reset moves it down
    pub distance: f32,
    /// Difficulty coefficient dividing push power; grows with distance
    pub slope: f32,
    pub combo: ComboState,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            distance: 0.0,
            slope: 1.0,
            combo: ComboState::default(),
        }
    }
}

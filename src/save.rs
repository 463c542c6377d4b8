//! Versioned save snapshots and offline progress
//!
//! The snapshot is the sole persisted artifact: a flattened record of
//! currencies, upgrade levels (as id/level pairs), progress and the prestige
//! count. An external collaborator owns the actual I/O; the core only
//! produces snapshots, validates them on the way back in and computes the
//! offline lump adjustment.

use serde::{Deserialize, Serialize};

use crate::catalog::{PrestigeId, UpgradeCatalog, UpgradeId};
use crate::consts::*;
use crate::sim::ComboState;

/// Flattened, versioned record of everything worth keeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    pub version: u32,
    pub grit: i64,
    pub favors: i64,
    /// Normal upgrade levels as (id, level) pairs; absent ids are level 0
    pub upgrades: Vec<(UpgradeId, u32)>,
    /// Prestige upgrade levels, same shape
    pub prestige_upgrades: Vec<(PrestigeId, u32)>,
    pub distance: f32,
    pub slope: f32,
    pub combo: ComboState,
    pub prestige_count: u32,
    /// Run seed for the deterministic roll stream
    pub seed: u64,
    /// Unix timestamp (seconds) when the snapshot was taken, supplied by the
    /// caller - the core holds no clock
    pub saved_at: i64,
}

impl SaveSnapshot {
    /// Sanity rules a snapshot must pass before any of it is applied:
    /// non-negative currencies and distance, strictly positive slope, finite
    /// floats, matching format version. Anything else is rejected whole.
    pub fn validate(&self) -> bool {
        if self.version != SAVE_VERSION {
            log::warn!(
                "Snapshot version {} doesn't match expected {}",
                self.version,
                SAVE_VERSION
            );
            return false;
        }
        if self.grit < 0 || self.favors < 0 {
            log::warn!("Snapshot rejected: negative currency");
            return false;
        }
        if !self.distance.is_finite() || self.distance < 0.0 {
            log::warn!("Snapshot rejected: bad distance {}", self.distance);
            return false;
        }
        if !self.slope.is_finite() || self.slope <= 0.0 {
            log::warn!("Snapshot rejected: bad slope {}", self.slope);
            return false;
        }
        true
    }

    fn level_of(&self, id: UpgradeId) -> u32 {
        self.upgrades
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|&(_, level)| level)
            .unwrap_or(0)
    }

    fn prestige_level_of(&self, id: PrestigeId) -> u32 {
        self.prestige_upgrades
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|&(_, level)| level)
            .unwrap_or(0)
    }
}

/// The lump adjustment earned while the game was closed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfflineGain {
    pub distance: f32,
    pub grit: i64,
}

/// Compute offline progress from a snapshot's saved upgrade levels.
///
/// An explicit approximation, not a replay: auto-push rate and power are
/// reconstructed straight from the saved levels and catalog definitions
/// (no ledger events fire), and the whole absence becomes one
/// `rate * elapsed * power` distance lump plus its grit. Returns `None`
/// when the absence is too short to count or nothing was pushing.
pub fn offline_gain(
    snapshot: &SaveSnapshot,
    catalog: &UpgradeCatalog,
    elapsed_secs: i64,
) -> Option<OfflineGain> {
    if elapsed_secs <= OFFLINE_MIN_SECS {
        return None;
    }

    let rate = catalog
        .get(UpgradeId::Stamina)?
        .effect
        .value_at(snapshot.level_of(UpgradeId::Stamina));
    if rate <= 0.0 {
        return None;
    }

    let base_power = catalog
        .get(UpgradeId::Brawn)?
        .effect
        .value_at(snapshot.level_of(UpgradeId::Brawn));
    let prestige_multiplier = catalog
        .get_prestige(PrestigeId::Might)?
        .effect
        .value_at(snapshot.prestige_level_of(PrestigeId::Might));

    let distance = rate * elapsed_secs as f32 * base_power * prestige_multiplier;
    let grit = (distance * GRIT_RATE).round() as i64;

    log::info!(
        "Offline for {}s: +{:.1} distance, +{} grit",
        elapsed_secs,
        distance,
        grit
    );
    Some(OfflineGain { distance, grit })
}

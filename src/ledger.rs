//! Upgrade levels, costs and purchase transactions
//!
//! The ledger owns the current level of every upgrade on both tracks plus the
//! catalog of definitions. Purchases are all-or-nothing: every check passes
//! before the economy is debited, and the level only moves after a successful
//! debit.
//!
//! Unlock events are edge-triggered: a cache of previous unlock states makes
//! sure `unlocked` fires exactly once per false-to-true transition, and
//! re-baselining after a reset or a snapshot load keeps it from re-firing for
//! upgrades that were already open.

use std::collections::HashMap;

use crate::catalog::{PrestigeId, UnlockCondition, UpgradeCatalog, UpgradeId};
use crate::economy::{Currency, Economy};
use crate::signal::Signal;

/// Read-only view of the state unlock conditions are evaluated against
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlockContext {
    pub distance: f32,
    pub prestige_count: u32,
    pub grit: i64,
    pub favors: i64,
}

/// Per-upgrade level tracking for both tracks
pub struct UpgradeLedger {
    catalog: UpgradeCatalog,
    normal_levels: HashMap<UpgradeId, u32>,
    prestige_levels: HashMap<PrestigeId, u32>,
    /// Unlock state as of the last scan, for edge triggering
    prev_unlocked: HashMap<UpgradeId, bool>,
    /// Fired with (id, new level) after a successful normal purchase
    pub purchased: Signal<(UpgradeId, u32)>,
    /// Fired with (id, new level) after a successful prestige purchase
    pub prestige_purchased: Signal<(PrestigeId, u32)>,
    /// Fired once per upgrade when its unlock state flips false -> true
    pub unlocked: Signal<UpgradeId>,
}

impl UpgradeLedger {
    pub fn new(catalog: UpgradeCatalog) -> Self {
        Self {
            catalog,
            normal_levels: HashMap::new(),
            prestige_levels: HashMap::new(),
            prev_unlocked: HashMap::new(),
            purchased: Signal::new(),
            prestige_purchased: Signal::new(),
            unlocked: Signal::new(),
        }
    }

    pub fn catalog(&self) -> &UpgradeCatalog {
        &self.catalog
    }

    /// Current level; unknown or never-purchased ids are level 0
    pub fn level(&self, id: UpgradeId) -> u32 {
        self.normal_levels.get(&id).copied().unwrap_or(0)
    }

    pub fn prestige_level(&self, id: PrestigeId) -> u32 {
        self.prestige_levels.get(&id).copied().unwrap_or(0)
    }

    /// Cost of the next level at the *current* level. Normal upgrades scale
    /// multiplicatively.
    pub fn cost(&self, id: UpgradeId) -> Option<i64> {
        let def = self.catalog.get(id)?;
        let level = self.level(id);
        Some((def.base_cost as f32 * def.cost_multiplier.powi(level as i32)).round() as i64)
    }

    /// Prestige upgrades scale linearly
    pub fn prestige_cost(&self, id: PrestigeId) -> Option<i64> {
        let def = self.catalog.get_prestige(id)?;
        let level = self.prestige_level(id);
        Some(def.base_cost + level as i64 * def.cost_increase)
    }

    /// True iff every unlock condition on the definition holds right now.
    /// Upgrades without a definition are never unlocked.
    pub fn is_unlocked(&self, id: UpgradeId, ctx: &UnlockContext) -> bool {
        let Some(def) = self.catalog.get(id) else {
            return false;
        };
        def.unlock_conditions
            .iter()
            .all(|condition| self.condition_met(condition, ctx))
    }

    fn condition_met(&self, condition: &UnlockCondition, ctx: &UnlockContext) -> bool {
        match *condition {
            UnlockCondition::UpgradeLevel { id, level } => self.level(id) >= level,
            UnlockCondition::Distance(required) => ctx.distance >= required,
            UnlockCondition::PrestigeCount(required) => ctx.prestige_count >= required,
            UnlockCondition::Currency { kind, amount } => match kind {
                Currency::Grit => ctx.grit >= amount,
                Currency::Favors => ctx.favors >= amount,
            },
        }
    }

    /// Buy one level of a normal upgrade. Fails without side effects when the
    /// definition is missing, the level cap is reached, the upgrade is locked
    /// or the economy can't cover the cost.
    pub fn purchase(&mut self, id: UpgradeId, economy: &mut Economy, ctx: &UnlockContext) -> bool {
        let Some(def) = self.catalog.get(id) else {
            return false;
        };
        let level = self.level(id);
        if def.max_level.is_some_and(|cap| level >= cap) {
            return false;
        }
        if !self.is_unlocked(id, ctx) {
            return false;
        }
        let Some(cost) = self.cost(id) else {
            return false;
        };
        if !economy.debit(Currency::Grit, cost) {
            return false;
        }

        let new_level = level + 1;
        self.normal_levels.insert(id, new_level);
        self.purchased.emit(&(id, new_level));

        // The purchase itself may have flipped other unlock conditions
        // (level- and currency-based ones), so rescan with fresh balances.
        let ctx = UnlockContext {
            grit: economy.grit(),
            favors: economy.favors(),
            ..*ctx
        };
        self.check_unlocks(&ctx);
        true
    }

    /// Buy one level of a prestige upgrade. Prestige upgrades are always
    /// unlocked; everything else mirrors the normal flow.
    pub fn purchase_prestige(&mut self, id: PrestigeId, economy: &mut Economy) -> bool {
        let Some(def) = self.catalog.get_prestige(id) else {
            return false;
        };
        let level = self.prestige_level(id);
        if level >= def.max_level {
            return false;
        }
        let Some(cost) = self.prestige_cost(id) else {
            return false;
        };
        if !economy.debit(Currency::Favors, cost) {
            return false;
        }

        let new_level = level + 1;
        self.prestige_levels.insert(id, new_level);
        self.prestige_purchased.emit(&(id, new_level));
        true
    }

    /// Edge-triggered unlock scan: fires `unlocked` for every upgrade whose
    /// state flipped false -> true since the last scan, then records the new
    /// states.
    pub fn check_unlocks(&mut self, ctx: &UnlockContext) {
        for id in UpgradeId::ALL {
            let now = self.is_unlocked(id, ctx);
            let was = self.prev_unlocked.get(&id).copied().unwrap_or(false);
            if now && !was {
                self.unlocked.emit(&id);
            }
            self.prev_unlocked.insert(id, now);
        }
    }

    /// Record current unlock states without firing events. Used after resets
    /// and snapshot loads so already-open upgrades don't re-announce.
    pub fn rebaseline_unlocks(&mut self, ctx: &UnlockContext) {
        for id in UpgradeId::ALL {
            let state = self.is_unlocked(id, ctx);
            self.prev_unlocked.insert(id, state);
        }
    }

    /// Zero every normal level (prestige levels survive) and re-baseline the
    /// unlock cache against the post-reset world.
    pub fn reset_primary(&mut self, ctx: &UnlockContext) {
        self.normal_levels.clear();
        self.rebaseline_unlocks(ctx);
    }

    /// Replace all levels from a snapshot. Later duplicate entries win, like
    /// the flattened snapshot format allows.
    pub fn load(
        &mut self,
        normal: &[(UpgradeId, u32)],
        prestige: &[(PrestigeId, u32)],
        ctx: &UnlockContext,
    ) {
        self.normal_levels.clear();
        self.prestige_levels.clear();
        for &(id, level) in normal {
            self.normal_levels.insert(id, level);
        }
        for &(id, level) in prestige {
            self.prestige_levels.insert(id, level);
        }
        self.rebaseline_unlocks(ctx);
    }

    /// Back to a fresh game
    pub fn reset(&mut self, ctx: &UnlockContext) {
        self.normal_levels.clear();
        self.prestige_levels.clear();
        self.rebaseline_unlocks(ctx);
    }

    /// Flattened level list for snapshots, in a stable order
    pub fn normal_levels_vec(&self) -> Vec<(UpgradeId, u32)> {
        UpgradeId::ALL
            .iter()
            .filter_map(|&id| {
                let level = self.level(id);
                (level > 0).then_some((id, level))
            })
            .collect()
    }

    pub fn prestige_levels_vec(&self) -> Vec<(PrestigeId, u32)> {
        PrestigeId::ALL
            .iter()
            .filter_map(|&id| {
                let level = self.prestige_level(id);
                (level > 0).then_some((id, level))
            })
            .collect()
    }

    // --- Effect queries ---

    fn effect_value(&self, id: UpgradeId) -> f32 {
        self.catalog
            .get(id)
            .map(|def| def.effect.value_at(self.level(id)))
            .unwrap_or(0.0)
    }

    fn prestige_effect_value(&self, id: PrestigeId, missing: f32) -> f32 {
        self.catalog
            .get_prestige(id)
            .map(|def| def.effect.value_at(self.prestige_level(id)))
            .unwrap_or(missing)
    }

    /// Extra power on every manual push
    pub fn manual_push_power(&self) -> f32 {
        self.effect_value(UpgradeId::Heave)
    }

    /// Auto pushes per second; 0 means the scheduler never fires one
    pub fn auto_push_rate(&self) -> f32 {
        self.effect_value(UpgradeId::Stamina)
    }

    /// Power of each auto push
    pub fn auto_push_power(&self) -> f32 {
        self.effect_value(UpgradeId::Brawn)
    }

    /// Critical hit chance in percent, rolled against [0, 100)
    pub fn critical_chance(&self) -> f32 {
        self.effect_value(UpgradeId::KeenEye)
    }

    pub fn critical_multiplier(&self) -> f32 {
        self.effect_value(UpgradeId::Crush)
    }

    /// Streak multiplier applied while a combo is active
    pub fn combo_multiplier_base(&self) -> f32 {
        self.effect_value(UpgradeId::Momentum)
    }

    /// Permanent multiplier on all push power from prestige upgrades
    pub fn prestige_power_multiplier(&self) -> f32 {
        self.prestige_effect_value(PrestigeId::Might, 1.0)
    }

    /// Fractional reduction of the slope target, in [0, 1)
    pub fn slope_reduction(&self) -> f32 {
        self.prestige_effect_value(PrestigeId::Grace, 0.0)
    }

    /// Permanent multiplier on grit rewards from prestige upgrades
    pub fn grit_multiplier(&self) -> f32 {
        self.prestige_effect_value(PrestigeId::Bounty, 1.0)
    }
}

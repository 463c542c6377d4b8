//! Upgrade definitions and unlock conditions
//!
//! The catalog is load-once, read-only data: cost curves, level caps, effect
//! values and unlock requirements for both upgrade tracks. Everything else in
//! the crate reads definitions through [`UpgradeCatalog::get`] /
//! [`UpgradeCatalog::get_prestige`] and never mutates them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::economy::Currency;

/// Normal (grit) upgrade identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeId {
    /// Manual push power
    Heave,
    /// Auto push rate
    Stamina,
    /// Auto push power
    Brawn,
    /// Critical hit chance
    KeenEye,
    /// Critical hit multiplier
    Crush,
    /// Combo multiplier base
    Momentum,
}

impl UpgradeId {
    pub const ALL: [UpgradeId; 6] = [
        UpgradeId::Heave,
        UpgradeId::Stamina,
        UpgradeId::Brawn,
        UpgradeId::KeenEye,
        UpgradeId::Crush,
        UpgradeId::Momentum,
    ];
}

/// Prestige (favors) upgrade identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrestigeId {
    /// Multiplies all push power
    Might,
    /// Reduces the slope target
    Grace,
    /// Multiplies grit rewards
    Bounty,
}

impl PrestigeId {
    pub const ALL: [PrestigeId; 3] = [PrestigeId::Might, PrestigeId::Grace, PrestigeId::Bounty];
}

/// What one level of an upgrade is worth
#[derive(Debug, Clone, Copy)]
pub struct EffectData {
    pub base: f32,
    pub per_level: f32,
    /// Optional non-linear level curve; `None` means the effect is linear in
    /// the level
    pub curve: Option<fn(u32) -> f32>,
}

impl EffectData {
    pub const fn linear(base: f32, per_level: f32) -> Self {
        Self {
            base,
            per_level,
            curve: None,
        }
    }

    /// Effect value at `level`: `base + per_level * curve(level)`
    pub fn value_at(&self, level: u32) -> f32 {
        let steps = match self.curve {
            Some(curve) => curve(level),
            None => level as f32,
        };
        self.base + steps * self.per_level
    }
}

/// A single requirement gating a normal upgrade. Pure predicate - evaluated
/// against a read-only view of current state, never mutates anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnlockCondition {
    /// Another upgrade must be at least this level
    UpgradeLevel { id: UpgradeId, level: u32 },
    /// Cumulative distance must have reached this value
    Distance(f32),
    /// At least this many prestiges completed
    PrestigeCount(u32),
    /// A currency balance must be at least this amount
    Currency { kind: Currency, amount: i64 },
}

/// Definition of a normal upgrade. Cost scales multiplicatively per level.
#[derive(Debug, Clone)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: &'static str,
    pub description: &'static str,
    pub base_cost: i64,
    pub cost_multiplier: f32,
    /// `None` means the upgrade can be leveled indefinitely
    pub max_level: Option<u32>,
    pub unlock_conditions: &'static [UnlockCondition],
    pub effect: EffectData,
}

/// Definition of a prestige upgrade. Cost scales linearly per level and
/// prestige upgrades are always unlocked.
#[derive(Debug, Clone)]
pub struct PrestigeDef {
    pub id: PrestigeId,
    pub name: &'static str,
    pub description: &'static str,
    pub base_cost: i64,
    pub cost_increase: i64,
    pub max_level: u32,
    pub effect: EffectData,
}

/// Immutable upgrade lookup, built once at startup
pub struct UpgradeCatalog {
    normal: HashMap<UpgradeId, UpgradeDef>,
    prestige: HashMap<PrestigeId, PrestigeDef>,
}

impl UpgradeCatalog {
    /// Build the lookup tables. Duplicate ids are reported and the first
    /// definition wins; later lookups stay consistent with what was kept.
    pub fn new(normal: Vec<UpgradeDef>, prestige: Vec<PrestigeDef>) -> Self {
        let mut normal_map = HashMap::new();
        for def in normal {
            if normal_map.contains_key(&def.id) {
                log::error!("Duplicate upgrade definition: {:?}", def.id);
                continue;
            }
            normal_map.insert(def.id, def);
        }

        let mut prestige_map = HashMap::new();
        for def in prestige {
            if prestige_map.contains_key(&def.id) {
                log::error!("Duplicate prestige upgrade definition: {:?}", def.id);
                continue;
            }
            prestige_map.insert(def.id, def);
        }

        Self {
            normal: normal_map,
            prestige: prestige_map,
        }
    }

    pub fn get(&self, id: UpgradeId) -> Option<&UpgradeDef> {
        self.normal.get(&id)
    }

    pub fn get_prestige(&self, id: PrestigeId) -> Option<&PrestigeDef> {
        self.prestige.get(&id)
    }
}

/// The shipping upgrade set
pub fn default_catalog() -> UpgradeCatalog {
    use UnlockCondition::{Distance, PrestigeCount, UpgradeLevel};

    let normal = vec![
        UpgradeDef {
            id: UpgradeId::Heave,
            name: "Heave",
            description: "Put your back into it. Each level adds manual push power.",
            base_cost: 10,
            cost_multiplier: 1.5,
            max_level: None,
            unlock_conditions: &[],
            effect: EffectData::linear(0.0, 1.0),
        },
        UpgradeDef {
            id: UpgradeId::Stamina,
            name: "Stamina",
            description: "Keep pushing while you catch your breath. Auto pushes per second.",
            base_cost: 25,
            cost_multiplier: 1.6,
            max_level: None,
            unlock_conditions: &[UpgradeLevel {
                id: UpgradeId::Heave,
                level: 3,
            }],
            effect: EffectData::linear(0.0, 0.5),
        },
        UpgradeDef {
            id: UpgradeId::Brawn,
            name: "Brawn",
            description: "Stronger shoulders make every auto push count.",
            base_cost: 40,
            cost_multiplier: 1.55,
            max_level: None,
            unlock_conditions: &[UpgradeLevel {
                id: UpgradeId::Stamina,
                level: 1,
            }],
            effect: EffectData::linear(1.0, 1.0),
        },
        UpgradeDef {
            id: UpgradeId::KeenEye,
            name: "Keen Eye",
            description: "Spot the perfect footing. +1% critical push chance per level.",
            base_cost: 75,
            cost_multiplier: 1.7,
            max_level: Some(50),
            unlock_conditions: &[
                Distance(500.0),
                UnlockCondition::Currency {
                    kind: Currency::Grit,
                    amount: 50,
                },
            ],
            effect: EffectData::linear(0.0, 1.0),
        },
        UpgradeDef {
            id: UpgradeId::Crush,
            name: "Crush",
            description: "When it hits, it hits. Raises the critical multiplier.",
            base_cost: 100,
            cost_multiplier: 1.8,
            max_level: Some(40),
            unlock_conditions: &[
                UpgradeLevel {
                    id: UpgradeId::KeenEye,
                    level: 5,
                },
                PrestigeCount(1),
            ],
            effect: EffectData::linear(2.0, 0.05),
        },
        UpgradeDef {
            id: UpgradeId::Momentum,
            name: "Momentum",
            description: "A rolling boulder gathers speed. Raises the streak multiplier.",
            base_cost: 150,
            cost_multiplier: 1.65,
            max_level: None,
            unlock_conditions: &[
                UpgradeLevel {
                    id: UpgradeId::Heave,
                    level: 5,
                },
                Distance(1000.0),
            ],
            effect: EffectData::linear(1.0, 0.1),
        },
    ];

    let prestige = vec![
        PrestigeDef {
            id: PrestigeId::Might,
            name: "Might",
            description: "Permanent +50% push power per level.",
            base_cost: 1,
            cost_increase: 1,
            max_level: 10,
            effect: EffectData::linear(1.0, 0.5),
        },
        PrestigeDef {
            id: PrestigeId::Grace,
            name: "Grace",
            description: "The hill relents a little. -5% slope per level.",
            base_cost: 2,
            cost_increase: 2,
            max_level: 8,
            effect: EffectData::linear(0.0, 0.05),
        },
        PrestigeDef {
            id: PrestigeId::Bounty,
            name: "Bounty",
            description: "Permanent +25% grit from every push per level.",
            base_cost: 1,
            cost_increase: 1,
            max_level: 10,
            effect: EffectData::linear(1.0, 0.25),
        },
    ];

    UpgradeCatalog::new(normal, prestige)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_covers_every_id() {
        let catalog = default_catalog();
        for id in UpgradeId::ALL {
            assert!(catalog.get(id).is_some(), "missing definition for {:?}", id);
        }
        for id in PrestigeId::ALL {
            assert!(
                catalog.get_prestige(id).is_some(),
                "missing prestige definition for {:?}",
                id
            );
        }
    }

    #[test]
    fn test_duplicate_definition_first_wins() {
        let mut defs = Vec::new();
        let base = default_catalog().get(UpgradeId::Heave).unwrap().clone();
        defs.push(base.clone());
        defs.push(UpgradeDef {
            base_cost: 9999,
            ..base
        });

        let catalog = UpgradeCatalog::new(defs, Vec::new());
        assert_eq!(catalog.get(UpgradeId::Heave).unwrap().base_cost, 10);
    }

    #[test]
    fn test_effect_linear_value() {
        let effect = EffectData::linear(2.0, 0.05);
        assert_eq!(effect.value_at(0), 2.0);
        assert!((effect.value_at(10) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_effect_custom_curve() {
        fn squares(level: u32) -> f32 {
            (level * level) as f32
        }
        let effect = EffectData {
            base: 1.0,
            per_level: 0.5,
            curve: Some(squares),
        };
        assert_eq!(effect.value_at(0), 1.0);
        assert_eq!(effect.value_at(3), 1.0 + 4.5);
    }
}

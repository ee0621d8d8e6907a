//! Timed level-ups offering a choice of permanent upgrades

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Choices shown per level-up
pub const CHOICES_PER_LEVEL: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    /// +25% bullet damage
    DamageUp,
    /// +15% fire rate
    FireRateUp,
    /// +1 max shield
    HealthUp,
    /// Void rises 20% slower
    VoidResist,
    /// +30% graze radius
    GrazeRange,
    /// -25% dash cooldown
    DashCooldown,
    /// +50% crystal pickup range
    Magnet,
    /// +20% echo gains
    EchoBoost,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 8] = [
        UpgradeKind::DamageUp,
        UpgradeKind::FireRateUp,
        UpgradeKind::HealthUp,
        UpgradeKind::VoidResist,
        UpgradeKind::GrazeRange,
        UpgradeKind::DashCooldown,
        UpgradeKind::Magnet,
        UpgradeKind::EchoBoost,
    ];

    /// `None` means unlimited
    pub fn max_stacks(self) -> Option<u32> {
        match self {
            UpgradeKind::DamageUp | UpgradeKind::FireRateUp | UpgradeKind::EchoBoost => None,
            UpgradeKind::HealthUp => Some(2),
            UpgradeKind::VoidResist
            | UpgradeKind::GrazeRange
            | UpgradeKind::DashCooldown
            | UpgradeKind::Magnet => Some(3),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UpgradeKind::DamageUp => "KINETIC BOOST",
            UpgradeKind::FireRateUp => "RAPID CYCLE",
            UpgradeKind::HealthUp => "SHIELD CELL",
            UpgradeKind::VoidResist => "VOID ANCHOR",
            UpgradeKind::GrazeRange => "PROXIMITY FIELD",
            UpgradeKind::DashCooldown => "PHASE CAPACITOR",
            UpgradeKind::Magnet => "CRYSTAL MAGNET",
            UpgradeKind::EchoBoost => "ECHO AMPLIFIER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelUpSystem {
    interval: f64,
    time_since_level: f64,
    level: u32,
    pending: Option<Vec<UpgradeKind>>,
    applied: BTreeMap<UpgradeKind, u32>,
}

impl LevelUpSystem {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            time_since_level: 0.0,
            level: 0,
            pending: None,
            applied: BTreeMap::new(),
        }
    }

    /// Advance the timer; returns the offered choices when a level-up triggers.
    /// Frozen while a choice is pending.
    pub fn update(&mut self, dt: f64, rng: &mut Pcg32) -> Option<(u32, Vec<UpgradeKind>)> {
        if self.pending.is_some() {
            return None;
        }
        self.time_since_level += dt;
        if self.time_since_level < self.interval {
            return None;
        }

        self.time_since_level = 0.0;
        self.level += 1;
        let choices = self.roll_choices(rng);
        log::info!("level {} reached, offering {:?}", self.level, choices);
        self.pending = Some(choices.clone());
        Some((self.level, choices))
    }

    fn roll_choices(&self, rng: &mut Pcg32) -> Vec<UpgradeKind> {
        let mut available: Vec<UpgradeKind> = UpgradeKind::ALL
            .into_iter()
            .filter(|kind| match kind.max_stacks() {
                Some(max) => self.stacks(*kind) < max,
                None => true,
            })
            .collect();
        available.shuffle(rng);
        available.truncate(CHOICES_PER_LEVEL);
        available
    }

    /// Take one of the pending choices; `None` for a bad index or no pending offer
    pub fn select(&mut self, index: usize) -> Option<UpgradeKind> {
        let kind = *self.pending.as_ref()?.get(index)?;
        self.pending = None;
        *self.applied.entry(kind).or_insert(0) += 1;
        Some(kind)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_choices(&self) -> Option<&[UpgradeKind]> {
        self.pending.as_deref()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn stacks(&self, kind: UpgradeKind) -> u32 {
        self.applied.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_offers_three_distinct_choices() {
        let mut system = LevelUpSystem::new(45.0);
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(system.update(44.0, &mut rng).is_none());

        let (level, choices) = system.update(1.0, &mut rng).expect("level-up due");
        assert_eq!(level, 1);
        assert_eq!(choices.len(), CHOICES_PER_LEVEL);
        let mut unique = choices.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), CHOICES_PER_LEVEL);
    }

    #[test]
    fn test_timer_frozen_while_pending() {
        let mut system = LevelUpSystem::new(10.0);
        let mut rng = Pcg32::seed_from_u64(2);
        system.update(10.0, &mut rng);
        assert!(system.update(100.0, &mut rng).is_none());

        assert!(system.select(0).is_some());
        assert!(!system.is_pending());
        assert!(system.update(9.0, &mut rng).is_none());
    }

    #[test]
    fn test_bad_index_keeps_offer() {
        let mut system = LevelUpSystem::new(1.0);
        let mut rng = Pcg32::seed_from_u64(3);
        system.update(1.0, &mut rng);
        assert_eq!(system.select(7), None);
        assert!(system.is_pending());
    }

    #[test]
    fn test_maxed_upgrades_are_not_offered() {
        let mut system = LevelUpSystem::new(1.0);
        system.applied.insert(UpgradeKind::HealthUp, 2);
        system.applied.insert(UpgradeKind::VoidResist, 3);
        system.applied.insert(UpgradeKind::GrazeRange, 3);
        system.applied.insert(UpgradeKind::DashCooldown, 3);
        system.applied.insert(UpgradeKind::Magnet, 3);

        let mut rng = Pcg32::seed_from_u64(4);
        for _ in 0..20 {
            let (_, mut choices) = system.update(1.0, &mut rng).expect("level-up due");
            choices.sort();
            assert_eq!(
                choices,
                vec![UpgradeKind::DamageUp, UpgradeKind::FireRateUp, UpgradeKind::EchoBoost]
            );
            let index = choices.len() - 1;
            system.select(index);
        }
    }
}

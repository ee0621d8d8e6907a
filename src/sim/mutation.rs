//! Weapon mutations picked up from crystals

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Faster fire rate
    #[default]
    Fury,
    /// Extra bullets per volley
    Scatter,
    /// Bullets pass through enemies
    Pierce,
    /// Bullets home in on enemies
    Seeker,
}

impl MutationKind {
    pub const ALL: [MutationKind; 4] = [
        MutationKind::Fury,
        MutationKind::Scatter,
        MutationKind::Pierce,
        MutationKind::Seeker,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationStacks {
    pub fury: u32,
    pub scatter: u32,
    pub pierce: u32,
    pub seeker: u32,
}

impl MutationStacks {
    pub const MAX_TOTAL: u32 = 6;

    pub fn total(&self) -> u32 {
        self.fury + self.scatter + self.pierce + self.seeker
    }

    /// Add one stack; false once the total cap is reached
    pub fn add(&mut self, kind: MutationKind) -> bool {
        if self.total() >= Self::MAX_TOTAL {
            return false;
        }
        *self.slot(kind) += 1;
        true
    }

    pub fn get(&self, kind: MutationKind) -> u32 {
        match kind {
            MutationKind::Fury => self.fury,
            MutationKind::Scatter => self.scatter,
            MutationKind::Pierce => self.pierce,
            MutationKind::Seeker => self.seeker,
        }
    }

    fn slot(&mut self, kind: MutationKind) -> &mut u32 {
        match kind {
            MutationKind::Fury => &mut self.fury,
            MutationKind::Scatter => &mut self.scatter,
            MutationKind::Pierce => &mut self.pierce,
            MutationKind::Seeker => &mut self.seeker,
        }
    }

    /// +20% fire rate per fury stack
    pub fn fire_rate_multiplier(&self) -> f32 {
        1.0 + self.fury as f32 * 0.2
    }

    pub fn bullet_count(&self) -> u32 {
        1 + self.scatter
    }

    pub fn pierce_count(&self) -> u32 {
        self.pierce
    }

    /// Homing turn per 1/60 s, radians (5 degrees per stack)
    pub fn homing_angle(&self) -> f32 {
        (self.seeker as f32 * 5.0).to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_stacks_are_capped() {
        let mut stacks = MutationStacks::default();
        for kind in MutationKind::ALL.iter().cycle().take(6) {
            assert!(stacks.add(*kind));
        }
        assert!(!stacks.add(MutationKind::Fury));
        assert_eq!(stacks.total(), 6);
        assert_eq!(stacks.get(MutationKind::Fury), 2);
    }

    #[test]
    fn test_weapon_modifiers() {
        let stacks = MutationStacks {
            fury: 2,
            scatter: 1,
            pierce: 3,
            seeker: 0,
        };
        assert!((stacks.fire_rate_multiplier() - 1.4).abs() < 1e-6);
        assert_eq!(stacks.bullet_count(), 2);
        assert_eq!(stacks.pierce_count(), 3);
        assert_eq!(stacks.homing_angle(), 0.0);
    }
}

//! Mutation crystal pickups

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::mutation::MutationKind;
use super::pool::{Releasable, Updatable};
use crate::consts::{GAME_HEIGHT, OFFSCREEN_MARGIN};

pub const CRYSTAL_LIFETIME: f32 = 8.0;
pub const MAGNET_RADIUS: f32 = 150.0;
pub const COLLECT_RADIUS: f32 = 30.0;
const GRAVITY: f32 = 200.0;
const MAGNET_STRENGTH: f32 = 400.0;

#[derive(Debug, Clone, Default)]
pub struct Crystal {
    pub kind: MutationKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub lifetime: f32,
    pending_removal: bool,
}

/// What crystals react to while updating
#[derive(Debug, Clone, Copy)]
pub struct CrystalContext {
    pub player_pos: Vec2,
    /// Scales the magnet radius (crystal magnet upgrade)
    pub magnet_multiplier: f32,
}

impl Crystal {
    /// Drop a crystal at `pos`, bursting upward; random kind when `kind` is `None`
    pub fn drop_at(&mut self, pos: Vec2, kind: Option<MutationKind>, rng: &mut Pcg32) {
        self.kind = kind
            .or_else(|| MutationKind::ALL.choose(rng).copied())
            .unwrap_or_default();
        self.pos = pos;
        self.vel = Vec2::new(
            (rng.random::<f32>() - 0.5) * 100.0,
            150.0 + rng.random::<f32>() * 50.0,
        );
        self.lifetime = CRYSTAL_LIFETIME;
        self.pending_removal = false;
    }

    pub fn in_reach(&self, player_pos: Vec2) -> bool {
        self.pos.distance(player_pos) < COLLECT_RADIUS
    }
}

impl Updatable<CrystalContext> for Crystal {
    fn update(&mut self, dt: f32, ctx: &mut CrystalContext) {
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.pending_removal = true;
            return;
        }

        self.vel.y -= GRAVITY * dt;

        let to_player = ctx.player_pos - self.pos;
        let dist = to_player.length();
        let radius = MAGNET_RADIUS * ctx.magnet_multiplier;
        if dist > 0.0 && dist < radius {
            let strength = (1.0 - dist / radius) * MAGNET_STRENGTH;
            self.vel += to_player / dist * strength * dt;
        }

        self.pos += self.vel * dt;

        if self.pos.y < -GAME_HEIGHT / 2.0 - OFFSCREEN_MARGIN {
            self.pending_removal = true;
        }
    }
}

impl Releasable for Crystal {
    fn is_pending_removal(&self) -> bool {
        self.pending_removal
    }

    fn mark_for_removal(&mut self) {
        self.pending_removal = true;
    }

    fn on_release(&mut self) {
        self.pending_removal = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn far_away() -> CrystalContext {
        CrystalContext {
            player_pos: Vec2::new(0.0, -10_000.0),
            magnet_multiplier: 1.0,
        }
    }

    #[test]
    fn test_bursts_up_then_falls() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut crystal = Crystal::default();
        crystal.drop_at(Vec2::ZERO, Some(MutationKind::Pierce), &mut rng);
        assert_eq!(crystal.kind, MutationKind::Pierce);
        assert!(crystal.vel.y >= 150.0);

        let mut ctx = far_away();
        for _ in 0..120 {
            crystal.update(1.0 / 60.0, &mut ctx);
        }
        assert!(crystal.vel.y < 0.0);
    }

    #[test]
    fn test_expires_after_lifetime() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut crystal = Crystal::default();
        crystal.drop_at(Vec2::new(0.0, 1000.0), None, &mut rng);
        let mut ctx = far_away();
        crystal.vel = Vec2::ZERO;
        crystal.update(CRYSTAL_LIFETIME + 0.01, &mut ctx);
        assert!(crystal.is_pending_removal());
    }

    #[test]
    fn test_magnet_pulls_toward_player() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut crystal = Crystal::default();
        crystal.drop_at(Vec2::ZERO, None, &mut rng);
        crystal.vel = Vec2::ZERO;

        let mut ctx = CrystalContext {
            player_pos: Vec2::new(100.0, 0.0),
            magnet_multiplier: 1.0,
        };
        crystal.update(0.01, &mut ctx);
        assert!(crystal.vel.x > 0.0);

        let mut outside = Crystal::default();
        outside.drop_at(Vec2::ZERO, None, &mut rng);
        outside.vel = Vec2::ZERO;
        let mut ctx = CrystalContext {
            player_pos: Vec2::new(200.0, 0.0),
            magnet_multiplier: 1.0,
        };
        outside.update(0.01, &mut ctx);
        assert_eq!(outside.vel.x, 0.0);

        // Magnet upgrade extends the radius
        ctx.magnet_multiplier = 1.5;
        outside.update(0.01, &mut ctx);
        assert!(outside.vel.x > 0.0);
    }

    #[test]
    fn test_collect_radius() {
        let crystal = Crystal {
            pos: Vec2::ZERO,
            ..Crystal::default()
        };
        assert!(crystal.in_reach(Vec2::new(29.0, 0.0)));
        assert!(!crystal.in_reach(Vec2::new(30.0, 0.0)));
    }
}

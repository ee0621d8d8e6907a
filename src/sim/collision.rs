//! Axis-aligned hitbox collision
//!
//! Bullets are tested against hitboxes, not sprites: hitboxes are smaller than
//! what gets drawn. The engine only reports hits; damage and deactivation are
//! the caller's job.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::{Handle, Pool, Releasable};

/// Rectangle in world units, `(x, y)` being the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Hitbox {
    /// Box of `size` centered on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            x: center.x - size.x / 2.0,
            y: center.y - size.y / 2.0,
            width: size.x,
            height: size.y,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap test; boxes that only share an edge do not collide
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// Capability: the entity exposes a collision box
pub trait Hittable {
    fn hitbox(&self) -> Hitbox;
}

/// A bullet that can strike targets, possibly several per frame
pub trait Projectile: Hittable + Releasable {
    /// Identity of whatever the bullet can hit
    type Target: Copy + Ord;

    /// Extra targets the bullet may pass through after its first hit
    fn pierce_remaining(&self) -> u32;

    /// Whether `target` is already in this bullet's hit set
    fn has_hit(&self, target: Self::Target) -> bool;
}

/// Targets one bullet strikes this pass, written into `hits`.
///
/// Overlapping enemies that are still active and not already in the bullet's
/// hit set are ordered nearest-to-bullet-center first (ties broken by target
/// order) and at most `pierce_remaining + 1` of them are kept. Enemies killed
/// by an earlier bullet this frame must fail `is_active` so they do not eat
/// into the budget.
pub fn check_vs_enemies<B, F>(
    bullet: &B,
    enemies: &[(B::Target, Hitbox)],
    mut is_active: F,
    hits: &mut Vec<B::Target>,
) where
    B: Projectile,
    F: FnMut(B::Target) -> bool,
{
    hits.clear();
    if bullet.is_pending_removal() {
        return;
    }

    let bullet_box = bullet.hitbox();
    let center = bullet_box.center();
    let mut candidates: Vec<(f32, B::Target)> = enemies
        .iter()
        .filter(|(target, enemy_box)| {
            !bullet.has_hit(*target) && bullet_box.overlaps(enemy_box) && is_active(*target)
        })
        .map(|(target, enemy_box)| (center.distance_squared(enemy_box.center()), *target))
        .collect();

    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    let budget = bullet.pierce_remaining() as usize + 1;
    hits.extend(candidates.into_iter().take(budget).map(|(_, target)| target));
}

/// Find the single bullet that hits the player this frame.
///
/// The player takes at most one hit per frame; when several bullets overlap,
/// the one nearest the player's center wins (then lowest handle).
pub fn check_vs_player<B>(bullets: &Pool<B>, player: &Hitbox) -> Option<Handle>
where
    B: Hittable + Releasable,
{
    let center = player.center();
    bullets
        .iter_active()
        .filter_map(|(handle, bullet)| {
            let bullet_box = bullet.hitbox();
            bullet_box
                .overlaps(player)
                .then(|| (center.distance_squared(bullet_box.center()), handle))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, handle)| handle)
}

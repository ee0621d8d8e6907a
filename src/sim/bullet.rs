//! Player and hostile projectiles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Hitbox, Hittable, Projectile};
use super::enemy::EnemyRef;
use super::pool::{Releasable, Updatable};
use crate::consts::{GAME_HEIGHT, GAME_WIDTH, OFFSCREEN_MARGIN};
use crate::normalize_angle;

/// Homing only considers enemies closer than this
pub const HOMING_RANGE: f32 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BulletOwner {
    #[default]
    Player,
    Enemy,
}

impl BulletOwner {
    fn size(self) -> Vec2 {
        match self {
            BulletOwner::Player => Vec2::new(6.0, 16.0),
            BulletOwner::Enemy => Vec2::new(8.0, 8.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bullet {
    pub owner: BulletOwner,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub size: Vec2,
    /// Extra enemies this bullet may still pass through
    pub pierce_remaining: u32,
    /// Max turn per 1/60 s, radians
    pub homing: f32,
    hit_enemies: Vec<EnemyRef>,
    pending_removal: bool,
}

impl Bullet {
    /// Re-initialize a pooled bullet as a fresh shot
    pub fn fire(&mut self, owner: BulletOwner, pos: Vec2, vel: Vec2, damage: f32) {
        self.owner = owner;
        self.pos = pos;
        self.vel = vel;
        self.damage = damage;
        self.size = owner.size();
        self.pierce_remaining = 0;
        self.homing = 0.0;
        self.hit_enemies.clear();
        self.pending_removal = false;
    }

    /// Record a hit; returns true when the bullet is spent
    pub fn register_hit(&mut self, target: EnemyRef) -> bool {
        self.hit_enemies.push(target);
        if self.pierce_remaining > 0 {
            self.pierce_remaining -= 1;
            false
        } else {
            self.pending_removal = true;
            true
        }
    }

    /// Turn toward the nearest unhit enemy within range, capped per frame
    pub fn steer(&mut self, dt: f32, targets: &[(EnemyRef, Hitbox)]) {
        if self.homing <= 0.0 || self.pending_removal {
            return;
        }

        let closest = targets
            .iter()
            .filter(|(target, _)| !self.hit_enemies.contains(target))
            .map(|(_, hitbox)| (self.pos.distance(hitbox.center()), hitbox.center()))
            .filter(|(dist, _)| *dist < HOMING_RANGE)
            .min_by(|a, b| a.0.total_cmp(&b.0));
        let Some((_, target)) = closest else {
            return;
        };

        let to_target = target - self.pos;
        let current = self.vel.y.atan2(self.vel.x);
        let desired = to_target.y.atan2(to_target.x);
        let max_turn = self.homing * dt * 60.0;
        let turn = normalize_angle(desired - current).clamp(-max_turn, max_turn);

        let speed = self.vel.length();
        let heading = current + turn;
        self.vel = Vec2::new(heading.cos(), heading.sin()) * speed;
    }
}

impl Releasable for Bullet {
    fn is_pending_removal(&self) -> bool {
        self.pending_removal
    }

    fn mark_for_removal(&mut self) {
        self.pending_removal = true;
    }

    fn on_release(&mut self) {
        self.pending_removal = false;
        self.hit_enemies.clear();
        self.pierce_remaining = 0;
        self.homing = 0.0;
    }
}

impl Hittable for Bullet {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, self.size)
    }
}

impl Projectile for Bullet {
    type Target = EnemyRef;

    fn pierce_remaining(&self) -> u32 {
        self.pierce_remaining
    }

    fn has_hit(&self, target: EnemyRef) -> bool {
        self.hit_enemies.contains(&target)
    }
}

impl Updatable<()> for Bullet {
    fn update(&mut self, dt: f32, _ctx: &mut ()) {
        self.pos += self.vel * dt;

        let half_w = GAME_WIDTH / 2.0 + OFFSCREEN_MARGIN;
        let half_h = GAME_HEIGHT / 2.0 + OFFSCREEN_MARGIN;
        if self.pos.x.abs() > half_w || self.pos.y.abs() > half_h {
            self.pending_removal = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::pool::Pool;

    fn enemy_ref(pool: &mut Pool<Bullet>) -> EnemyRef {
        // Any live handle will do as an identity
        EnemyRef {
            kind: EnemyKind::Swarmer,
            handle: pool.acquire(|_| {}),
        }
    }

    #[test]
    fn test_leaves_arena() {
        let mut bullet = Bullet::default();
        bullet.fire(BulletOwner::Player, Vec2::new(0.0, 340.0), Vec2::new(0.0, 600.0), 5.0);
        bullet.update(0.016, &mut ());
        assert!(!bullet.is_pending_removal());
        bullet.update(0.05, &mut ());
        assert!(bullet.is_pending_removal());
    }

    #[test]
    fn test_pierce_consumes_charges() {
        let mut ids: Pool<Bullet> = Pool::new("ids", 3);
        let (a, b, c) = (enemy_ref(&mut ids), enemy_ref(&mut ids), enemy_ref(&mut ids));

        let mut bullet = Bullet::default();
        bullet.fire(BulletOwner::Player, Vec2::ZERO, Vec2::Y, 5.0);
        bullet.pierce_remaining = 2;

        assert!(!bullet.register_hit(a));
        assert!(!bullet.register_hit(b));
        assert!(bullet.register_hit(c));
        assert!(bullet.has_hit(b));
        assert!(bullet.is_pending_removal());
    }

    #[test]
    fn test_release_clears_hit_set() {
        let mut ids: Pool<Bullet> = Pool::new("ids", 1);
        let target = enemy_ref(&mut ids);

        let mut bullet = Bullet::default();
        bullet.fire(BulletOwner::Player, Vec2::ZERO, Vec2::Y, 5.0);
        bullet.register_hit(target);
        bullet.on_release();
        assert!(!bullet.has_hit(target));
        assert!(!bullet.is_pending_removal());
    }

    #[test]
    fn test_homing_turns_toward_target_at_capped_rate() {
        let mut ids: Pool<Bullet> = Pool::new("ids", 1);
        let target = enemy_ref(&mut ids);
        let enemy_box = Hitbox::centered(Vec2::new(100.0, 0.0), Vec2::splat(24.0));

        let mut bullet = Bullet::default();
        bullet.fire(BulletOwner::Player, Vec2::ZERO, Vec2::new(0.0, 600.0), 5.0);
        bullet.homing = 5f32.to_radians();
        bullet.steer(1.0 / 60.0, &[(target, enemy_box)]);

        let heading = bullet.vel.y.atan2(bullet.vel.x);
        let turned = std::f32::consts::FRAC_PI_2 - heading;
        assert!((turned - 5f32.to_radians()).abs() < 1e-4);
        assert!((bullet.vel.length() - 600.0).abs() < 1e-2);
    }

    #[test]
    fn test_homing_ignores_out_of_range() {
        let mut ids: Pool<Bullet> = Pool::new("ids", 1);
        let target = enemy_ref(&mut ids);
        let far = Hitbox::centered(Vec2::new(500.0, 0.0), Vec2::splat(24.0));

        let mut bullet = Bullet::default();
        bullet.fire(BulletOwner::Player, Vec2::ZERO, Vec2::new(0.0, 600.0), 5.0);
        bullet.homing = 0.5;
        bullet.steer(0.016, &[(target, far)]);
        assert_eq!(bullet.vel, Vec2::new(0.0, 600.0));
    }
}

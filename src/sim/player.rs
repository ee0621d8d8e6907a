//! The player ship: steering, dash, firing cadence and health

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Hitbox, Hittable};
use crate::consts::{
    DASH_COOLDOWN, DASH_DISTANCE, DASH_DURATION, INVINCIBILITY_DURATION, PLAYER_BASE_DAMAGE,
    PLAYER_BOUNDS_MAX, PLAYER_BOUNDS_MIN, PLAYER_FIRE_RATE, PLAYER_HITBOX, PLAYER_LERP,
    PLAYER_MAX_HEALTH, PLAYER_START,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Dash {
    elapsed: f32,
    from: Vec2,
    to: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub health: u32,
    pub max_health: u32,
    /// Seconds between shots before mutations
    pub fire_interval: f32,
    pub damage_multiplier: f32,
    pub dash_cooldown: f32,
    pub dash_max_cooldown: f32,
    /// Steering responsiveness from the mode
    pub speed_multiplier: f32,
    invincibility_timer: f32,
    fire_timer: f32,
    dash: Option<Dash>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Player {
    pub fn new(speed_multiplier: f32) -> Self {
        Self {
            pos: PLAYER_START,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            fire_interval: 1.0 / PLAYER_FIRE_RATE,
            damage_multiplier: 1.0,
            dash_cooldown: 0.0,
            dash_max_cooldown: DASH_COOLDOWN,
            speed_multiplier,
            invincibility_timer: 0.0,
            fire_timer: 0.0,
            dash: None,
        }
    }

    /// Dashing or inside the post-hit window
    pub fn is_invincible(&self) -> bool {
        self.dash.is_some() || self.invincibility_timer > 0.0
    }

    pub fn is_dashing(&self) -> bool {
        self.dash.is_some()
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Advance timers, dash and steering. Returns true when a dash starts.
    pub fn update(&mut self, dt: f32, target: Vec2, dash_pressed: bool) -> bool {
        if self.invincibility_timer > 0.0 {
            self.invincibility_timer = (self.invincibility_timer - dt).max(0.0);
        }
        if self.dash_cooldown > 0.0 {
            self.dash_cooldown = (self.dash_cooldown - dt).max(0.0);
        }

        if let Some(dash) = &mut self.dash {
            dash.elapsed += dt;
            let progress = dash.elapsed / DASH_DURATION;
            if progress >= 1.0 {
                self.pos = dash.to;
                self.dash = None;
            } else {
                let eased = 1.0 - (1.0 - progress).powi(3);
                self.pos = dash.from.lerp(dash.to, eased);
            }
            return false;
        }

        let target = target.clamp(PLAYER_BOUNDS_MIN, PLAYER_BOUNDS_MAX);
        if dash_pressed && self.dash_cooldown <= 0.0 {
            self.start_dash(target);
            return true;
        }

        // Frame-rate independent smoothing
        let t = 1.0 - (1.0 - PLAYER_LERP).powf(dt * 60.0 * self.speed_multiplier);
        self.pos = self.pos.lerp(target, t);
        false
    }

    fn start_dash(&mut self, target: Vec2) {
        let offset = target - self.pos;
        let dir = if offset.length() < 10.0 {
            Vec2::Y
        } else {
            offset.normalize()
        };
        let to = (self.pos + dir * DASH_DISTANCE).clamp(PLAYER_BOUNDS_MIN, PLAYER_BOUNDS_MAX);
        self.dash = Some(Dash {
            elapsed: 0.0,
            from: self.pos,
            to,
        });
        self.dash_cooldown = self.dash_max_cooldown;
    }

    /// Advance the fire timer; true when a volley should go out this frame
    pub fn update_firing(&mut self, dt: f32, fire_held: bool, rate_multiplier: f32) -> bool {
        self.fire_timer += dt;
        if fire_held && self.fire_timer >= self.fire_interval / rate_multiplier {
            self.fire_timer = 0.0;
            return true;
        }
        false
    }

    pub fn bullet_damage(&self) -> f32 {
        PLAYER_BASE_DAMAGE * self.damage_multiplier
    }

    /// Lose one point of health unless invincible; returns whether it landed
    pub fn take_damage(&mut self) -> bool {
        if self.is_invincible() {
            return false;
        }
        self.health = self.health.saturating_sub(1);
        self.invincibility_timer = INVINCIBILITY_DURATION;
        true
    }

    pub fn heal(&mut self, amount: u32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// 0.0 right after a dash, 1.0 when ready
    pub fn dash_readiness(&self) -> f32 {
        if self.dash_max_cooldown <= 0.0 {
            return 1.0;
        }
        1.0 - (self.dash_cooldown / self.dash_max_cooldown).clamp(0.0, 1.0)
    }
}

impl Hittable for Player {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, PLAYER_HITBOX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_steering_converges_and_clamps() {
        let mut player = Player::default();
        for _ in 0..240 {
            player.update(DT, Vec2::new(1000.0, 1000.0), false);
        }
        assert!((player.pos - PLAYER_BOUNDS_MAX).length() < 0.5);
    }

    #[test]
    fn test_steering_is_frame_rate_independent() {
        let mut fast = Player::default();
        let mut slow = Player::default();
        let target = Vec2::new(100.0, 50.0);
        for _ in 0..60 {
            fast.update(DT, target, false);
        }
        for _ in 0..30 {
            slow.update(2.0 * DT, target, false);
        }
        assert!((fast.pos - slow.pos).length() < 0.01);
    }

    #[test]
    fn test_dash_is_invincible_and_on_cooldown() {
        let mut player = Player::default();
        let start = player.pos;
        let end = start + Vec2::new(DASH_DISTANCE, 0.0);
        assert!(player.update(DT, start + Vec2::new(200.0, 0.0), true));
        assert!(player.is_invincible());
        assert!(!player.take_damage());

        for _ in 0..12 {
            player.update(DT, end, false);
        }
        assert!(!player.is_dashing());
        assert!((player.pos - end).length() < 1e-3);

        // Cooldown blocks an immediate second dash
        assert!(!player.update(DT, start, true));
        assert!(player.dash_readiness() < 0.5);
    }

    #[test]
    fn test_dash_with_target_underfoot_goes_up() {
        let mut player = Player::default();
        let start = player.pos;
        let end = start + Vec2::new(0.0, DASH_DISTANCE);
        player.update(DT, start, true);
        for _ in 0..12 {
            player.update(DT, end, false);
        }
        assert!((player.pos - end).length() < 1e-3);
    }

    #[test]
    fn test_damage_grants_invincibility_window() {
        let mut player = Player::default();
        assert!(player.take_damage());
        assert_eq!(player.health, PLAYER_MAX_HEALTH - 1);
        assert!(!player.take_damage());

        for _ in 0..((INVINCIBILITY_DURATION / DT) as usize + 2) {
            player.update(DT, player.pos, false);
        }
        assert!(player.take_damage());
        assert_eq!(player.health, PLAYER_MAX_HEALTH - 2);
    }

    #[test]
    fn test_firing_cadence() {
        let mut player = Player::default();
        let mut shots = 0;
        for _ in 0..60 {
            if player.update_firing(DT, true, 1.0) {
                shots += 1;
            }
        }
        assert!((5..=6).contains(&shots));

        let mut held_off = Player::default();
        assert!(!held_off.update_firing(1.0, false, 1.0));
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut player = Player::default();
        player.take_damage();
        player.heal(5);
        assert_eq!(player.health, player.max_health);
    }
}

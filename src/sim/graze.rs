//! Near-miss scoring
//!
//! A hostile bullet passing inside the graze ring (but outside the hitbox)
//! pays out echoes, scaled by the running combo. Each bullet counts once.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bullet::Bullet;
use super::pool::{Handle, Pool};

/// Combo size and the payout multiplier it unlocks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboTier {
    pub threshold: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrazeConfig {
    pub graze_radius: f32,
    pub hit_radius: f32,
    /// Seconds without a graze before the combo drops
    pub combo_timeout: f64,
    pub base_reward: f64,
    /// Most selective first
    pub tiers: Vec<ComboTier>,
    /// Grazed-identity set is cleared wholesale past this size
    pub record_cap: usize,
}

impl Default for GrazeConfig {
    fn default() -> Self {
        Self {
            graze_radius: 40.0,
            hit_radius: 8.0,
            combo_timeout: 2.0,
            base_reward: 0.5,
            tiers: vec![
                ComboTier { threshold: 20, multiplier: 3.0 },
                ComboTier { threshold: 10, multiplier: 2.0 },
                ComboTier { threshold: 5, multiplier: 1.5 },
                ComboTier { threshold: 1, multiplier: 1.0 },
            ],
            record_cap: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub count: u32,
    pub time_since_last_graze: f64,
}

/// What one frame of grazing produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrazeResult {
    pub grazes: u32,
    pub echoes: f64,
    pub combo: u32,
    pub positions: Vec<Vec2>,
}

impl GrazeResult {
    pub fn grazed(&self) -> bool {
        self.grazes > 0
    }
}

#[derive(Debug, Clone)]
pub struct GrazeTracker {
    config: GrazeConfig,
    combo: ComboState,
    grazed: HashSet<Handle>,
    /// Upgrade scaling of the graze radius
    radius_multiplier: f32,
}

impl GrazeTracker {
    pub fn new(config: GrazeConfig) -> Self {
        Self {
            config,
            combo: ComboState::default(),
            grazed: HashSet::new(),
            radius_multiplier: 1.0,
        }
    }

    /// Payout multiplier for the current combo
    pub fn multiplier(&self) -> f64 {
        self.config
            .tiers
            .iter()
            .find(|tier| self.combo.count >= tier.threshold)
            .map_or(1.0, |tier| tier.multiplier)
    }

    pub fn graze_radius(&self) -> f32 {
        self.config.graze_radius * self.radius_multiplier
    }

    /// Scan hostile bullets around the player
    pub fn update(&mut self, dt: f64, player_pos: Vec2, invincible: bool, bullets: &Pool<Bullet>) -> GrazeResult {
        self.combo.time_since_last_graze += dt;
        if self.combo.time_since_last_graze > self.config.combo_timeout {
            self.combo.count = 0;
        }

        let mut result = GrazeResult {
            combo: self.combo.count,
            ..GrazeResult::default()
        };
        if invincible {
            return result;
        }

        let graze_radius = self.graze_radius();
        for (handle, bullet) in bullets.iter_active() {
            if self.grazed.contains(&handle) {
                continue;
            }
            let dist = player_pos.distance(bullet.pos);
            if dist > self.config.hit_radius && dist < graze_radius {
                self.grazed.insert(handle);
                self.combo.count += 1;
                self.combo.time_since_last_graze = 0.0;

                result.grazes += 1;
                result.echoes += self.config.base_reward * self.multiplier();
                result.combo = self.combo.count;
                result.positions.push(bullet.pos);
            }
        }

        if self.grazed.len() > self.config.record_cap {
            self.grazed.clear();
        }

        result
    }

    pub fn on_player_hit(&mut self) {
        self.combo = ComboState::default();
    }

    /// Apply one graze radius stack
    pub fn widen(&mut self, factor: f32) {
        self.radius_multiplier *= factor;
    }

    pub fn combo(&self) -> ComboState {
        self.combo
    }
}

//! The rising void
//!
//! A boundary climbs from the bottom of the arena. Its rise rate escalates the
//! longer the player goes without a kill; kills and grazes push it back down.
//! The player dies on touching it.

use serde::{Deserialize, Serialize};

use crate::consts::GAME_HEIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardMode {
    #[default]
    Normal,
    Accelerating,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    /// Seconds without a kill before the void accelerates
    pub accelerate_after: f64,
    /// Seconds without a kill before the void enters danger
    pub danger_after: f64,
    pub accelerating_factor: f64,
    pub danger_factor: f64,
    /// Percent removed per normal kill
    pub kill_pushback: f64,
    pub elite_kill_pushback: f64,
    pub graze_pushback: f64,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            accelerate_after: 5.0,
            danger_after: 8.0,
            accelerating_factor: 1.5,
            danger_factor: 2.0,
            kill_pushback: 1.5,
            elite_kill_pushback: 3.0,
            graze_pushback: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidHazard {
    config: HazardConfig,
    /// Percent of the arena swallowed, in `[0, 100]`
    height: f64,
    time_since_kill: f64,
    mode: HazardMode,
    /// Percent per second in normal mode (zone/endless driven)
    base_rate: f64,
    /// Mode scaling (void rush runs faster)
    speed_multiplier: f64,
    /// Upgrade scaling, shrinks with each void resistance stack
    resistance: f64,
    /// Mode scaling of every pushback
    pushback_multiplier: f64,
}

impl VoidHazard {
    pub fn new(config: HazardConfig, speed_multiplier: f64, pushback_multiplier: f64) -> Self {
        Self {
            config,
            height: 0.0,
            time_since_kill: 0.0,
            mode: HazardMode::Normal,
            base_rate: 1.2,
            speed_multiplier,
            resistance: 1.0,
            pushback_multiplier,
        }
    }

    fn mode_for(&self, time_since_kill: f64) -> HazardMode {
        if time_since_kill > self.config.danger_after {
            HazardMode::Danger
        } else if time_since_kill > self.config.accelerate_after {
            HazardMode::Accelerating
        } else {
            HazardMode::Normal
        }
    }

    /// Current rise in percent per second
    pub fn rise_rate(&self) -> f64 {
        let factor = match self.mode {
            HazardMode::Normal => 1.0,
            HazardMode::Accelerating => self.config.accelerating_factor,
            HazardMode::Danger => self.config.danger_factor,
        };
        self.base_rate * factor * self.speed_multiplier * self.resistance
    }

    /// Advance one frame; returns the new mode when it changed
    pub fn update(&mut self, dt: f64) -> Option<HazardMode> {
        self.time_since_kill += dt;

        let previous = self.mode;
        self.mode = self.mode_for(self.time_since_kill);

        self.height = (self.height + self.rise_rate() * dt).clamp(0.0, 100.0);

        (self.mode != previous).then_some(self.mode)
    }

    /// Returns the pushback applied
    pub fn on_kill(&mut self, elite: bool) -> f64 {
        self.time_since_kill = 0.0;
        self.mode = HazardMode::Normal;

        let base = if elite {
            self.config.elite_kill_pushback
        } else {
            self.config.kill_pushback
        };
        self.push_back(base * self.pushback_multiplier)
    }

    /// Leaves the kill timer and mode alone; returns the pushback applied
    pub fn on_graze(&mut self) -> f64 {
        self.push_back(self.config.graze_pushback * self.pushback_multiplier)
    }

    fn push_back(&mut self, amount: f64) -> f64 {
        let before = self.height;
        self.height = (self.height - amount).max(0.0);
        before - self.height
    }

    /// World y of the void's top edge
    pub fn boundary_y(&self) -> f32 {
        -GAME_HEIGHT / 2.0 + (self.height / 100.0) as f32 * GAME_HEIGHT
    }

    pub fn is_player_in_void(&self, player_y: f32) -> bool {
        player_y < self.boundary_y()
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn mode(&self) -> HazardMode {
        self.mode
    }

    pub fn time_since_kill(&self) -> f64 {
        self.time_since_kill
    }

    pub fn set_base_rate(&mut self, rate: f64) {
        self.base_rate = rate.max(0.0);
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// Apply one void resistance stack (rise 20% slower)
    pub fn add_resistance(&mut self, factor: f64) {
        self.resistance *= factor;
    }
}

//! Void Runner - simulation core for a top-down survival shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pools, enemies, collisions, void, economy)
//! - `tuning`: Data-driven game balance
//! - `persistence`: Best-zone and banked-echo storage
//!
//! Rendering, audio, UI and raw input capture are external collaborators.
//! They feed [`sim::TickInput`] in and read [`sim::FrameSnapshot`] plus the
//! drained [`sim::GameEvent`] queue out.

pub mod persistence;
pub mod sim;
pub mod tuning;

pub use persistence::PersistentProgress;
pub use tuning::{ModeKind, Tuning};

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Arena dimensions, centered on the origin with y up
    pub const GAME_WIDTH: f32 = 800.0;
    pub const GAME_HEIGHT: f32 = 600.0;
    /// Frames longer than this are clamped to avoid discontinuous jumps
    pub const MAX_FRAME_DT: f32 = 0.05;
    /// How far past the arena edge an entity may travel before it is released
    pub const OFFSCREEN_MARGIN: f32 = 50.0;

    /// Player defaults
    pub const PLAYER_START: Vec2 = Vec2::new(0.0, -100.0);
    pub const PLAYER_BOUNDS_MIN: Vec2 = Vec2::new(-380.0, -210.0);
    pub const PLAYER_BOUNDS_MAX: Vec2 = Vec2::new(380.0, 280.0);
    pub const PLAYER_HITBOX: Vec2 = Vec2::new(16.0, 16.0);
    /// Per-frame (60 Hz) lerp factor toward the steering target
    pub const PLAYER_LERP: f32 = 0.12;
    /// Shots per second
    pub const PLAYER_FIRE_RATE: f32 = 6.0;
    pub const PLAYER_BASE_DAMAGE: f32 = 5.0;
    pub const PLAYER_BULLET_SPEED: f32 = 600.0;
    pub const PLAYER_MAX_HEALTH: u32 = 3;
    /// Post-hit invincibility (seconds)
    pub const INVINCIBILITY_DURATION: f32 = 1.2;

    /// Dash
    pub const DASH_DISTANCE: f32 = 80.0;
    pub const DASH_DURATION: f32 = 0.15;
    pub const DASH_COOLDOWN: f32 = 2.5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One seeded RNG, passed by reference into every system that draws
//! - Per-frame delta capped before it reaches any system
//! - Collision outcomes independent of pool iteration order
//! - No rendering, audio or platform dependencies

pub mod bullet;
pub mod collision;
pub mod crystal;
pub mod economy;
pub mod enemy;
pub mod event;
pub mod graze;
pub mod hazard;
pub mod levelup;
pub mod mutation;
pub mod player;
pub mod pool;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod zone;

pub use bullet::{Bullet, BulletOwner};
pub use collision::{Hitbox, Hittable, Projectile, check_vs_enemies, check_vs_player};
pub use crystal::Crystal;
pub use economy::{EchoLedger, EconomyConfig, Settlement};
pub use enemy::{Drifter, Enemy, EnemyKind, EnemyRef, EnemyRoster, Kill, Swarmer, Turret};
pub use event::{DeathCause, GameEvent};
pub use graze::{ComboState, GrazeConfig, GrazeResult, GrazeTracker};
pub use hazard::{HazardConfig, HazardMode, VoidHazard};
pub use levelup::{LevelUpSystem, UpgradeKind};
pub use mutation::{MutationKind, MutationStacks};
pub use player::Player;
pub use pool::{Handle, Pool, Releasable, Updatable};
pub use spawn::{IntervalStep, SpawnRequest, SpawnRule, SpawnScheduler};
pub use state::{FrameSnapshot, GamePhase, GameState, RunStats};
pub use tick::{TickInput, tick};
pub use zone::{CheckpointChoice, CheckpointPolicy, ZonePhase, ZoneProgress, ZoneTransition};

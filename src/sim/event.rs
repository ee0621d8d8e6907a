//! Discrete outcomes the simulation reports to collaborators
//!
//! The game state appends to one queue per frame; render, audio, UI and
//! persistence drain it. Nothing in the simulation reads events back.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use super::hazard::HazardMode;
use super::levelup::UpgradeKind;
use super::mutation::MutationKind;
use super::zone::{CheckpointChoice, ZoneStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Touched the void
    Void,
    /// Ran out of health
    Damage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    EnemyKilled {
        kind: EnemyKind,
        pos: Vec2,
        elite: bool,
        echoes: f64,
    },
    PlayerHit {
        health: u32,
    },
    Grazed {
        count: u32,
        combo: u32,
        echoes: f64,
        positions: Vec<Vec2>,
    },
    Dashed,
    ZoneCompleted {
        zone: u32,
        stats: ZoneStats,
    },
    CheckpointResolved {
        choice: CheckpointChoice,
        banked: u64,
    },
    ZoneStarted {
        zone: u32,
        name: String,
    },
    LevelUpTriggered {
        level: u32,
        choices: Vec<UpgradeKind>,
    },
    UpgradeApplied {
        upgrade: UpgradeKind,
    },
    CrystalCollected {
        kind: MutationKind,
        /// False when the mutation cap was already reached
        applied: bool,
    },
    HazardModeChanged {
        mode: HazardMode,
    },
    RunEnded {
        cause: DeathCause,
        echoes_lost: u64,
        echoes_salvaged: u64,
    },
    /// Persisted counters changed and should be written back
    ProgressChanged {
        best_zone: u32,
        banked: u64,
    },
}

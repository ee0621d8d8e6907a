//! Game state and run lifecycle
//!
//! The game state owns every system and pool for one run. Systems never hold
//! references to each other; `tick` passes what each needs per call.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bullet::Bullet;
use super::collision::Hitbox;
use super::crystal::Crystal;
use super::economy::EchoLedger;
use super::enemy::{EnemyRef, EnemyRoster};
use super::event::{DeathCause, GameEvent};
use super::graze::GrazeTracker;
use super::hazard::{HazardMode, VoidHazard};
use super::levelup::{LevelUpSystem, UpgradeKind};
use super::mutation::MutationStacks;
use super::player::Player;
use super::pool::Pool;
use super::spawn::{IntervalStep, SpawnScheduler};
use super::zone::{CheckpointChoice, ZonePhase, ZoneProgress, ZoneTransition};
use crate::persistence::PersistentProgress;
use crate::tuning::{ModeConfig, ModeKind, Tuning};

/// Upgrade effect sizes
const DAMAGE_UP: f32 = 0.25;
const FIRE_RATE_UP: f32 = 0.85;
const VOID_RESIST: f64 = 0.8;
const GRAZE_RANGE_UP: f32 = 1.3;
const DASH_COOLDOWN_UP: f32 = 0.75;
const MAGNET_UP: f32 = 0.5;
const ECHO_BOOST: f64 = 0.2;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Active gameplay (zone checkpoints and intros included)
    #[default]
    Playing,
    /// Waiting for an upgrade choice
    LevelUp,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub time_survived: f64,
    pub kills: u32,
    pub echoes_earned: f64,
    pub echoes_lost: u64,
    pub zone_reached: u32,
}

/// Everything a collaborator needs to present one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub phase: GamePhase,
    pub mode: ModeKind,
    pub player_pos: Vec2,
    pub health: u32,
    pub max_health: u32,
    pub invincible: bool,
    pub dash_readiness: f32,
    pub carried: f64,
    pub banked: u64,
    pub multiplier: f64,
    /// Void height in percent
    pub hazard: f64,
    pub hazard_mode: HazardMode,
    pub hazard_boundary_y: f32,
    pub combo: u32,
    /// `None` in endless mode
    pub zone: Option<u32>,
    pub zone_name: String,
    pub zone_phase: Option<ZonePhase>,
    pub zone_time_remaining: Option<f64>,
    pub level: u32,
    pub upgrade_choices: Vec<UpgradeKind>,
    pub mutations: MutationStacks,
    pub enemies: usize,
    pub enemy_bullets: usize,
    pub stats: RunStats,
}

/// Complete state of one run
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub mode: ModeConfig,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub player: Player,
    pub player_bullets: Pool<Bullet>,
    pub enemy_bullets: Pool<Bullet>,
    pub enemies: EnemyRoster,
    pub crystals: Pool<Crystal>,
    pub spawner: SpawnScheduler,
    pub hazard: VoidHazard,
    pub graze: GrazeTracker,
    pub ledger: EchoLedger,
    /// `None` when the mode has no zones
    pub zone: Option<ZoneProgress>,
    pub level_up: LevelUpSystem,
    pub mutations: MutationStacks,
    /// Crystal magnet radius scaling from upgrades
    pub magnet_multiplier: f32,
    pub stats: RunStats,
    pub progress: PersistentProgress,
    zone_name: String,
    pub(super) pending_death: Option<DeathCause>,
    /// Scratch buffer of enemy hitboxes, rebuilt each frame
    pub(super) targets: Vec<(EnemyRef, Hitbox)>,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Start a run with the given seed, mode and balance table
    pub fn new(seed: u64, mode: ModeKind, tuning: Tuning, progress: PersistentProgress) -> Self {
        let mode = tuning.mode(mode).clone();
        let pools = tuning.pools;

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            player: Player::new(mode.player_speed_multiplier),
            player_bullets: Pool::new("player_bullet", pools.player_bullets),
            enemy_bullets: Pool::new("enemy_bullet", pools.enemy_bullets),
            enemies: EnemyRoster::new(pools.enemies),
            crystals: Pool::new("crystal", pools.crystals),
            spawner: SpawnScheduler::new(tuning.spawn_placement, mode.spawn_rate_multiplier),
            hazard: VoidHazard::new(tuning.hazard, mode.void_rate_multiplier, mode.pushback_multiplier),
            graze: GrazeTracker::new(tuning.graze.clone()),
            ledger: EchoLedger::new(tuning.economy, progress.banked),
            zone: mode
                .zone_duration
                .map(|duration| ZoneProgress::new(duration, mode.zone_intro_duration, mode.checkpoint)),
            level_up: LevelUpSystem::new(mode.level_up_interval),
            mutations: MutationStacks::default(),
            magnet_multiplier: 1.0,
            stats: RunStats {
                zone_reached: 1,
                ..RunStats::default()
            },
            progress,
            zone_name: String::new(),
            pending_death: None,
            targets: Vec::new(),
            events: Vec::new(),
            mode,
            tuning,
        };

        state.ledger.reset_run();
        if state.zone.is_some() {
            state.start_zone(1);
        } else {
            state.zone_name = state.mode.name.clone();
            state.retune_endless();
        }
        log::info!("{} run started (seed {seed})", state.mode.name);

        state
    }

    pub(super) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// True while the zone machine is live (always true in endless)
    pub fn zone_is_live(&self) -> bool {
        self.zone.as_ref().is_none_or(ZoneProgress::is_playing)
    }

    pub fn current_zone(&self) -> Option<u32> {
        self.zone.as_ref().map(ZoneProgress::current_zone)
    }

    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }

    /// Apply a zone's configuration to the spawner and hazard
    pub(super) fn start_zone(&mut self, number: u32) {
        let config = self.tuning.zone(number);
        let curve = self.tuning.spawn_curve_from(config.spawn_interval);
        self.spawner
            .configure(config.spawn_rules, curve, config.elite_chance);
        self.hazard.set_base_rate(config.void_rate);
        self.stats.zone_reached = self.stats.zone_reached.max(number);
        self.zone_name = config.name.clone();
        log::info!("zone {number} {} live", config.name);
        self.push_event(GameEvent::ZoneStarted {
            zone: number,
            name: config.name,
        });
    }

    /// Drive spawn and void parameters from survival time (endless)
    pub(super) fn retune_endless(&mut self) {
        let difficulty = self.tuning.endless.at(self.stats.time_survived);
        let curve = vec![IntervalStep {
            time: 0.0,
            interval: difficulty.spawn_interval,
        }];
        self.spawner
            .retune(difficulty.spawn_rules, curve, difficulty.elite_chance);
        self.hazard.set_base_rate(difficulty.void_rate);
    }

    /// Zone timer ran out: restore a shield and clear the field
    pub(super) fn enter_checkpoint(&mut self) {
        self.player.heal(1);
        self.enemies.release_all();
        self.enemy_bullets.release_all();
        self.crystals.release_all();
    }

    pub(super) fn handle_zone_transition(&mut self, transition: ZoneTransition) {
        match transition {
            ZoneTransition::Completed { zone, stats } => {
                self.enter_checkpoint();
                self.push_event(GameEvent::ZoneCompleted { zone, stats });
            }
            ZoneTransition::IntroStarted { zone, choice } => {
                match choice {
                    CheckpointChoice::Bank => {
                        self.ledger.bank();
                    }
                    CheckpointChoice::Carry => self.ledger.carry(),
                }
                log::info!("checkpoint resolved with {choice:?}, heading to zone {zone}");
                self.stats.zone_reached = self.stats.zone_reached.max(zone);
                self.push_event(GameEvent::CheckpointResolved {
                    choice,
                    banked: self.ledger.banked(),
                });
                if choice == CheckpointChoice::Bank {
                    self.save_progress();
                }
            }
            ZoneTransition::Started { zone } => self.start_zone(zone),
        }
    }

    /// Resolve an open checkpoint; ignored when none is open or the game is paused
    pub fn choose_checkpoint(&mut self, choice: CheckpointChoice) -> bool {
        if matches!(self.phase, GamePhase::Paused | GamePhase::GameOver) {
            return false;
        }
        let Some(transition) = self.zone.as_mut().and_then(|zone| zone.choose(choice)) else {
            return false;
        };
        self.handle_zone_transition(transition);
        true
    }

    /// Take one of the offered upgrades and resume play
    pub fn select_upgrade(&mut self, index: usize) -> Option<UpgradeKind> {
        if self.phase != GamePhase::LevelUp {
            return None;
        }
        let upgrade = self.level_up.select(index)?;
        self.apply_upgrade(upgrade);
        self.phase = GamePhase::Playing;
        Some(upgrade)
    }

    pub(super) fn apply_upgrade(&mut self, upgrade: UpgradeKind) {
        match upgrade {
            UpgradeKind::DamageUp => self.player.damage_multiplier += DAMAGE_UP,
            UpgradeKind::FireRateUp => self.player.fire_interval *= FIRE_RATE_UP,
            UpgradeKind::HealthUp => {
                self.player.max_health += 1;
                self.player.heal(1);
            }
            UpgradeKind::VoidResist => self.hazard.add_resistance(VOID_RESIST),
            UpgradeKind::GrazeRange => self.graze.widen(GRAZE_RANGE_UP),
            UpgradeKind::DashCooldown => self.player.dash_max_cooldown *= DASH_COOLDOWN_UP,
            UpgradeKind::Magnet => self.magnet_multiplier += MAGNET_UP,
            UpgradeKind::EchoBoost => self.ledger.boost_gain(ECHO_BOOST),
        }
        log::info!("upgrade applied: {}", upgrade.name());
        self.push_event(GameEvent::UpgradeApplied { upgrade });
    }

    /// Toggle pause; a pending upgrade choice survives the pause
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Playing | GamePhase::LevelUp => GamePhase::Paused,
            GamePhase::Paused if self.level_up.is_pending() => GamePhase::LevelUp,
            GamePhase::Paused => GamePhase::Playing,
            GamePhase::GameOver => GamePhase::GameOver,
        };
    }

    /// First cause wins; the run ends at the close of the frame
    pub(super) fn flag_death(&mut self, cause: DeathCause) {
        if self.pending_death.is_none() {
            self.pending_death = Some(cause);
        }
    }

    /// Settle a flagged death; runs at most once per run
    pub(super) fn resolve_death(&mut self) {
        let Some(cause) = self.pending_death.take() else {
            return;
        };
        if self.phase == GamePhase::GameOver {
            return;
        }

        let settlement = self.ledger.apply_death_penalty();
        self.stats.echoes_lost = settlement.lost;
        self.phase = GamePhase::GameOver;
        log::info!(
            "run ended by {cause:?} after {:.1}s: {} echoes lost, {} salvaged",
            self.stats.time_survived,
            settlement.lost,
            settlement.salvaged
        );

        self.push_event(GameEvent::RunEnded {
            cause,
            echoes_lost: settlement.lost,
            echoes_salvaged: settlement.salvaged,
        });
        self.save_progress();
    }

    /// Sync the persisted counters and announce them
    fn save_progress(&mut self) {
        self.progress.best_zone = self.progress.best_zone.max(self.stats.zone_reached);
        self.progress.banked = self.ledger.banked();
        self.push_event(GameEvent::ProgressChanged {
            best_zone: self.progress.best_zone,
            banked: self.progress.banked,
        });
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            phase: self.phase,
            mode: self.mode.kind,
            player_pos: self.player.pos,
            health: self.player.health,
            max_health: self.player.max_health,
            invincible: self.player.is_invincible(),
            dash_readiness: self.player.dash_readiness(),
            carried: self.ledger.carried(),
            banked: self.ledger.banked(),
            multiplier: self.ledger.multiplier(),
            hazard: self.hazard.height(),
            hazard_mode: self.hazard.mode(),
            hazard_boundary_y: self.hazard.boundary_y(),
            combo: self.graze.combo().count,
            zone: self.current_zone(),
            zone_name: self.zone_name.clone(),
            zone_phase: self.zone.as_ref().map(ZoneProgress::phase),
            zone_time_remaining: self.zone.as_ref().map(ZoneProgress::time_remaining),
            level: self.level_up.level(),
            upgrade_choices: self
                .level_up
                .pending_choices()
                .map(<[UpgradeKind]>::to_vec)
                .unwrap_or_default(),
            mutations: self.mutations,
            enemies: self.enemies.live_count(),
            enemy_bullets: self.enemy_bullets.live_count(),
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;

    fn campaign(seed: u64) -> GameState {
        GameState::new(seed, ModeKind::Campaign, Tuning::default(), PersistentProgress::default())
    }

    #[test]
    fn test_new_run_starts_zone_one() {
        let mut state = campaign(1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.current_zone(), Some(1));
        assert_eq!(state.zone_name(), "BREACH");
        assert_eq!(state.hazard.base_rate(), 1.2);

        let events = state.drain_events();
        assert_eq!(
            events,
            vec![GameEvent::ZoneStarted {
                zone: 1,
                name: "BREACH".to_string()
            }]
        );
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_endless_has_no_zone() {
        let state = GameState::new(
            1,
            ModeKind::Endless,
            Tuning::default(),
            PersistentProgress::default(),
        );
        assert_eq!(state.current_zone(), None);
        assert!(state.zone_is_live());
        assert_eq!(state.hazard.base_rate(), 1.0);
        assert_eq!(state.snapshot().zone_name, "ENDLESS");
    }

    #[test]
    fn test_banked_progress_carries_into_ledger() {
        let progress = PersistentProgress {
            best_zone: 3,
            banked: 250,
        };
        let state = GameState::new(9, ModeKind::Campaign, Tuning::default(), progress);
        assert_eq!(state.ledger.banked(), 250);
        assert_eq!(state.snapshot().banked, 250);
    }

    #[test]
    fn test_upgrades_apply_their_effects() {
        let mut state = campaign(2);
        let interval = state.player.fire_interval;

        state.apply_upgrade(UpgradeKind::DamageUp);
        state.apply_upgrade(UpgradeKind::FireRateUp);
        state.apply_upgrade(UpgradeKind::HealthUp);
        state.apply_upgrade(UpgradeKind::Magnet);

        assert_eq!(state.player.damage_multiplier, 1.25);
        assert!((state.player.fire_interval - interval * 0.85).abs() < 1e-6);
        assert_eq!(state.player.max_health, 4);
        assert_eq!(state.player.health, 4);
        assert_eq!(state.magnet_multiplier, 1.5);
    }

    #[test]
    fn test_checkpoint_heals_and_clears_field() {
        let mut state = campaign(3);
        state.player.health = 1;
        state
            .enemies
            .spawn(EnemyKind::Swarmer, Vec2::ZERO, false, &mut state.rng);
        state.enemy_bullets.acquire(|_| {});

        state.enter_checkpoint();
        assert_eq!(state.player.health, 2);
        assert_eq!(state.enemies.live_count(), 0);
        assert_eq!(state.enemy_bullets.live_count(), 0);
    }

    #[test]
    fn test_checkpoint_choice_without_checkpoint_is_ignored() {
        let mut state = campaign(4);
        assert!(!state.choose_checkpoint(CheckpointChoice::Bank));
    }

    #[test]
    fn test_death_resolves_once() {
        let mut state = campaign(5);
        state.ledger.add(80.0);
        state.flag_death(DeathCause::Damage);
        state.flag_death(DeathCause::Void);
        state.resolve_death();
        state.flag_death(DeathCause::Void);
        state.resolve_death();

        let events = state.drain_events();
        let ended: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, GameEvent::RunEnded { .. }))
            .collect();
        assert_eq!(
            ended,
            vec![&GameEvent::RunEnded {
                cause: DeathCause::Damage,
                echoes_lost: 48,
                echoes_salvaged: 32,
            }]
        );
        assert_eq!(state.ledger.banked(), 32);
        assert_eq!(state.progress.banked, 32);
        assert_eq!(state.progress.best_zone, 1);
        assert!(state.is_over());
    }

    #[test]
    fn test_pause_keeps_pending_level_up() {
        let mut state = campaign(6);
        state.level_up.update(45.0, &mut state.rng);
        state.phase = GamePhase::LevelUp;

        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::Paused);
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::LevelUp);

        assert!(state.select_upgrade(0).is_some());
        assert_eq!(state.phase, GamePhase::Playing);
    }
}

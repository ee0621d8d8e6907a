//! Per-frame simulation step
//!
//! One call advances the run by one rendered frame, in a fixed order:
//! spawn, entity physics and AI, collision resolution, then the hazard,
//! graze, pickup, level-up and zone reactions. A death detected mid-frame
//! is settled only after the rest of the frame has run.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bullet::BulletOwner;
use super::collision::{Hittable, check_vs_enemies, check_vs_player};
use super::crystal::CrystalContext;
use super::enemy::{EnemyContext, Kill};
use super::event::{DeathCause, GameEvent};
use super::pool::{Handle, Releasable, Updatable};
use super::state::{GamePhase, GameState};
use super::zone::CheckpointChoice;
use crate::consts::{MAX_FRAME_DT, PLAYER_BULLET_SPEED};

/// Angle between neighbouring bullets of a scatter volley (degrees)
const VOLLEY_SPREAD_DEGREES: f32 = 10.0;
/// Muzzle offset above the ship's center
const MUZZLE_OFFSET: f32 = 20.0;

/// Input commands for a single frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Steering target in world units; `None` holds position
    pub target: Option<Vec2>,
    /// Fire held
    pub fire: bool,
    /// Dash pressed this frame (edge)
    pub dash: bool,
    /// Pause toggle
    pub pause: bool,
    /// Resolve an open checkpoint
    pub checkpoint_choice: Option<CheckpointChoice>,
    /// Pick one of the offered upgrades
    pub upgrade_choice: Option<usize>,
}

/// Advance the game state by one frame of `dt` seconds (capped)
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        state.toggle_pause();
    }
    if let Some(index) = input.upgrade_choice {
        state.select_upgrade(index);
    }
    if let Some(choice) = input.checkpoint_choice {
        state.choose_checkpoint(choice);
    }

    if state.phase != GamePhase::Playing {
        return;
    }
    if !dt.is_finite() {
        log::warn!("ignoring non-finite frame delta {dt}");
        return;
    }
    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    let dt64 = f64::from(dt);
    state.stats.time_survived += dt64;
    let live = state.zone_is_live();

    if live {
        spawn_enemies(state, dt64);
    }
    update_player(state, input, dt);
    update_entities(state, dt);
    resolve_collisions(state);

    if live {
        if let Some(mode) = state.hazard.update(dt64) {
            log::debug!("void mode now {mode:?}");
            state.push_event(GameEvent::HazardModeChanged { mode });
        }
    }
    if state.hazard.is_player_in_void(state.player.pos.y) {
        state.flag_death(DeathCause::Void);
    }

    resolve_grazes(state, dt64);
    collect_crystals(state);

    // A run ending this frame neither levels up nor closes its zone
    if state.pending_death.is_none() {
        if live {
            if let Some((level, choices)) = state.level_up.update(dt64, &mut state.rng) {
                state.phase = GamePhase::LevelUp;
                state.push_event(GameEvent::LevelUpTriggered { level, choices });
            }
        }
        advance_progression(state, dt64);
    }

    state.resolve_death();
}

fn spawn_enemies(state: &mut GameState, dt: f64) {
    let Some(request) = state.spawner.update(dt, &mut state.rng) else {
        return;
    };
    state
        .enemies
        .spawn(request.kind, request.pos, request.elite, &mut state.rng);
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let target = input.target.unwrap_or(state.player.pos);
    if state.player.update(dt, target, input.dash) {
        state.push_event(GameEvent::Dashed);
    }

    let rate = state.mutations.fire_rate_multiplier();
    if state.player.update_firing(dt, input.fire, rate) {
        fire_volley(state);
    }
}

/// Fan of player bullets centered straight up
fn fire_volley(state: &mut GameState) {
    let count = state.mutations.bullet_count().max(1);
    let spread = VOLLEY_SPREAD_DEGREES.to_radians();
    let first = -((count - 1) as f32) * spread / 2.0;

    let origin = state.player.pos + Vec2::new(0.0, MUZZLE_OFFSET);
    let damage = state.player.bullet_damage();
    let pierce = state.mutations.pierce_count();
    let homing = state.mutations.homing_angle();

    for i in 0..count {
        let angle = first + i as f32 * spread;
        let vel = Vec2::from_angle(angle).rotate(Vec2::Y * PLAYER_BULLET_SPEED);
        state.player_bullets.acquire(|bullet| {
            bullet.fire(BulletOwner::Player, origin, vel, damage);
            bullet.pierce_remaining = pierce;
            bullet.homing = homing;
        });
    }
}

fn update_entities(state: &mut GameState, dt: f32) {
    state.targets.clear();
    state.enemies.collect_targets(&mut state.targets);
    let targets = &state.targets;
    state.player_bullets.step(|_, bullet| {
        bullet.steer(dt, targets);
        bullet.update(dt, &mut ());
    });

    let mut ctx = EnemyContext {
        player_pos: state.player.pos,
        rng: &mut state.rng,
        bullets: &mut state.enemy_bullets,
    };
    state.enemies.update(dt, &mut ctx);

    state.enemy_bullets.update(dt, &mut ());

    let mut ctx = CrystalContext {
        player_pos: state.player.pos,
        magnet_multiplier: state.magnet_multiplier,
    };
    state.crystals.update(dt, &mut ctx);
}

fn resolve_collisions(state: &mut GameState) {
    state.targets.clear();
    state.enemies.collect_targets(&mut state.targets);

    // One bullet at a time, so kills land before the next bullet picks targets
    let bullets: Vec<Handle> = state
        .player_bullets
        .iter_active()
        .map(|(handle, _)| handle)
        .collect();
    let mut struck = Vec::new();
    for handle in bullets {
        let Some(bullet) = state.player_bullets.get(handle) else {
            continue;
        };
        let enemies = &state.enemies;
        check_vs_enemies(
            bullet,
            &state.targets,
            |target| enemies.is_alive(target),
            &mut struck,
        );
        let damage = bullet.damage;

        for &target in &struck {
            if let Some(bullet) = state.player_bullets.get_mut(handle) {
                bullet.register_hit(target);
            }
            if let Some(kill) = state.enemies.damage(target, damage) {
                on_enemy_killed(state, kill);
            }
        }
    }

    if state.player.is_invincible() {
        return;
    }
    let Some(handle) = check_vs_player(&state.enemy_bullets, &state.player.hitbox()) else {
        return;
    };
    if let Some(bullet) = state.enemy_bullets.get_mut(handle) {
        bullet.mark_for_removal();
    }
    if state.player.take_damage() {
        state.graze.on_player_hit();
        log::debug!("player hit, {} shields left", state.player.health);
        state.push_event(GameEvent::PlayerHit {
            health: state.player.health,
        });
        if state.player.is_dead() {
            state.flag_death(DeathCause::Damage);
        }
    }
}

fn on_enemy_killed(state: &mut GameState, kill: Kill) {
    let echoes = state.ledger.add(kill.echo_value);
    let hazard_mode = state.hazard.mode();
    state.hazard.on_kill(kill.elite);
    if let Some(zone) = state.zone.as_mut() {
        zone.record_kill(echoes);
    }
    state.stats.kills += 1;
    state.stats.echoes_earned += echoes;

    state.push_event(GameEvent::EnemyKilled {
        kind: kill.enemy.kind,
        pos: kill.pos,
        elite: kill.elite,
        echoes,
    });
    if state.hazard.mode() != hazard_mode {
        state.push_event(GameEvent::HazardModeChanged {
            mode: state.hazard.mode(),
        });
    }

    let chance = if kill.elite {
        state.tuning.drops.elite_chance
    } else {
        state.tuning.drops.normal_chance
    };
    if state.rng.random_bool(chance.clamp(0.0, 1.0)) {
        let rng = &mut state.rng;
        state
            .crystals
            .acquire(|crystal| crystal.drop_at(kill.pos, None, rng));
    }
}

fn resolve_grazes(state: &mut GameState, dt: f64) {
    let result = state.graze.update(
        dt,
        state.player.pos,
        state.player.is_invincible(),
        &state.enemy_bullets,
    );
    if !result.grazed() {
        return;
    }

    let echoes = state.ledger.add(result.echoes);
    state.stats.echoes_earned += echoes;
    state.hazard.on_graze();
    state.push_event(GameEvent::Grazed {
        count: result.grazes,
        combo: result.combo,
        echoes,
        positions: result.positions,
    });
}

fn collect_crystals(state: &mut GameState) {
    let player_pos = state.player.pos;
    let mut collected = Vec::new();
    state.crystals.step(|_, crystal| {
        if crystal.in_reach(player_pos) {
            collected.push(crystal.kind);
            crystal.mark_for_removal();
        }
    });

    for kind in collected {
        let applied = state.mutations.add(kind);
        log::debug!("crystal {kind:?} collected (applied: {applied})");
        state.push_event(GameEvent::CrystalCollected { kind, applied });
    }
}

fn advance_progression(state: &mut GameState, dt: f64) {
    if state.zone.is_none() {
        state.retune_endless();
        return;
    }
    let transition = state.zone.as_mut().and_then(|zone| zone.update(dt));
    if let Some(transition) = transition {
        state.handle_zone_transition(transition);
    }
}

//! Hostile entities
//!
//! Three concrete kinds, each pooled separately behind the [`Enemy`] trait.
//! [`EnemyRoster`] owns the pools and is the only place that needs to know
//! which kinds exist.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bullet::{Bullet, BulletOwner};
use super::collision::{Hitbox, Hittable};
use super::pool::{Handle, Pool, Releasable, Updatable};
use crate::consts::{GAME_HEIGHT, GAME_WIDTH, OFFSCREEN_MARGIN};
use crate::normalize_angle;

/// Hostile bullets always cost the player one point of health
const ENEMY_BULLET_DAMAGE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Swarmer,
    Drifter,
    Turret,
}

/// Identity of a live enemy across all kind pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyRef {
    pub kind: EnemyKind,
    pub handle: Handle,
}

/// What enemies see of the world while updating
pub struct EnemyContext<'a> {
    pub player_pos: Vec2,
    pub rng: &'a mut Pcg32,
    pub bullets: &'a mut Pool<Bullet>,
}

impl EnemyContext<'_> {
    fn shoot(&mut self, pos: Vec2, vel: Vec2) {
        self.bullets
            .acquire(|bullet| bullet.fire(BulletOwner::Enemy, pos, vel, ENEMY_BULLET_DAMAGE));
    }
}

/// Reported when damage takes an enemy to zero health
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kill {
    pub enemy: EnemyRef,
    pub pos: Vec2,
    pub elite: bool,
    pub echo_value: f64,
}

pub trait Enemy: Default + Releasable + Hittable + for<'a> Updatable<EnemyContext<'a>> {
    const KIND: EnemyKind;

    /// Re-initialize a pooled enemy at `pos`
    fn spawn(&mut self, pos: Vec2, elite: bool, rng: &mut Pcg32);

    fn position(&self) -> Vec2;

    fn health(&self) -> f32;

    fn is_elite(&self) -> bool;

    fn echo_value(&self) -> f64;

    /// Subtract health; flags the enemy for removal and returns true on death
    fn take_damage(&mut self, amount: f32) -> bool;
}

fn below_arena(pos: Vec2) -> bool {
    pos.y < -GAME_HEIGHT / 2.0 - OFFSCREEN_MARGIN
}

/// Sine-strafing diver with an aimed single shot
#[derive(Debug, Clone, Default)]
pub struct Swarmer {
    pos: Vec2,
    spawn_x: f32,
    health: f32,
    elite: bool,
    echo_value: f64,
    phase_time: f32,
    shoot_timer: f32,
    pending_removal: bool,
}

impl Swarmer {
    pub const HEALTH: f32 = 5.0;
    pub const SPEED: f32 = 120.0;
    pub const SINE_AMPLITUDE: f32 = 40.0;
    pub const SINE_FREQUENCY: f32 = 2.0;
    pub const SHOOT_INTERVAL: f32 = 2.0;
    pub const BULLET_SPEED: f32 = 200.0;
}

impl Enemy for Swarmer {
    const KIND: EnemyKind = EnemyKind::Swarmer;

    fn spawn(&mut self, pos: Vec2, elite: bool, rng: &mut Pcg32) {
        self.pos = pos;
        self.spawn_x = pos.x;
        self.elite = elite;
        self.health = if elite { Self::HEALTH * 2.5 } else { Self::HEALTH };
        self.echo_value = if elite { 8.0 } else { 1.0 };
        self.phase_time = rng.random::<f32>() * TAU;
        self.shoot_timer = rng.random::<f32>() * Self::SHOOT_INTERVAL;
        self.pending_removal = false;
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn is_elite(&self) -> bool {
        self.elite
    }

    fn echo_value(&self) -> f64 {
        self.echo_value
    }

    fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        if self.health <= 0.0 {
            self.pending_removal = true;
            return true;
        }
        false
    }
}

impl<'a> Updatable<EnemyContext<'a>> for Swarmer {
    fn update(&mut self, dt: f32, ctx: &mut EnemyContext<'a>) {
        self.phase_time += dt;
        self.pos.x = self.spawn_x
            + (self.phase_time * Self::SINE_FREQUENCY * TAU).sin() * Self::SINE_AMPLITUDE;
        self.pos.y -= Self::SPEED * dt;

        self.shoot_timer += dt;
        if self.shoot_timer >= Self::SHOOT_INTERVAL {
            self.shoot_timer = 0.0;
            let aim = (ctx.player_pos - self.pos).normalize_or_zero();
            if aim != Vec2::ZERO {
                ctx.shoot(self.pos - Vec2::new(0.0, 10.0), aim * Self::BULLET_SPEED);
            }
        }

        if below_arena(self.pos) {
            self.pending_removal = true;
        }
    }
}

impl Releasable for Swarmer {
    fn is_pending_removal(&self) -> bool {
        self.pending_removal
    }

    fn mark_for_removal(&mut self) {
        self.pending_removal = true;
    }

    fn on_release(&mut self) {
        self.pending_removal = false;
    }
}

impl Hittable for Swarmer {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, Vec2::splat(24.0))
    }
}

/// Wall-bouncing tank with an aimed three-way spread
#[derive(Debug, Clone, Default)]
pub struct Drifter {
    pos: Vec2,
    health: f32,
    elite: bool,
    echo_value: f64,
    direction: f32,
    shoot_timer: f32,
    pending_removal: bool,
}

impl Drifter {
    pub const HEALTH: f32 = 12.0;
    pub const ELITE_HEALTH: f32 = 30.0;
    pub const HORIZONTAL_SPEED: f32 = 120.0;
    pub const VERTICAL_SPEED: f32 = 40.0;
    pub const SHOOT_INTERVAL: f32 = 2.5;
    pub const BULLET_SPEED: f32 = 180.0;
    pub const SPREAD_DEGREES: f32 = 15.0;
    const WALL_INSET: f32 = 30.0;
}

impl Enemy for Drifter {
    const KIND: EnemyKind = EnemyKind::Drifter;

    fn spawn(&mut self, pos: Vec2, elite: bool, rng: &mut Pcg32) {
        self.pos = pos;
        self.elite = elite;
        self.health = if elite { Self::ELITE_HEALTH } else { Self::HEALTH };
        self.echo_value = if elite { 8.0 } else { 3.0 };
        self.direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        self.shoot_timer = rng.random::<f32>() * Self::SHOOT_INTERVAL;
        self.pending_removal = false;
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn is_elite(&self) -> bool {
        self.elite
    }

    fn echo_value(&self) -> f64 {
        self.echo_value
    }

    fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        if self.health <= 0.0 {
            self.pending_removal = true;
            return true;
        }
        false
    }
}

impl<'a> Updatable<EnemyContext<'a>> for Drifter {
    fn update(&mut self, dt: f32, ctx: &mut EnemyContext<'a>) {
        self.pos.x += Self::HORIZONTAL_SPEED * self.direction * dt;
        let half_width = GAME_WIDTH / 2.0 - Self::WALL_INSET;
        if self.pos.x > half_width {
            self.pos.x = half_width;
            self.direction = -1.0;
        } else if self.pos.x < -half_width {
            self.pos.x = -half_width;
            self.direction = 1.0;
        }
        self.pos.y -= Self::VERTICAL_SPEED * dt;

        self.shoot_timer += dt;
        if self.shoot_timer >= Self::SHOOT_INTERVAL {
            self.shoot_timer = 0.0;
            let aim = (ctx.player_pos - self.pos).normalize_or_zero();
            if aim != Vec2::ZERO {
                let spread = Self::SPREAD_DEGREES.to_radians();
                let muzzle = self.pos - Vec2::new(0.0, 15.0);
                for angle in [-spread, 0.0, spread] {
                    let dir = Vec2::from_angle(angle).rotate(aim);
                    ctx.shoot(muzzle, dir * Self::BULLET_SPEED);
                }
            }
        }

        if below_arena(self.pos) {
            self.pending_removal = true;
        }
    }
}

impl Releasable for Drifter {
    fn is_pending_removal(&self) -> bool {
        self.pending_removal
    }

    fn mark_for_removal(&mut self) {
        self.pending_removal = true;
    }

    fn on_release(&mut self) {
        self.pending_removal = false;
        self.shoot_timer = 0.0;
    }
}

impl Hittable for Drifter {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, Vec2::new(32.0, 24.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TurretState {
    #[default]
    Entering,
    Active,
}

/// Stationary emplacement that tracks the player and fires bursts
#[derive(Debug, Clone, Default)]
pub struct Turret {
    pos: Vec2,
    health: f32,
    elite: bool,
    echo_value: f64,
    state: TurretState,
    target_y: f32,
    /// Barrel heading, radians from +x
    aim: f32,
    shoot_interval: f32,
    shoot_timer: f32,
    burst_remaining: u32,
    burst_timer: f32,
    pending_removal: bool,
}

impl Turret {
    pub const HEALTH: f32 = 20.0;
    pub const ELITE_HEALTH: f32 = 50.0;
    pub const DRIFT_SPEED: f32 = 60.0;
    /// Barrel turn rate, radians per second
    pub const TURN_RATE: f32 = 2.0;
    pub const SHOOT_INTERVAL: f32 = 3.0;
    pub const ELITE_SHOOT_INTERVAL: f32 = 2.0;
    pub const BURST_SIZE: u32 = 4;
    pub const BURST_DELAY: f32 = 0.1;
    pub const BULLET_SPEED: f32 = 220.0;
    pub const SPREAD_DEGREES: f32 = 5.0;
    const BARREL_LENGTH: f32 = 20.0;

    pub fn is_settled(&self) -> bool {
        self.state == TurretState::Active
    }

    pub fn aim(&self) -> f32 {
        self.aim
    }

    fn track(&mut self, target: Vec2, dt: f32) {
        let to_target = target - self.pos;
        let desired = to_target.y.atan2(to_target.x);
        let diff = normalize_angle(desired - self.aim);
        let max_turn = Self::TURN_RATE * dt;
        if diff.abs() < max_turn {
            self.aim = desired;
        } else {
            self.aim = normalize_angle(self.aim + diff.signum() * max_turn);
        }
    }

    fn fire(&self, ctx: &mut EnemyContext<'_>) {
        let spread = (ctx.rng.random::<f32>() - 0.5) * Self::SPREAD_DEGREES.to_radians();
        let muzzle = self.pos + Vec2::from_angle(self.aim) * Self::BARREL_LENGTH;
        ctx.shoot(muzzle, Vec2::from_angle(self.aim + spread) * Self::BULLET_SPEED);
    }
}

impl Enemy for Turret {
    const KIND: EnemyKind = EnemyKind::Turret;

    fn spawn(&mut self, pos: Vec2, elite: bool, rng: &mut Pcg32) {
        self.pos = pos;
        self.elite = elite;
        self.health = if elite { Self::ELITE_HEALTH } else { Self::HEALTH };
        self.echo_value = if elite { 12.0 } else { 5.0 };
        self.shoot_interval = if elite {
            Self::ELITE_SHOOT_INTERVAL
        } else {
            Self::SHOOT_INTERVAL
        };
        self.target_y = pos.y - (100.0 + rng.random::<f32>() * 150.0);
        self.state = TurretState::Entering;
        self.aim = -std::f32::consts::FRAC_PI_2;
        self.shoot_timer = rng.random::<f32>() * self.shoot_interval;
        self.burst_remaining = 0;
        self.burst_timer = 0.0;
        self.pending_removal = false;
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn is_elite(&self) -> bool {
        self.elite
    }

    fn echo_value(&self) -> f64 {
        self.echo_value
    }

    fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        if self.health <= 0.0 {
            self.pending_removal = true;
            return true;
        }
        false
    }
}

impl<'a> Updatable<EnemyContext<'a>> for Turret {
    fn update(&mut self, dt: f32, ctx: &mut EnemyContext<'a>) {
        match self.state {
            TurretState::Entering => {
                self.pos.y -= Self::DRIFT_SPEED * dt;
                if self.pos.y <= self.target_y {
                    self.pos.y = self.target_y;
                    self.state = TurretState::Active;
                }
            }
            TurretState::Active => {
                self.track(ctx.player_pos, dt);
                if self.burst_remaining > 0 {
                    self.burst_timer += dt;
                    if self.burst_timer >= Self::BURST_DELAY {
                        self.burst_timer = 0.0;
                        self.fire(ctx);
                        self.burst_remaining -= 1;
                    }
                } else {
                    self.shoot_timer += dt;
                    if self.shoot_timer >= self.shoot_interval {
                        self.shoot_timer = 0.0;
                        self.burst_remaining = Self::BURST_SIZE;
                        self.burst_timer = 0.0;
                    }
                }
            }
        }

        if below_arena(self.pos) {
            self.pending_removal = true;
        }
    }
}

impl Releasable for Turret {
    fn is_pending_removal(&self) -> bool {
        self.pending_removal
    }

    fn mark_for_removal(&mut self) {
        self.pending_removal = true;
    }

    fn on_release(&mut self) {
        self.pending_removal = false;
        self.shoot_timer = 0.0;
        self.burst_remaining = 0;
        self.state = TurretState::Entering;
    }
}

impl Hittable for Turret {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, Vec2::splat(28.0))
    }
}

/// Pool sizes per kind; `None` leaves the kind unregistered
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterCapacity {
    pub swarmers: Option<usize>,
    pub drifters: Option<usize>,
    pub turrets: Option<usize>,
}

impl Default for RosterCapacity {
    fn default() -> Self {
        Self {
            swarmers: Some(50),
            drifters: Some(20),
            turrets: Some(10),
        }
    }
}

/// Every enemy pool, one per kind
#[derive(Debug)]
pub struct EnemyRoster {
    swarmers: Option<Pool<Swarmer>>,
    drifters: Option<Pool<Drifter>>,
    turrets: Option<Pool<Turret>>,
}

impl EnemyRoster {
    pub fn new(capacity: RosterCapacity) -> Self {
        Self {
            swarmers: capacity.swarmers.map(|n| Pool::new("swarmer", n)),
            drifters: capacity.drifters.map(|n| Pool::new("drifter", n)),
            turrets: capacity.turrets.map(|n| Pool::new("turret", n)),
        }
    }

    /// Live and not already dying this frame
    pub fn is_alive(&self, target: EnemyRef) -> bool {
        match target.kind {
            EnemyKind::Swarmer => alive_in(&self.swarmers, target),
            EnemyKind::Drifter => alive_in(&self.drifters, target),
            EnemyKind::Turret => alive_in(&self.turrets, target),
        }
    }

    /// Materialize an enemy; `None` (and a warning) when no pool is registered
    pub fn spawn(&mut self, kind: EnemyKind, pos: Vec2, elite: bool, rng: &mut Pcg32) -> Option<EnemyRef> {
        let handle = match kind {
            EnemyKind::Swarmer => spawn_into(&mut self.swarmers, pos, elite, rng),
            EnemyKind::Drifter => spawn_into(&mut self.drifters, pos, elite, rng),
            EnemyKind::Turret => spawn_into(&mut self.turrets, pos, elite, rng),
        };
        if handle.is_none() {
            log::warn!("no pool registered for {kind:?}, spawn skipped");
        }
        handle.map(|handle| EnemyRef { kind, handle })
    }

    pub fn update(&mut self, dt: f32, ctx: &mut EnemyContext<'_>) {
        if let Some(pool) = &mut self.swarmers {
            pool.update(dt, ctx);
        }
        if let Some(pool) = &mut self.drifters {
            pool.update(dt, ctx);
        }
        if let Some(pool) = &mut self.turrets {
            pool.update(dt, ctx);
        }
    }

    /// Active enemy hitboxes, appended to `out`
    pub fn collect_targets(&self, out: &mut Vec<(EnemyRef, Hitbox)>) {
        collect_from(&self.swarmers, out);
        collect_from(&self.drifters, out);
        collect_from(&self.turrets, out);
    }

    /// Apply damage to a live enemy; returns the kill if it died
    pub fn damage(&mut self, target: EnemyRef, amount: f32) -> Option<Kill> {
        match target.kind {
            EnemyKind::Swarmer => damage_in(&mut self.swarmers, target, amount),
            EnemyKind::Drifter => damage_in(&mut self.drifters, target, amount),
            EnemyKind::Turret => damage_in(&mut self.turrets, target, amount),
        }
    }

    pub fn release_all(&mut self) {
        if let Some(pool) = &mut self.swarmers {
            pool.release_all();
        }
        if let Some(pool) = &mut self.drifters {
            pool.release_all();
        }
        if let Some(pool) = &mut self.turrets {
            pool.release_all();
        }
    }

    pub fn live_count(&self) -> usize {
        self.swarmers.as_ref().map_or(0, Pool::live_count)
            + self.drifters.as_ref().map_or(0, Pool::live_count)
            + self.turrets.as_ref().map_or(0, Pool::live_count)
    }
}

fn spawn_into<E: Enemy>(pool: &mut Option<Pool<E>>, pos: Vec2, elite: bool, rng: &mut Pcg32) -> Option<Handle> {
    pool.as_mut()
        .map(|pool| pool.acquire(|enemy| enemy.spawn(pos, elite, rng)))
}

fn collect_from<E: Enemy>(pool: &Option<Pool<E>>, out: &mut Vec<(EnemyRef, Hitbox)>) {
    if let Some(pool) = pool {
        out.extend(pool.iter_active().map(|(handle, enemy)| {
            (
                EnemyRef {
                    kind: E::KIND,
                    handle,
                },
                enemy.hitbox(),
            )
        }));
    }
}

fn alive_in<E: Enemy>(pool: &Option<Pool<E>>, target: EnemyRef) -> bool {
    pool.as_ref()
        .and_then(|pool| pool.get(target.handle))
        .is_some_and(|enemy| !enemy.is_pending_removal())
}

fn damage_in<E: Enemy>(pool: &mut Option<Pool<E>>, target: EnemyRef, amount: f32) -> Option<Kill> {
    let enemy = pool.as_mut()?.get_mut(target.handle)?;
    if enemy.is_pending_removal() {
        return None;
    }
    enemy.take_damage(amount).then(|| Kill {
        enemy: target,
        pos: enemy.position(),
        elite: enemy.is_elite(),
        echo_value: enemy.echo_value(),
    })
}

//! Weighted, time-scaled enemy spawning
//!
//! The scheduler only decides *when*, *what* and *where*. Materializing the
//! enemy in a pool is the caller's job, so a missing pool is a wiring problem
//! the caller logs and skips.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use crate::consts::{GAME_HEIGHT, GAME_WIDTH};

/// One entry of the enemy mix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    pub kind: EnemyKind,
    pub weight: f64,
    /// Zone time (seconds) before this kind can be drawn
    #[serde(default)]
    pub min_zone_time: f64,
}

impl SpawnRule {
    pub const fn new(kind: EnemyKind, weight: f64) -> Self {
        Self {
            kind,
            weight,
            min_zone_time: 0.0,
        }
    }
}

/// Breakpoint of the interval step function: from `time` on, spawn every `interval`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalStep {
    pub time: f64,
    pub interval: f64,
}

/// Placement knobs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPlacement {
    /// Horizontal inset from the arena edges
    pub margin: f32,
    /// Larger inset for turrets so they settle near the center
    pub turret_margin: f32,
    /// How far above the visible top edge enemies appear
    pub offset_above_top: f32,
    /// Zone time before elites may appear
    pub elite_grace: f64,
}

impl Default for SpawnPlacement {
    fn default() -> Self {
        Self {
            margin: 50.0,
            turret_margin: 150.0,
            offset_above_top: 50.0,
            elite_grace: 30.0,
        }
    }
}

/// What the scheduler wants materialized this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: EnemyKind,
    pub pos: glam::Vec2,
    pub elite: bool,
}

#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    rules: Vec<SpawnRule>,
    curve: Vec<IntervalStep>,
    elite_chance: f64,
    rate_multiplier: f64,
    placement: SpawnPlacement,
    spawn_timer: f64,
    zone_timer: f64,
}

impl SpawnScheduler {
    pub fn new(placement: SpawnPlacement, rate_multiplier: f64) -> Self {
        Self {
            rules: Vec::new(),
            curve: Vec::new(),
            elite_chance: 0.0,
            rate_multiplier,
            placement,
            spawn_timer: 0.0,
            zone_timer: 0.0,
        }
    }

    /// Install a zone's enemy mix and cadence; timers restart
    pub fn configure(&mut self, rules: Vec<SpawnRule>, curve: Vec<IntervalStep>, elite_chance: f64) {
        self.rules = rules;
        self.curve = curve;
        self.elite_chance = elite_chance;
        self.spawn_timer = 0.0;
        self.zone_timer = 0.0;
    }

    /// Swap the mix and cadence without touching the timers (endless drift)
    pub fn retune(&mut self, rules: Vec<SpawnRule>, curve: Vec<IntervalStep>, elite_chance: f64) {
        self.rules = rules;
        self.curve = curve;
        self.elite_chance = elite_chance;
    }

    /// Step function over the breakpoints; the last one holds forever
    pub fn base_interval(&self) -> f64 {
        let mut interval = self.curve.first().map_or(f64::INFINITY, |step| step.interval);
        for step in &self.curve {
            if self.zone_timer >= step.time {
                interval = step.interval;
            } else {
                break;
            }
        }
        interval
    }

    pub fn effective_interval(&self) -> f64 {
        self.base_interval() / self.rate_multiplier
    }

    /// Advance the timers and, when the interval elapses, produce one spawn
    pub fn update(&mut self, dt: f64, rng: &mut Pcg32) -> Option<SpawnRequest> {
        self.spawn_timer += dt;
        self.zone_timer += dt;

        if self.spawn_timer < self.effective_interval() {
            return None;
        }
        self.spawn_timer = 0.0;

        let Some(kind) = self.pick_kind(rng) else {
            log::warn!(
                "no enemy kind unlocked at zone time {:.1}s, skipping spawn",
                self.zone_timer
            );
            return None;
        };

        let elite = self.roll_elite(rng);
        let pos = self.spawn_position(kind, rng);
        log::debug!("spawn {kind:?} elite={elite} at ({:.0}, {:.0})", pos.x, pos.y);

        Some(SpawnRequest { kind, pos, elite })
    }

    /// Weighted draw over the rules unlocked at the current zone time.
    ///
    /// Draws `r` in `[0, total)` and subtracts weights in rule order until
    /// the remainder goes non-positive.
    pub fn pick_kind(&self, rng: &mut Pcg32) -> Option<EnemyKind> {
        let unlocked = || {
            self.rules
                .iter()
                .filter(|rule| rule.weight > 0.0 && self.zone_timer >= rule.min_zone_time)
        };

        let total: f64 = unlocked().map(|rule| rule.weight).sum();
        if total <= 0.0 {
            return None;
        }

        let mut remainder = rng.random::<f64>() * total;
        let mut last = None;
        for rule in unlocked() {
            remainder -= rule.weight;
            last = Some(rule.kind);
            if remainder <= 0.0 {
                return last;
            }
        }
        // Float drift can leave a sliver of remainder
        last
    }

    fn roll_elite(&self, rng: &mut Pcg32) -> bool {
        if self.zone_timer <= self.placement.elite_grace {
            return false;
        }
        rng.random_bool(self.elite_chance.clamp(0.0, 1.0))
    }

    fn spawn_position(&self, kind: EnemyKind, rng: &mut Pcg32) -> glam::Vec2 {
        let margin = match kind {
            EnemyKind::Turret => self.placement.turret_margin,
            _ => self.placement.margin,
        };
        let half_span = (GAME_WIDTH / 2.0 - margin).max(0.0);
        let x = if half_span > 0.0 {
            rng.random_range(-half_span..=half_span)
        } else {
            0.0
        };
        glam::Vec2::new(x, GAME_HEIGHT / 2.0 + self.placement.offset_above_top)
    }

    pub fn elite_chance(&self) -> f64 {
        self.elite_chance
    }

    pub fn set_rate_multiplier(&mut self, multiplier: f64) {
        self.rate_multiplier = multiplier.max(f64::EPSILON);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn default_curve() -> Vec<IntervalStep> {
        vec![
            IntervalStep { time: 0.0, interval: 1.8 },
            IntervalStep { time: 20.0, interval: 1.4 },
            IntervalStep { time: 45.0, interval: 1.0 },
            IntervalStep { time: 70.0, interval: 0.8 },
        ]
    }

    fn siege_mix() -> Vec<SpawnRule> {
        vec![
            SpawnRule::new(EnemyKind::Swarmer, 0.5),
            SpawnRule::new(EnemyKind::Drifter, 0.3),
            SpawnRule::new(EnemyKind::Turret, 0.2),
        ]
    }

    fn scheduler(rules: Vec<SpawnRule>, elite_chance: f64) -> SpawnScheduler {
        let mut scheduler = SpawnScheduler::new(SpawnPlacement::default(), 1.0);
        scheduler.configure(rules, default_curve(), elite_chance);
        scheduler
    }

    #[test]
    fn test_weighted_draw_matches_weights() {
        let scheduler = scheduler(siege_mix(), 0.0);
        let mut rng = Pcg32::seed_from_u64(7);
        let draws = 100_000;
        let mut counts = [0u32; 3];

        for _ in 0..draws {
            match scheduler.pick_kind(&mut rng) {
                Some(EnemyKind::Swarmer) => counts[0] += 1,
                Some(EnemyKind::Drifter) => counts[1] += 1,
                Some(EnemyKind::Turret) => counts[2] += 1,
                None => panic!("mix has positive weight"),
            }
        }

        for (count, expected) in counts.iter().zip([0.5, 0.3, 0.2]) {
            let observed = f64::from(*count) / f64::from(draws);
            assert!(
                (observed - expected).abs() < 0.02,
                "observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_interval_step_function() {
        let mut scheduler = scheduler(siege_mix(), 0.0);
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(scheduler.base_interval(), 1.8);

        for _ in 0..(25 * 10) {
            scheduler.update(0.1, &mut rng);
        }
        assert_eq!(scheduler.base_interval(), 1.4);

        for _ in 0..(200 * 10) {
            scheduler.update(0.1, &mut rng);
        }
        // Past the last breakpoint the interval holds
        assert_eq!(scheduler.base_interval(), 0.8);
    }

    #[test]
    fn test_rate_multiplier_shortens_interval() {
        let mut scheduler = scheduler(siege_mix(), 0.0);
        scheduler.set_rate_multiplier(2.0);
        assert!((scheduler.effective_interval() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_spawns_once_interval_elapses() {
        let mut scheduler = scheduler(siege_mix(), 0.0);
        let mut rng = Pcg32::seed_from_u64(3);

        assert!(scheduler.update(1.0, &mut rng).is_none());
        let request = scheduler.update(0.9, &mut rng);
        assert!(request.is_some());
        // Timer restarted
        assert!(scheduler.update(0.5, &mut rng).is_none());
    }

    #[test]
    fn test_no_elites_during_grace() {
        let mut scheduler = scheduler(siege_mix(), 1.0);
        let mut rng = Pcg32::seed_from_u64(11);

        let mut elapsed = 0.0;
        while elapsed < 29.5 {
            if let Some(request) = scheduler.update(0.05, &mut rng) {
                assert!(!request.elite);
            }
            elapsed += 0.05;
        }

        let mut saw_elite = false;
        for _ in 0..200 {
            if let Some(request) = scheduler.update(0.05, &mut rng) {
                saw_elite |= request.elite;
            }
        }
        assert!(saw_elite);
    }

    #[test]
    fn test_spawn_position_respects_margins() {
        let scheduler = scheduler(siege_mix(), 0.0);
        let mut rng = Pcg32::seed_from_u64(5);

        for _ in 0..1000 {
            let pos = scheduler.spawn_position(EnemyKind::Swarmer, &mut rng);
            assert!(pos.x.abs() <= GAME_WIDTH / 2.0 - 50.0);
            assert_eq!(pos.y, GAME_HEIGHT / 2.0 + 50.0);

            let pos = scheduler.spawn_position(EnemyKind::Turret, &mut rng);
            assert!(pos.x.abs() <= GAME_WIDTH / 2.0 - 150.0);
        }
    }

    #[test]
    fn test_locked_kinds_are_never_drawn() {
        let rules = vec![
            SpawnRule::new(EnemyKind::Swarmer, 0.5),
            SpawnRule {
                kind: EnemyKind::Turret,
                weight: 10.0,
                min_zone_time: 60.0,
            },
        ];
        let scheduler = scheduler(rules, 0.0);
        let mut rng = Pcg32::seed_from_u64(9);

        for _ in 0..1000 {
            assert_eq!(scheduler.pick_kind(&mut rng), Some(EnemyKind::Swarmer));
        }
    }

    #[test]
    fn test_empty_mix_skips_spawn() {
        let mut scheduler = scheduler(Vec::new(), 0.0);
        let mut rng = Pcg32::seed_from_u64(2);
        assert!(scheduler.update(5.0, &mut rng).is_none());
    }
}

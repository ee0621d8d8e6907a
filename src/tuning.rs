//! Data-driven game balance
//!
//! Everything numeric the simulation consumes per zone or per mode lives
//! here. [`Tuning::default`] is the built-in table; [`Tuning::from_json`]
//! accepts an external one, with any omitted section falling back to the
//! defaults.

use serde::{Deserialize, Serialize};

use crate::sim::economy::EconomyConfig;
use crate::sim::enemy::{EnemyKind, RosterCapacity};
use crate::sim::graze::GrazeConfig;
use crate::sim::hazard::HazardConfig;
use crate::sim::spawn::{IntervalStep, SpawnPlacement, SpawnRule};
use crate::sim::zone::CheckpointPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub id: u32,
    pub name: String,
    pub subtitle: String,
    pub spawn_rules: Vec<SpawnRule>,
    /// Seconds between spawns at the start of the zone
    pub spawn_interval: f64,
    pub elite_chance: f64,
    /// Void rise in percent per second
    pub void_rate: f64,
}

/// How zones past the authored table get harder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneScaling {
    /// Spawn interval is divided by `1 + step * zones_past_table`
    pub interval_step: f64,
    pub min_interval: f64,
    pub elite_step: f64,
    pub max_elite_chance: f64,
    pub void_rate_step: f64,
}

impl Default for ZoneScaling {
    fn default() -> Self {
        Self {
            interval_step: 0.15,
            min_interval: 0.5,
            elite_step: 0.03,
            max_elite_chance: 0.35,
            void_rate_step: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    #[default]
    Campaign,
    VoidRush,
    Endless,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub kind: ModeKind,
    pub name: String,
    /// `None` disables zones entirely (endless)
    pub zone_duration: Option<f64>,
    pub zone_intro_duration: f64,
    pub checkpoint: CheckpointPolicy,
    pub level_up_interval: f64,
    pub void_rate_multiplier: f64,
    pub spawn_rate_multiplier: f64,
    pub pushback_multiplier: f64,
    pub player_speed_multiplier: f32,
}

impl ModeConfig {
    pub fn campaign() -> Self {
        Self {
            kind: ModeKind::Campaign,
            name: "CAMPAIGN".to_string(),
            zone_duration: Some(90.0),
            zone_intro_duration: 3.0,
            checkpoint: CheckpointPolicy::Choice,
            level_up_interval: 45.0,
            void_rate_multiplier: 1.0,
            spawn_rate_multiplier: 1.0,
            pushback_multiplier: 1.0,
            player_speed_multiplier: 1.0,
        }
    }

    pub fn void_rush() -> Self {
        Self {
            kind: ModeKind::VoidRush,
            name: "VOID RUSH".to_string(),
            zone_duration: Some(30.0),
            zone_intro_duration: 1.0,
            checkpoint: CheckpointPolicy::Auto { duration: 1.5 },
            level_up_interval: 20.0,
            void_rate_multiplier: 3.0,
            spawn_rate_multiplier: 1.8,
            pushback_multiplier: 2.0,
            player_speed_multiplier: 1.2,
        }
    }

    pub fn endless() -> Self {
        Self {
            kind: ModeKind::Endless,
            name: "ENDLESS".to_string(),
            zone_duration: None,
            zone_intro_duration: 0.0,
            checkpoint: CheckpointPolicy::Choice,
            level_up_interval: 30.0,
            void_rate_multiplier: 0.8,
            spawn_rate_multiplier: 1.0,
            pushback_multiplier: 1.0,
            player_speed_multiplier: 1.0,
        }
    }
}

/// Endless-mode parameters at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct EndlessDifficulty {
    pub spawn_interval: f64,
    pub elite_chance: f64,
    pub void_rate: f64,
    pub spawn_rules: Vec<SpawnRule>,
}

/// Continuous difficulty for endless mode, linear in minutes survived
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndlessCurve {
    pub start_interval: f64,
    pub interval_per_minute: f64,
    pub min_interval: f64,
    pub start_elite_chance: f64,
    pub elite_per_minute: f64,
    pub max_elite_chance: f64,
    pub start_void_rate: f64,
    pub void_rate_per_minute: f64,
    pub max_void_rate: f64,
    /// Seconds survived before drifters join
    pub drifter_unlock: f64,
    /// Seconds survived before turrets join
    pub turret_unlock: f64,
}

impl Default for EndlessCurve {
    fn default() -> Self {
        Self {
            start_interval: 1.8,
            interval_per_minute: 0.43,
            min_interval: 0.5,
            start_elite_chance: 0.05,
            elite_per_minute: 0.083,
            max_elite_chance: 0.30,
            start_void_rate: 1.0,
            void_rate_per_minute: 0.5,
            max_void_rate: 2.5,
            drifter_unlock: 60.0,
            turret_unlock: 120.0,
        }
    }
}

impl EndlessCurve {
    pub fn at(&self, elapsed: f64) -> EndlessDifficulty {
        let minutes = elapsed / 60.0;
        let spawn_rules = if elapsed >= self.turret_unlock {
            vec![
                SpawnRule::new(EnemyKind::Swarmer, 0.5),
                SpawnRule::new(EnemyKind::Drifter, 0.3),
                SpawnRule::new(EnemyKind::Turret, 0.2),
            ]
        } else if elapsed >= self.drifter_unlock {
            vec![
                SpawnRule::new(EnemyKind::Swarmer, 0.7),
                SpawnRule::new(EnemyKind::Drifter, 0.3),
            ]
        } else {
            vec![SpawnRule::new(EnemyKind::Swarmer, 1.0)]
        };

        EndlessDifficulty {
            spawn_interval: (self.start_interval - minutes * self.interval_per_minute)
                .max(self.min_interval),
            elite_chance: (self.start_elite_chance + minutes * self.elite_per_minute)
                .min(self.max_elite_chance),
            void_rate: (self.start_void_rate + minutes * self.void_rate_per_minute)
                .min(self.max_void_rate),
            spawn_rules,
        }
    }
}

/// Pool warm-up sizes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSizes {
    pub player_bullets: usize,
    pub enemy_bullets: usize,
    pub crystals: usize,
    pub enemies: RosterCapacity,
}

impl Default for PoolSizes {
    fn default() -> Self {
        Self {
            player_bullets: 100,
            enemy_bullets: 200,
            crystals: 20,
            enemies: RosterCapacity::default(),
        }
    }
}

/// Crystal drop odds on kills
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropTable {
    pub elite_chance: f64,
    pub normal_chance: f64,
}

impl Default for DropTable {
    fn default() -> Self {
        Self {
            elite_chance: 1.0,
            normal_chance: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub zones: Vec<ZoneConfig>,
    pub zone_scaling: ZoneScaling,
    /// Interval breakpoints for a zone whose start interval equals the first entry;
    /// other zones scale it proportionally
    pub spawn_curve: Vec<IntervalStep>,
    pub spawn_placement: SpawnPlacement,
    pub endless: EndlessCurve,
    pub hazard: HazardConfig,
    pub graze: GrazeConfig,
    pub economy: EconomyConfig,
    pub pools: PoolSizes,
    pub drops: DropTable,
    pub campaign: ModeConfig,
    pub void_rush: ModeConfig,
    pub endless_mode: ModeConfig,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            zones: default_zones(),
            zone_scaling: ZoneScaling::default(),
            spawn_curve: vec![
                IntervalStep { time: 0.0, interval: 1.8 },
                IntervalStep { time: 20.0, interval: 1.4 },
                IntervalStep { time: 45.0, interval: 1.0 },
                IntervalStep { time: 70.0, interval: 0.8 },
            ],
            spawn_placement: SpawnPlacement::default(),
            endless: EndlessCurve::default(),
            hazard: HazardConfig::default(),
            graze: GrazeConfig::default(),
            economy: EconomyConfig::default(),
            pools: PoolSizes::default(),
            drops: DropTable::default(),
            campaign: ModeConfig::campaign(),
            void_rush: ModeConfig::void_rush(),
            endless_mode: ModeConfig::endless(),
        }
    }
}

fn default_zones() -> Vec<ZoneConfig> {
    use EnemyKind::{Drifter, Swarmer, Turret};

    let zone = |id: u32, name: &str, subtitle: &str, rules: Vec<SpawnRule>, interval, elite, void| {
        ZoneConfig {
            id,
            name: name.to_string(),
            subtitle: subtitle.to_string(),
            spawn_rules: rules,
            spawn_interval: interval,
            elite_chance: elite,
            void_rate: void,
        }
    };

    vec![
        zone(1, "BREACH", "They found you", vec![SpawnRule::new(Swarmer, 1.0)], 1.8, 0.10, 1.2),
        zone(
            2,
            "SWARM",
            "Nowhere to hide",
            vec![SpawnRule::new(Swarmer, 0.7), SpawnRule::new(Drifter, 0.3)],
            1.4,
            0.15,
            1.5,
        ),
        zone(
            3,
            "SIEGE",
            "Hold the line",
            vec![
                SpawnRule::new(Swarmer, 0.5),
                SpawnRule::new(Drifter, 0.3),
                SpawnRule::new(Turret, 0.2),
            ],
            1.0,
            0.20,
            1.8,
        ),
        zone(
            4,
            "HIVE",
            "Face the queen",
            vec![
                SpawnRule::new(Swarmer, 0.4),
                SpawnRule::new(Drifter, 0.35),
                SpawnRule::new(Turret, 0.25),
            ],
            0.8,
            0.25,
            2.0,
        ),
    ]
}

impl Tuning {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn mode(&self, kind: ModeKind) -> &ModeConfig {
        match kind {
            ModeKind::Campaign => &self.campaign,
            ModeKind::VoidRush => &self.void_rush,
            ModeKind::Endless => &self.endless_mode,
        }
    }

    /// Config for zone `number` (1-based); zones past the table scale the last one
    pub fn zone(&self, number: u32) -> ZoneConfig {
        if let Some(config) = self.zones.iter().find(|zone| zone.id == number) {
            return config.clone();
        }

        let Some(last) = self.zones.iter().max_by_key(|zone| zone.id) else {
            log::warn!("zone table is empty, falling back to built-in zones");
            return Self::default().zone(number);
        };

        let past = f64::from(number.saturating_sub(last.id));
        let scaling = &self.zone_scaling;
        ZoneConfig {
            id: number,
            name: format!("ZONE {number}"),
            subtitle: "Beyond the hive".to_string(),
            spawn_rules: last.spawn_rules.clone(),
            spawn_interval: (last.spawn_interval / (1.0 + past * scaling.interval_step))
                .max(scaling.min_interval),
            elite_chance: (last.elite_chance + past * scaling.elite_step)
                .min(scaling.max_elite_chance),
            void_rate: last.void_rate + past * scaling.void_rate_step,
        }
    }

    /// The shared breakpoint curve scaled so it starts at `start_interval`
    pub fn spawn_curve_from(&self, start_interval: f64) -> Vec<IntervalStep> {
        let base = self.spawn_curve.first().map_or(start_interval, |step| step.interval);
        let factor = if base > 0.0 { start_interval / base } else { 1.0 };
        self.spawn_curve
            .iter()
            .map(|step| IntervalStep {
                time: step.time,
                interval: step.interval * factor,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authored_zones() {
        let tuning = Tuning::default();
        let siege = tuning.zone(3);
        assert_eq!(siege.name, "SIEGE");
        assert_eq!(siege.spawn_rules.len(), 3);
        assert_eq!(siege.void_rate, 1.8);
    }

    #[test]
    fn test_zones_past_table_scale() {
        let tuning = Tuning::default();
        let zone6 = tuning.zone(6);
        assert_eq!(zone6.name, "ZONE 6");
        assert!((zone6.spawn_interval - 0.8 / 1.3).abs() < 1e-9);
        assert!((zone6.elite_chance - 0.31).abs() < 1e-9);
        assert!((zone6.void_rate - 2.4).abs() < 1e-9);

        let zone40 = tuning.zone(40);
        assert_eq!(zone40.spawn_interval, 0.5);
        assert_eq!(zone40.elite_chance, 0.35);
    }

    #[test]
    fn test_spawn_curve_scales_proportionally() {
        let tuning = Tuning::default();
        let breach = tuning.spawn_curve_from(1.8);
        assert_eq!(breach, tuning.spawn_curve);

        let siege = tuning.spawn_curve_from(0.9);
        assert!((siege[0].interval - 0.9).abs() < 1e-9);
        assert!((siege[3].interval - 0.4).abs() < 1e-9);
        assert_eq!(siege[2].time, 45.0);
    }

    #[test]
    fn test_endless_curve() {
        let curve = EndlessCurve::default();
        let start = curve.at(0.0);
        assert_eq!(start.spawn_interval, 1.8);
        assert_eq!(start.spawn_rules.len(), 1);

        let two_min = curve.at(120.0);
        assert!((two_min.spawn_interval - 0.94).abs() < 1e-9);
        assert_eq!(two_min.spawn_rules.len(), 3);

        let late = curve.at(3600.0);
        assert_eq!(late.spawn_interval, 0.5);
        assert_eq!(late.elite_chance, 0.30);
        assert_eq!(late.void_rate, 2.5);
    }

    #[test]
    fn test_json_round_trip_and_partial_override() {
        let tuning = Tuning::default();
        let json = tuning.to_json().expect("serializes");
        assert_eq!(Tuning::from_json(&json).expect("parses"), tuning);

        let partial = Tuning::from_json(r#"{ "hazard": { "kill_pushback": 4.0 } }"#)
            .expect("partial tuning parses");
        assert_eq!(partial.hazard.kill_pushback, 4.0);
        assert_eq!(partial.hazard.graze_pushback, 0.5);
        assert_eq!(partial.zones.len(), 4);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Tuning::from_json("{ \"zones\": 7 }").is_err());
    }
}

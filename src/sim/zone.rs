//! Zone progression: Playing -> Checkpoint -> Intro -> Playing (next zone)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZonePhase {
    #[default]
    Playing,
    Checkpoint,
    Intro,
}

/// How a checkpoint resolves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum CheckpointPolicy {
    /// Wait for the player to bank or carry
    Choice,
    /// Bank automatically after `duration` seconds
    Auto { duration: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointChoice {
    Bank,
    Carry,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub kills: u32,
    pub echoes_earned: f64,
    /// Whole seconds spent in the zone
    pub time: u32,
}

/// Progression step reported by [`ZoneProgress::update`] and [`ZoneProgress::choose`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneTransition {
    /// Zone timer ran out; a checkpoint is open
    Completed { zone: u32, stats: ZoneStats },
    /// Checkpoint resolved; the next zone's intro is showing
    IntroStarted { zone: u32, choice: CheckpointChoice },
    /// Intro finished; the zone is live and its config should be applied
    Started { zone: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneProgress {
    current_zone: u32,
    zone_timer: f64,
    phase: ZonePhase,
    zone_duration: f64,
    intro_duration: f64,
    policy: CheckpointPolicy,
    intro_timer: f64,
    checkpoint_timer: f64,
    stats: ZoneStats,
}

impl ZoneProgress {
    pub fn new(zone_duration: f64, intro_duration: f64, policy: CheckpointPolicy) -> Self {
        Self {
            current_zone: 1,
            zone_timer: 0.0,
            phase: ZonePhase::Playing,
            zone_duration,
            intro_duration,
            policy,
            intro_timer: 0.0,
            checkpoint_timer: 0.0,
            stats: ZoneStats::default(),
        }
    }

    pub fn update(&mut self, dt: f64) -> Option<ZoneTransition> {
        match self.phase {
            ZonePhase::Playing => {
                self.zone_timer += dt;
                if self.zone_timer >= self.zone_duration {
                    self.phase = ZonePhase::Checkpoint;
                    self.checkpoint_timer = 0.0;
                    self.stats.time = self.zone_timer.floor() as u32;
                    log::info!("zone {} complete", self.current_zone);
                    return Some(ZoneTransition::Completed {
                        zone: self.current_zone,
                        stats: self.stats,
                    });
                }
                None
            }
            ZonePhase::Checkpoint => match self.policy {
                CheckpointPolicy::Choice => None,
                CheckpointPolicy::Auto { duration } => {
                    self.checkpoint_timer += dt;
                    if self.checkpoint_timer >= duration {
                        self.choose(CheckpointChoice::Bank)
                    } else {
                        None
                    }
                }
            },
            ZonePhase::Intro => {
                self.intro_timer += dt;
                if self.intro_timer >= self.intro_duration {
                    self.phase = ZonePhase::Playing;
                    log::info!("zone {} started", self.current_zone);
                    return Some(ZoneTransition::Started {
                        zone: self.current_zone,
                    });
                }
                None
            }
        }
    }

    /// Resolve an open checkpoint; ignored outside the checkpoint phase
    pub fn choose(&mut self, choice: CheckpointChoice) -> Option<ZoneTransition> {
        if self.phase != ZonePhase::Checkpoint {
            return None;
        }
        self.current_zone += 1;
        self.zone_timer = 0.0;
        self.intro_timer = 0.0;
        self.stats = ZoneStats::default();
        self.phase = ZonePhase::Intro;
        Some(ZoneTransition::IntroStarted {
            zone: self.current_zone,
            choice,
        })
    }

    pub fn record_kill(&mut self, echoes: f64) {
        self.stats.kills += 1;
        self.stats.echoes_earned += echoes;
    }

    pub fn current_zone(&self) -> u32 {
        self.current_zone
    }

    pub fn zone_timer(&self) -> f64 {
        self.zone_timer
    }

    pub fn phase(&self) -> ZonePhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == ZonePhase::Playing
    }

    pub fn time_remaining(&self) -> f64 {
        (self.zone_duration - self.zone_timer).max(0.0)
    }

    /// Fraction of the zone elapsed, `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.zone_duration <= 0.0 {
            return 0.0;
        }
        (self.zone_timer / self.zone_duration).min(1.0)
    }

    pub fn stats(&self) -> ZoneStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign() -> ZoneProgress {
        ZoneProgress::new(90.0, 3.0, CheckpointPolicy::Choice)
    }

    #[test]
    fn test_full_cycle() {
        let mut zone = campaign();
        assert_eq!(zone.update(89.0), None);
        zone.record_kill(3.0);

        let completed = zone.update(1.0);
        assert!(matches!(
            completed,
            Some(ZoneTransition::Completed { zone: 1, stats }) if stats.kills == 1 && stats.time == 90
        ));
        assert_eq!(zone.phase(), ZonePhase::Checkpoint);

        // Waits for a decision
        assert_eq!(zone.update(100.0), None);
        assert_eq!(zone.current_zone(), 1);

        let intro = zone.choose(CheckpointChoice::Carry);
        assert_eq!(
            intro,
            Some(ZoneTransition::IntroStarted {
                zone: 2,
                choice: CheckpointChoice::Carry
            })
        );
        assert_eq!(zone.zone_timer(), 0.0);
        assert_eq!(zone.phase(), ZonePhase::Intro);
        assert_eq!(zone.stats(), ZoneStats::default());

        assert_eq!(zone.update(2.0), None);
        assert_eq!(zone.update(1.0), Some(ZoneTransition::Started { zone: 2 }));
        assert!(zone.is_playing());
        assert_eq!(zone.current_zone(), 2);
    }

    #[test]
    fn test_timer_at_duration_completes_next_update() {
        let mut zone = ZoneProgress::new(10.0, 1.0, CheckpointPolicy::Choice);
        zone.zone_timer = 10.0;
        assert!(zone.is_playing());
        assert!(matches!(zone.update(0.0), Some(ZoneTransition::Completed { .. })));
    }

    #[test]
    fn test_choice_outside_checkpoint_is_ignored() {
        let mut zone = campaign();
        assert_eq!(zone.choose(CheckpointChoice::Bank), None);
        assert_eq!(zone.current_zone(), 1);
    }

    #[test]
    fn test_auto_checkpoint_banks() {
        let mut zone = ZoneProgress::new(30.0, 1.0, CheckpointPolicy::Auto { duration: 1.5 });
        zone.update(30.0);
        assert_eq!(zone.phase(), ZonePhase::Checkpoint);
        assert_eq!(zone.update(1.0), None);
        assert_eq!(
            zone.update(0.5),
            Some(ZoneTransition::IntroStarted {
                zone: 2,
                choice: CheckpointChoice::Bank
            })
        );
    }

    #[test]
    fn test_timer_only_resets_on_intro() {
        let mut zone = campaign();
        zone.update(95.0);
        assert_eq!(zone.zone_timer(), 95.0);
        zone.update(1.0);
        assert_eq!(zone.zone_timer(), 95.0);
        zone.choose(CheckpointChoice::Bank);
        assert_eq!(zone.zone_timer(), 0.0);
    }
}

//! Echo ledger: carried (at risk) versus banked (safe) currency

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Fraction of carried echoes lost on death
    pub death_penalty: f64,
    /// Multiplier granted for carrying into the next zone
    pub carry_bonus: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            death_penalty: 0.6,
            carry_bonus: 1.3,
        }
    }
}

/// Outcome of a death penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub lost: u64,
    pub salvaged: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoLedger {
    config: EconomyConfig,
    banked: u64,
    carried: f64,
    multiplier: f64,
    /// Permanent gain bonus from echo boost upgrades
    gain_bonus: f64,
}

impl EchoLedger {
    pub fn new(config: EconomyConfig, banked: u64) -> Self {
        Self {
            config,
            banked,
            carried: 0.0,
            multiplier: 1.0,
            gain_bonus: 1.0,
        }
    }

    /// Start of run: drop anything carried, keep the bank
    pub fn reset_run(&mut self) {
        self.carried = 0.0;
        self.multiplier = 1.0;
        self.gain_bonus = 1.0;
    }

    /// Credit earnings to the carried pool; returns the amount actually added
    pub fn add(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 || !amount.is_finite() {
            return 0.0;
        }
        let credited = amount * self.multiplier * self.gain_bonus;
        self.carried += credited;
        credited
    }

    /// Move the whole carried amount into the bank; returns the new bank total
    pub fn bank(&mut self) -> u64 {
        self.banked += self.carried.floor() as u64;
        self.carried = 0.0;
        self.multiplier = 1.0;
        self.banked
    }

    /// Keep echoes at risk for a better multiplier next zone.
    ///
    /// Does not compound: carrying twice still yields the configured bonus.
    pub fn carry(&mut self) {
        self.multiplier = self.config.carry_bonus;
    }

    /// Settle a death: salvage part of the carried pool, lose the rest.
    ///
    /// Whole echoes only; fractions are forfeit. `carried` is zero afterwards.
    pub fn apply_death_penalty(&mut self) -> Settlement {
        let whole = self.carried.floor().max(0.0) as u64;
        // Nudge so 80 * 0.6 lands on 48, not 47.999...
        let lost = ((self.carried * self.config.death_penalty + 1e-9).floor() as u64).min(whole);
        let salvaged = whole - lost;

        self.banked += salvaged;
        self.carried = 0.0;
        self.multiplier = 1.0;

        Settlement { lost, salvaged }
    }

    /// Deduct from the bank; refuses (returns false) rather than going negative
    pub fn spend(&mut self, amount: u64) -> bool {
        if amount > self.banked {
            return false;
        }
        self.banked -= amount;
        true
    }

    /// Apply one echo boost stack
    pub fn boost_gain(&mut self, bonus: f64) {
        self.gain_bonus += bonus;
    }

    pub fn banked(&self) -> u64 {
        self.banked
    }

    pub fn carried(&self) -> f64 {
        self.carried
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Banked plus whole carried echoes
    pub fn total(&self) -> u64 {
        self.banked + self.carried.floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ledger(banked: u64) -> EchoLedger {
        EchoLedger::new(EconomyConfig::default(), banked)
    }

    #[test]
    fn test_bank_moves_carried() {
        let mut ledger = ledger(100);
        ledger.add(50.0);
        assert_eq!(ledger.bank(), 150);
        assert_eq!(ledger.carried(), 0.0);
        assert_eq!(ledger.multiplier(), 1.0);
    }

    #[test]
    fn test_death_penalty_split() {
        let mut ledger = ledger(0);
        ledger.add(80.0);
        let settlement = ledger.apply_death_penalty();
        assert_eq!(settlement, Settlement { lost: 48, salvaged: 32 });
        assert_eq!(ledger.banked(), 32);
        assert_eq!(ledger.carried(), 0.0);
    }

    #[test]
    fn test_death_penalty_on_empty_is_harmless() {
        let mut ledger = ledger(10);
        let settlement = ledger.apply_death_penalty();
        assert_eq!(settlement, Settlement { lost: 0, salvaged: 0 });
        assert_eq!(ledger.banked(), 10);
    }

    #[test]
    fn test_carry_raises_multiplier_without_compounding() {
        let mut ledger = ledger(0);
        ledger.carry();
        ledger.carry();
        assert_eq!(ledger.multiplier(), 1.3);
        assert!((ledger.add(10.0) - 13.0).abs() < 1e-9);

        ledger.bank();
        assert_eq!(ledger.multiplier(), 1.0);
        assert_eq!(ledger.banked(), 13);
    }

    #[test]
    fn test_gain_bonus_stacks() {
        let mut ledger = ledger(0);
        ledger.boost_gain(0.2);
        ledger.boost_gain(0.2);
        assert!((ledger.add(10.0) - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_spend_never_goes_negative() {
        let mut ledger = ledger(20);
        assert!(!ledger.spend(21));
        assert!(ledger.spend(20));
        assert_eq!(ledger.banked(), 0);
    }

    #[test]
    fn test_reset_run_keeps_bank() {
        let mut ledger = ledger(5);
        ledger.carry();
        ledger.add(3.0);
        ledger.reset_run();
        assert_eq!(ledger.carried(), 0.0);
        assert_eq!(ledger.multiplier(), 1.0);
        assert_eq!(ledger.banked(), 5);
    }

    proptest! {
        #[test]
        fn prop_death_never_creates_echoes(
            start in 0u64..10_000,
            earnings in proptest::collection::vec(0.0f64..50.0, 0..50),
        ) {
            let mut ledger = ledger(start);
            for amount in earnings {
                ledger.add(amount);
            }
            let whole = ledger.carried().floor() as u64;
            let settlement = ledger.apply_death_penalty();

            prop_assert_eq!(settlement.lost + settlement.salvaged, whole);
            prop_assert_eq!(ledger.banked(), start + settlement.salvaged);
            prop_assert_eq!(ledger.carried(), 0.0);
        }
    }
}

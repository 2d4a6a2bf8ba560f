//! Chain rules configuration.
//!
//! Deserialized once at node startup and turned into the runtime rule
//! objects through the fallible `build` methods. Invalid parameters fail
//! fast here so the node never starts with an inconsistent rule set.

use crate::energy::{
    ClampedDecayStrategy, DecayStrategy, EnergyLimitStrategy, MonotonicStrategy, TargetedStrategy,
};
use crate::error::{ConsensusError, Result};
use crate::fork::ForkSchedule;
use serde::{Deserialize, Serialize};

/// Default energy floor for new chains.
pub const DEFAULT_ENERGY_LOWER_BOUND: u64 = 1_050_000;

/// Default per-block rate-of-change divisor.
pub const DEFAULT_ENERGY_DIVISOR_LIMIT: u64 = 1024;

fn default_energy_lower_bound() -> u64 {
    DEFAULT_ENERGY_LOWER_BOUND
}

fn default_energy_divisor_limit() -> u64 {
    DEFAULT_ENERGY_DIVISOR_LIMIT
}

/// Which energy-limit rule the chain runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnergyStrategyKind {
    /// Demand-driven growth only.
    #[default]
    Monotonic,
    /// Demand-tracking in both directions.
    Decay,
    /// Decay held inside a clamp corridor.
    ClampedDecay,
    /// Convergence on a fixed target.
    Targeted,
}

/// Energy-limit rule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Floor below which no block is valid.
    #[serde(default = "default_energy_lower_bound")]
    pub energy_lower_bound: u64,
    /// Controls the maximum per-block rate of change; must be > 0.
    #[serde(default = "default_energy_divisor_limit")]
    pub energy_divisor_limit: u64,
    /// Selected rule.
    #[serde(default)]
    pub strategy: EnergyStrategyKind,
    /// Corridor floor, required by `clamped-decay`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clamp_lower_bound: Option<u64>,
    /// Corridor ceiling, required by `clamped-decay`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clamp_upper_bound: Option<u64>,
    /// Fixed target, required by `targeted`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u64>,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            energy_lower_bound: DEFAULT_ENERGY_LOWER_BOUND,
            energy_divisor_limit: DEFAULT_ENERGY_DIVISOR_LIMIT,
            strategy: EnergyStrategyKind::default(),
            clamp_lower_bound: None,
            clamp_upper_bound: None,
            target: None,
        }
    }
}

impl EnergyConfig {
    /// Build the configured strategy, validating all parameters.
    pub fn build(&self) -> Result<Box<dyn EnergyLimitStrategy>> {
        let lower = self.energy_lower_bound;
        let divisor = self.energy_divisor_limit;
        let strategy: Box<dyn EnergyLimitStrategy> = match self.strategy {
            EnergyStrategyKind::Monotonic => Box::new(MonotonicStrategy::new(lower, divisor)?),
            EnergyStrategyKind::Decay => Box::new(DecayStrategy::new(lower, divisor)?),
            EnergyStrategyKind::ClampedDecay => {
                let clamp_lower = self.clamp_lower_bound.ok_or(
                    ConsensusError::MissingStrategyParameter {
                        strategy: "clamped-decay",
                        parameter: "clamp_lower_bound",
                    },
                )?;
                let clamp_upper = self.clamp_upper_bound.ok_or(
                    ConsensusError::MissingStrategyParameter {
                        strategy: "clamped-decay",
                        parameter: "clamp_upper_bound",
                    },
                )?;
                Box::new(ClampedDecayStrategy::new(
                    lower,
                    divisor,
                    clamp_lower,
                    clamp_upper,
                )?)
            }
            EnergyStrategyKind::Targeted => {
                let target =
                    self.target
                        .ok_or(ConsensusError::MissingStrategyParameter {
                            strategy: "targeted",
                            parameter: "target",
                        })?;
                Box::new(TargetedStrategy::new(lower, divisor, target)?)
            }
        };
        Ok(strategy)
    }
}

/// Fork activation heights; absent means the fork never activates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkConfig {
    /// Unity fork activation height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unity_fork_height: Option<u64>,
    /// 0.4.0 fork activation height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_040_height: Option<u64>,
    /// Nonce fork activation height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce_fork_height: Option<u64>,
    /// Signature-swap fork activation height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_swap_fork_height: Option<u64>,
}

impl ForkConfig {
    /// Build the fork schedule, validating every configured height.
    pub fn build(&self) -> Result<ForkSchedule> {
        let mut schedule = ForkSchedule::new();
        if let Some(height) = self.unity_fork_height {
            schedule.enable_unity_fork(height)?;
        }
        if let Some(height) = self.fork_040_height {
            schedule.enable_040_fork(height)?;
        }
        if let Some(height) = self.nonce_fork_height {
            schedule.enable_nonce_fork(height)?;
        }
        if let Some(height) = self.signature_swap_fork_height {
            schedule.enable_signature_swap_fork(height)?;
        }
        Ok(schedule)
    }
}

/// The full height-driven rule configuration for a chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainRulesConfig {
    /// Fork activation heights.
    #[serde(default)]
    pub forks: ForkConfig,
    /// Energy-limit rule parameters.
    #[serde(default)]
    pub energy: EnergyConfig,
}

impl ChainRulesConfig {
    /// Build the runtime rule objects.
    pub fn build(&self) -> Result<ChainRules> {
        Ok(ChainRules {
            fork_schedule: self.forks.build()?,
            energy_strategy: self.energy.build()?,
        })
    }
}

/// Runtime rule objects handed to the header validator.
pub struct ChainRules {
    /// Fork activation schedule.
    pub fork_schedule: ForkSchedule,
    /// Selected energy-limit rule.
    pub energy_strategy: Box<dyn EnergyLimitStrategy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds() {
        let rules = ChainRulesConfig::default().build().expect("valid defaults");
        assert!(!rules.fork_schedule.is_unity_fork_active(1_000_000));
        assert_eq!(
            rules.energy_strategy.energy_lower_bound(),
            DEFAULT_ENERGY_LOWER_BOUND
        );
    }

    #[test]
    fn test_fork_heights_applied() {
        let config = ForkConfig {
            unity_fork_height: Some(100),
            fork_040_height: Some(0),
            nonce_fork_height: None,
            signature_swap_fork_height: Some(200),
        };
        let schedule = config.build().expect("valid heights");
        assert!(schedule.is_unity_fork_active(101));
        assert!(schedule.is_040_fork_active(0));
        assert!(!schedule.is_nonce_fork_active(u64::MAX));
        assert!(schedule.is_signature_swap_fork_active(200));
    }

    #[test]
    fn test_invalid_fork_height_fails_build() {
        let config = ForkConfig {
            unity_fork_height: Some(1),
            ..ForkConfig::default()
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn test_clamped_decay_requires_bounds() {
        let config = EnergyConfig {
            strategy: EnergyStrategyKind::ClampedDecay,
            ..EnergyConfig::default()
        };
        assert_eq!(
            config.build().err(),
            Some(ConsensusError::MissingStrategyParameter {
                strategy: "clamped-decay",
                parameter: "clamp_lower_bound",
            })
        );
    }

    #[test]
    fn test_targeted_requires_target() {
        let config = EnergyConfig {
            strategy: EnergyStrategyKind::Targeted,
            ..EnergyConfig::default()
        };
        assert!(config.build().is_err());

        let config = EnergyConfig {
            strategy: EnergyStrategyKind::Targeted,
            target: Some(15_000_000),
            ..EnergyConfig::default()
        };
        assert!(config.build().is_ok());
    }

    #[test]
    fn test_zero_divisor_fails_build() {
        let config = EnergyConfig {
            energy_divisor_limit: 0,
            ..EnergyConfig::default()
        };
        assert_eq!(config.build().err(), Some(ConsensusError::ZeroEnergyDivisor));
    }

    #[test]
    fn test_strategy_kind_serde_names() {
        let json = serde_json::to_string(&EnergyStrategyKind::ClampedDecay).expect("serialize");
        assert_eq!(json, "\"clamped-decay\"");
    }
}

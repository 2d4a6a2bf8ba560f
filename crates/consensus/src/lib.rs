//! Consensus rule selection for the emberchain hybrid PoW/PoS chain.
//!
//! This crate hosts the deterministic, height-driven pieces of consensus:
//! the fork activation schedule and the per-block energy-limit rules. Both
//! are pure functions of configuration and the parent header, and must
//! produce byte-identical decisions on every node.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod energy;
pub mod error;
pub mod fork;

pub use config::{ChainRules, ChainRulesConfig, EnergyConfig, EnergyStrategyKind, ForkConfig};
pub use energy::{
    ClampedDecayStrategy, DecayStrategy, EnergyLimitStrategy, MonotonicStrategy, TargetedStrategy,
};
pub use error::{ConsensusError, Result};
pub use fork::ForkSchedule;

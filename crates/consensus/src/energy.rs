//! Per-block energy-limit derivation strategies.
//!
//! The energy limit is the per-block cap on total transaction cost. Each
//! strategy derives the next block's limit purely from the parent header
//! and static configuration, so every node computes the same value. The
//! base contract clamps every candidate to the configured floor.
//!
//! All intermediate arithmetic truncates toward zero; consensus depends on
//! this, so the signed steps go through `i128` rather than floating point.

use crate::error::{ConsensusError, Result};
use ember_types::BlockHeader;

/// Common contract for the interchangeable energy-limit rules.
///
/// Implementations are stateless and safe to call from any thread; the
/// selected rule is built once per chain configuration (see
/// [`crate::config::EnergyConfig`]).
pub trait EnergyLimitStrategy: Send + Sync {
    /// Candidate limit for the child of `parent`, before the floor clamp.
    fn energy_limit_internal(&self, parent: &BlockHeader) -> u64;

    /// Floor below which no block is valid.
    fn energy_lower_bound(&self) -> u64;

    /// Energy limit for the child of `parent`, guaranteed to be at least
    /// the lower bound.
    fn energy_limit(&self, parent: &BlockHeader) -> u64 {
        self.energy_limit_internal(parent)
            .max(self.energy_lower_bound())
    }
}

fn check_divisor(divisor: u64) -> Result<()> {
    if divisor == 0 {
        return Err(ConsensusError::ZeroEnergyDivisor);
    }
    Ok(())
}

/// Raise the limit when demand is high, never lower it.
///
/// If the parent consumed more than 80% of its limit, the limit grows by
/// `limit / divisor`; otherwise it stays unchanged.
#[derive(Debug, Clone)]
pub struct MonotonicStrategy {
    energy_lower_bound: u64,
    energy_divisor_limit: u64,
}

impl MonotonicStrategy {
    /// Create the strategy; `divisor` must be strictly positive.
    pub fn new(energy_lower_bound: u64, energy_divisor_limit: u64) -> Result<Self> {
        check_divisor(energy_divisor_limit)?;
        Ok(Self {
            energy_lower_bound,
            energy_divisor_limit,
        })
    }
}

impl EnergyLimitStrategy for MonotonicStrategy {
    fn energy_limit_internal(&self, parent: &BlockHeader) -> u64 {
        // used > limit * 4/5, compared without intermediate rounding
        let demand_high = (parent.energy_used as u128) * 5 > (parent.energy_limit as u128) * 4;
        if demand_high {
            parent.energy_limit + parent.energy_limit / self.energy_divisor_limit
        } else {
            parent.energy_limit
        }
    }

    fn energy_lower_bound(&self) -> u64 {
        self.energy_lower_bound
    }
}

/// Track demand in both directions.
///
/// The limit moves by `(used * 4/3 - limit) / divisor` per block: upward
/// moves are bounded to a third of the distance-based delta, downward moves
/// follow the full delta.
#[derive(Debug, Clone)]
pub struct DecayStrategy {
    energy_lower_bound: u64,
    energy_divisor_limit: u64,
}

impl DecayStrategy {
    /// Create the strategy; `divisor` must be strictly positive.
    pub fn new(energy_lower_bound: u64, energy_divisor_limit: u64) -> Result<Self> {
        check_divisor(energy_divisor_limit)?;
        Ok(Self {
            energy_lower_bound,
            energy_divisor_limit,
        })
    }

    fn divisor(&self) -> u64 {
        self.energy_divisor_limit
    }
}

impl EnergyLimitStrategy for DecayStrategy {
    fn energy_limit_internal(&self, parent: &BlockHeader) -> u64 {
        let limit = parent.energy_limit as i128;
        let gu = parent.energy_used as i128 * 4 / 3;
        let delta = (gu - limit) / self.energy_divisor_limit as i128;
        (limit + delta).max(0) as u64
    }

    fn energy_lower_bound(&self) -> u64 {
        self.energy_lower_bound
    }
}

/// Decay behavior held inside a corridor.
///
/// Below the corridor the limit is forced up by `limit / divisor`, above it
/// forced down by the same step; inside, the decay rule applies.
#[derive(Debug, Clone)]
pub struct ClampedDecayStrategy {
    decay: DecayStrategy,
    clamp_lower_bound: u64,
    clamp_upper_bound: u64,
}

impl ClampedDecayStrategy {
    /// Create the strategy; requires `divisor > 0` and
    /// `clamp_upper_bound >= clamp_lower_bound`.
    pub fn new(
        energy_lower_bound: u64,
        energy_divisor_limit: u64,
        clamp_lower_bound: u64,
        clamp_upper_bound: u64,
    ) -> Result<Self> {
        if clamp_upper_bound < clamp_lower_bound {
            return Err(ConsensusError::InvertedClampBounds {
                lower: clamp_lower_bound,
                upper: clamp_upper_bound,
            });
        }
        Ok(Self {
            decay: DecayStrategy::new(energy_lower_bound, energy_divisor_limit)?,
            clamp_lower_bound,
            clamp_upper_bound,
        })
    }
}

impl EnergyLimitStrategy for ClampedDecayStrategy {
    fn energy_limit_internal(&self, parent: &BlockHeader) -> u64 {
        let limit = parent.energy_limit;
        if limit < self.clamp_lower_bound {
            limit + limit / self.decay.divisor()
        } else if limit > self.clamp_upper_bound {
            limit - limit / self.decay.divisor()
        } else {
            self.decay.energy_limit_internal(parent)
        }
    }

    fn energy_lower_bound(&self) -> u64 {
        self.decay.energy_lower_bound()
    }
}

/// Converge on a fixed target.
///
/// The limit moves toward `target` by at most `limit / divisor` per block
/// and stops exactly on it.
#[derive(Debug, Clone)]
pub struct TargetedStrategy {
    energy_lower_bound: u64,
    energy_divisor_limit: u64,
    target: u64,
}

impl TargetedStrategy {
    /// Create the strategy; `divisor` must be strictly positive.
    pub fn new(energy_lower_bound: u64, energy_divisor_limit: u64, target: u64) -> Result<Self> {
        check_divisor(energy_divisor_limit)?;
        Ok(Self {
            energy_lower_bound,
            energy_divisor_limit,
            target,
        })
    }
}

impl EnergyLimitStrategy for TargetedStrategy {
    fn energy_limit_internal(&self, parent: &BlockHeader) -> u64 {
        let limit = parent.energy_limit;
        let step = limit / self.energy_divisor_limit;
        match limit.cmp(&self.target) {
            std::cmp::Ordering::Less => limit.saturating_add(step).min(self.target),
            std::cmp::Ordering::Greater => limit.saturating_sub(step).max(self.target),
            std::cmp::Ordering::Equal => limit,
        }
    }

    fn energy_lower_bound(&self) -> u64 {
        self.energy_lower_bound
    }
}

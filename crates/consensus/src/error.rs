//! Consensus configuration error types

use thiserror::Error;

/// Result type alias for consensus configuration.
pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Errors raised while building the chain rule objects.
///
/// All of these are configuration errors: they are fatal at startup and
/// must prevent the node from coming up with an inconsistent rule set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsensusError {
    /// A fork activation height is below the fork's minimum.
    #[error("{fork} fork activation height {requested} is below minimum {minimum}")]
    ForkActivationBelowMinimum {
        /// Human name of the fork.
        fork: &'static str,
        /// Lowest height at which the fork may activate.
        minimum: u64,
        /// Height that was requested.
        requested: u64,
    },

    /// The energy divisor must be strictly positive.
    #[error("energy divisor limit must be > 0")]
    ZeroEnergyDivisor,

    /// Clamp bounds are inverted.
    #[error("energy clamp bounds inverted: lower {lower} > upper {upper}")]
    InvertedClampBounds {
        /// Configured lower clamp bound.
        lower: u64,
        /// Configured upper clamp bound.
        upper: u64,
    },

    /// The selected strategy needs a parameter that was not supplied.
    #[error("energy strategy {strategy} requires parameter {parameter}")]
    MissingStrategyParameter {
        /// Strategy that was selected.
        strategy: &'static str,
        /// Parameter that is missing from the configuration.
        parameter: &'static str,
    },
}

//! Height-driven fork activation schedule.
//!
//! Every node must answer "which rules apply at height N" identically, so
//! the schedule is configured once at startup and treated as immutable
//! afterwards (share it behind an `Arc`). The enable/disable mutators exist
//! for startup wiring and for tests.

use crate::error::{ConsensusError, Result};

/// Activation height meaning "never activates".
pub const NEVER: u64 = u64::MAX;

/// Minimum activation height for forks whose activation block is still
/// validated under the pre-fork rules.
const MIN_TRANSITION_HEIGHT: u64 = 2;

/// One fork's switch: whether it is scheduled and at which height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ForkPoint {
    enabled: bool,
    activation: u64,
}

impl ForkPoint {
    const DISABLED: Self = Self {
        enabled: false,
        activation: NEVER,
    };

    fn enable(&mut self, height: u64, minimum: u64, fork: &'static str) -> Result<()> {
        if height < minimum {
            return Err(ConsensusError::ForkActivationBelowMinimum {
                fork,
                minimum,
                requested: height,
            });
        }
        self.enabled = true;
        self.activation = height;
        Ok(())
    }

    fn disable(&mut self) {
        *self = Self::DISABLED;
    }

    /// New rules apply strictly after the activation block; the activation
    /// block itself is still validated under the old rules.
    fn active_after(&self, number: u64) -> bool {
        self.enabled && number > self.activation
    }

    /// New rules apply at the activation block and onwards.
    fn active_from(&self, number: u64) -> bool {
        self.enabled && number >= self.activation
    }

    fn is_activation_block(&self, number: u64) -> bool {
        self.enabled && number == self.activation
    }
}

/// The chain's fork activation schedule.
///
/// Answers, for any block height, whether each fork's rules apply. All
/// queries are pure reads; repeated `enable_*` calls follow last-write-wins
/// semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkSchedule {
    unity: ForkPoint,
    fork_040: ForkPoint,
    nonce: ForkPoint,
    signature_swap: ForkPoint,
}

impl Default for ForkSchedule {
    fn default() -> Self {
        Self::new()
    }
}

impl ForkSchedule {
    /// Create a schedule with every fork disabled.
    pub fn new() -> Self {
        Self {
            unity: ForkPoint::DISABLED,
            fork_040: ForkPoint::DISABLED,
            nonce: ForkPoint::DISABLED,
            signature_swap: ForkPoint::DISABLED,
        }
    }

    // === Unity fork (PoW/PoS hybrid activation) ===

    /// Schedule the Unity fork at `height` (must be >= 2).
    ///
    /// Calling again replaces the previous height (last write wins).
    pub fn enable_unity_fork(&mut self, height: u64) -> Result<()> {
        self.unity.enable(height, MIN_TRANSITION_HEIGHT, "unity")
    }

    /// Unschedule the Unity fork (test support).
    pub fn disable_unity_fork(&mut self) {
        self.unity.disable();
    }

    /// Unity rules apply strictly after the activation block, which is
    /// itself still mined under the PoW-only rules.
    pub fn is_unity_fork_active(&self, number: u64) -> bool {
        self.unity.active_after(number)
    }

    /// Check whether `number` is exactly the Unity activation block.
    pub fn is_unity_fork_block(&self, number: u64) -> bool {
        self.unity.is_activation_block(number)
    }

    // === 0.4.0 fork ===

    /// Schedule the 0.4.0 fork at `height` (any height, including genesis).
    ///
    /// Calling again replaces the previous height (last write wins).
    pub fn enable_040_fork(&mut self, height: u64) -> Result<()> {
        self.fork_040.enable(height, 0, "0.4.0")
    }

    /// Unschedule the 0.4.0 fork (test support).
    pub fn disable_040_fork(&mut self) {
        self.fork_040.disable();
    }

    /// 0.4.0 rules take effect starting at the activation block itself.
    pub fn is_040_fork_active(&self, number: u64) -> bool {
        self.fork_040.active_from(number)
    }

    // === Nonce fork ===

    /// Schedule the nonce fork at `height` (must be >= 2).
    ///
    /// Calling again replaces the previous height (last write wins).
    pub fn enable_nonce_fork(&mut self, height: u64) -> Result<()> {
        self.nonce.enable(height, MIN_TRANSITION_HEIGHT, "nonce")
    }

    /// Unschedule the nonce fork (test support).
    pub fn disable_nonce_fork(&mut self) {
        self.nonce.disable();
    }

    /// Nonce rules apply strictly after the activation block, same
    /// rationale as Unity.
    pub fn is_nonce_fork_active(&self, number: u64) -> bool {
        self.nonce.active_after(number)
    }

    /// Check whether `number` is exactly the nonce-fork activation block.
    pub fn is_nonce_fork_block(&self, number: u64) -> bool {
        self.nonce.is_activation_block(number)
    }

    // === Signature-swap fork ===

    /// Schedule the signature-swap fork at `height` (must be >= 2).
    ///
    /// Calling again replaces the previous height (last write wins).
    pub fn enable_signature_swap_fork(&mut self, height: u64) -> Result<()> {
        self.signature_swap
            .enable(height, MIN_TRANSITION_HEIGHT, "signature-swap")
    }

    /// Unschedule the signature-swap fork (test support).
    pub fn disable_signature_swap_fork(&mut self) {
        self.signature_swap.disable();
    }

    /// Signature-swap rules take effect starting at the activation block
    /// itself.
    pub fn is_signature_swap_fork_active(&self, number: u64) -> bool {
        self.signature_swap.active_from(number)
    }

    /// Check whether `number` is exactly the signature-swap activation
    /// block.
    pub fn is_signature_swap_fork_block(&self, number: u64) -> bool {
        self.signature_swap.is_activation_block(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_forks_never_active() {
        let schedule = ForkSchedule::new();
        for number in [0, 1, 2, 1_000_000, NEVER] {
            assert!(!schedule.is_unity_fork_active(number));
            assert!(!schedule.is_040_fork_active(number));
            assert!(!schedule.is_nonce_fork_active(number));
            assert!(!schedule.is_signature_swap_fork_active(number));
            assert!(!schedule.is_unity_fork_block(number));
        }
    }

    #[test]
    fn test_unity_activation_is_exclusive() {
        let mut schedule = ForkSchedule::new();
        schedule.enable_unity_fork(100).expect("valid height");

        assert!(!schedule.is_unity_fork_active(99));
        // The activation block itself still follows the old rules.
        assert!(!schedule.is_unity_fork_active(100));
        assert!(schedule.is_unity_fork_active(101));

        assert!(!schedule.is_unity_fork_block(99));
        assert!(schedule.is_unity_fork_block(100));
        assert!(!schedule.is_unity_fork_block(101));
    }

    #[test]
    fn test_040_activation_is_inclusive() {
        let mut schedule = ForkSchedule::new();
        schedule.enable_040_fork(50).expect("valid height");

        assert!(!schedule.is_040_fork_active(49));
        assert!(schedule.is_040_fork_active(50));
        assert!(schedule.is_040_fork_active(51));
    }

    #[test]
    fn test_signature_swap_inclusive_active_with_transition_block() {
        let mut schedule = ForkSchedule::new();
        schedule.enable_signature_swap_fork(7).expect("valid height");

        assert!(!schedule.is_signature_swap_fork_active(6));
        assert!(schedule.is_signature_swap_fork_active(7));
        assert!(schedule.is_signature_swap_fork_block(7));
        assert!(!schedule.is_signature_swap_fork_block(8));
    }

    #[test]
    fn test_nonce_fork_matches_unity_semantics() {
        let mut schedule = ForkSchedule::new();
        schedule.enable_nonce_fork(2).expect("minimum height");

        assert!(!schedule.is_nonce_fork_active(2));
        assert!(schedule.is_nonce_fork_active(3));
        assert!(schedule.is_nonce_fork_block(2));
    }

    #[test]
    fn test_activation_below_minimum_rejected() {
        let mut schedule = ForkSchedule::new();

        for height in [0, 1] {
            assert!(schedule.enable_unity_fork(height).is_err());
            assert!(schedule.enable_nonce_fork(height).is_err());
            assert!(schedule.enable_signature_swap_fork(height).is_err());
        }
        // 0.4.0 may activate at genesis.
        assert!(schedule.enable_040_fork(0).is_ok());

        assert_eq!(
            schedule.enable_unity_fork(1),
            Err(ConsensusError::ForkActivationBelowMinimum {
                fork: "unity",
                minimum: 2,
                requested: 1,
            })
        );
    }

    #[test]
    fn test_activation_monotonic_once_enabled() {
        let mut schedule = ForkSchedule::new();
        schedule.enable_unity_fork(1000).expect("valid height");
        schedule.enable_040_fork(1000).expect("valid height");

        let mut unity_seen_active = false;
        let mut v040_seen_active = false;
        for number in 0..2000 {
            let unity = schedule.is_unity_fork_active(number);
            let v040 = schedule.is_040_fork_active(number);
            // Once active, never flips back.
            assert!(!(unity_seen_active && !unity));
            assert!(!(v040_seen_active && !v040));
            unity_seen_active |= unity;
            v040_seen_active |= v040;
        }
        assert!(unity_seen_active);
        assert!(v040_seen_active);
    }

    #[test]
    fn test_repeated_enable_last_write_wins() {
        let mut schedule = ForkSchedule::new();
        schedule.enable_unity_fork(100).expect("valid height");
        schedule.enable_unity_fork(200).expect("valid height");

        assert!(!schedule.is_unity_fork_block(100));
        assert!(schedule.is_unity_fork_block(200));
        assert!(!schedule.is_unity_fork_active(150));
        assert!(schedule.is_unity_fork_active(201));
    }

    #[test]
    fn test_disable_resets() {
        let mut schedule = ForkSchedule::new();
        schedule.enable_unity_fork(100).expect("valid height");
        schedule.disable_unity_fork();

        assert!(!schedule.is_unity_fork_active(101));
        assert!(!schedule.is_unity_fork_block(100));
        assert_eq!(schedule, ForkSchedule::new());
    }
}

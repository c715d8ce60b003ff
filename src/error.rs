//! Error types for profile construction.
//!
//! All precondition violations are rejected when a profile is built;
//! once a profile exists, every computation on it is infallible.

use thiserror::Error;

/// Errors raised while constructing a unit, hero, or weapon profile.
///
/// # Examples
///
/// ```rust
/// use wardice::{ProfileError, UnitProfile};
///
/// let err = UnitProfile::new("Militia", 1, 4, 1, 0, 10).unwrap_err();
/// assert_eq!(err, ProfileError::QualityTooLow(1));
/// ```
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    /// A profile name was empty or whitespace-only.
    #[error("profile name cannot be empty")]
    EmptyName,

    /// Quality below 2 would make a natural 1 succeed; a 1 always fails.
    #[error("quality must be at least 2 so a natural 1 can fail, got {0}")]
    QualityTooLow(i32),

    /// Defense below 2 would make a natural 1 save; a 1 always fails.
    #[error("defense must be at least 2 so a natural 1 can fail, got {0}")]
    DefenseTooLow(i32),

    /// Toughness is the wounds needed to remove one model and must be positive.
    #[error("toughness must be positive, got {0}")]
    NonPositiveToughness(i32),

    /// Fear only ever adds to resolution scores.
    #[error("fear cannot be negative, got {0}")]
    NegativeFear(i32),

    /// A unit may be empty (zero models) but never negative.
    #[error("model count cannot be negative, got {0}")]
    NegativeModelCount(i32),

    /// A weapon may contribute zero attacks but never a negative number.
    #[error("attacks per model cannot be negative, got {0}")]
    NegativeAttacks(i32),

    /// Doubling a single-model unit is not a legal formation.
    #[error("cannot combine a single-model unit")]
    CombinedSingleModel,
}

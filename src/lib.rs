//! Exact outcome probabilities for one round of tabletop wargame combat.
//!
//! `wardice` computes the full probability distribution of a round of
//! combat between two units in closed form. Nothing is sampled: dice are
//! convolved as exact discrete distributions, special rules reshape those
//! distributions at fixed pipeline stages, and the final report carries
//! exact win, tie, and wipe probabilities alongside the joint outcome
//! distribution they summarize.
//!
//! # Structure
//!
//! - [`Distribution`] is the probability algebra everything is built on.
//! - [`hit_roll_distribution`] turns batches of d6 hit rolls into
//!   [`HitState`] aggregates.
//! - [`UnitProfile`], [`HeroProfile`], and [`WeaponProfile`] describe the
//!   fighters; construction validates every stat.
//! - [`Rule`] and the [`special`] catalog implement the special rules as
//!   distribution transformers hooked into three pipeline stages.
//! - [`simulate`] orchestrates the round and produces a [`BattleReport`].
//!
//! # Example
//!
//! ```rust
//! use wardice::{rule, simulate, special, Mode, UnitProfile, WeaponProfile};
//!
//! let spears = WeaponProfile::new("Spears", 1)
//!     .unwrap()
//!     .with_rules([rule(special::Counter)]);
//! let swords = WeaponProfile::new("Swords", 2).unwrap();
//!
//! let phalanx = UnitProfile::new("Phalanx", 4, 4, 1, 0, 10)
//!     .unwrap()
//!     .with_weapons([spears]);
//! let raiders = UnitProfile::new("Raiders", 3, 5, 1, 1, 10)
//!     .unwrap()
//!     .with_weapons([swords]);
//!
//! let report = simulate(&raiders, &phalanx, Mode::Melee);
//! assert!(report.expected_wounds_to_b > 0.0);
//! ```

mod battle;
mod dice;
mod distribution;
mod error;
mod profile;
mod resolve;
mod rules;
pub mod special;

pub use battle::{simulate, BattleOutcome, BattleReport, Mode};
pub use dice::{binomial, hit_roll_distribution, unsaved_probability, HitState};
pub use distribution::{Distribution, MASS_EPSILON};
pub use error::ProfileError;
pub use profile::{HeroProfile, UnitProfile, WeaponProfile};
pub use resolve::{AttackDamage, DefenseState};
pub use rules::{
    rule, AfterDefenseContext, AfterHitContext, BeforeHitContext, DefenseModifiers, Hooks, Rule,
};

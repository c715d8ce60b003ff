//! The special-rule abstraction and the pipeline contexts it acts on.
//!
//! Every special rule implements [`Rule`] and declares, via [`Hooks`],
//! which pipeline stages it participates in and on which side. The
//! resolver inspects the flags once per engagement and only invokes a
//! rule at the stages it declared; a rule's stage method is never called
//! speculatively.
//!
//! Rules are shared as `Arc<dyn Rule>` so the same rule value can sit on
//! a weapon, a unit, and a hero aura simultaneously.

use std::sync::Arc;

use bitflags::bitflags;

use crate::dice::HitState;
use crate::distribution::Distribution;
use crate::profile::{UnitProfile, WeaponProfile};
use crate::resolve::DefenseState;

bitflags! {
    /// Pipeline stages a rule participates in.
    ///
    /// Offense flags fire when the rule's owner is attacking; defense
    /// flags fire when the owner is being attacked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Hooks: u8 {
        const BEFORE_HIT_OFFENSE = 1 << 0;
        const BEFORE_HIT_DEFENSE = 1 << 1;
        const AFTER_HIT_OFFENSE = 1 << 2;
        const AFTER_HIT_DEFENSE = 1 << 3;
        const AFTER_DEFENSE_OFFENSE = 1 << 4;
        const AFTER_DEFENSE_DEFENSE = 1 << 5;
    }
}

/// A special rule participating in the attack pipeline.
///
/// Implementors override only the stage methods matching their
/// [`hooks`](Rule::hooks); the defaults are no-ops so a single-stage rule
/// stays a few lines long.
pub trait Rule: Send + Sync {
    /// Display name used in debug output.
    fn name(&self) -> &str;

    /// Stages this rule participates in.
    fn hooks(&self) -> Hooks;

    /// True if the owning weapon lets its unit strike first when charged.
    fn grants_counter_strike(&self) -> bool {
        false
    }

    /// Adjust attack counts, quality, or armor penetration before dice roll.
    fn before_hit(&self, _ctx: &mut BeforeHitContext<'_>) {}

    /// Transform the hit distribution or accumulate defense modifiers.
    fn after_hit(&self, _ctx: &mut AfterHitContext<'_>) {}

    /// Transform the unsaved-wound distribution.
    fn after_defense(&self, _ctx: &mut AfterDefenseContext<'_>) {}
}

/// Wrap a rule value for attachment to profiles.
///
/// # Examples
///
/// ```rust
/// use wardice::{rule, special::Reliable};
///
/// let shared = rule(Reliable);
/// assert_eq!(shared.name(), "Reliable");
/// ```
pub fn rule(r: impl Rule + 'static) -> Arc<dyn Rule> {
    Arc::new(r)
}

/// Save-roll modifiers accumulated during the after-hit stage.
///
/// Applied uniformly to every save in the engagement, unlike
/// [`HitState::ap_bonus`] which tracks per-outcome penetration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefenseModifiers {
    /// Flat armor penetration added on top of the weapon's own.
    pub extra_armor_penetration: i32,
    /// Additional penetration applied only to hits from natural sixes.
    pub extra_armor_penetration_on_six: i32,
    /// Successful natural-six saves must be rolled once more.
    pub force_defense_six_reroll: bool,
    /// Healing rules are disabled for this engagement.
    pub suppress_regeneration: bool,
}

/// Mutable view of an attack before any dice are rolled.
pub struct BeforeHitContext<'a> {
    pub attacker: &'a UnitProfile,
    pub defender: &'a UnitProfile,
    pub weapon: &'a WeaponProfile,
    /// Models contributing attacks with this weapon.
    pub attacking_models: i32,
    /// The weapon's base attacks per model, before any rule adjustment.
    pub attacks_per_model: i32,
    pub charging: bool,
    /// Total dice to roll; starts at `attacking_models * attacks_per_model`.
    pub total_attacks: i32,
    /// Minimum face needed to hit; clamped to at least 2 after the stage.
    pub quality: i32,
    /// Armor penetration carried into the save rolls.
    pub armor_penetration: i32,
}

impl BeforeHitContext<'_> {
    pub fn is_ranged(&self) -> bool {
        self.weapon.is_ranged()
    }
}

/// Mutable view of the hit distribution between rolling and saving.
pub struct AfterHitContext<'a> {
    pub attacker: &'a UnitProfile,
    pub defender: &'a UnitProfile,
    pub weapon: &'a WeaponProfile,
    pub charging: bool,
    /// Dice rolled for this weapon, after before-hit adjustments.
    pub total_attacks: i32,
    /// Face target the dice were rolled against.
    pub quality_target: i32,
    /// Save-roll modifiers accumulated so far.
    pub modifiers: DefenseModifiers,
    distribution: Distribution<HitState>,
}

impl<'a> AfterHitContext<'a> {
    pub(crate) fn new(
        attacker: &'a UnitProfile,
        defender: &'a UnitProfile,
        weapon: &'a WeaponProfile,
        charging: bool,
        total_attacks: i32,
        quality_target: i32,
        distribution: Distribution<HitState>,
    ) -> Self {
        Self {
            attacker,
            defender,
            weapon,
            charging,
            total_attacks,
            quality_target,
            modifiers: DefenseModifiers::default(),
            distribution,
        }
    }

    /// Current hit distribution.
    pub fn distribution(&self) -> &Distribution<HitState> {
        &self.distribution
    }

    /// Rewrite every outcome in place.
    pub fn map(&mut self, f: impl Fn(&HitState) -> HitState) {
        self.distribution = self.distribution.map(f);
    }

    /// Replace every outcome with a sub-distribution.
    pub fn expand(&mut self, f: impl Fn(&HitState) -> Distribution<HitState>) {
        self.distribution = self.distribution.and_then(f);
    }

    /// Swap in a whole new distribution.
    pub fn replace(&mut self, distribution: Distribution<HitState>) {
        self.distribution = distribution;
    }

    pub(crate) fn into_parts(self) -> (Distribution<HitState>, DefenseModifiers) {
        (self.distribution, self.modifiers)
    }
}

/// Mutable view of the unsaved-wound distribution after saves.
pub struct AfterDefenseContext<'a> {
    pub attacker: &'a UnitProfile,
    pub defender: &'a UnitProfile,
    pub weapon: &'a WeaponProfile,
    /// False when an offensive rule suppressed healing this engagement.
    pub regeneration_enabled: bool,
    distribution: Distribution<DefenseState>,
}

impl<'a> AfterDefenseContext<'a> {
    pub(crate) fn new(
        attacker: &'a UnitProfile,
        defender: &'a UnitProfile,
        weapon: &'a WeaponProfile,
        regeneration_enabled: bool,
        distribution: Distribution<DefenseState>,
    ) -> Self {
        Self {
            attacker,
            defender,
            weapon,
            regeneration_enabled,
            distribution,
        }
    }

    /// Current unsaved-wound distribution.
    pub fn distribution(&self) -> &Distribution<DefenseState> {
        &self.distribution
    }

    /// Rewrite every outcome in place.
    pub fn map(&mut self, f: impl Fn(&DefenseState) -> DefenseState) {
        self.distribution = self.distribution.map(f);
    }

    /// Replace every outcome with a sub-distribution.
    pub fn expand(&mut self, f: impl Fn(&DefenseState) -> Distribution<DefenseState>) {
        self.distribution = self.distribution.and_then(f);
    }

    pub(crate) fn into_distribution(self) -> Distribution<DefenseState> {
        self.distribution
    }
}

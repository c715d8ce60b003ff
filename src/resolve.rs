//! Attack resolution: from profiles to an exact damage distribution.
//!
//! One engagement direction (one unit attacking another) resolves each
//! weapon through the three-stage pipeline and convolves the per-weapon
//! damage distributions into a single [`AttackDamage`] distribution. The
//! hero's weapons resolve separately with the hero's own quality and
//! personal rules, then convolve in with the rest.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dice::{hit_roll_distribution, HitState};
use crate::distribution::Distribution;
use crate::profile::{UnitProfile, WeaponProfile};
use crate::rules::{
    AfterDefenseContext, AfterHitContext, BeforeHitContext, DefenseModifiers, Hooks, Rule,
};

/// Outcome of the save rolls for one weapon's hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefenseState {
    /// Wounds that got through the saves.
    pub unsaved_wounds: i32,
    /// Wounds the attacker inflicted on itself.
    pub self_wounds: i32,
    /// Total hits that had to be saved against.
    pub hits: i32,
}

impl DefenseState {
    /// Copy with `healed` wounds removed, clamped at zero.
    pub fn heal(&self, healed: i32) -> DefenseState {
        DefenseState {
            unsaved_wounds: (self.unsaved_wounds - healed).max(0),
            ..*self
        }
    }
}

/// Damage one side deals in a single strike.
///
/// Composable by pointwise addition via [`AttackDamage::add`]; weapon
/// results convolve into a unit total by adding.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AttackDamage {
    /// Unsaved wounds dealt to the defender.
    pub wounds: i32,
    /// Wounds dealt to the attacker by its own weapons.
    pub self_wounds: i32,
    /// Hits the defender had to save against.
    pub hits: i32,
}

impl AttackDamage {
    /// Pointwise sum of two damage totals.
    pub fn add(&self, other: &AttackDamage) -> AttackDamage {
        AttackDamage {
            wounds: self.wounds + other.wounds,
            self_wounds: self.self_wounds + other.self_wounds,
            hits: self.hits + other.hits,
        }
    }
}

/// Rules bundled by pipeline slot for one engagement direction.
struct StageRules<'a> {
    /// Defender passives adjusting the attack before dice are rolled.
    defense_before: Vec<&'a dyn Rule>,
    /// Attacker unit rules and active hero auras, before-hit stage.
    offense_before: Vec<&'a dyn Rule>,
    /// Attacker-side after-hit rules beyond the weapon's own.
    offense_after_hit: Vec<&'a dyn Rule>,
    /// Defender passives reshaping the hit distribution.
    defense_after_hit: Vec<&'a dyn Rule>,
    /// Attacker-side after-defense rules beyond the weapon's own.
    offense_after_defense: Vec<&'a dyn Rule>,
    /// Defender rules reshaping the unsaved-wound distribution.
    defense_after: Vec<&'a dyn Rule>,
}

fn with_hook<'a>(
    rules: impl IntoIterator<Item = &'a std::sync::Arc<dyn Rule>>,
    hook: Hooks,
) -> Vec<&'a dyn Rule> {
    rules
        .into_iter()
        .filter(|rule| rule.hooks().intersects(hook))
        .map(|rule| rule.as_ref())
        .collect()
}

/// Resolve every weapon of `attacker` against `defender`.
///
/// `attacking_models` is the number of regular models still able to
/// fight; the hero strikes with its own weapons while
/// `attacker_hero_active`. Hero auras participate in the offensive stages
/// only while the hero is active; the defender's aura rules participate
/// in the defensive stages only while `defender_hero_active`.
pub(crate) fn resolve_unit_attacks(
    attacker: &UnitProfile,
    defender: &UnitProfile,
    attacking_models: i32,
    attacker_hero_active: bool,
    defender_hero_active: bool,
    charging: bool,
) -> Distribution<AttackDamage> {
    let attacker_auras = if attacker_hero_active {
        attacker.hero().map_or(&[][..], |hero| hero.auras())
    } else {
        &[]
    };
    let defender_auras = if defender_hero_active {
        defender.hero().map_or(&[][..], |hero| hero.auras())
    } else {
        &[]
    };

    let unit_stage = StageRules {
        defense_before: with_hook(
            defender.rules().iter().chain(defender_auras),
            Hooks::BEFORE_HIT_DEFENSE,
        ),
        offense_before: with_hook(
            attacker.rules().iter().chain(attacker_auras),
            Hooks::BEFORE_HIT_OFFENSE,
        ),
        offense_after_hit: with_hook(attacker_auras, Hooks::AFTER_HIT_OFFENSE),
        defense_after_hit: with_hook(
            defender.rules().iter().chain(defender_auras),
            Hooks::AFTER_HIT_DEFENSE,
        ),
        offense_after_defense: with_hook(attacker_auras, Hooks::AFTER_DEFENSE_OFFENSE),
        defense_after: with_hook(
            defender.rules().iter().chain(defender_auras),
            Hooks::AFTER_DEFENSE_DEFENSE,
        ),
    };

    let mut total = Distribution::certain(AttackDamage::default());
    for weapon in attacker.weapons() {
        let damage = resolve_weapon(
            attacker,
            defender,
            weapon,
            attacking_models,
            attacker.quality(),
            charging,
            &unit_stage,
        );
        total = total.product(&damage, |left, right| left.add(right));
    }

    if attacker_hero_active {
        if let Some(hero) = attacker.hero() {
            // The hero fights with its personal rules folded into every
            // offensive slot alongside the unit rules and its own auras.
            let hero_stage = StageRules {
                defense_before: unit_stage.defense_before.clone(),
                offense_before: with_hook(
                    attacker
                        .rules()
                        .iter()
                        .chain(attacker_auras)
                        .chain(hero.rules()),
                    Hooks::BEFORE_HIT_OFFENSE,
                ),
                offense_after_hit: with_hook(
                    attacker_auras.iter().chain(hero.rules()),
                    Hooks::AFTER_HIT_OFFENSE,
                ),
                defense_after_hit: unit_stage.defense_after_hit.clone(),
                offense_after_defense: with_hook(
                    attacker_auras.iter().chain(hero.rules()),
                    Hooks::AFTER_DEFENSE_OFFENSE,
                ),
                defense_after: unit_stage.defense_after.clone(),
            };
            for weapon in hero.weapons() {
                let damage = resolve_weapon(
                    attacker,
                    defender,
                    weapon,
                    1,
                    hero.quality(),
                    charging,
                    &hero_stage,
                );
                total = total.product(&damage, |left, right| left.add(right));
            }
        }
    }

    total
}

/// Resolve a single weapon through the three-stage pipeline.
fn resolve_weapon(
    attacker: &UnitProfile,
    defender: &UnitProfile,
    weapon: &WeaponProfile,
    attacking_models: i32,
    quality: i32,
    charging: bool,
    stage: &StageRules<'_>,
) -> Distribution<AttackDamage> {
    if attacking_models <= 0 || weapon.attacks_per_model() <= 0 {
        return Distribution::certain(AttackDamage::default());
    }

    let mut before = BeforeHitContext {
        attacker,
        defender,
        weapon,
        attacking_models,
        attacks_per_model: weapon.attacks_per_model(),
        charging,
        total_attacks: attacking_models * weapon.attacks_per_model(),
        quality,
        armor_penetration: weapon.armor_penetration(),
    };
    for rule in &stage.defense_before {
        rule.before_hit(&mut before);
    }
    for rule in &stage.offense_before {
        rule.before_hit(&mut before);
    }
    for rule in weapon.before_hit_rules() {
        rule.before_hit(&mut before);
    }

    let total_attacks = before.total_attacks.max(0);
    let quality_target = before.quality.max(2);
    let armor_penetration = before.armor_penetration;
    if total_attacks == 0 {
        return Distribution::certain(AttackDamage::default());
    }

    let hits = hit_roll_distribution(total_attacks, quality_target, false);
    let mut after_hit = AfterHitContext::new(
        attacker,
        defender,
        weapon,
        charging,
        total_attacks,
        quality_target,
        hits,
    );
    for rule in weapon.after_hit_rules() {
        rule.after_hit(&mut after_hit);
    }
    for rule in &stage.offense_after_hit {
        rule.after_hit(&mut after_hit);
    }
    for rule in &stage.defense_after_hit {
        rule.after_hit(&mut after_hit);
    }
    let (hit_distribution, modifiers) = after_hit.into_parts();

    trace!(
        weapon = weapon.name(),
        total_attacks,
        quality_target,
        armor_penetration,
        "resolved hit stage"
    );

    let saved = resolve_defense(&hit_distribution, defender, armor_penetration, &modifiers);

    let mut after_defense = AfterDefenseContext::new(
        attacker,
        defender,
        weapon,
        !modifiers.suppress_regeneration,
        saved,
    );
    for rule in weapon.after_defense_rules() {
        rule.after_defense(&mut after_defense);
    }
    for rule in &stage.offense_after_defense {
        rule.after_defense(&mut after_defense);
    }
    for rule in &stage.defense_after {
        rule.after_defense(&mut after_defense);
    }

    after_defense.into_distribution().map(|state| AttackDamage {
        wounds: state.unsaved_wounds.max(0),
        self_wounds: state.self_wounds.max(0),
        hits: state.hits.max(0),
    })
}

/// Roll the defender's saves against each hit outcome.
///
/// Hits from natural sixes save against additional penetration; direct
/// wounds bypass the save entirely.
pub(crate) fn resolve_defense(
    hits: &Distribution<HitState>,
    defender: &UnitProfile,
    armor_penetration: i32,
    modifiers: &DefenseModifiers,
) -> Distribution<DefenseState> {
    hits.and_then(|state| {
        let total_hits = state.hits.max(0);
        if total_hits == 0 {
            return Distribution::certain(DefenseState {
                unsaved_wounds: state.direct_wounds.max(0),
                self_wounds: state.self_wounds,
                hits: 0,
            });
        }

        let six_hits = state.natural_sixes.clamp(0, total_hits);
        let regular_hits = total_hits - six_hits;
        let effective_ap =
            armor_penetration + modifiers.extra_armor_penetration + state.ap_bonus;
        let reroll = modifiers.force_defense_six_reroll;

        let regular_saves = hit_roll_distribution(
            regular_hits,
            defender.defense() + effective_ap,
            reroll,
        )
        .map(|s| s.hits);
        let six_saves = hit_roll_distribution(
            six_hits,
            defender.defense() + effective_ap + modifiers.extra_armor_penetration_on_six,
            reroll,
        )
        .map(|s| s.hits);

        let direct = state.direct_wounds.max(0);
        let self_wounds = state.self_wounds;
        regular_saves.product(&six_saves, move |&saved_regular, &saved_six| DefenseState {
            unsaved_wounds: (regular_hits - saved_regular).max(0)
                + (six_hits - saved_six).max(0)
                + direct,
            self_wounds,
            hits: total_hits,
        })
    })
}

//! The concrete special-rule catalog.
//!
//! Each rule is a small unit struct (or a struct with its tuning
//! parameters) implementing [`Rule`] for exactly the stages it declares.
//! Rules never roll dice themselves; they reshape the exact distributions
//! flowing through the pipeline.

use crate::dice::{binomial, hit_roll_distribution, HitState};
use crate::rules::{AfterDefenseContext, AfterHitContext, BeforeHitContext, Hooks, Rule};

/// Charging models contributing attacks beyond this count lose them.
const MAX_CHARGING_MODELS: i32 = 5;

/// Gains 2 armor penetration against tough targets (toughness 3+).
pub struct Slayer;

impl Rule for Slayer {
    fn name(&self) -> &str {
        "Slayer"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_OFFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        if ctx.defender.toughness() >= 3 {
            ctx.armor_penetration += 2;
        }
    }
}

/// Gains 2 armor penetration against lightly armored targets (defense 2-3).
pub struct Reap;

impl Rule for Reap {
    fn name(&self) -> &str {
        "Reap"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_OFFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        if matches!(ctx.defender.defense(), 2 | 3) {
            ctx.armor_penetration += 2;
        }
    }
}

/// The wielding unit strikes first even when charged.
///
/// Carries no stage behavior; its entire effect is the initiative swap
/// read off [`Rule::grants_counter_strike`] by the battle orchestrator.
pub struct Counter;

impl Rule for Counter {
    fn name(&self) -> &str {
        "Counter"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_OFFENSE
    }

    fn grants_counter_strike(&self) -> bool {
        true
    }
}

/// On the charge, hits one face easier and gains 1 armor penetration.
pub struct Thrust;

impl Rule for Thrust {
    fn name(&self) -> &str {
        "Thrust"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_OFFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        if ctx.charging {
            ctx.quality = (ctx.quality - 1).max(2);
            ctx.armor_penetration += 1;
        }
    }
}

/// Always hits on 2+ regardless of the wielder's quality.
pub struct Reliable;

impl Rule for Reliable {
    fn name(&self) -> &str {
        "Reliable"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_OFFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        ctx.quality = ctx.quality.min(2);
    }
}

/// Hits one face easier than the wielder's quality.
pub struct Precise;

impl Rule for Precise {
    fn name(&self) -> &str {
        "Precise"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_OFFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        ctx.quality = (ctx.quality - 1).max(2);
    }
}

/// Caps base attacks at five models' worth; rule-granted bonus attacks
/// are preserved on top of the cap.
pub struct CavalryCap;

impl Rule for CavalryCap {
    fn name(&self) -> &str {
        "CavalryCap"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_OFFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        let base = ctx.attacks_per_model * ctx.attacking_models;
        let capped_base = ctx.attacks_per_model * ctx.attacking_models.min(MAX_CHARGING_MODELS);
        let bonus = (ctx.total_attacks - base).max(0);
        ctx.total_attacks = (capped_base + bonus).max(0);
    }
}

/// Flat extra armor penetration on every hit.
pub struct Piercing(pub i32);

impl Rule for Piercing {
    fn name(&self) -> &str {
        "Piercing"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_OFFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        ctx.armor_penetration += self.0;
    }
}

/// Incoming attacks hit one face harder.
pub struct Evasion;

impl Rule for Evasion {
    fn name(&self) -> &str {
        "Evasion"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_DEFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        ctx.quality = (ctx.quality + 1).min(6);
    }
}

/// Incoming ranged attacks hit one face harder.
pub struct Stealth;

impl Rule for Stealth {
    fn name(&self) -> &str {
        "Stealth"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_DEFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        if ctx.is_ranged() {
            ctx.quality = (ctx.quality + 1).min(6);
        }
    }
}

/// Reduces incoming armor penetration by one.
pub struct Shield;

impl Rule for Shield {
    fn name(&self) -> &str {
        "Shield"
    }

    fn hooks(&self) -> Hooks {
        Hooks::BEFORE_HIT_DEFENSE
    }

    fn before_hit(&self, ctx: &mut BeforeHitContext<'_>) {
        ctx.armor_penetration -= 1;
    }
}

/// Wounds cannot be healed and six-saves must be rerolled.
pub struct Bane;

impl Rule for Bane {
    fn name(&self) -> &str {
        "Bane"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        ctx.modifiers.suppress_regeneration = true;
        ctx.modifiers.force_defense_six_reroll = true;
    }
}

/// Wounds cannot be healed; natural sixes gain 4 armor penetration.
pub struct Rending;

impl Rule for Rending {
    fn name(&self) -> &str {
        "Rending"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        ctx.modifiers.suppress_regeneration = true;
        ctx.modifiers.extra_armor_penetration_on_six += 4;
    }
}

/// Natural sixes gain 2 armor penetration.
pub struct Crack;

impl Rule for Crack {
    fn name(&self) -> &str {
        "Crack"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        ctx.modifiers.extra_armor_penetration_on_six += 2;
    }
}

/// On the charge, each natural six scores one extra hit.
pub struct Furious;

impl Rule for Furious {
    fn name(&self) -> &str {
        "Furious"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        if ctx.charging {
            ctx.map(|state| HitState {
                hits: state.hits + state.natural_sixes,
                ..*state
            });
        }
    }
}

/// Each natural six scores one extra hit, charging or not.
pub struct Relentless;

impl Rule for Relentless {
    fn name(&self) -> &str {
        "Relentless"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        ctx.map(|state| HitState {
            hits: state.hits + state.natural_sixes,
            ..*state
        });
    }
}

/// Each natural one wounds the wielder.
pub struct Overtuned;

impl Rule for Overtuned {
    fn name(&self) -> &str {
        "Overtuned"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        ctx.map(|state| state.add_self_wounds(state.natural_ones));
    }
}

/// Multiplies hits (and their natural sixes) when any hit landed.
pub struct MultiplyHits(pub i32);

impl Rule for MultiplyHits {
    fn name(&self) -> &str {
        "MultiplyHits"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        let factor = self.0;
        ctx.map(|state| {
            if state.hits > 0 {
                HitState {
                    hits: state.hits * factor,
                    natural_sixes: state.natural_sixes * factor,
                    ..*state
                }
            } else {
                *state
            }
        });
    }
}

/// Hits multiply by the defender's model count, capped, against multi-model
/// targets.
pub struct Blast(pub i32);

impl Rule for Blast {
    fn name(&self) -> &str {
        "Blast"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        let models = ctx.defender.model_count();
        if models > 1 {
            let factor = models.min(self.0);
            ctx.map(|state| HitState {
                hits: state.hits * factor,
                ..*state
            });
        }
    }
}

/// Half the time fights with extra penetration, half the time with better
/// aim.
///
/// The better-aim branch rerolls the whole batch one face easier; when the
/// quality target is already at the floor the current distribution stands
/// in for that branch.
pub struct UnpredictableFighter;

impl Rule for UnpredictableFighter {
    fn name(&self) -> &str {
        "UnpredictableFighter"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        let pierce_branch = ctx.distribution().map(|state| state.add_ap_bonus(1));
        let aim_branch = if ctx.quality_target > 2 && ctx.total_attacks > 0 {
            hit_roll_distribution(ctx.total_attacks, ctx.quality_target - 1, false)
        } else {
            ctx.distribution().clone()
        };
        ctx.replace(pierce_branch.blend(&aim_branch, 0.5, 0.5));
    }
}

/// Each natural six wounds directly, bypassing the save roll.
pub struct ExplodingSixes;

impl Rule for ExplodingSixes {
    fn name(&self) -> &str {
        "ExplodingSixes"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_OFFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        ctx.map(|state| state.add_direct_wounds(state.natural_sixes));
    }
}

/// Strips one point of accumulated per-hit penetration from incoming hits.
pub struct Fortified;

impl Rule for Fortified {
    fn name(&self) -> &str {
        "Fortified"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_HIT_DEFENSE
    }

    fn after_hit(&self, ctx: &mut AfterHitContext<'_>) {
        ctx.map(|state| state.add_ap_bonus(-1));
    }
}

/// Each unsaved wound multiplies against tough targets, capped.
pub struct Deadly(pub i32);

impl Rule for Deadly {
    fn name(&self) -> &str {
        "Deadly"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_DEFENSE_OFFENSE
    }

    fn after_defense(&self, ctx: &mut AfterDefenseContext<'_>) {
        let toughness = ctx.defender.toughness();
        if toughness > 1 {
            let factor = toughness.min(self.0);
            ctx.map(|state| crate::resolve::DefenseState {
                unsaved_wounds: state.unsaved_wounds * factor,
                ..*state
            });
        }
    }
}

/// Each unsaved wound heals with a fixed chance.
///
/// Suppressed entirely when an offensive rule disabled healing for the
/// engagement.
pub struct Regeneration {
    heal_chance: f64,
}

impl Regeneration {
    /// Standard regeneration: each wound heals on 2 chances in 6.
    pub fn new() -> Self {
        Self {
            heal_chance: 2.0 / 6.0,
        }
    }

    /// Lesser regeneration: each wound heals on 1 chance in 6.
    pub fn lesser() -> Self {
        Self {
            heal_chance: 1.0 / 6.0,
        }
    }

    /// Override the per-wound heal chance.
    pub fn with_heal_chance(mut self, heal_chance: f64) -> Self {
        self.heal_chance = heal_chance.clamp(0.0, 1.0);
        self
    }
}

impl Default for Regeneration {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for Regeneration {
    fn name(&self) -> &str {
        "Regeneration"
    }

    fn hooks(&self) -> Hooks {
        Hooks::AFTER_DEFENSE_DEFENSE
    }

    fn after_defense(&self, ctx: &mut AfterDefenseContext<'_>) {
        if !ctx.regeneration_enabled {
            return;
        }
        let heal_chance = self.heal_chance;
        ctx.expand(|state| {
            let wounds = state.unsaved_wounds;
            let healed = binomial(wounds, heal_chance);
            let state = *state;
            healed.map(move |&h| state.heal(h))
        });
    }
}

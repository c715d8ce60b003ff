//! Unit, hero, and weapon configuration.
//!
//! Profiles are validated once at construction and immutable afterwards.
//! The `with_*` methods are consuming copy-with-override builders; shared
//! ownership of rules goes through `Arc<dyn Rule>` so a profile can be
//! cloned freely without duplicating rule values.

use std::fmt;
use std::sync::Arc;

use crate::error::ProfileError;
use crate::rules::{Hooks, Rule};

/// A weapon carried by every model of a unit (or by a hero).
///
/// The rule list given to [`WeaponProfile::with_rules`] is partitioned by
/// hook stage at construction; a rule declaring several stages appears in
/// each matching stage list.
///
/// # Examples
///
/// ```rust
/// use wardice::{rule, special::Precise, WeaponProfile};
///
/// let bow = WeaponProfile::new("Bow", 2)
///     .unwrap()
///     .with_armor_penetration(1)
///     .with_ranged(true)
///     .with_rules([rule(Precise)]);
/// assert_eq!(bow.attacks_per_model(), 2);
/// assert!(bow.is_ranged());
/// ```
#[derive(Clone)]
pub struct WeaponProfile {
    name: String,
    attacks_per_model: i32,
    armor_penetration: i32,
    ranged: bool,
    before_hit_rules: Vec<Arc<dyn Rule>>,
    after_hit_rules: Vec<Arc<dyn Rule>>,
    after_defense_rules: Vec<Arc<dyn Rule>>,
}

impl WeaponProfile {
    /// Create a weapon with the given attacks per model.
    pub fn new(name: impl Into<String>, attacks_per_model: i32) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if attacks_per_model < 0 {
            return Err(ProfileError::NegativeAttacks(attacks_per_model));
        }
        Ok(Self {
            name,
            attacks_per_model,
            armor_penetration: 0,
            ranged: false,
            before_hit_rules: Vec::new(),
            after_hit_rules: Vec::new(),
            after_defense_rules: Vec::new(),
        })
    }

    /// Override the armor penetration applied against the defender's saves.
    pub fn with_armor_penetration(mut self, armor_penetration: i32) -> Self {
        self.armor_penetration = armor_penetration;
        self
    }

    /// Mark the weapon as ranged.
    pub fn with_ranged(mut self, ranged: bool) -> Self {
        self.ranged = ranged;
        self
    }

    /// Attach special rules, partitioned by the stages they declare.
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) -> Self {
        for rule in rules {
            let hooks = rule.hooks();
            if hooks.intersects(Hooks::BEFORE_HIT_OFFENSE | Hooks::BEFORE_HIT_DEFENSE) {
                self.before_hit_rules.push(Arc::clone(&rule));
            }
            if hooks.intersects(Hooks::AFTER_HIT_OFFENSE | Hooks::AFTER_HIT_DEFENSE) {
                self.after_hit_rules.push(Arc::clone(&rule));
            }
            if hooks.intersects(Hooks::AFTER_DEFENSE_OFFENSE | Hooks::AFTER_DEFENSE_DEFENSE) {
                self.after_defense_rules.push(Arc::clone(&rule));
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attacks_per_model(&self) -> i32 {
        self.attacks_per_model
    }

    pub fn armor_penetration(&self) -> i32 {
        self.armor_penetration
    }

    pub fn is_ranged(&self) -> bool {
        self.ranged
    }

    pub fn before_hit_rules(&self) -> &[Arc<dyn Rule>] {
        &self.before_hit_rules
    }

    pub fn after_hit_rules(&self) -> &[Arc<dyn Rule>] {
        &self.after_hit_rules
    }

    pub fn after_defense_rules(&self) -> &[Arc<dyn Rule>] {
        &self.after_defense_rules
    }

    /// True if any attached rule grants the counter-strike keyword.
    pub fn has_counter(&self) -> bool {
        self.before_hit_rules
            .iter()
            .any(|rule| rule.grants_counter_strike())
    }
}

impl fmt::Debug for WeaponProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeaponProfile")
            .field("name", &self.name)
            .field("attacks_per_model", &self.attacks_per_model)
            .field("armor_penetration", &self.armor_penetration)
            .field("ranged", &self.ranged)
            .field("rules", &rule_names(&self.before_hit_rules, &self.after_hit_rules, &self.after_defense_rules))
            .finish()
    }
}

fn rule_names(lists: &[Arc<dyn Rule>], more: &[Arc<dyn Rule>], even_more: &[Arc<dyn Rule>]) -> Vec<String> {
    lists
        .iter()
        .chain(more)
        .chain(even_more)
        .map(|rule| rule.name().to_string())
        .collect()
}

/// An individual hero attached to a unit.
///
/// A hero fights with its own quality and weapons, carries personal rules
/// that apply to its own attacks, and projects aura rules onto the whole
/// unit's pipeline.
#[derive(Clone)]
pub struct HeroProfile {
    name: String,
    quality: i32,
    defense: i32,
    toughness: i32,
    fear: i32,
    weapons: Vec<WeaponProfile>,
    rules: Vec<Arc<dyn Rule>>,
    auras: Vec<Arc<dyn Rule>>,
}

impl HeroProfile {
    pub fn new(
        name: impl Into<String>,
        quality: i32,
        defense: i32,
        toughness: i32,
        fear: i32,
    ) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if quality < 2 {
            return Err(ProfileError::QualityTooLow(quality));
        }
        if defense < 2 {
            return Err(ProfileError::DefenseTooLow(defense));
        }
        if toughness <= 0 {
            return Err(ProfileError::NonPositiveToughness(toughness));
        }
        if fear < 0 {
            return Err(ProfileError::NegativeFear(fear));
        }
        Ok(Self {
            name,
            quality,
            defense,
            toughness,
            fear,
            weapons: Vec::new(),
            rules: Vec::new(),
            auras: Vec::new(),
        })
    }

    /// Override the hero's own weapons.
    pub fn with_weapons(mut self, weapons: impl IntoIterator<Item = WeaponProfile>) -> Self {
        self.weapons = weapons.into_iter().collect();
        self
    }

    /// Attach personal rules applying only to the hero's own attacks.
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Attach aura rules projected onto the whole unit's pipeline.
    pub fn with_auras(mut self, auras: impl IntoIterator<Item = Arc<dyn Rule>>) -> Self {
        self.auras.extend(auras);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quality(&self) -> i32 {
        self.quality
    }

    pub fn defense(&self) -> i32 {
        self.defense
    }

    pub fn toughness(&self) -> i32 {
        self.toughness
    }

    pub fn fear(&self) -> i32 {
        self.fear
    }

    pub fn weapons(&self) -> &[WeaponProfile] {
        &self.weapons
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn auras(&self) -> &[Arc<dyn Rule>] {
        &self.auras
    }
}

impl fmt::Debug for HeroProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeroProfile")
            .field("name", &self.name)
            .field("quality", &self.quality)
            .field("defense", &self.defense)
            .field("toughness", &self.toughness)
            .field("fear", &self.fear)
            .field("weapons", &self.weapons)
            .field("rules", &rule_names(&self.rules, &self.auras, &[]))
            .finish()
    }
}

/// A combat unit: stat block, weapons, passive rules, optional hero.
///
/// # Examples
///
/// ```rust
/// use wardice::{UnitProfile, WeaponProfile};
///
/// let spear = WeaponProfile::new("Spear", 1).unwrap();
/// let guards = UnitProfile::new("Guards", 4, 4, 1, 0, 10)
///     .unwrap()
///     .with_weapons([spear]);
/// assert_eq!(guards.total_wound_capacity(), 10);
/// ```
#[derive(Clone)]
pub struct UnitProfile {
    name: String,
    quality: i32,
    defense: i32,
    toughness: i32,
    fear: i32,
    model_count: i32,
    weapons: Vec<WeaponProfile>,
    rules: Vec<Arc<dyn Rule>>,
    hero: Option<HeroProfile>,
    combined: bool,
}

impl UnitProfile {
    /// Create a unit from its stat block.
    ///
    /// Preconditions (`quality >= 2`, `defense >= 2`, `toughness > 0`,
    /// `fear >= 0`, `model_count >= 0`) are rejected here, never coerced.
    pub fn new(
        name: impl Into<String>,
        quality: i32,
        defense: i32,
        toughness: i32,
        fear: i32,
        model_count: i32,
    ) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if quality < 2 {
            return Err(ProfileError::QualityTooLow(quality));
        }
        if defense < 2 {
            return Err(ProfileError::DefenseTooLow(defense));
        }
        if toughness <= 0 {
            return Err(ProfileError::NonPositiveToughness(toughness));
        }
        if fear < 0 {
            return Err(ProfileError::NegativeFear(fear));
        }
        if model_count < 0 {
            return Err(ProfileError::NegativeModelCount(model_count));
        }
        Ok(Self {
            name,
            quality,
            defense,
            toughness,
            fear,
            model_count,
            weapons: Vec::new(),
            rules: Vec::new(),
            hero: None,
            combined: false,
        })
    }

    /// Override the unit's weapons.
    pub fn with_weapons(mut self, weapons: impl IntoIterator<Item = WeaponProfile>) -> Self {
        self.weapons = weapons.into_iter().collect();
        self
    }

    /// Attach passive rules carried by every model.
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Attach a hero to the unit.
    pub fn with_hero(mut self, hero: HeroProfile) -> Self {
        self.hero = Some(hero);
        self
    }

    /// Double the model count to form a combined unit.
    ///
    /// Single-model units cannot be combined.
    pub fn combined(mut self) -> Result<Self, ProfileError> {
        if self.model_count == 1 {
            return Err(ProfileError::CombinedSingleModel);
        }
        self.model_count *= 2;
        self.combined = true;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quality(&self) -> i32 {
        self.quality
    }

    pub fn defense(&self) -> i32 {
        self.defense
    }

    pub fn toughness(&self) -> i32 {
        self.toughness
    }

    pub fn fear(&self) -> i32 {
        self.fear
    }

    pub fn model_count(&self) -> i32 {
        self.model_count
    }

    pub fn weapons(&self) -> &[WeaponProfile] {
        &self.weapons
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn hero(&self) -> Option<&HeroProfile> {
        self.hero.as_ref()
    }

    pub fn is_combined(&self) -> bool {
        self.combined
    }

    /// Wounds the regular models can absorb before the unit is empty.
    pub fn regular_wound_capacity(&self) -> i32 {
        self.model_count * self.toughness
    }

    /// Wounds the whole unit, hero included, can absorb.
    pub fn total_wound_capacity(&self) -> i32 {
        self.regular_wound_capacity() + self.hero.as_ref().map_or(0, |hero| hero.toughness())
    }

    /// Fear contributed to resolution scores by the unit and its hero.
    pub fn total_fear(&self) -> i32 {
        self.fear + self.hero.as_ref().map_or(0, |hero| hero.fear())
    }

    /// True if any weapon carries the counter-strike keyword.
    pub fn has_counter_weapon(&self) -> bool {
        self.weapons.iter().any(WeaponProfile::has_counter)
    }
}

impl fmt::Debug for UnitProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitProfile")
            .field("name", &self.name)
            .field("quality", &self.quality)
            .field("defense", &self.defense)
            .field("toughness", &self.toughness)
            .field("fear", &self.fear)
            .field("model_count", &self.model_count)
            .field("combined", &self.combined)
            .field("weapons", &self.weapons)
            .field("rules", &rule_names(&self.rules, &[], &[]))
            .field("hero", &self.hero)
            .finish()
    }
}

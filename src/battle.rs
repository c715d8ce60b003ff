//! Battle orchestration and summary statistics.
//!
//! A battle is one round of combat between two units. In melee both
//! sides strike, ordered by charge initiative (or by a counter-strike
//! weapon on the defender); the retaliation strikes with whatever
//! survived the first strike. In a ranged battle only the attacker
//! shoots.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distribution::Distribution;
use crate::profile::UnitProfile;
use crate::resolve::{resolve_unit_attacks, AttackDamage};

/// How the engagement is fought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Unit A charges unit B; both sides strike.
    Melee,
    /// Unit A shoots unit B; only A strikes.
    Ranged,
}

/// One joint outcome of the round.
///
/// `wounds_to_x` counts everything x suffered, including wounds from its
/// own weapons. `score_x` is the resolution score x presents: wounds it
/// dealt plus its total fear.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BattleOutcome {
    pub wounds_to_a: i32,
    pub wounds_to_b: i32,
    pub score_a: i32,
    pub score_b: i32,
    pub hits_to_a: i32,
    pub hits_to_b: i32,
}

/// Exact statistics for one round of combat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub expected_wounds_to_a: f64,
    pub expected_wounds_to_b: f64,
    pub expected_models_lost_a: f64,
    pub expected_models_lost_b: f64,
    pub expected_hits_to_a: f64,
    pub expected_hits_to_b: f64,
    /// Probability that A wins the round.
    pub win_probability_a: f64,
    /// Probability that B wins the round.
    pub win_probability_b: f64,
    /// Probability that neither side wins (melee score tie).
    pub tie_probability: f64,
    /// Probability that A is wiped out entirely.
    pub wipe_probability_a: f64,
    /// Probability that B is wiped out entirely.
    pub wipe_probability_b: f64,
    /// The full joint outcome distribution the statistics summarize.
    pub outcomes: Distribution<BattleOutcome>,
}

/// Compute the exact outcome distribution of one round.
///
/// Unit A is always the aggressor: the charger in melee, the shooter at
/// range. Identical inputs produce bit-identical reports.
///
/// # Examples
///
/// ```rust
/// use wardice::{simulate, Mode, UnitProfile, WeaponProfile};
///
/// let sword = WeaponProfile::new("Sword", 1).unwrap();
/// let a = UnitProfile::new("Raiders", 4, 4, 1, 0, 5)
///     .unwrap()
///     .with_weapons([sword.clone()]);
/// let b = UnitProfile::new("Guards", 4, 4, 1, 0, 5)
///     .unwrap()
///     .with_weapons([sword]);
/// let report = simulate(&a, &b, Mode::Melee);
/// let total = report.win_probability_a + report.win_probability_b + report.tie_probability;
/// assert!((total - 1.0).abs() < 1e-9);
/// ```
pub fn simulate(unit_a: &UnitProfile, unit_b: &UnitProfile, mode: Mode) -> BattleReport {
    debug!(
        attacker = unit_a.name(),
        defender = unit_b.name(),
        ?mode,
        "simulating round"
    );
    let outcomes = match mode {
        Mode::Melee => melee_outcomes(unit_a, unit_b),
        Mode::Ranged => ranged_outcomes(unit_a, unit_b),
    };
    build_report(unit_a, unit_b, mode, outcomes)
}

fn melee_outcomes(unit_a: &UnitProfile, unit_b: &UnitProfile) -> Distribution<BattleOutcome> {
    // A counter-strike weapon on the defender steals the initiative, and
    // with it the charge state: whoever strikes first counts as charging.
    let a_strikes_first = !unit_b.has_counter_weapon();
    let exchange = if a_strikes_first {
        strike_exchange(unit_a, unit_b)
    } else {
        strike_exchange(unit_b, unit_a).map(|&(by_b, by_a)| (by_a, by_b))
    };
    exchange.map(|&(by_a, by_b)| BattleOutcome {
        wounds_to_a: by_b.wounds + by_a.self_wounds,
        wounds_to_b: by_a.wounds + by_b.self_wounds,
        score_a: by_a.wounds + unit_a.total_fear(),
        score_b: by_b.wounds + unit_b.total_fear(),
        hits_to_a: by_b.hits,
        hits_to_b: by_a.hits,
    })
}

/// Joint distribution of `(damage by first striker, damage by second)`.
///
/// The second striker retaliates per first-strike outcome with the models
/// that survived it; a slain hero neither fights nor projects auras.
fn strike_exchange(
    first: &UnitProfile,
    second: &UnitProfile,
) -> Distribution<(AttackDamage, AttackDamage)> {
    let first_hero = first.hero().is_some();
    let second_hero = second.hero().is_some();
    let opening = resolve_unit_attacks(
        first,
        second,
        first.model_count(),
        first_hero,
        second_hero,
        true,
    );

    // Distinct survivor configurations are few; retaliations are shared
    // across first-strike outcomes that leave the same survivors.
    let memo: RefCell<BTreeMap<(i32, bool), Distribution<AttackDamage>>> =
        RefCell::new(BTreeMap::new());

    opening.and_then(|&by_first| {
        let survivors = remaining_regular_models(second, by_first.wounds);
        let hero_alive = hero_survives(second, by_first.wounds);
        let retaliation = memo
            .borrow_mut()
            .entry((survivors, hero_alive))
            .or_insert_with(|| {
                resolve_unit_attacks(second, first, survivors, hero_alive, first_hero, false)
            })
            .clone();
        retaliation.map(move |&by_second| (by_first, by_second))
    })
}

fn ranged_outcomes(unit_a: &UnitProfile, unit_b: &UnitProfile) -> Distribution<BattleOutcome> {
    let volley = resolve_unit_attacks(
        unit_a,
        unit_b,
        unit_a.model_count(),
        unit_a.hero().is_some(),
        unit_b.hero().is_some(),
        false,
    );
    volley.map(|&by_a| BattleOutcome {
        wounds_to_a: by_a.self_wounds,
        wounds_to_b: by_a.wounds,
        score_a: by_a.wounds + unit_a.total_fear(),
        score_b: unit_b.total_fear(),
        hits_to_a: 0,
        hits_to_b: by_a.hits,
    })
}

fn build_report(
    unit_a: &UnitProfile,
    unit_b: &UnitProfile,
    mode: Mode,
    outcomes: Distribution<BattleOutcome>,
) -> BattleReport {
    let mut win_a = 0.0;
    let mut win_b = 0.0;
    let mut tie = 0.0;
    let mut wipe_a = 0.0;
    let mut wipe_b = 0.0;
    for (outcome, mass) in outcomes.iter() {
        match mode {
            Mode::Melee => {
                if outcome.score_a > outcome.score_b {
                    win_a += mass;
                } else if outcome.score_b > outcome.score_a {
                    win_b += mass;
                } else {
                    tie += mass;
                }
            }
            Mode::Ranged => {
                // Only the shooter has a win condition; unmet conditions
                // flag nothing.
                if meets_ranged_elimination(unit_b, outcome.wounds_to_b) {
                    win_a += mass;
                }
            }
        }
        if outcome.wounds_to_a >= unit_a.total_wound_capacity() {
            wipe_a += mass;
        }
        if outcome.wounds_to_b >= unit_b.total_wound_capacity() {
            wipe_b += mass;
        }
    }

    BattleReport {
        expected_wounds_to_a: outcomes.expectation(|o| o.wounds_to_a as f64),
        expected_wounds_to_b: outcomes.expectation(|o| o.wounds_to_b as f64),
        expected_models_lost_a: outcomes.expectation(|o| models_lost(unit_a, o.wounds_to_a) as f64),
        expected_models_lost_b: outcomes.expectation(|o| models_lost(unit_b, o.wounds_to_b) as f64),
        expected_hits_to_a: outcomes.expectation(|o| o.hits_to_a as f64),
        expected_hits_to_b: outcomes.expectation(|o| o.hits_to_b as f64),
        win_probability_a: win_a,
        win_probability_b: win_b,
        tie_probability: tie,
        wipe_probability_a: wipe_a,
        wipe_probability_b: wipe_b,
        outcomes,
    }
}

/// Regular models still standing after `wounds` are applied.
fn remaining_regular_models(unit: &UnitProfile, wounds: i32) -> i32 {
    let absorbed = wounds.max(0).min(unit.regular_wound_capacity());
    (unit.model_count() - absorbed / unit.toughness()).max(0)
}

/// The hero soaks only the wounds overflowing the regular models.
fn hero_survives(unit: &UnitProfile, wounds: i32) -> bool {
    match unit.hero() {
        Some(hero) => wounds < unit.regular_wound_capacity() + hero.toughness(),
        None => false,
    }
}

/// Whole regular models removed by `wounds`.
fn models_lost(unit: &UnitProfile, wounds: i32) -> i32 {
    (wounds.max(0).min(unit.regular_wound_capacity()) / unit.toughness())
        .min(unit.model_count())
}

/// Models removed counting the hero as one model.
fn count_models_removed(unit: &UnitProfile, wounds: i32) -> i32 {
    let mut removed = models_lost(unit, wounds);
    if unit.hero().is_some() && !hero_survives(unit, wounds) {
        removed += 1;
    }
    removed
}

/// A ranged volley wins by removing at least half the target's models.
///
/// A single-model target is instead judged by losing at least half its
/// toughness in wounds.
fn meets_ranged_elimination(unit: &UnitProfile, wounds: i32) -> bool {
    let total_models = unit.model_count() + i32::from(unit.hero().is_some());
    if total_models <= 0 {
        return false;
    }
    if total_models == 1 {
        let base_toughness = match unit.hero() {
            Some(hero) if unit.model_count() == 0 => hero.toughness(),
            _ => unit.toughness(),
        };
        wounds >= (base_toughness + 1) / 2
    } else {
        let required = (total_models + 1) / 2;
        count_models_removed(unit, wounds) >= required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{HeroProfile, WeaponProfile};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn armed_unit(name: &str, quality: i32, defense: i32, models: i32) -> UnitProfile {
        let sword = WeaponProfile::new("Sword", 1).unwrap();
        UnitProfile::new(name, quality, defense, 1, 0, models)
            .unwrap()
            .with_weapons([sword])
    }

    #[test]
    fn test_melee_probabilities_sum_to_one() {
        let a = armed_unit("A", 4, 4, 5);
        let b = armed_unit("B", 4, 4, 5);
        let report = simulate(&a, &b, Mode::Melee);
        let total =
            report.win_probability_a + report.win_probability_b + report.tie_probability;
        assert!(close(total, 1.0));
    }

    #[test]
    fn test_mirror_melee_is_nearly_symmetric() {
        // The charger strikes first and thins the retaliation, so the
        // mirror match still favors A.
        let a = armed_unit("A", 3, 3, 5);
        let b = armed_unit("B", 3, 3, 5);
        let report = simulate(&a, &b, Mode::Melee);
        assert!(report.win_probability_a > report.win_probability_b);
    }

    #[test]
    fn test_ranged_has_no_tie_mass() {
        let a = armed_unit("A", 4, 4, 5);
        let b = armed_unit("B", 4, 4, 5);
        let report = simulate(&a, &b, Mode::Ranged);
        assert!(close(report.tie_probability, 0.0));
        assert!(close(report.win_probability_b, 0.0));
        assert!(report.win_probability_a <= 1.0 + 1e-9);
    }

    #[test]
    fn test_ranged_defender_deals_nothing() {
        let a = armed_unit("A", 4, 4, 5);
        let b = armed_unit("B", 4, 4, 5);
        let report = simulate(&a, &b, Mode::Ranged);
        assert!(close(report.expected_wounds_to_a, 0.0));
        assert!(close(report.expected_hits_to_a, 0.0));
    }

    #[test]
    fn test_survivor_counting() {
        let unit = UnitProfile::new("Tough", 4, 4, 2, 0, 3).unwrap();
        assert_eq!(remaining_regular_models(&unit, 0), 3);
        assert_eq!(remaining_regular_models(&unit, 1), 3);
        assert_eq!(remaining_regular_models(&unit, 2), 2);
        assert_eq!(remaining_regular_models(&unit, 5), 1);
        assert_eq!(remaining_regular_models(&unit, 100), 0);
    }

    #[test]
    fn test_hero_soaks_overflow_only() {
        let hero = HeroProfile::new("Captain", 3, 4, 2, 0).unwrap();
        let unit = UnitProfile::new("Guards", 4, 4, 1, 0, 3)
            .unwrap()
            .with_hero(hero);
        assert!(hero_survives(&unit, 3));
        assert!(hero_survives(&unit, 4));
        assert!(!hero_survives(&unit, 5));
    }

    #[test]
    fn test_ranged_elimination_thresholds() {
        // Ten models: half rounded up is five.
        let horde = UnitProfile::new("Horde", 4, 4, 1, 0, 10).unwrap();
        assert!(!meets_ranged_elimination(&horde, 4));
        assert!(meets_ranged_elimination(&horde, 5));

        // Single tough model: half its toughness in wounds.
        let ogre = UnitProfile::new("Ogre", 4, 4, 6, 0, 1).unwrap();
        assert!(!meets_ranged_elimination(&ogre, 2));
        assert!(meets_ranged_elimination(&ogre, 3));
    }

    #[test]
    fn test_empty_unit_cannot_be_driven_off() {
        // No models and no hero: nothing to remove, no win condition.
        let remnant = UnitProfile::new("Remnant", 4, 4, 3, 0, 0).unwrap();
        assert!(!meets_ranged_elimination(&remnant, 0));
        assert!(!meets_ranged_elimination(&remnant, 100));
    }

    #[test]
    fn test_wipe_requires_total_capacity() {
        let unit = UnitProfile::new("Pair", 4, 4, 2, 0, 2).unwrap();
        assert_eq!(unit.total_wound_capacity(), 4);
        let a = armed_unit("A", 2, 7, 1);
        let report = simulate(&a, &unit, Mode::Melee);
        let direct: f64 = report
            .outcomes
            .iter()
            .filter(|(o, _)| o.wounds_to_b >= 4)
            .map(|(_, mass)| mass)
            .sum();
        assert!(close(report.wipe_probability_b, direct));
    }
}

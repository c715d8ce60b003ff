//! D6 roll distributions.
//!
//! Converts a batch of hit dice into an exact [`Distribution`] of
//! [`HitState`] aggregates by convolving a single-die distribution with
//! itself. The aggregate counters (total hits, natural sixes, natural
//! ones, ...) are the unit of convolution, never individual dice, which
//! keeps the state space polynomial in the number of dice.

use crate::distribution::Distribution;

const FACE_PROBABILITY: f64 = 1.0 / 6.0;

/// Aggregate outcome of a batch of hit rolls.
///
/// Composable by pointwise addition via [`HitState::add`]; two batches of
/// dice convolve into one by adding their states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HitState {
    /// Total successful hits, including natural sixes.
    pub hits: i32,
    /// Unmodified rolls of 6.
    pub natural_sixes: i32,
    /// Unmodified rolls of 1.
    pub natural_ones: i32,
    /// Wounds applied without a save roll.
    pub direct_wounds: i32,
    /// Wounds the attacker inflicts on itself.
    pub self_wounds: i32,
    /// Extra armor penetration accumulated on this batch of hits.
    pub ap_bonus: i32,
}

impl HitState {
    /// Pointwise sum of two batch aggregates.
    pub fn add(&self, other: &HitState) -> HitState {
        HitState {
            hits: self.hits + other.hits,
            natural_sixes: self.natural_sixes + other.natural_sixes,
            natural_ones: self.natural_ones + other.natural_ones,
            direct_wounds: self.direct_wounds + other.direct_wounds,
            self_wounds: self.self_wounds + other.self_wounds,
            ap_bonus: self.ap_bonus + other.ap_bonus,
        }
    }

    /// Copy with `delta` more direct wounds, clamped at zero.
    pub fn add_direct_wounds(&self, delta: i32) -> HitState {
        HitState {
            direct_wounds: (self.direct_wounds + delta).max(0),
            ..*self
        }
    }

    /// Copy with `delta` more self-inflicted wounds, clamped at zero.
    pub fn add_self_wounds(&self, delta: i32) -> HitState {
        HitState {
            self_wounds: (self.self_wounds + delta).max(0),
            ..*self
        }
    }

    /// Copy with `delta` more armor-penetration bonus, clamped at zero.
    pub fn add_ap_bonus(&self, delta: i32) -> HitState {
        HitState {
            ap_bonus: (self.ap_bonus + delta).max(0),
            ..*self
        }
    }
}

/// Exact hit distribution for `dice` d6 against a minimum face of `target`.
///
/// A natural 1 always fails and a natural 6 always succeeds; faces from
/// `max(target, 2)` to 5 succeed as plain hits. With `reroll_sixes`, a
/// rolled 6 is rolled once more and the reroll stands, so only a six
/// followed by a six counts as a natural six.
///
/// # Examples
///
/// ```rust
/// use wardice::hit_roll_distribution;
///
/// let d = hit_roll_distribution(4, 4, false);
/// assert!((d.total_mass() - 1.0).abs() < 1e-9);
/// // Success on 4, 5, or 6: expected hits = 4 * 3/6.
/// assert!((d.expectation(|s| s.hits as f64) - 2.0).abs() < 1e-9);
/// ```
pub fn hit_roll_distribution(dice: i32, target: i32, reroll_sixes: bool) -> Distribution<HitState> {
    let mut distribution = Distribution::certain(HitState::default());
    if dice <= 0 {
        return distribution;
    }
    let single = single_roll_distribution(target, reroll_sixes);
    for _ in 0..dice {
        distribution = distribution.product(&single, |left, right| left.add(right));
    }
    distribution
}

/// Distribution of one hit die.
fn single_roll_distribution(target: i32, reroll_sixes: bool) -> Distribution<HitState> {
    let quality = target.max(2);

    let plain_faces = if quality <= 5 { 5 - quality + 1 } else { 0 };

    let mut natural_one = FACE_PROBABILITY;
    let mut natural_six = FACE_PROBABILITY;
    let mut plain_success = plain_faces as f64 * FACE_PROBABILITY;
    let mut failure = (1.0 - (natural_one + natural_six + plain_success)).max(0.0);

    if reroll_sixes {
        // The six is rolled again without the flag; the initial 1/6 mass
        // redistributes over the plain single-die outcomes.
        natural_six = FACE_PROBABILITY * FACE_PROBABILITY;
        natural_one += FACE_PROBABILITY * FACE_PROBABILITY;
        plain_success += plain_success * FACE_PROBABILITY;
        failure += failure * FACE_PROBABILITY;
    }

    Distribution::new([
        (
            HitState {
                natural_ones: 1,
                ..HitState::default()
            },
            natural_one,
        ),
        (
            HitState {
                hits: 1,
                natural_sixes: 1,
                ..HitState::default()
            },
            natural_six,
        ),
        (
            HitState {
                hits: 1,
                ..HitState::default()
            },
            plain_success,
        ),
        (HitState::default(), failure),
    ])
}

/// Exact binomial distribution of successes over `trials` attempts.
///
/// # Examples
///
/// ```rust
/// use wardice::binomial;
///
/// let d = binomial(3, 0.5);
/// assert!((d.expectation(|&k| k as f64) - 1.5).abs() < 1e-9);
/// ```
pub fn binomial(trials: i32, success_probability: f64) -> Distribution<i32> {
    if trials <= 0 {
        return Distribution::certain(0);
    }
    let p = success_probability.clamp(0.0, 1.0);
    let mut outcomes = Vec::with_capacity(trials as usize + 1);
    let mut coefficient = 1.0;
    for k in 0..=trials {
        if k > 0 {
            coefficient *= (trials - (k - 1)) as f64 / k as f64;
        }
        let mass = coefficient * p.powi(k) * (1.0 - p).powi(trials - k);
        outcomes.push((k, mass));
    }
    Distribution::new(outcomes)
}

/// Probability that one save roll fails against `defense`.
///
/// A natural 1 always fails and a natural 6 always saves; a face `r` in
/// 2..=5 saves when `r - armor_penetration >= defense`. With
/// `force_six_reroll`, a natural six save is rolled once more without the
/// flag and the reroll stands.
///
/// # Examples
///
/// ```rust
/// use wardice::unsaved_probability;
///
/// // Unreachable defense: everything but the natural six fails.
/// assert_eq!(unsaved_probability(7, 0, false), 5.0 / 6.0);
/// ```
pub fn unsaved_probability(defense: i32, armor_penetration: i32, force_six_reroll: bool) -> f64 {
    let defense = defense.max(2);
    let mut failing_faces = 1; // natural 1
    for face in 2..=5 {
        if face - armor_penetration < defense {
            failing_faces += 1;
        }
    }
    let mut unsaved = failing_faces as f64 / 6.0;
    if force_six_reroll {
        unsaved += unsaved_probability(defense, armor_penetration, false) * FACE_PROBABILITY;
    }
    unsaved.clamp(0.0, 1.0)
}

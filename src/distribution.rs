//! Exact discrete probability distributions.
//!
//! `Distribution<T>` maps outcome values to probability mass. It is the
//! algebraic foundation of the engine: dice are convolved with [`product`],
//! rules transform outcomes with [`map`] and [`and_then`], and summary
//! statistics come from [`expectation`].
//!
//! Outcomes are stored in a `BTreeMap`, so iteration (and therefore
//! floating-point summation order) is fixed by the outcome ordering.
//! Identical inputs always produce bit-identical results.
//!
//! [`product`]: Distribution::product
//! [`map`]: Distribution::map
//! [`and_then`]: Distribution::and_then
//! [`expectation`]: Distribution::expectation

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Probability masses at or below this threshold are dropped on construction.
pub const MASS_EPSILON: f64 = 1e-12;

/// A discrete probability distribution over outcomes of type `T`.
///
/// Invariants maintained by every constructor:
/// - every stored entry has mass greater than [`MASS_EPSILON`];
/// - entries built from colliding keys have their masses summed;
/// - the total mass is renormalized to 1 (unless all mass was dropped).
///
/// # Examples
///
/// ```rust
/// use wardice::Distribution;
///
/// let d6 = Distribution::new((1..=6).map(|face| (face, 1.0 / 6.0)));
/// assert_eq!(d6.len(), 6);
/// assert!((d6.expectation(|&face| face as f64) - 3.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution<T: Ord> {
    masses: BTreeMap<T, f64>,
}

impl<T: Ord> Distribution<T> {
    /// Build a distribution from `(outcome, mass)` pairs.
    ///
    /// Colliding outcomes have their masses summed, masses at or below
    /// [`MASS_EPSILON`] are dropped, and the result is renormalized.
    pub fn new(entries: impl IntoIterator<Item = (T, f64)>) -> Self {
        let mut masses: BTreeMap<T, f64> = BTreeMap::new();
        for (outcome, mass) in entries {
            if mass > MASS_EPSILON {
                *masses.entry(outcome).or_insert(0.0) += mass;
            }
        }
        let mut distribution = Self { masses };
        distribution.normalize();
        distribution
    }

    /// A distribution with the whole mass on a single outcome.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wardice::Distribution;
    ///
    /// let sure = Distribution::certain(3);
    /// assert_eq!(sure.len(), 1);
    /// assert!((sure.total_mass() - 1.0).abs() < 1e-12);
    /// ```
    pub fn certain(outcome: T) -> Self {
        let mut masses = BTreeMap::new();
        masses.insert(outcome, 1.0);
        Self { masses }
    }

    /// Project each outcome through `f`, summing mass for colliding results.
    pub fn map<U: Ord>(&self, f: impl Fn(&T) -> U) -> Distribution<U> {
        let mut masses: BTreeMap<U, f64> = BTreeMap::new();
        for (outcome, &mass) in &self.masses {
            *masses.entry(f(outcome)).or_insert(0.0) += mass;
        }
        let mut distribution = Distribution { masses };
        distribution.normalize();
        distribution
    }

    /// Replace each outcome with a sub-distribution weighted by its mass.
    ///
    /// This is the monadic bind: it is how a rule applies a probabilistic
    /// transformation (for example, healing each unsaved wound with some
    /// chance) without leaving the exact-arithmetic world.
    pub fn and_then<U: Ord>(&self, f: impl Fn(&T) -> Distribution<U>) -> Distribution<U> {
        let mut masses: BTreeMap<U, f64> = BTreeMap::new();
        for (outcome, &mass) in &self.masses {
            let inner = f(outcome);
            for (inner_outcome, inner_mass) in inner.masses {
                let combined = mass * inner_mass;
                if combined > 0.0 {
                    *masses.entry(inner_outcome).or_insert(0.0) += combined;
                }
            }
        }
        let mut distribution = Distribution { masses };
        distribution.normalize();
        distribution
    }

    /// Pair this distribution independently with `other`.
    ///
    /// Every outcome of `self` is combined with every outcome of `other`
    /// via `combine`, with masses multiplied and colliding results summed.
    /// This is the convolution primitive: dice batches, weapon damage, and
    /// the two sides of an engagement are all folded together with it.
    pub fn product<U: Ord, V: Ord>(
        &self,
        other: &Distribution<U>,
        combine: impl Fn(&T, &U) -> V,
    ) -> Distribution<V> {
        let mut masses: BTreeMap<V, f64> = BTreeMap::new();
        for (left, &left_mass) in &self.masses {
            for (right, &right_mass) in &other.masses {
                let mass = left_mass * right_mass;
                if mass > 0.0 {
                    *masses.entry(combine(left, right)).or_insert(0.0) += mass;
                }
            }
        }
        let mut distribution = Distribution { masses };
        distribution.normalize();
        distribution
    }

    /// Probability-weighted sum of `f(outcome)`.
    pub fn expectation(&self, f: impl Fn(&T) -> f64) -> f64 {
        self.masses
            .iter()
            .map(|(outcome, mass)| mass * f(outcome))
            .sum()
    }

    /// Total probability mass currently stored.
    pub fn total_mass(&self) -> f64 {
        self.masses.values().sum()
    }

    /// Iterate over `(outcome, mass)` pairs in outcome order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.masses.iter().map(|(outcome, &mass)| (outcome, mass))
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    /// True when no outcome carries mass.
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    fn normalize(&mut self) {
        let total: f64 = self.masses.values().sum();
        if total <= 0.0 || (total - 1.0).abs() <= MASS_EPSILON {
            return;
        }
        let scale = 1.0 / total;
        for mass in self.masses.values_mut() {
            *mass *= scale;
        }
    }
}

impl<T: Ord + Clone> Distribution<T> {
    /// Weighted mixture of two distributions over the same outcome type.
    ///
    /// Used by rules that branch probabilistically between two whole
    /// resolution paths rather than transforming individual outcomes.
    pub fn blend(&self, other: &Self, self_weight: f64, other_weight: f64) -> Self {
        let left = self
            .masses
            .iter()
            .map(|(outcome, mass)| (outcome.clone(), mass * self_weight));
        let right = other
            .masses
            .iter()
            .map(|(outcome, mass)| (outcome.clone(), mass * other_weight));
        Self::new(left.chain(right))
    }

    /// Keep only outcomes with mass at or above `threshold`, renormalized.
    pub fn prune(&self, threshold: f64) -> Self {
        Self::new(
            self.masses
                .iter()
                .filter(|(_, &mass)| mass >= threshold)
                .map(|(outcome, &mass)| (outcome.clone(), mass)),
        )
    }
}

impl<T: Ord + Serialize> Serialize for Distribution<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.masses.iter())
    }
}

impl<'de, T: Ord + Deserialize<'de>> Deserialize<'de> for Distribution<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<(T, f64)>::deserialize(deserializer)?;
        Ok(Self::new(entries))
    }
}

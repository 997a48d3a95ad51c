//! Resource bundles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A bundle of named resource quantities.
///
/// Missing names count as zero. Quantities are signed so the same type
/// carries costs, incomes and deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceAmount(BTreeMap<String, i64>);

impl ResourceAmount {
    /// An empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, resource: impl Into<String>, amount: i64) -> Self {
        self.0.insert(resource.into(), amount);
        self
    }

    /// Quantity of `resource`.
    #[must_use]
    pub fn get(&self, resource: &str) -> i64 {
        self.0.get(resource).copied().unwrap_or(0)
    }

    /// Add `amount` to one resource.
    pub fn adjust(&mut self, resource: &str, amount: i64) {
        *self.0.entry(resource.to_owned()).or_insert(0) += amount;
    }

    /// Element-wise sum.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        let mut sum = self.clone();
        for (name, amount) in &other.0 {
            sum.adjust(name, *amount);
        }
        sum
    }

    /// Element-wise difference.
    #[must_use]
    pub fn minus(&self, other: &Self) -> Self {
        let mut diff = self.clone();
        for (name, amount) in &other.0 {
            diff.adjust(name, -amount);
        }
        diff
    }

    /// Every quantity divided by `divisor` (rounded down). A zero divisor
    /// returns the bundle unchanged.
    #[must_use]
    pub fn divide(&self, divisor: u32) -> Self {
        if divisor == 0 {
            return self.clone();
        }
        Self(
            self.0
                .iter()
                .map(|(name, amount)| (name.clone(), amount.div_euclid(i64::from(divisor))))
                .collect(),
        )
    }

    /// Payment `step` (1-based) of `turns` spreading this bundle over
    /// several turns. Every payment is rounded down except the last, which
    /// carries the remainder so all payments add up to the bundle.
    #[must_use]
    pub fn installment(&self, turns: u32, step: u32) -> Self {
        let share = self.divide(turns);
        if turns == 0 || step < turns {
            return share;
        }
        self.minus(&share.scaled(turns - 1))
    }

    /// Every quantity multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: u32) -> Self {
        Self(
            self.0
                .iter()
                .map(|(name, amount)| (name.clone(), amount * i64::from(factor)))
                .collect(),
        )
    }

    /// Whether every quantity in `cost` is available here.
    #[must_use]
    pub fn covers(&self, cost: &Self) -> bool {
        cost.0.iter().all(|(name, amount)| self.get(name) >= *amount)
    }

    /// Whether no quantity is negative.
    #[must_use]
    pub fn is_non_negative(&self) -> bool {
        self.0.values().all(|amount| *amount >= 0)
    }

    /// Iterate over `(resource, quantity)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, amount)| (name.as_str(), *amount))
    }
}

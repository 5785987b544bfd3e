//! Order-independent comparison that still counts duplicates.
//!
//! Sections and units are compared with a greedy first-fit claim: each item on the left claims
//! the first unclaimed item on the right it matches. This is not a maximum matching.

use crate::Unit;
use crate::section::{OptionValue, Section};

/// Semantic equality. Never fails.
pub trait Match {
    fn matches(&self, other: &Self) -> bool;
}

impl Match for OptionValue {
    fn matches(&self, other: &Self) -> bool {
        self.name() == other.name() && self.value() == other.value()
    }
}

impl Match for Section {
    fn matches(&self, other: &Self) -> bool {
        if self.name() != other.name() || self.options().len() != other.options().len() {
            return false;
        }

        let mut claimed = vec![false; other.options().len()];
        for left in self.options() {
            for (i, right) in other.options().iter().enumerate() {
                if !claimed[i] && left.matches(right) {
                    claimed[i] = true;
                    break;
                }
            }
        }

        claimed.into_iter().all(|c| c)
    }
}

impl Match for Unit {
    fn matches(&self, other: &Self) -> bool {
        let (left, right) = (self.sections(), other.sections());
        if left.len() != right.len() {
            return false;
        }

        let last = right.len().saturating_sub(1);
        let mut claimed = vec![false; right.len()];
        for section in left {
            for (i, candidate) in right.iter().enumerate() {
                if !claimed[i] && section.matches(candidate) {
                    claimed[i] = true;
                    break;
                }
                if i == last {
                    return false;
                }
            }
        }

        true
    }
}

/// Whether `a` and `b` hold the same sections with the same options, ignoring order.
#[must_use]
pub fn units_equivalent(a: &Unit, b: &Unit) -> bool {
    a.matches(b)
}

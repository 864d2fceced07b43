//! The filter engine — user-selected predicates over the normalized set.
//!
//! RULES:
//!   - An empty selected set is a wildcard, never "exclude all".
//!   - The date range applies to the policy-start date, inclusive both ends;
//!     a record without a policy-start date is excluded once a bound is set.
//!   - Active filters combine with logical AND.
//!   - Pure function over an immutable snapshot; input order is preserved.

use crate::{record::ClaimRecord, types::Category};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub states: BTreeSet<Category>,
    pub channels: BTreeSet<Category>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterCriteria {
    /// Criteria with no restriction at all; `apply` is the identity.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn with_states<I: IntoIterator<Item = Category>>(mut self, states: I) -> Self {
        self.states = states.into_iter().collect();
        self
    }

    pub fn with_channels<I: IntoIterator<Item = Category>>(mut self, channels: I) -> Self {
        self.channels = channels.into_iter().collect();
        self
    }

    pub fn with_date_range(
        mut self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    fn matches(&self, record: &ClaimRecord) -> bool {
        if !self.states.is_empty() {
            match &record.state {
                Some(state) if self.states.contains(state) => {}
                _ => return false,
            }
        }
        if !self.channels.is_empty() {
            match &record.channel {
                Some(channel) if self.channels.contains(channel) => {}
                _ => return false,
            }
        }
        if self.start_date.is_some() || self.end_date.is_some() {
            // Inclusion cannot be evaluated without a policy-start date.
            let Some(start) = record.policy_start else {
                return false;
            };
            if let Some(from) = self.start_date {
                if start < from {
                    return false;
                }
            }
            if let Some(to) = self.end_date {
                if start > to {
                    return false;
                }
            }
        }
        true
    }

    /// Apply every active predicate, returning the kept records in input
    /// order.
    pub fn apply(&self, records: &[ClaimRecord]) -> Vec<ClaimRecord> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

//! The normalized claim record — one row of input, immutable after ingestion.
//!
//! Derived fields (day deltas, death-month bucket) are computed exactly once
//! when the record is built. A derived day count is `None` whenever either
//! input date is missing; it is never coerced to zero.

use crate::types::{Category, DayCount, PolicyId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub policy_id: PolicyId,
    pub state: Option<Category>,
    pub city: Option<Category>,
    pub postcode: Option<Category>,
    pub channel: Option<Category>,
    pub policy_start: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub intimation_date: Option<NaiveDate>,
    /// `None` for blank/NA cells; the "No Fraud" sentinel is kept verbatim.
    pub fraud_category: Option<String>,

    // Derived at ingestion.
    pub policy_to_death_days: Option<DayCount>,
    pub death_to_intimation_days: Option<DayCount>,
    /// First day of the death month, used for chronological bucketing.
    pub death_month: Option<NaiveDate>,
}

impl ClaimRecord {
    /// Build a record from its parsed fields, computing the derived ones.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        policy_id: PolicyId,
        state: Option<Category>,
        city: Option<Category>,
        postcode: Option<Category>,
        channel: Option<Category>,
        policy_start: Option<NaiveDate>,
        death_date: Option<NaiveDate>,
        intimation_date: Option<NaiveDate>,
        fraud_category: Option<String>,
    ) -> Self {
        let policy_to_death_days = match (policy_start, death_date) {
            (Some(start), Some(death)) => Some(death.signed_duration_since(start).num_days()),
            _ => None,
        };
        let death_to_intimation_days = match (death_date, intimation_date) {
            (Some(death), Some(intimation)) => {
                Some(intimation.signed_duration_since(death).num_days())
            }
            _ => None,
        };
        let death_month = death_date
            .and_then(|d| NaiveDate::from_ymd_opt(d.year(), d.month(), 1));

        Self {
            policy_id,
            state,
            city,
            postcode,
            channel,
            policy_start,
            death_date,
            intimation_date,
            fraud_category,
            policy_to_death_days,
            death_to_intimation_days,
            death_month,
        }
    }

    /// Whether this record carries an actual fraud determination: the
    /// category is present and is not the "no fraud" sentinel.
    pub fn is_fraud(&self, no_fraud_sentinel: &str) -> bool {
        matches!(&self.fraud_category, Some(category) if category != no_fraud_sentinel)
    }
}

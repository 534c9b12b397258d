//! Subscription plan types
//!
//! A plan carries a cost table and a length. Fixed-length plans have one price
//! (the `fixed` entry) and renew for their stored length. Flexible plans price
//! each renewal period separately and the paid amount decides which period the
//! member bought.

use super::SubscriptionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seconds per renewal unit
const DAY_SECONDS: i64 = 86_400;
const WEEK_SECONDS: i64 = 604_800;
const MONTH_SECONDS: i64 = 2_629_743;
const YEAR_SECONDS: i64 = 31_556_926;

/// Renewal period unit
///
/// Identified by a single uppercase code letter, which is also the first
/// letter of the cost table key that prices it (`year` → `Y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationUnit {
    Day,
    Week,
    Month,
    Year,
}

impl DurationUnit {
    /// Parse a unit from its code letter (case-insensitive)
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'D' => Some(DurationUnit::Day),
            'W' => Some(DurationUnit::Week),
            'M' => Some(DurationUnit::Month),
            'Y' => Some(DurationUnit::Year),
            _ => None,
        }
    }

    /// The uppercase code letter for this unit
    pub fn code(self) -> char {
        match self {
            DurationUnit::Day => 'D',
            DurationUnit::Week => 'W',
            DurationUnit::Month => 'M',
            DurationUnit::Year => 'Y',
        }
    }

    /// Length of one unit in seconds
    pub fn seconds(self) -> i64 {
        match self {
            DurationUnit::Day => DAY_SECONDS,
            DurationUnit::Week => WEEK_SECONDS,
            DurationUnit::Month => MONTH_SECONDS,
            DurationUnit::Year => YEAR_SECONDS,
        }
    }
}

/// Plan length
///
/// Stored as `F` for flexible plans, or `<count><unit>` (e.g. `6M`) for
/// fixed-length plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanLength {
    /// Renews for a fixed number of units at the plan's fixed price
    Fixed { count: u32, unit: DurationUnit },
    /// Renewal period is chosen by the amount paid
    Flexible,
}

impl PlanLength {
    /// Length of one renewal in seconds, `None` for flexible plans
    pub fn seconds(&self) -> Option<i64> {
        match self {
            PlanLength::Fixed { count, unit } => Some(i64::from(*count) * unit.seconds()),
            PlanLength::Flexible => None,
        }
    }

    pub fn is_flexible(&self) -> bool {
        matches!(self, PlanLength::Flexible)
    }
}

impl FromStr for PlanLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("F") {
            return Ok(PlanLength::Flexible);
        }

        let mut chars = s.chars();
        let unit = chars
            .next_back()
            .and_then(DurationUnit::from_code)
            .ok_or_else(|| format!("Invalid plan length unit in '{}'", s))?;
        let count: u32 = chars
            .as_str()
            .parse()
            .map_err(|_| format!("Invalid plan length count in '{}'", s))?;
        if count == 0 {
            return Err(format!("Plan length '{}' must be at least one unit", s));
        }

        Ok(PlanLength::Fixed { count, unit })
    }
}

impl fmt::Display for PlanLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanLength::Fixed { count, unit } => write!(f, "{}{}", count, unit.code()),
            PlanLength::Flexible => write!(f, "F"),
        }
    }
}

/// Price for one renewal period of a flexible plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationPrice {
    /// Period key as configured by the administrator (`day`, `week`, `month`, `year`)
    pub duration: String,
    /// Price of one period
    pub price: Decimal,
}

impl DurationPrice {
    pub fn new(duration: impl Into<String>, price: Decimal) -> Self {
        DurationPrice {
            duration: duration.into(),
            price,
        }
    }

    /// Unit derived from the first letter of the period key
    pub fn unit(&self) -> Option<DurationUnit> {
        self.duration.chars().next().and_then(DurationUnit::from_code)
    }
}

/// Plan cost table
///
/// `durations` keeps the order the administrator entered the periods in; the
/// first matching period wins when a flexible payment is matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostTable {
    /// Price of a fixed-length renewal
    pub fixed: Option<Decimal>,
    /// Per-period prices of a flexible plan
    pub durations: Vec<DurationPrice>,
}

impl CostTable {
    /// Cost table for a fixed-length plan
    pub fn fixed(price: Decimal) -> Self {
        CostTable {
            fixed: Some(price),
            durations: Vec::new(),
        }
    }

    /// Add a flexible period price, keeping insertion order
    pub fn with_duration(mut self, duration: impl Into<String>, price: Decimal) -> Self {
        self.durations.push(DurationPrice::new(duration, price));
        self
    }
}

/// Subscription plan record
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionPlan {
    pub id: SubscriptionId,
    pub name: String,
    pub cost: CostTable,
    pub length: PlanLength,
}

//! Projected delivery dates from product lead times.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Unit of a product's lead time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DurationUnit {
    Days,
    Weeks,
    Months,
}

impl DurationUnit {
    /// Parses a stored unit. Missing or unrecognized units count as days.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("WEEKS") => Self::Weeks,
            Some("MONTHS") => Self::Months,
            _ => Self::Days,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Days => "DAYS",
            Self::Weeks => "WEEKS",
            Self::Months => "MONTHS",
        }
    }
}

/// Lead time of a product, as supplied by the product catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadTime {
    pub amount: i64,
    pub unit: DurationUnit,
}

impl LeadTime {
    pub fn new(amount: i64, unit: DurationUnit) -> Self {
        Self { amount, unit }
    }

    /// Builds a lead time from raw catalog columns; NULL amounts become zero.
    pub fn from_columns(amount: Option<i64>, unit: Option<&str>) -> Self {
        Self {
            amount: amount.unwrap_or(0),
            unit: DurationUnit::parse_lenient(unit),
        }
    }

    /// The date an order placed on `date_ordered` is expected to ship.
    pub fn delivery_date(&self, date_ordered: NaiveDate) -> NaiveDate {
        delivery_date(date_ordered, Some(self.amount), self.unit)
    }
}

/// Projects a delivery date.
///
/// Non-positive or missing amounts leave the order date unchanged. Month
/// arithmetic is calendar-aware and clamps to the end of shorter months.
/// Results beyond chrono's date range saturate at the order date.
pub fn delivery_date(date_ordered: NaiveDate, amount: Option<i64>, unit: DurationUnit) -> NaiveDate {
    let amount = match amount {
        Some(n) if n > 0 => n,
        _ => return date_ordered,
    };

    let projected = match unit {
        DurationUnit::Days => u64::try_from(amount)
            .ok()
            .and_then(|n| date_ordered.checked_add_days(Days::new(n))),
        DurationUnit::Weeks => u64::try_from(amount)
            .ok()
            .and_then(|n| n.checked_mul(7))
            .and_then(|n| date_ordered.checked_add_days(Days::new(n))),
        DurationUnit::Months => u32::try_from(amount)
            .ok()
            .and_then(|n| date_ordered.checked_add_months(Months::new(n))),
    };

    projected.unwrap_or(date_ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_days() {
        assert_eq!(
            delivery_date(date("2024-01-10"), Some(5), DurationUnit::Days),
            date("2024-01-15")
        );
    }

    #[test]
    fn test_weeks() {
        assert_eq!(
            delivery_date(date("2024-01-10"), Some(2), DurationUnit::Weeks),
            date("2024-01-24")
        );
    }

    #[test]
    fn test_months_clamp_to_leap_day() {
        assert_eq!(
            delivery_date(date("2024-01-31"), Some(1), DurationUnit::Months),
            date("2024-02-29")
        );
        assert_eq!(
            delivery_date(date("2023-01-31"), Some(1), DurationUnit::Months),
            date("2023-02-28")
        );
        assert_eq!(
            delivery_date(date("2024-11-15"), Some(3), DurationUnit::Months),
            date("2025-02-15")
        );
    }

    #[test]
    fn test_zero_negative_and_missing_amounts() {
        let d = date("2024-03-01");
        for unit in [DurationUnit::Days, DurationUnit::Weeks, DurationUnit::Months] {
            assert_eq!(delivery_date(d, Some(0), unit), d);
            assert_eq!(delivery_date(d, Some(-4), unit), d);
            assert_eq!(delivery_date(d, None, unit), d);
        }
    }

    #[test]
    fn test_unrecognized_unit_counts_as_days() {
        assert_eq!(DurationUnit::parse_lenient(Some("fortnights")), DurationUnit::Days);
        assert_eq!(DurationUnit::parse_lenient(None), DurationUnit::Days);
        assert_eq!(DurationUnit::parse_lenient(Some(" weeks ")), DurationUnit::Weeks);
        assert_eq!(DurationUnit::parse_lenient(Some("Months")), DurationUnit::Months);

        let lead = LeadTime::from_columns(Some(3), Some("fortnights"));
        assert_eq!(lead.delivery_date(date("2024-01-10")), date("2024-01-13"));
    }

    #[test]
    fn test_overflow_saturates_at_order_date() {
        let d = date("2024-01-10");
        assert_eq!(delivery_date(d, Some(i64::MAX), DurationUnit::Weeks), d);
        assert_eq!(delivery_date(d, Some(i64::MAX), DurationUnit::Months), d);
    }
}

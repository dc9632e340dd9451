//! Shapes returned to dashboards and tracking screens.

use chrono::NaiveDate;
use serde::Serialize;

use super::status::OrderStatus;

/// Label shown for a stage nobody has been assigned to.
pub const UNASSIGNED: &str = "Unassigned";

/// One production stage of an order, as seen by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    pub stage: String,
    pub employee_id: Option<i64>,
    /// Assignee's name, or [`UNASSIGNED`].
    pub employee_name: String,
    pub completed: bool,
}

/// One production stage of an order, as seen by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStage {
    pub stage: String,
    pub completed: bool,
}

/// An order with its projected delivery date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: i64,
    pub user_id: i64,
    pub product_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub date_ordered: String,
    /// `None` when the stored order date cannot be parsed.
    pub delivery_date: Option<NaiveDate>,
    pub status: OrderStatus,
    pub progress_percent: i64,
}

/// A stage on an employee's work list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTask {
    pub order_id: i64,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub completed: bool,
}

/// Which orders `list_orders` returns.
#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    /// Restrict to one customer's orders.
    pub user_id: Option<i64>,
}

/// Parses a stored order date (`YYYY-MM-DD`, optionally followed by a time).
pub fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_date() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(parse_order_date("2024-01-10"), Some(d));
        assert_eq!(parse_order_date(" 2024-01-10 "), Some(d));
        assert_eq!(parse_order_date("2024-01-10 14:22:01"), Some(d));
        assert_eq!(parse_order_date("yesterday"), None);
        assert_eq!(parse_order_date(""), None);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = OrderSummary {
            order_id: 4,
            user_id: 2,
            product_id: 9,
            product_name: None,
            date_ordered: "2024-01-10".to_string(),
            delivery_date: NaiveDate::from_ymd_opt(2024, 1, 24),
            status: OrderStatus::Processing,
            progress_percent: 27,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["progressPercent"], 27);
        assert_eq!(json["status"], "PROCESSING");
        assert_eq!(json["deliveryDate"], "2024-01-24");
        assert!(json.get("productName").is_none());
    }
}

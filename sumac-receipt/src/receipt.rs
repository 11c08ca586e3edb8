//! Canonical receipt data model
//!
//! Callers hand us loosely-typed order payloads accumulated over years of
//! front-end revisions: optional fields, typo'd aliases, numbers that are
//! sometimes strings. All of that is absorbed here in a single
//! normalization step, so downstream consumers (classifier, renderers,
//! dispatcher) only ever see one canonical, fully-typed shape.

use crate::money::{round_money, sanitize_amount, sanitize_quantity};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Logical destination of a receipt, distinct from the physical device
/// it resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterRole {
    Customer,
    Kitchen,
}

impl std::fmt::Display for PrinterRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrinterRole::Customer => write!(f, "customer"),
            PrinterRole::Kitchen => write!(f, "kitchen"),
        }
    }
}

/// Service mode of the order, drives which metadata block is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
}

// ============================================================================
// Caller-supplied input (partial, loosely typed)
// ============================================================================

/// Raw order payload as supplied by the caller
///
/// Every field is optional and numerics are accepted as numbers or
/// numeric strings. Known historical aliases are absorbed here and
/// nowhere else.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptInput {
    #[serde(default, alias = "orderId", alias = "orderNo")]
    pub order_number: Option<String>,

    /// Epoch milliseconds; absent means "now"
    #[serde(default, deserialize_with = "lenient_f64")]
    pub timestamp: Option<f64>,

    #[serde(default)]
    pub cashier_name: Option<String>,
    #[serde(default)]
    pub cashier_name_localized: Option<String>,

    #[serde(default, alias = "type")]
    pub order_type: Option<String>,
    #[serde(default, alias = "table")]
    pub table_number: Option<String>,

    #[serde(default)]
    pub customer_name: Option<String>,
    // "custtPhone" is a long-lived front-end typo still present in the wild
    #[serde(default, alias = "custPhone", alias = "custtPhone")]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,

    #[serde(default, alias = "items")]
    pub order_items: Vec<ItemInput>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tax: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub discount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total: Option<f64>,

    #[serde(default)]
    pub payments: Vec<PaymentInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub localized_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    #[serde(default = "default_payment_method")]
    pub method: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
}

fn default_payment_method() -> String {
    "cash".to_string()
}

/// Accept a numeric field as number, numeric string or null
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

// ============================================================================
// Canonical model
// ============================================================================

/// Fully normalized receipt, safe to render
#[derive(Debug, Clone)]
pub struct Receipt {
    pub order_number: String,
    pub timestamp: DateTime<Utc>,
    pub cashier_name: Option<String>,
    pub cashier_name_localized: Option<String>,
    pub order_type: OrderType,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone)]
pub struct LineItem {
    pub name: String,
    pub localized_name: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub cancelled: bool,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        round_money(self.quantity * self.unit_price)
    }
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub method: String,
    pub amount: Decimal,
}

impl ReceiptInput {
    /// Normalize into the canonical shape
    ///
    /// - missing/malformed amounts become 0, quantities become 1
    /// - subtotal is recomputed from line items when absent or zero
    /// - total is recomputed as subtotal + tax - discount when absent or
    ///   zero, so the output can never show a corrupted grand total
    pub fn normalize(self) -> Receipt {
        let items: Vec<LineItem> = self
            .order_items
            .into_iter()
            .map(|i| LineItem {
                name: i.name.unwrap_or_else(|| "-".to_string()),
                localized_name: i.localized_name.filter(|s| !s.trim().is_empty()),
                quantity: sanitize_quantity(i.quantity),
                unit_price: sanitize_amount(i.price),
                cancelled: i.cancelled,
            })
            .collect();

        let computed_subtotal: Decimal = items
            .iter()
            .filter(|i| !i.cancelled)
            .map(|i| i.line_total())
            .sum();

        let subtotal = match sanitize_amount(self.subtotal) {
            s if s > Decimal::ZERO => s,
            _ => computed_subtotal,
        };
        let tax = sanitize_amount(self.tax);
        let discount = sanitize_amount(self.discount);

        let total = match sanitize_amount(self.total) {
            t if t > Decimal::ZERO => t,
            _ => round_money(subtotal + tax - discount),
        };

        let order_type = parse_order_type(self.order_type.as_deref(), self.table_number.is_some());

        let timestamp = self
            .timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single())
            .unwrap_or_else(Utc::now);

        Receipt {
            order_number: self.order_number.unwrap_or_else(|| "-".to_string()),
            timestamp,
            cashier_name: self.cashier_name,
            cashier_name_localized: self.cashier_name_localized,
            order_type,
            table_number: self.table_number,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_address: self.customer_address,
            items,
            subtotal: round_money(subtotal),
            tax: round_money(tax),
            discount: round_money(discount),
            total,
            payments: self
                .payments
                .into_iter()
                .map(|p| Payment {
                    method: p.method.trim().to_lowercase(),
                    amount: sanitize_amount(p.amount),
                })
                .collect(),
        }
    }
}

fn parse_order_type(raw: Option<&str>, has_table: bool) -> OrderType {
    match raw.map(|s| s.trim().to_lowercase()) {
        Some(s) if matches!(s.as_str(), "dine_in" | "dine-in" | "dinein" | "dine in") => {
            OrderType::DineIn
        }
        Some(s) if s == "delivery" => OrderType::Delivery,
        Some(s) if matches!(s.as_str(), "takeaway" | "take_away" | "take-away" | "pickup") => {
            OrderType::Takeaway
        }
        // Unknown or absent: infer from the presence of a table
        _ => {
            if has_table {
                OrderType::DineIn
            } else {
                OrderType::Takeaway
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input_from(value: serde_json::Value) -> ReceiptInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_computes_totals() {
        let input = input_from(json!({
            "orderNumber": "1001",
            "orderItems": [
                {"name": "Tea", "quantity": 3, "price": 5.00}
            ],
            "tax": 1.5,
            "discount": 0
        }));

        let receipt = input.normalize();
        assert_eq!(receipt.order_number, "1001");
        assert_eq!(receipt.subtotal, Decimal::new(1500, 2));
        assert_eq!(receipt.total, Decimal::new(1650, 2));
        assert_eq!(receipt.items[0].quantity, Decimal::from(3));
    }

    #[test]
    fn test_supplied_total_wins() {
        let input = input_from(json!({
            "orderItems": [{"name": "Tea", "quantity": 1, "price": 5.0}],
            "total": 20.0
        }));
        assert_eq!(input.normalize().total, Decimal::from(20));
    }

    #[test]
    fn test_phone_aliases_absorbed() {
        let a = input_from(json!({"custPhone": "0501234567"}));
        let b = input_from(json!({"custtPhone": "0501234567"}));
        let c = input_from(json!({"customerPhone": "0501234567"}));
        assert_eq!(a.customer_phone.as_deref(), Some("0501234567"));
        assert_eq!(b.customer_phone.as_deref(), Some("0501234567"));
        assert_eq!(c.customer_phone.as_deref(), Some("0501234567"));
    }

    #[test]
    fn test_order_number_aliases_absorbed() {
        let a = input_from(json!({"orderNo": "1001"}));
        let b = input_from(json!({"orderId": "1001"}));
        assert_eq!(a.order_number.as_deref(), Some("1001"));
        assert_eq!(b.order_number.as_deref(), Some("1001"));
    }

    #[test]
    fn test_malformed_numerics_degrade() {
        let input = input_from(json!({
            "orderItems": [
                {"name": "Tea", "quantity": "3", "price": "abc"},
                {"name": "Cake"}
            ],
            "tax": "oops"
        }));

        let receipt = input.normalize();
        assert_eq!(receipt.items[0].quantity, Decimal::from(3));
        assert_eq!(receipt.items[0].unit_price, Decimal::ZERO);
        assert_eq!(receipt.items[1].quantity, Decimal::ONE);
        assert_eq!(receipt.tax, Decimal::ZERO);
    }

    #[test]
    fn test_cancelled_lines_excluded_from_subtotal() {
        let input = input_from(json!({
            "orderItems": [
                {"name": "Tea", "quantity": 2, "price": 5.0},
                {"name": "Cake", "quantity": 1, "price": 9.0, "cancelled": true}
            ]
        }));

        let receipt = input.normalize();
        assert_eq!(receipt.subtotal, Decimal::from(10));
        assert_eq!(receipt.total, Decimal::from(10));
    }

    #[test]
    fn test_order_type_inference() {
        let dine_in = input_from(json!({"table": "12"})).normalize();
        assert_eq!(dine_in.order_type, OrderType::DineIn);

        let takeaway = input_from(json!({})).normalize();
        assert_eq!(takeaway.order_type, OrderType::Takeaway);

        let delivery = input_from(json!({"orderType": "delivery"})).normalize();
        assert_eq!(delivery.order_type, OrderType::Delivery);
    }

    #[test]
    fn test_empty_input_is_safe() {
        let receipt = ReceiptInput::default().normalize();
        assert_eq!(receipt.order_number, "-");
        assert_eq!(receipt.total, Decimal::ZERO);
        assert!(receipt.items.is_empty());
    }
}

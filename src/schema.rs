/// Source schema for the transaction table.
///
/// Every column the pipeline understands is a `Field`. Each field has a
/// fixed `FieldKind` that decides how the normalizer coerces it. Columns
/// outside this list are carried by the raw table but never normalized.

use serde::Serialize;
use std::fmt;

/// How a field's raw values are coerced during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Order / customer identifiers: non-empty text or null.
    Identifier,
    /// Region, category and payment type: a value or the unset sentinel.
    Categorical,
    /// Prices and payment values: finite f64 or null.
    Numeric,
    /// Order lifecycle timestamps: a valid instant or null.
    Timestamp,
}

/// A known column of the transaction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Field {
    #[serde(rename = "order_id")]
    OrderId,
    #[serde(rename = "customer_id")]
    CustomerId,
    #[serde(rename = "customer_state")]
    CustomerState,
    #[serde(rename = "product_category_name_english")]
    ProductCategory,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "payment_type")]
    PaymentType,
    #[serde(rename = "payment_value")]
    PaymentValue,
    #[serde(rename = "order_purchase_timestamp")]
    PurchasedAt,
    #[serde(rename = "order_approved_at")]
    ApprovedAt,
    #[serde(rename = "order_delivered_carrier_date")]
    DeliveredCarrierAt,
    #[serde(rename = "order_delivered_customer_date")]
    DeliveredCustomerAt,
    #[serde(rename = "order_estimated_delivery_date")]
    EstimatedDeliveryAt,
}

impl Field {
    /// All known fields, in canonical column order.
    pub const ALL: [Field; 12] = [
        Field::OrderId,
        Field::CustomerId,
        Field::CustomerState,
        Field::ProductCategory,
        Field::Price,
        Field::PaymentType,
        Field::PaymentValue,
        Field::PurchasedAt,
        Field::ApprovedAt,
        Field::DeliveredCarrierAt,
        Field::DeliveredCustomerAt,
        Field::EstimatedDeliveryAt,
    ];

    /// The five order lifecycle timestamps.
    pub const TIMESTAMPS: [Field; 5] = [
        Field::PurchasedAt,
        Field::ApprovedAt,
        Field::DeliveredCarrierAt,
        Field::DeliveredCustomerAt,
        Field::EstimatedDeliveryAt,
    ];

    /// Column name as it appears in the source header.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::OrderId => "order_id",
            Field::CustomerId => "customer_id",
            Field::CustomerState => "customer_state",
            Field::ProductCategory => "product_category_name_english",
            Field::Price => "price",
            Field::PaymentType => "payment_type",
            Field::PaymentValue => "payment_value",
            Field::PurchasedAt => "order_purchase_timestamp",
            Field::ApprovedAt => "order_approved_at",
            Field::DeliveredCarrierAt => "order_delivered_carrier_date",
            Field::DeliveredCustomerAt => "order_delivered_customer_date",
            Field::EstimatedDeliveryAt => "order_estimated_delivery_date",
        }
    }

    /// Look up a field by its source column name (exact match).
    pub fn from_column_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.column_name() == name)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::OrderId | Field::CustomerId => FieldKind::Identifier,
            Field::CustomerState | Field::ProductCategory | Field::PaymentType => {
                FieldKind::Categorical
            }
            Field::Price | Field::PaymentValue => FieldKind::Numeric,
            Field::PurchasedAt
            | Field::ApprovedAt
            | Field::DeliveredCarrierAt
            | Field::DeliveredCustomerAt
            | Field::EstimatedDeliveryAt => FieldKind::Timestamp,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_column_name(field.column_name()), Some(field));
        }
        assert_eq!(Field::from_column_name("seller_id"), None);
        assert_eq!(Field::from_column_name("Price"), None);
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(Field::CustomerState.kind(), FieldKind::Categorical);
        assert_eq!(Field::PaymentValue.kind(), FieldKind::Numeric);
        assert_eq!(Field::CustomerId.kind(), FieldKind::Identifier);
        for field in Field::TIMESTAMPS {
            assert_eq!(field.kind(), FieldKind::Timestamp);
        }
    }

    #[test]
    fn test_serializes_as_column_name() {
        let json = serde_json::to_string(&Field::ProductCategory).unwrap();
        assert_eq!(json, "\"product_category_name_english\"");
    }
}

//! Checkout form and order payload types.
//!
//! [`CheckoutForm`] is what the customer types in; [`CustomerDetails`] is
//! the validated, trimmed result. [`OrderRequest`] and [`OrderItemRequest`]
//! are the bodies of the two backend calls that record an order.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{FlowerId, OrderId};
use crate::item::CartLineItem;
use crate::money::{serialize_as_number, Money};

/// Raw customer input from the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub first_name: String,
    pub telegram_username: String,
    pub phone_number: String,
    pub address: String,
}

/// Customer details after validation. Every field is trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub telegram_username: String,
    pub phone_number: String,
    pub address: String,
}

impl CheckoutForm {
    /// Trims every field and requires all four to be present.
    ///
    /// Fields are checked in form order, so the first missing one is reported.
    pub fn validate(&self) -> Result<CustomerDetails, CoreError> {
        fn required(value: &str, field: &'static str) -> Result<String, CoreError> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(CoreError::MissingField { field });
            }
            Ok(trimmed.to_string())
        }

        Ok(CustomerDetails {
            name: required(&self.first_name, "first_name")?,
            telegram_username: required(&self.telegram_username, "telegram_username")?,
            phone_number: required(&self.phone_number, "phone_number")?,
            address: required(&self.address, "address")?,
        })
    }
}

/// Body of the order-creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub telegram_username: String,
}

impl From<&CustomerDetails> for OrderRequest {
    fn from(customer: &CustomerDetails) -> Self {
        OrderRequest {
            name: customer.name.clone(),
            phone_number: customer.phone_number.clone(),
            address: customer.address.clone(),
            telegram_username: customer.telegram_username.clone(),
        }
    }
}

/// Body of the order-item creation call, one per cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemRequest {
    pub flower_id: FlowerId,
    pub order_id: OrderId,
    pub quantity: u32,
    #[serde(serialize_with = "serialize_as_number")]
    pub price: Money,
}

impl OrderItemRequest {
    pub fn for_line(order_id: &OrderId, line: &CartLineItem) -> Self {
        OrderItemRequest {
            flower_id: line.id.clone(),
            order_id: order_id.clone(),
            quantity: line.quantity,
            price: line.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::CatalogItem;

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            first_name: "  Aziza ".into(),
            telegram_username: "@aziza".into(),
            phone_number: " +998 90 123 45 67".into(),
            address: "Tashkent, Chilonzor 5".into(),
        }
    }

    #[test]
    fn validate_trims_fields() {
        let details = filled_form().validate().unwrap();
        assert_eq!(details.name, "Aziza");
        assert_eq!(details.phone_number, "+998 90 123 45 67");
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let mut form = filled_form();
        form.telegram_username = "   ".into();
        form.address = String::new();
        assert_eq!(
            form.validate(),
            Err(CoreError::MissingField {
                field: "telegram_username"
            })
        );
    }

    #[test]
    fn empty_form_is_rejected() {
        assert_eq!(
            CheckoutForm::default().validate(),
            Err(CoreError::MissingField {
                field: "first_name"
            })
        );
    }

    #[test]
    fn order_request_shape() {
        let request = OrderRequest::from(&filled_form().validate().unwrap());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Aziza",
                "phone_number": "+998 90 123 45 67",
                "address": "Tashkent, Chilonzor 5",
                "telegram_username": "@aziza"
            })
        );
    }

    #[test]
    fn order_item_request_sends_numeric_price() {
        let mut line =
            CartLineItem::from_catalog(CatalogItem::new("f1", "Rose", Money::from_major(10_000)));
        line.quantity = 2;
        let request = OrderItemRequest::for_line(&OrderId::from("17"), &line);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "flower_id": "f1",
                "order_id": "17",
                "quantity": 2,
                "price": 10000
            })
        );
    }
}

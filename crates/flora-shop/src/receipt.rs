//! Plain-text order summary handed to the customer after checkout.

use std::fmt;

use crate::config::ShopConfig;
use crate::orders::PlacedOrder;

/// Days the customer has to pay after ordering.
pub const PAYMENT_DUE_DAYS: u32 = 10;

const NAME_WIDTH: usize = 28;

/// Renders a [`PlacedOrder`] with the shop's payment instructions.
pub struct Receipt<'a> {
    order: &'a PlacedOrder,
    config: &'a ShopConfig,
}

impl<'a> Receipt<'a> {
    pub fn new(order: &'a PlacedOrder, config: &'a ShopConfig) -> Self {
        Receipt { order, config }
    }

    /// Suggested file name, unique per placement time.
    pub fn file_name(&self) -> String {
        format!("order_{}.txt", self.order.placed_at.timestamp_millis())
    }

    fn amount(&self, money: flora_core::Money) -> String {
        format!("{} {}", money.grouped(), self.config.currency)
    }
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let mut short: String = name.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

impl fmt::Display for Receipt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = self.order;
        let customer = &order.customer;

        writeln!(f, "{}", self.config.shop_name)?;
        writeln!(f, "Order summary")?;
        writeln!(f, "Order: {}", order.id)?;
        writeln!(f, "Date: {}", order.placed_at.format("%Y-%m-%d"))?;
        writeln!(f)?;
        writeln!(f, "Customer: {}", customer.name)?;
        writeln!(f, "Telegram: {}", customer.telegram_username)?;
        writeln!(f, "Phone: {}", customer.phone_number)?;
        writeln!(f, "Address: {}", customer.address)?;
        writeln!(f)?;

        writeln!(
            f,
            "{:<w$}  {:>16}  {:>4}  {:>18}",
            "Item",
            "Price",
            "Qty",
            "Total",
            w = NAME_WIDTH
        )?;
        for line in &order.items {
            writeln!(
                f,
                "{:<w$}  {:>16}  {:>4}  {:>18}",
                truncate(&line.name, NAME_WIDTH),
                self.amount(line.price),
                line.quantity,
                self.amount(line.total),
                w = NAME_WIDTH
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Grand total: {}", self.amount(order.total))?;
        writeln!(f)?;

        match &self.config.card_number {
            Some(card) => writeln!(f, "Pay by card transfer to: {}", card)?,
            None => writeln!(f, "Pay by card transfer; ask us for the card number.")?,
        }
        writeln!(
            f,
            "Send the payment screenshot via Telegram to {}",
            self.config.payment_contact
        )?;
        writeln!(f, "Payment is due within {} days.", PAYMENT_DUE_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flora_core::{CartLineItem, CatalogItem, CustomerDetails, Money, OrderId};

    fn placed() -> PlacedOrder {
        let mut rose =
            CartLineItem::from_catalog(CatalogItem::new("f1", "Rose", Money::from_major(10_000)));
        rose.quantity = 2;
        let tulip = CartLineItem::from_catalog(CatalogItem::new(
            "f2",
            "A very long bouquet name that will not fit",
            Money::from_major(5_000),
        ));
        PlacedOrder::from_cart_lines(
            OrderId::from("42"),
            CustomerDetails {
                name: "Aziza".into(),
                telegram_username: "@aziza".into(),
                phone_number: "+998901234567".into(),
                address: "Tashkent, Chilonzor 5".into(),
            },
            &[rose, tulip],
            Utc.with_ymd_and_hms(2026, 3, 8, 9, 30, 0).unwrap(),
        )
    }

    fn config() -> ShopConfig {
        let mut config = ShopConfig::default();
        config.card_number = Some("8600 1234 5678 9012".into());
        config
    }

    #[test]
    fn renders_header_customer_and_totals() {
        let order = placed();
        let config = config();
        let text = Receipt::new(&order, &config).to_string();

        assert!(text.starts_with("Rozoviy Sad\nOrder summary\n"));
        assert!(text.contains("Order: 42"));
        assert!(text.contains("Date: 2026-03-08"));
        assert!(text.contains("Customer: Aziza"));
        assert!(text.contains("Address: Tashkent, Chilonzor 5"));
        assert!(text.contains("10,000 UZS"));
        assert!(text.contains("20,000 UZS"));
        assert!(text.contains("Grand total: 25,000 UZS"));
        assert!(text.contains("8600 1234 5678 9012"));
        assert!(text.contains("https://t.me/rozoviysaduz"));
        assert!(text.contains("due within 10 days"));
    }

    #[test]
    fn long_names_are_shortened() {
        let order = placed();
        let config = config();
        let text = Receipt::new(&order, &config).to_string();
        assert!(text.contains("A very long bouquet name ..."));
        assert!(!text.contains("will not fit"));
    }

    #[test]
    fn missing_card_number_still_renders() {
        let order = placed();
        let config = ShopConfig::default();
        let text = Receipt::new(&order, &config).to_string();
        assert!(text.contains("ask us for the card number"));
    }

    #[test]
    fn file_name_uses_placement_time() {
        let order = placed();
        let config = config();
        let receipt = Receipt::new(&order, &config);
        assert_eq!(
            receipt.file_name(),
            format!("order_{}.txt", order.placed_at.timestamp_millis())
        );
    }
}

//! Turning the cart into a backend order.
//!
//! [`submit`] runs the whole checkout: validate the form, create the order
//! header, create one item per cart line, then record the order and empty
//! the cart. Nothing local changes unless every backend call succeeded, so
//! a failed checkout can simply be retried.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use flora_core::{CheckoutForm, OrderItemRequest, OrderRequest};
use flora_storage::KeyValueStore;

use crate::cart::CartStore;
use crate::error::ShopError;
use crate::gateway::OrderGateway;
use crate::orders::{OrderLog, PlacedOrder};

/// Places the cart as an order, stamped with the current time.
pub fn submit<S, G>(
    cart: &mut CartStore<S>,
    form: &CheckoutForm,
    gateway: &mut G,
    log: &mut OrderLog,
) -> Result<PlacedOrder, ShopError>
where
    S: KeyValueStore,
    G: OrderGateway,
{
    submit_at(cart, form, gateway, log, Utc::now())
}

/// [`submit`] with an explicit placement time.
pub fn submit_at<S, G>(
    cart: &mut CartStore<S>,
    form: &CheckoutForm,
    gateway: &mut G,
    log: &mut OrderLog,
    placed_at: DateTime<Utc>,
) -> Result<PlacedOrder, ShopError>
where
    S: KeyValueStore,
    G: OrderGateway,
{
    if cart.is_empty() {
        return Err(ShopError::EmptyCart);
    }
    let customer = form.validate()?;
    let lines = cart.snapshot();

    let order_id = gateway.create_order(&OrderRequest::from(&customer))?;
    info!(order = %order_id, lines = lines.len(), "order created");

    for line in &lines {
        if let Err(e) = gateway.create_order_item(&OrderItemRequest::for_line(&order_id, line)) {
            warn!(order = %order_id, flower = %line.id, error = %e, "order item rejected; cart kept");
            return Err(e.into());
        }
    }

    let order = PlacedOrder::from_cart_lines(order_id, customer, &lines, placed_at);
    log.record(order.clone());
    cart.clear();
    info!(order = %order.id, total = %order.total, "checkout complete");
    Ok(order)
}

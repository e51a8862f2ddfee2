use std::fmt::Write as _;

use log::*;
use settlement_engine::{
    events::{EventHandlers, EventHooks},
    settlement_objects::OrderConfirmation,
};

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;

/// Assigns event handlers for customer notifications.
///
/// A checkout that was split across several marketplace orders still produces exactly one
/// `OrderSettledEvent`, so the customer receives one confirmation. The rendered confirmation is
/// currently written to the log; a mail provider can be attached here without touching the
/// settlement flow.
pub fn create_notification_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_settled(|ev| {
        Box::pin(async move {
            let confirmation = ev.confirmation;
            info!(
                "📬️ Order confirmation for {} <{}>:\n{}",
                confirmation.customer_name,
                confirmation.customer_email,
                render_confirmation(&confirmation)
            );
        })
    });
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}

/// Renders the plain-text confirmation body for one settled checkout.
pub fn render_confirmation(c: &OrderConfirmation) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "Hi {},", c.customer_name);
    let _ = writeln!(body);
    let _ = writeln!(body, "Thank you for your order! Your payment for {} has been received.", c.gateway_order_id);
    let _ = writeln!(body);
    let _ = writeln!(body, "Items:");
    for item in &c.items {
        let seller = item.seller_name.as_deref().unwrap_or("the marketplace");
        let _ = writeln!(body, "  {} x {} at {} each, sold by {seller}", item.quantity, item.product_name, item.unit_price);
    }
    let _ = writeln!(body);
    for payment in &c.payments {
        let _ = writeln!(body, "Payment {}: {} ({})", payment.transaction_id, payment.amount, payment.status);
    }
    let _ = writeln!(body, "Grand total: {}", c.grand_total);
    let _ = writeln!(body);
    let _ = writeln!(body, "Shipping to:");
    let _ = writeln!(body, "  {}", c.shipping_address);
    let _ = writeln!(body, "  {}, {} - {}", c.shipping_city, c.shipping_state, c.shipping_pincode);
    let _ = writeln!(body);
    let _ = writeln!(body, "Each seller ships separately, so your items may arrive in more than one package.");
    body
}

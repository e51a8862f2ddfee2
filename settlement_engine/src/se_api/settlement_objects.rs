use chrono::{DateTime, Utc};
use log::debug;
use mss_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItemDetail, PaymentRecord, PaymentRecordStatus};

/// What the carrier handed back for one seller's package, before it is persisted.
#[derive(Debug, Clone)]
pub struct CarrierShipment {
    pub carrier_shipment_id: i64,
    pub carrier_order_id: i64,
    pub carrier_order_ref: String,
    pub awb_code: String,
    pub courier_id: Option<i64>,
    pub courier_name: Option<String>,
    pub pickup_location: String,
}

/// One successfully shipped seller group, as reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentSuccess {
    pub order_id: i64,
    pub seller_id: String,
    pub seller_name: String,
    pub shipment_id: i64,
    pub carrier_shipment_id: i64,
    pub awb_code: String,
    pub courier_name: Option<String>,
    pub item_ids: Vec<i64>,
}

/// A seller group that could not be shipped. The payment side of the order is unaffected; the
/// group can be retried once the underlying cause is fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedSellerGroup {
    pub order_id: i64,
    pub seller_id: String,
    pub seller_name: String,
    pub item_ids: Vec<i64>,
    pub reason: String,
}

impl FailedSellerGroup {
    pub fn order_not_found(order_id: i64) -> Self {
        Self {
            order_id,
            seller_id: String::new(),
            seller_name: String::new(),
            item_ids: Vec::new(),
            reason: format!("Order {order_id} does not exist"),
        }
    }
}

/// The ledger outcome for a single order within the settled checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSettlement {
    pub order_id: i64,
    pub gateway_order_id: String,
    pub payment_id: i64,
    pub status: PaymentRecordStatus,
}

/// Everything that happened while settling one gateway event, success and failure alike.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    pub processed_orders: Vec<OrderSettlement>,
    pub shipment_results: Vec<ShipmentSuccess>,
    pub failed_items: Vec<FailedSellerGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationItem {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub seller_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPayment {
    pub transaction_id: String,
    pub amount: Money,
    pub status: PaymentRecordStatus,
    pub payment_date: DateTime<Utc>,
}

/// A single flattened confirmation for the whole checkout, even when the cart was split across
/// several orders. The customer placed one order as far as they are concerned, so they get one
/// confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub order_ids: Vec<i64>,
    pub gateway_order_id: String,
    pub items: Vec<ConfirmationItem>,
    pub payments: Vec<ConfirmationPayment>,
    pub grand_total: Money,
}

impl OrderConfirmation {
    /// Flattens the settled orders into one confirmation. The customer identity and address come
    /// from the first order; sibling orders from one checkout share them, but if they ever differ
    /// the first one wins.
    pub fn assemble(orders: &[(Order, Vec<OrderItemDetail>)], payments: Vec<PaymentRecord>) -> Option<Self> {
        let (first, _) = orders.first()?;
        if orders.iter().any(|(o, _)| o.shipping_address != first.shipping_address) {
            debug!(
                "📬️ Orders for {} carry different shipping addresses. Using the address of order #{}.",
                first.gateway_order_id, first.id
            );
        }
        let items = orders
            .iter()
            .flat_map(|(_, items)| items.iter())
            .map(|i| ConfirmationItem {
                product_name: i.product_name.clone(),
                quantity: i.quantity,
                unit_price: i.price_at_purchase,
                seller_name: i.effective_seller_name().map(String::from),
            })
            .collect();
        let payments = payments
            .into_iter()
            .map(|p| ConfirmationPayment {
                transaction_id: p.transaction_id,
                amount: p.amount,
                status: p.status,
                payment_date: p.payment_date,
            })
            .collect();
        let grand_total = orders.iter().map(|(o, _)| o.total_amount).sum();
        Some(Self {
            customer_name: first.customer_name.clone(),
            customer_email: first.customer_email.clone(),
            shipping_address: first.shipping_address.clone(),
            shipping_city: first.shipping_city.clone(),
            shipping_state: first.shipping_state.clone(),
            shipping_pincode: first.shipping_pincode.clone(),
            order_ids: orders.iter().map(|(o, _)| o.id).collect(),
            gateway_order_id: first.gateway_order_id.to_string(),
            items,
            payments,
            grand_total,
        })
    }
}

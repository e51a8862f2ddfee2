use std::fmt::Display;

use serde::{Deserialize, Serialize};
use settlement_engine::settlement_objects::{FailedSellerGroup, OrderSettlement, SettlementOutcome, ShipmentSuccess};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The checkout callback the storefront posts after the gateway's client-side flow completes.
/// `signature` covers `"{gateway_order_id}|{gateway_payment_id}"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
    /// The order the storefront was showing when it called back.
    pub order_db_id: i64,
    /// All orders in the checkout batch, when the cart spanned several sellers.
    #[serde(default)]
    pub all_order_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub cart_id: Option<String>,
}

impl VerifyPaymentRequest {
    /// The orders to settle: the full batch when the storefront sent one, otherwise the single
    /// order id.
    pub fn order_ids(&self) -> Vec<i64> {
        match &self.all_order_ids {
            Some(ids) if !ids.is_empty() => ids.clone(),
            _ => vec![self.order_db_id],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub data: SettlementSummary,
}

/// The settlement outcome as the storefront consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSummary {
    pub processed_orders: Vec<OrderSettlement>,
    pub shiprocket_results: Vec<ShipmentSuccess>,
    pub failed_items: Vec<FailedSellerGroup>,
}

impl From<SettlementOutcome> for SettlementSummary {
    fn from(outcome: SettlementOutcome) -> Self {
        Self {
            processed_orders: outcome.processed_orders,
            shiprocket_results: outcome.shipment_results,
            failed_items: outcome.failed_items,
        }
    }
}

use thiserror::Error;

use crate::db_types::{
    DraftShipment,
    GatewayOrderId,
    NewAllocation,
    NewPaymentRecord,
    NewShipment,
    Order,
    OrderItemDetail,
    PaymentRecord,
    PaymentStatus,
    Shipment,
};

/// The result of asking the database to move an order's payment status forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// The status changed to the requested value.
    Applied,
    /// The order was already at (or past) the requested status, so nothing was written.
    Unchanged,
}

impl StatusTransition {
    pub fn applied(&self) -> bool {
        matches!(self, StatusTransition::Applied)
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("No settled payment found for {0}")]
    PaymentNotFound(String),
    #[error("Cannot record refund: {0}")]
    InvalidRefundState(String),
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}

/// The storage operations the settlement flows are built on.
///
/// Write operations are idempotent wherever a gateway replay could reach them. In particular,
/// [`upsert_payment`](Self::upsert_payment), [`upsert_allocation`](Self::upsert_allocation) and
/// [`insert_refund_payment`](Self::insert_refund_payment) converge on a single row no matter how
/// many times the same event is delivered.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase {
    /// The connection URL for this database instance.
    fn url(&self) -> &str;

    /// Fetch an order by its database id.
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError>;

    /// Fetch every order sharing the given gateway checkout reference. A multi-seller cart is
    /// split into one order per seller at checkout, so this can return more than one row.
    async fn fetch_orders_by_gateway_ref(
        &self,
        gateway_order_id: &GatewayOrderId,
    ) -> Result<Vec<Order>, SettlementError>;

    /// Fetch the order's items joined with their product variants.
    async fn fetch_items_for_order(&self, order_id: i64) -> Result<Vec<OrderItemDetail>, SettlementError>;

    /// Move the order's payment status to `status`, if the transition is a legal forward step.
    /// Returns [`StatusTransition::Unchanged`] when the order is already at or past `status`, and
    /// [`SettlementError::OrderNotFound`] when the order does not exist.
    async fn update_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<StatusTransition, SettlementError>;

    /// Insert the payment record, or update the existing non-refund record for the same
    /// `(order_id, gateway_order_id)` pair in place. Returns the stored row.
    async fn upsert_payment(&self, payment: NewPaymentRecord) -> Result<PaymentRecord, SettlementError>;

    /// Insert the per-item allocation, or overwrite the amount and status of the row with the same
    /// allocation id.
    async fn upsert_allocation(&self, allocation: NewAllocation) -> Result<(), SettlementError>;

    /// Fetch the active (non-refund) payment record for the order under the given gateway
    /// reference, if one exists.
    async fn fetch_payment_for_order(
        &self,
        order_id: i64,
        gateway_order_id: &GatewayOrderId,
    ) -> Result<Option<PaymentRecord>, SettlementError>;

    /// Every ledger row for the order, refunds included, oldest first.
    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<PaymentRecord>, SettlementError>;

    /// Append a refund row to the ledger. If a refund with the same `(order_id, transaction_id)`
    /// already exists it is returned unchanged, so replays of a dispute event are harmless.
    async fn insert_refund_payment(&self, refund: NewPaymentRecord) -> Result<PaymentRecord, SettlementError>;

    /// Fetch the draft shipments with the given ids.
    async fn fetch_draft_shipments(&self, ids: &[i64]) -> Result<Vec<DraftShipment>, SettlementError>;

    /// Persist a shipment registered with the carrier and return the stored row.
    async fn create_shipment(&self, shipment: NewShipment) -> Result<Shipment, SettlementError>;

    /// Point the given order items at the shipment and clear their draft references.
    async fn attach_items_to_shipment(&self, item_ids: &[i64], shipment_id: i64) -> Result<(), SettlementError>;

    /// Delete consumed draft shipments. Items must be detached first.
    async fn delete_draft_shipments(&self, ids: &[i64]) -> Result<(), SettlementError>;

    /// Reduce the variant's stock level by `quantity`, stopping at zero.
    async fn decrement_stock(&self, variant_id: i64, quantity: i64) -> Result<(), SettlementError>;

    /// Remove the customer's cart and its items. Deleting a cart that does not exist is not an
    /// error.
    async fn delete_cart(&self, cart_id: &str) -> Result<(), SettlementError>;
}

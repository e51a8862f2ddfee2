use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{carts, db_url, new_pool, orders, payments, shipments};
use crate::{
    db_types::{
        DraftShipment,
        GatewayOrderId,
        ItemAllocation,
        NewAllocation,
        NewDraftShipment,
        NewOrder,
        NewOrderItem,
        NewPaymentRecord,
        NewProductVariant,
        NewShipment,
        Order,
        OrderItemDetail,
        PaymentRecord,
        PaymentStatus,
        Shipment,
    },
    traits::{SettlementDatabase, SettlementError, StatusTransition},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_orders_by_gateway_ref(
        &self,
        gateway_order_id: &GatewayOrderId,
    ) -> Result<Vec<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_by_gateway_ref(gateway_order_id, &mut conn).await
    }

    async fn fetch_items_for_order(&self, order_id: i64) -> Result<Vec<OrderItemDetail>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_items_for_order(order_id, &mut conn).await
    }

    async fn update_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<StatusTransition, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::transition_payment_status(order_id, status, &mut tx).await?;
        tx.commit().await?;
        if result.applied() {
            debug!("🗃️ Order #{order_id} payment status is now {status}");
        }
        Ok(result)
    }

    async fn upsert_payment(&self, payment: NewPaymentRecord) -> Result<PaymentRecord, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let record = payments::upsert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment {} for order #{} saved with id {}", record.transaction_id, record.order_id, record.id);
        Ok(record)
    }

    async fn upsert_allocation(&self, allocation: NewAllocation) -> Result<(), SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::upsert_allocation(&allocation, &mut conn).await?;
        trace!("🗃️ Allocation {} saved", allocation.id);
        Ok(())
    }

    async fn fetch_payment_for_order(
        &self,
        order_id: i64,
        gateway_order_id: &GatewayOrderId,
    ) -> Result<Option<PaymentRecord>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::find_active_payment(order_id, gateway_order_id, &mut conn).await
    }

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<PaymentRecord>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payments_for_order(order_id, &mut conn).await
    }

    async fn insert_refund_payment(&self, refund: NewPaymentRecord) -> Result<PaymentRecord, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let record = payments::insert_refund(refund, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Refund {} recorded against order #{}", record.transaction_id, record.order_id);
        Ok(record)
    }

    async fn fetch_draft_shipments(&self, ids: &[i64]) -> Result<Vec<DraftShipment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        shipments::fetch_drafts(ids, &mut conn).await
    }

    async fn create_shipment(&self, shipment: NewShipment) -> Result<Shipment, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        let shipment = shipments::insert_shipment(shipment, &mut conn).await?;
        debug!("🗃️ Shipment #{} (AWB {}) saved for order #{}", shipment.id, shipment.awb_code, shipment.order_id);
        Ok(shipment)
    }

    async fn attach_items_to_shipment(&self, item_ids: &[i64], shipment_id: i64) -> Result<(), SettlementError> {
        let mut tx = self.pool.begin().await?;
        orders::attach_items_to_shipment(item_ids, shipment_id, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ {} item(s) attached to shipment #{shipment_id}", item_ids.len());
        Ok(())
    }

    async fn delete_draft_shipments(&self, ids: &[i64]) -> Result<(), SettlementError> {
        let mut conn = self.pool.acquire().await?;
        shipments::delete_drafts(ids, &mut conn).await
    }

    async fn decrement_stock(&self, variant_id: i64, quantity: i64) -> Result<(), SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::decrement_stock(variant_id, quantity, &mut conn).await?;
        trace!("🗃️ Stock for variant #{variant_id} reduced by {quantity}");
        Ok(())
    }

    async fn delete_cart(&self, cart_id: &str) -> Result<(), SettlementError> {
        let mut tx = self.pool.begin().await?;
        carts::delete_cart(cart_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Cart {cart_id} deleted");
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, SettlementError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SettlementError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn insert_order(&self, order: NewOrder) -> Result<i64, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    pub async fn insert_product_variant(&self, variant: NewProductVariant) -> Result<i64, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_product_variant(variant, &mut conn).await
    }

    pub async fn insert_order_item(&self, item: NewOrderItem) -> Result<i64, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order_item(item, &mut conn).await
    }

    pub async fn insert_draft_shipment(&self, draft: NewDraftShipment) -> Result<i64, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        shipments::insert_draft(draft, &mut conn).await
    }

    pub async fn insert_cart(&self, cart_id: &str, items: &[(i64, i64)]) -> Result<(), SettlementError> {
        let mut tx = self.pool.begin().await?;
        carts::insert_cart(cart_id, items, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn cart_exists(&self, cart_id: &str) -> Result<bool, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        carts::cart_exists(cart_id, &mut conn).await
    }

    pub async fn fetch_variant_stock(&self, variant_id: i64) -> Result<i64, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_variant_stock(variant_id, &mut conn).await
    }

    pub async fn fetch_allocations_for_payment(&self, payment_id: i64) -> Result<Vec<ItemAllocation>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_allocations_for_payment(payment_id, &mut conn).await
    }

    pub async fn fetch_shipments_for_order(&self, order_id: i64) -> Result<Vec<Shipment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        shipments::fetch_shipments_for_order(order_id, &mut conn).await
    }
}

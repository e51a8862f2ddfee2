use std::fmt::Debug;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use log::*;
use mss_common::Money;

use crate::{
    db_types::{
        GatewayOrderId,
        NewPaymentRecord,
        NewShipment,
        Order,
        OrderItemDetail,
        PaymentRecord,
        PaymentRecordStatus,
        PaymentStatus,
    },
    events::{EventProducers, OrderSettledEvent},
    helpers::{group_by_seller, SellerGroup},
    se_api::{
        ledger_api::LedgerApi,
        settlement_objects::{
            FailedSellerGroup,
            OrderConfirmation,
            OrderSettlement,
            SettlementOutcome,
            ShipmentSuccess,
        },
        shipment_api::ShipmentApi,
    },
    traits::{SettlementDatabase, SettlementError, ShippingCarrier},
};

/// `SettlementFlowApi` is the primary API for reconciling gateway payment events against orders:
/// it advances order payment state, records the money in the ledger, books shipments per seller,
/// and fires the confirmation event.
pub struct SettlementFlowApi<B, C> {
    db: B,
    ledger: LedgerApi<B>,
    shipments: ShipmentApi<C>,
    producers: EventProducers,
}

impl<B, C> Debug for SettlementFlowApi<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementFlowApi")
    }
}

impl<B, C> SettlementFlowApi<B, C> {
    pub fn new(db: B, ledger: LedgerApi<B>, shipments: ShipmentApi<C>, producers: EventProducers) -> Self {
        Self { db, ledger, shipments, producers }
    }
}

impl<B, C> SettlementFlowApi<B, C>
where
    B: SettlementDatabase,
    C: ShippingCarrier,
{
    /// The gateway authorized the payment but has not captured funds yet. Orders move to
    /// `Authorized` and the ledger records the pending money, but nothing ships.
    pub async fn process_authorization(
        &self,
        gateway_order_id: &GatewayOrderId,
        transaction_id: &str,
        payment_method: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Vec<OrderSettlement>, SettlementError> {
        trace!("🔄️💰️ Payment {transaction_id} for {gateway_order_id} was authorized");
        self.record_payment_state(
            gateway_order_id,
            transaction_id,
            payment_method,
            at,
            PaymentStatus::Authorized,
            PaymentRecordStatus::Authorized,
        )
        .await
    }

    /// The payment attempt failed. The failure is recorded in the ledger so the attempt is
    /// auditable; a later successful attempt for the same checkout supersedes it.
    pub async fn process_failure(
        &self,
        gateway_order_id: &GatewayOrderId,
        transaction_id: &str,
        payment_method: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Vec<OrderSettlement>, SettlementError> {
        trace!("🔄️❌️ Payment {transaction_id} for {gateway_order_id} failed");
        self.record_payment_state(
            gateway_order_id,
            transaction_id,
            payment_method,
            at,
            PaymentStatus::Failed,
            PaymentRecordStatus::Failed,
        )
        .await
    }

    /// Funds were captured. Settles every order under the gateway reference: ledger, shipments,
    /// stock, cart cleanup and the confirmation event.
    pub async fn process_capture(
        &self,
        gateway_order_id: &GatewayOrderId,
        transaction_id: &str,
        payment_method: Option<&str>,
        at: DateTime<Utc>,
        cart_id: Option<&str>,
    ) -> Result<SettlementOutcome, SettlementError> {
        let orders = self.db.fetch_orders_by_gateway_ref(gateway_order_id).await?;
        if orders.is_empty() {
            warn!("🔄️💰️ No orders found for gateway reference {gateway_order_id}. Nothing to settle.");
            return Ok(SettlementOutcome::default());
        }
        let order_ids = orders.iter().map(|o| o.id).collect::<Vec<_>>();
        self.settle_orders(&order_ids, gateway_order_id, transaction_id, payment_method, at, cart_id).await
    }

    /// Settle the given orders against a captured payment. Order-level problems (a missing order,
    /// a seller group that cannot ship) are reported in the outcome rather than failing the whole
    /// settlement; the payment itself is never rolled back.
    pub async fn settle_orders(
        &self,
        order_ids: &[i64],
        gateway_order_id: &GatewayOrderId,
        transaction_id: &str,
        payment_method: Option<&str>,
        at: DateTime<Utc>,
        cart_id: Option<&str>,
    ) -> Result<SettlementOutcome, SettlementError> {
        let mut outcome = SettlementOutcome::default();
        let mut settled: Vec<(Order, Vec<OrderItemDetail>)> = Vec::new();
        let mut payments: Vec<PaymentRecord> = Vec::new();
        for order_id in order_ids {
            let result = self
                .settle_order(*order_id, gateway_order_id, transaction_id, payment_method, at, &mut outcome)
                .await?;
            if let Some((order, items, payment)) = result {
                payments.push(payment);
                settled.push((order, items));
            }
        }
        if let Some(cart_id) = cart_id {
            if let Err(e) = self.db.delete_cart(cart_id).await {
                error!("🔄️🛒️ Could not delete cart {cart_id}: {e}. Settlement continues without it.");
            }
        }
        if let Some(confirmation) = OrderConfirmation::assemble(&settled, payments) {
            self.call_order_settled_hook(confirmation).await;
        }
        debug!(
            "🔄️✅️ Settlement of {gateway_order_id} complete. {} order(s) settled, {} shipment(s) created, {} \
             failure(s).",
            outcome.processed_orders.len(),
            outcome.shipment_results.len(),
            outcome.failed_items.len()
        );
        Ok(outcome)
    }

    /// A dispute resolved against us. Appends refund rows to the ledger, splits them over the
    /// items, and moves the orders to `Refunded`.
    ///
    /// An explicit refund amount is only honoured when the gateway reference maps to a single
    /// order; across several orders there is no way to tell whose money it was, so each order
    /// refunds its own full payment.
    pub async fn process_dispute(
        &self,
        gateway_order_id: &GatewayOrderId,
        refund_transaction_id: &str,
        refund_amount: Option<Money>,
        at: DateTime<Utc>,
    ) -> Result<Vec<OrderSettlement>, SettlementError> {
        let orders = self.db.fetch_orders_by_gateway_ref(gateway_order_id).await?;
        if orders.is_empty() {
            warn!("🔄️↩️ No orders found for gateway reference {gateway_order_id}. Nothing to refund.");
            return Ok(Vec::new());
        }
        let single_order = orders.len() == 1;
        if !single_order && refund_amount.is_some() {
            warn!(
                "🔄️↩️ Refund {refund_transaction_id} names an amount, but {gateway_order_id} spans {} orders. \
                 Refunding each order's full payment instead.",
                orders.len()
            );
        }
        let mut results = Vec::with_capacity(orders.len());
        for order in &orders {
            let Some(payment) = self.db.fetch_payment_for_order(order.id, gateway_order_id).await? else {
                warn!("🔄️↩️ Order #{} has no settled payment to refund. Skipping.", order.id);
                continue;
            };
            let refund_total = match refund_amount {
                Some(amount) if single_order => amount,
                _ => payment.amount,
            };
            let items = self.db.fetch_items_for_order(order.id).await?;
            let record = self.ledger.record_refund(&payment, &items, refund_total, refund_transaction_id, at).await?;
            self.db.update_payment_status(order.id, PaymentStatus::Refunded).await?;
            info!("🔄️↩️ Order #{} refunded {refund_total} under {refund_transaction_id}", order.id);
            results.push(OrderSettlement {
                order_id: order.id,
                gateway_order_id: gateway_order_id.to_string(),
                payment_id: record.id,
                status: record.status,
            });
        }
        Ok(results)
    }

    async fn record_payment_state(
        &self,
        gateway_order_id: &GatewayOrderId,
        transaction_id: &str,
        payment_method: Option<&str>,
        at: DateTime<Utc>,
        order_status: PaymentStatus,
        record_status: PaymentRecordStatus,
    ) -> Result<Vec<OrderSettlement>, SettlementError> {
        let orders = self.db.fetch_orders_by_gateway_ref(gateway_order_id).await?;
        if orders.is_empty() {
            warn!("🔄️💰️ No orders found for gateway reference {gateway_order_id}. Nothing to record.");
            return Ok(Vec::new());
        }
        let mut results = Vec::with_capacity(orders.len());
        for order in &orders {
            self.db.update_payment_status(order.id, order_status).await?;
            let payment = NewPaymentRecord::new(
                order.id,
                gateway_order_id.clone(),
                transaction_id.to_string(),
                order.total_amount,
            )
            .with_status(record_status)
            .with_method(payment_method)
            .with_date(at);
            let payment = self.ledger.upsert_payment(payment).await?;
            let items = self.db.fetch_items_for_order(order.id).await?;
            self.ledger.allocate_to_items(&payment, &items).await?;
            results.push(OrderSettlement {
                order_id: order.id,
                gateway_order_id: gateway_order_id.to_string(),
                payment_id: payment.id,
                status: payment.status,
            });
        }
        debug!("🔄️💰️ {} order(s) under {gateway_order_id} recorded as {record_status}", results.len());
        Ok(results)
    }

    /// Settles a single order. Returns `None` when the order does not exist, recording the miss in
    /// the outcome so a bad id cannot sink its siblings.
    async fn settle_order(
        &self,
        order_id: i64,
        gateway_order_id: &GatewayOrderId,
        transaction_id: &str,
        payment_method: Option<&str>,
        at: DateTime<Utc>,
        outcome: &mut SettlementOutcome,
    ) -> Result<Option<(Order, Vec<OrderItemDetail>, PaymentRecord)>, SettlementError> {
        let Some(order) = self.db.fetch_order(order_id).await? else {
            warn!("🔄️💰️ Order #{order_id} referenced by {gateway_order_id} does not exist. Skipping it.");
            outcome.failed_items.push(FailedSellerGroup::order_not_found(order_id));
            return Ok(None);
        };
        // Stock is only adjusted when this event is the one that actually moved the order to
        // Paid. A replay finds the order already Paid and leaves stock alone.
        let newly_paid = self.db.update_payment_status(order.id, PaymentStatus::Paid).await?.applied();
        let payment = NewPaymentRecord::new(
            order.id,
            gateway_order_id.clone(),
            transaction_id.to_string(),
            order.total_amount,
        )
        .with_status(PaymentRecordStatus::Completed)
        .with_method(payment_method)
        .with_date(at);
        let payment = self.ledger.upsert_payment(payment).await?;
        let items = self.db.fetch_items_for_order(order.id).await?;
        self.ledger.allocate_to_items(&payment, &items).await?;
        outcome.processed_orders.push(OrderSettlement {
            order_id: order.id,
            gateway_order_id: gateway_order_id.to_string(),
            payment_id: payment.id,
            status: payment.status,
        });

        let unshipped = items.iter().filter(|i| i.shipment_id.is_none()).cloned().collect::<Vec<_>>();
        let groups = group_by_seller(&unshipped);
        debug!("🔄️🚚️ Order #{} has {} seller group(s) awaiting shipment", order.id, groups.len());
        let shipment_runs = groups.values().map(|group| self.ship_seller_group(&order, group));
        for result in join_all(shipment_runs).await {
            match result {
                Ok(success) => outcome.shipment_results.push(success),
                Err(failure) => outcome.failed_items.push(failure),
            }
        }

        if newly_paid {
            for item in &items {
                if let Err(e) = self.db.decrement_stock(item.variant_id, item.quantity).await {
                    error!("🔄️💰️ Stock decrement failed for variant #{}: {e}", item.variant_id);
                    outcome.failed_items.push(FailedSellerGroup {
                        order_id: order.id,
                        seller_id: item.effective_seller_id().unwrap_or_default().to_string(),
                        seller_name: item.effective_seller_name().unwrap_or_default().to_string(),
                        item_ids: vec![item.id],
                        reason: format!("stock decrement failed: {e}"),
                    });
                }
            }
        }
        Ok(Some((order, items, payment)))
    }

    /// Ships one seller group end to end. Failure never propagates as an error; it is folded into
    /// a [`FailedSellerGroup`] so sibling groups keep going and the drafts stay in place for a
    /// retry.
    async fn ship_seller_group(&self, order: &Order, group: &SellerGroup) -> Result<ShipmentSuccess, FailedSellerGroup> {
        let result: Result<ShipmentSuccess, String> = async {
            let draft_ids = group.draft_shipment_ids();
            let drafts = self.db.fetch_draft_shipments(&draft_ids).await.map_err(|e| e.to_string())?;
            let booked = self.shipments.create_seller_shipment(order, group, &drafts).await.map_err(|e| e.to_string())?;
            let shipment = self
                .db
                .create_shipment(NewShipment {
                    order_id: order.id,
                    seller_id: group.seller_id.clone(),
                    carrier_shipment_id: booked.carrier_shipment_id,
                    carrier_order_id: booked.carrier_order_id,
                    carrier_order_ref: booked.carrier_order_ref.clone(),
                    awb_code: booked.awb_code.clone(),
                    courier_id: booked.courier_id,
                    courier_name: booked.courier_name.clone(),
                    pickup_location: booked.pickup_location.clone(),
                })
                .await
                .map_err(|e| e.to_string())?;
            let item_ids = group.item_ids();
            self.db.attach_items_to_shipment(&item_ids, shipment.id).await.map_err(|e| e.to_string())?;
            self.db.delete_draft_shipments(&draft_ids).await.map_err(|e| e.to_string())?;
            Ok(ShipmentSuccess {
                order_id: order.id,
                seller_id: group.seller_id.clone(),
                seller_name: group.seller_name.clone(),
                shipment_id: shipment.id,
                carrier_shipment_id: shipment.carrier_shipment_id,
                awb_code: shipment.awb_code.clone(),
                courier_name: shipment.courier_name.clone(),
                item_ids,
            })
        }
        .await;
        result.map_err(|reason| {
            error!("🔄️🚚️ Seller {} of order #{} could not ship: {reason}", group.seller_id, order.id);
            FailedSellerGroup {
                order_id: order.id,
                seller_id: group.seller_id.clone(),
                seller_name: group.seller_name.clone(),
                item_ids: group.item_ids(),
                reason,
            }
        })
    }

    async fn call_order_settled_hook(&self, confirmation: OrderConfirmation) {
        for emitter in &self.producers.order_settled_producer {
            debug!("🔄️📬️ Notifying order settled hook subscribers");
            let event = OrderSettledEvent::new(confirmation.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use mss_common::Money;

use crate::{
    db_types::{AllocationId, NewAllocation, NewPaymentRecord, OrderItemDetail, PaymentRecord, PaymentRecordStatus},
    traits::{SettlementDatabase, SettlementError},
};

/// `LedgerApi` owns the payment ledger: the per-order payment rows and their per-item
/// allocations. All of its writes are idempotent, so gateway replays converge on the same rows.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> LedgerApi<B>
where B: SettlementDatabase
{
    /// Record (or refresh) the order's payment row for the gateway transaction.
    pub async fn upsert_payment(&self, payment: NewPaymentRecord) -> Result<PaymentRecord, SettlementError> {
        self.db.upsert_payment(payment).await
    }

    /// Write one allocation per item against the payment, each carrying the item's line total and
    /// the payment's status. Returns the number of allocations written.
    ///
    /// The allocation ids are derived from the item and the gateway transaction, so calling this
    /// again for a replayed event rewrites the same rows.
    pub async fn allocate_to_items(
        &self,
        payment: &PaymentRecord,
        items: &[OrderItemDetail],
    ) -> Result<usize, SettlementError> {
        for item in items {
            let allocation = NewAllocation {
                id: AllocationId::new(item.id, &payment.transaction_id),
                payment_id: payment.id,
                order_item_id: item.id,
                amount: item.line_total(),
                status: payment.status,
            };
            self.db.upsert_allocation(allocation).await?;
        }
        trace!("🔄️💰️ {} allocation(s) written for payment {}", items.len(), payment.transaction_id);
        Ok(items.len())
    }

    /// Append a refund to the ledger and split it over the order's items in proportion to their
    /// line totals. The last item absorbs the rounding remainder so the shares always sum to the
    /// refund exactly.
    pub async fn record_refund(
        &self,
        original: &PaymentRecord,
        items: &[OrderItemDetail],
        refund_total: Money,
        refund_transaction_id: &str,
        refunded_at: DateTime<Utc>,
    ) -> Result<PaymentRecord, SettlementError> {
        if original.amount.is_zero() {
            return Err(SettlementError::InvalidRefundState(format!(
                "payment {} for order #{} has a zero amount, so a proportional split is undefined",
                original.transaction_id, original.order_id
            )));
        }
        let refund = NewPaymentRecord {
            order_id: original.order_id,
            gateway_order_id: original.gateway_order_id.clone(),
            gateway: original.gateway.clone(),
            transaction_id: refund_transaction_id.to_string(),
            amount: refund_total,
            status: PaymentRecordStatus::Refunded,
            payment_method: original.payment_method.clone(),
            payment_date: refunded_at,
        };
        let record = self.db.insert_refund_payment(refund).await?;
        if items.is_empty() {
            warn!(
                "🔄️💰️ Order #{} has no items to allocate refund {refund_transaction_id} against",
                original.order_id
            );
            return Ok(record);
        }
        // Integer proportional split. Every share except the last is floored, and the final item
        // takes whatever is left, so the total never drifts from refund_total.
        let original_total = original.amount.value() as i128;
        let mut remaining = refund_total.value();
        let last = items.len() - 1;
        for (n, item) in items.iter().enumerate() {
            let share = if n == last {
                remaining
            } else {
                let line = item.line_total().value() as i128;
                (refund_total.value() as i128 * line / original_total) as i64
            };
            remaining -= share;
            let allocation = NewAllocation {
                id: AllocationId::refund(item.id, refund_transaction_id),
                payment_id: record.id,
                order_item_id: item.id,
                amount: Money::from(share),
                status: PaymentRecordStatus::Refunded,
            };
            self.db.upsert_allocation(allocation).await?;
        }
        debug!(
            "🔄️💰️ Refund {refund_transaction_id} of {refund_total} split across {} item(s) of order #{}",
            items.len(),
            original.order_id
        );
        Ok(record)
    }
}

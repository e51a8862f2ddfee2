use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{GatewayOrderId, ItemAllocation, NewAllocation, NewPaymentRecord, PaymentRecord},
    traits::SettlementError,
};

const PAYMENT_COLUMNS: &str = r#"
    id, order_id, gateway_order_id, gateway, transaction_id, amount, status,
    payment_method, payment_date, created_at, updated_at
"#;

/// The order's live ledger row under the given gateway reference. Refund rows are appended, never
/// updated, so they are excluded here.
pub async fn find_active_payment(
    order_id: i64,
    gateway_order_id: &GatewayOrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, SettlementError> {
    let q = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE order_id = $1 AND gateway_order_id = $2 AND status != 'Refunded' \
         ORDER BY id ASC LIMIT 1"
    );
    let payment = sqlx::query_as::<_, PaymentRecord>(&q)
        .bind(order_id)
        .bind(gateway_order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn fetch_payments_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentRecord>, SettlementError> {
    let q = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 ORDER BY id ASC");
    let payments = sqlx::query_as::<_, PaymentRecord>(&q).bind(order_id).fetch_all(conn).await?;
    Ok(payments)
}

/// Inserts the payment, or folds it into the existing non-refund row for the same
/// `(order_id, gateway_order_id)`. A replayed or superseding gateway event therefore lands on one
/// ledger row, carrying the latest transaction id and status.
pub async fn upsert_payment(
    payment: NewPaymentRecord,
    conn: &mut SqliteConnection,
) -> Result<PaymentRecord, SettlementError> {
    let existing = find_active_payment(payment.order_id, &payment.gateway_order_id, &mut *conn).await?;
    let record = match existing {
        Some(current) => {
            debug!(
                "🗃️ Payment row #{} for order #{} exists ({}). Updating in place.",
                current.id, current.order_id, current.status
            );
            let q = format!(
                "UPDATE payments SET transaction_id = $1, amount = $2, status = $3, payment_method = $4, \
                 payment_date = $5, updated_at = CURRENT_TIMESTAMP WHERE id = $6 \
                 RETURNING {PAYMENT_COLUMNS}"
            );
            sqlx::query_as::<_, PaymentRecord>(&q)
                .bind(&payment.transaction_id)
                .bind(payment.amount)
                .bind(payment.status.to_string())
                .bind(&payment.payment_method)
                .bind(payment.payment_date)
                .bind(current.id)
                .fetch_one(conn)
                .await?
        }
        None => insert_payment(payment, conn).await?,
    };
    Ok(record)
}

async fn insert_payment(
    payment: NewPaymentRecord,
    conn: &mut SqliteConnection,
) -> Result<PaymentRecord, SettlementError> {
    let q = format!(
        "INSERT INTO payments (order_id, gateway_order_id, gateway, transaction_id, amount, status, \
         payment_method, payment_date) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {PAYMENT_COLUMNS}"
    );
    let record = sqlx::query_as::<_, PaymentRecord>(&q)
        .bind(payment.order_id)
        .bind(payment.gateway_order_id.as_str())
        .bind(&payment.gateway)
        .bind(&payment.transaction_id)
        .bind(payment.amount)
        .bind(payment.status.to_string())
        .bind(&payment.payment_method)
        .bind(payment.payment_date)
        .fetch_one(conn)
        .await?;
    Ok(record)
}

/// Appends a refund row, unless one with the same `(order_id, transaction_id)` already exists, in
/// which case the existing row is returned.
pub async fn insert_refund(
    refund: NewPaymentRecord,
    conn: &mut SqliteConnection,
) -> Result<PaymentRecord, SettlementError> {
    let q = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE order_id = $1 AND transaction_id = $2 AND status = 'Refunded' LIMIT 1"
    );
    let existing = sqlx::query_as::<_, PaymentRecord>(&q)
        .bind(refund.order_id)
        .bind(&refund.transaction_id)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(record) = existing {
        debug!("🗃️ Refund {} already recorded for order #{}", record.transaction_id, record.order_id);
        return Ok(record);
    }
    insert_payment(refund, conn).await
}

/// Saves a per-item allocation. The allocation id is a deterministic composite of the item and the
/// gateway transaction, so replays overwrite rather than duplicate.
pub async fn upsert_allocation(
    allocation: &NewAllocation,
    conn: &mut SqliteConnection,
) -> Result<(), SettlementError> {
    sqlx::query(
        r#"
        INSERT INTO order_item_payments (id, payment_id, order_item_id, amount, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET
            payment_id = excluded.payment_id,
            amount = excluded.amount,
            status = excluded.status,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(allocation.id.as_str())
    .bind(allocation.payment_id)
    .bind(allocation.order_item_id)
    .bind(allocation.amount)
    .bind(allocation.status.to_string())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_allocations_for_payment(
    payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ItemAllocation>, SettlementError> {
    let allocations = sqlx::query_as::<_, ItemAllocation>(
        "SELECT id, payment_id, order_item_id, amount, status, created_at, updated_at \
         FROM order_item_payments WHERE payment_id = $1 ORDER BY order_item_id ASC",
    )
    .bind(payment_id)
    .fetch_all(conn)
    .await?;
    Ok(allocations)
}

use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, NewOrderItem, NewProductVariant, Order, OrderItemDetail, PaymentStatus},
    traits::{SettlementError, StatusTransition},
};

const ORDER_COLUMNS: &str = r#"
    id, gateway_order_id, customer_name, customer_email, customer_phone,
    shipping_address, shipping_address_2, shipping_city, shipping_state, shipping_pincode, shipping_country,
    total_amount, payment_status, created_at, updated_at
"#;

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SettlementError> {
    let q = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&q).bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_orders_by_gateway_ref(
    gateway_order_id: &crate::db_types::GatewayOrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SettlementError> {
    let q = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE gateway_order_id = $1 ORDER BY id ASC");
    let orders = sqlx::query_as::<_, Order>(&q).bind(gateway_order_id.as_str()).fetch_all(conn).await?;
    trace!("🗃️ {} order(s) found for gateway reference {gateway_order_id}", orders.len());
    Ok(orders)
}

/// Fetches the order's items joined against the product catalogue, so that callers see the
/// variant's seller and unit weight alongside the values captured at checkout.
pub async fn fetch_items_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItemDetail>, SettlementError> {
    let items = sqlx::query_as::<_, OrderItemDetail>(
        r#"
        SELECT
            i.id, i.order_id, i.variant_id, i.product_name, i.sku, i.hsn_code, i.quantity,
            i.price_at_purchase, i.discount_at_purchase, i.gst_at_purchase, i.shipping_charge,
            i.seller_id, i.seller_name, i.fulfillment_status, i.shipment_id, i.draft_shipment_id,
            v.seller_id AS variant_seller_id, v.seller_name AS variant_seller_name, v.unit_weight_kg
        FROM order_items i
        JOIN product_variants v ON v.id = i.variant_id
        WHERE i.order_id = $1
        ORDER BY i.id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Applies a forward payment-status transition to the order. Backward or repeated transitions are
/// reported as [`StatusTransition::Unchanged`] without touching the row.
pub async fn transition_payment_status(
    order_id: i64,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<StatusTransition, SettlementError> {
    let order = fetch_order(order_id, &mut *conn).await?.ok_or(SettlementError::OrderNotFound(order_id))?;
    if !order.payment_status.can_transition_to(status) {
        debug!("🗃️ Order #{order_id} is {}. Not moving to {status}.", order.payment_status);
        return Ok(StatusTransition::Unchanged);
    }
    let status = status.to_string();
    sqlx::query("UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(StatusTransition::Applied)
}

pub async fn attach_items_to_shipment(
    item_ids: &[i64],
    shipment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), SettlementError> {
    if item_ids.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("UPDATE order_items SET shipment_id = ");
    builder.push_bind(shipment_id);
    builder.push(", draft_shipment_id = NULL WHERE id IN (");
    let mut ids = builder.separated(", ");
    for id in item_ids {
        ids.push_bind(*id);
    }
    builder.push(")");
    builder.build().execute(conn).await?;
    Ok(())
}

/// Reduces the variant's stock level, clamping at zero so replays or oversells never drive the
/// count negative.
pub async fn decrement_stock(
    variant_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), SettlementError> {
    sqlx::query("UPDATE product_variants SET stock_quantity = MAX(stock_quantity - $1, 0) WHERE id = $2")
        .bind(quantity)
        .bind(variant_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_variant_stock(variant_id: i64, conn: &mut SqliteConnection) -> Result<i64, SettlementError> {
    let stock = sqlx::query_scalar::<_, i64>("SELECT stock_quantity FROM product_variants WHERE id = $1")
        .bind(variant_id)
        .fetch_one(conn)
        .await?;
    Ok(stock)
}

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<i64, SettlementError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO orders (
            gateway_order_id, customer_name, customer_email, customer_phone,
            shipping_address, shipping_address_2, shipping_city, shipping_state, shipping_pincode, shipping_country,
            total_amount
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(order.gateway_order_id.as_str())
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.shipping_address)
    .bind(&order.shipping_address_2)
    .bind(&order.shipping_city)
    .bind(&order.shipping_state)
    .bind(&order.shipping_pincode)
    .bind(&order.shipping_country)
    .bind(order.total_amount)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn insert_product_variant(
    variant: NewProductVariant,
    conn: &mut SqliteConnection,
) -> Result<i64, SettlementError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO product_variants (sku, product_name, seller_id, seller_name, unit_weight_kg, stock_quantity)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&variant.sku)
    .bind(&variant.product_name)
    .bind(&variant.seller_id)
    .bind(&variant.seller_name)
    .bind(variant.unit_weight_kg)
    .bind(variant.stock_quantity)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn insert_order_item(item: NewOrderItem, conn: &mut SqliteConnection) -> Result<i64, SettlementError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO order_items (
            order_id, variant_id, product_name, sku, hsn_code, quantity,
            price_at_purchase, discount_at_purchase, gst_at_purchase, shipping_charge,
            seller_id, seller_name, draft_shipment_id
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(item.order_id)
    .bind(item.variant_id)
    .bind(&item.product_name)
    .bind(&item.sku)
    .bind(&item.hsn_code)
    .bind(item.quantity)
    .bind(item.price_at_purchase)
    .bind(item.discount_at_purchase)
    .bind(item.gst_at_purchase)
    .bind(item.shipping_charge)
    .bind(&item.seller_id)
    .bind(&item.seller_name)
    .bind(item.draft_shipment_id)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{DraftShipment, NewDraftShipment, NewShipment, Shipment},
    traits::SettlementError,
};

const SHIPMENT_COLUMNS: &str = r#"
    id, order_id, seller_id, carrier_shipment_id, carrier_order_id, carrier_order_ref, awb_code,
    courier_id, courier_name, pickup_location, status, label_url, manifest_url, created_at, updated_at
"#;

pub async fn fetch_drafts(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<DraftShipment>, SettlementError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new(
        "SELECT id, order_id, seller_id, pickup_location, courier_id, courier_name, shipping_charge, created_at \
         FROM draft_shipments WHERE id IN (",
    );
    let mut id_list = builder.separated(", ");
    for id in ids {
        id_list.push_bind(*id);
    }
    builder.push(") ORDER BY id ASC");
    let drafts = builder.build_query_as::<DraftShipment>().fetch_all(conn).await?;
    Ok(drafts)
}

pub async fn insert_shipment(shipment: NewShipment, conn: &mut SqliteConnection) -> Result<Shipment, SettlementError> {
    let q = format!(
        "INSERT INTO shipments (order_id, seller_id, carrier_shipment_id, carrier_order_id, carrier_order_ref, \
         awb_code, courier_id, courier_name, pickup_location) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {SHIPMENT_COLUMNS}"
    );
    let shipment = sqlx::query_as::<_, Shipment>(&q)
        .bind(shipment.order_id)
        .bind(&shipment.seller_id)
        .bind(shipment.carrier_shipment_id)
        .bind(shipment.carrier_order_id)
        .bind(&shipment.carrier_order_ref)
        .bind(&shipment.awb_code)
        .bind(shipment.courier_id)
        .bind(&shipment.courier_name)
        .bind(&shipment.pickup_location)
        .fetch_one(conn)
        .await?;
    Ok(shipment)
}

/// Deletes consumed drafts. The caller must have re-pointed any order items at their real shipment
/// first.
pub async fn delete_drafts(ids: &[i64], conn: &mut SqliteConnection) -> Result<(), SettlementError> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("DELETE FROM draft_shipments WHERE id IN (");
    let mut id_list = builder.separated(", ");
    for id in ids {
        id_list.push_bind(*id);
    }
    builder.push(")");
    builder.build().execute(conn).await?;
    Ok(())
}

pub async fn fetch_shipments_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Shipment>, SettlementError> {
    let q = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE order_id = $1 ORDER BY id ASC");
    let shipments = sqlx::query_as::<_, Shipment>(&q).bind(order_id).fetch_all(conn).await?;
    Ok(shipments)
}

pub async fn insert_draft(draft: NewDraftShipment, conn: &mut SqliteConnection) -> Result<i64, SettlementError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO draft_shipments (order_id, seller_id, pickup_location, courier_id, courier_name, \
         shipping_charge) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(draft.order_id)
    .bind(&draft.seller_id)
    .bind(&draft.pickup_location)
    .bind(draft.courier_id)
    .bind(&draft.courier_name)
    .bind(draft.shipping_charge)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

use sqlx::SqliteConnection;

use crate::traits::SettlementError;

/// Removes the cart and its items. Items go first to satisfy the foreign key. Deleting a cart
/// that was already cleaned up is a no-op.
pub async fn delete_cart(cart_id: &str, conn: &mut SqliteConnection) -> Result<(), SettlementError> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart_id).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM carts WHERE id = $1").bind(cart_id).execute(conn).await?;
    Ok(())
}

pub async fn insert_cart(cart_id: &str, items: &[(i64, i64)], conn: &mut SqliteConnection) -> Result<(), SettlementError> {
    sqlx::query("INSERT INTO carts (id) VALUES ($1)").bind(cart_id).execute(&mut *conn).await?;
    for (variant_id, quantity) in items {
        sqlx::query("INSERT INTO cart_items (cart_id, variant_id, quantity) VALUES ($1, $2, $3)")
            .bind(cart_id)
            .bind(variant_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn cart_exists(cart_id: &str, conn: &mut SqliteConnection) -> Result<bool, SettlementError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM carts WHERE id = $1")
        .bind(cart_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

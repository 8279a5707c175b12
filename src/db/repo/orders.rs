//! Order and order-line operations for the repository.

use crate::domain::{
    AccountId, Decimal, ItemId, Order, OrderId, OrderLine, OrderStatus, StallId, TimeMs,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

use super::{Repository, UnitOfWork};

fn map_order(row: &SqliteRow) -> Order {
    let status_str: String = row.get("status");
    let status = OrderStatus::from_str(&status_str).unwrap_or_else(|_| {
        warn!("unknown status '{}' in orders row; treating as cancelled", status_str);
        OrderStatus::Cancelled
    });
    Order {
        id: OrderId::new(row.get("id")),
        account_id: AccountId::new(row.get("account_id")),
        stall_id: StallId::new(row.get("stall_id")),
        status,
        total: Decimal::from_cents(row.get("total_cents")),
        created_at: TimeMs::new(row.get("created_at_ms")),
    }
}

impl Repository {
    /// Get an order by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, account_id, stall_id, status, total_cents, created_at_ms FROM orders WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| map_order(&r)))
    }

    /// Get an order by id, scoped to the stall it belongs to.
    ///
    /// An order of another stall is indistinguishable from a missing one.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_order_for_stall(
        &self,
        id: &OrderId,
        stall_id: &StallId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, stall_id, status, total_cents, created_at_ms
            FROM orders
            WHERE id = ? AND stall_id = ?
            "#,
        )
        .bind(id.as_str())
        .bind(stall_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| map_order(&r)))
    }

    /// Lines of an order, in insertion order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_order_lines(&self, id: &OrderId) -> Result<Vec<OrderLine>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, item_id, qty, unit_price_cents
            FROM order_lines
            WHERE order_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| OrderLine {
                order_id: OrderId::new(r.get("order_id")),
                item_id: ItemId::new(r.get("item_id")),
                qty: r.get("qty"),
                unit_price: Decimal::from_cents(r.get("unit_price_cents")),
            })
            .collect())
    }

    /// Conditionally move an order's status: the write only lands when the
    /// status is still `observed`.
    ///
    /// Returns `false` when zero rows changed, meaning another actor moved
    /// the status between the caller's read and this write.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn cas_order_status(
        &self,
        id: &OrderId,
        observed: OrderStatus,
        target: OrderStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status = ?")
            .bind(target.as_str())
            .bind(id.as_str())
            .bind(observed.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl UnitOfWork {
    /// Insert an order row.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_order(&mut self, order: &Order) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, account_id, stall_id, status, total_cents, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id.as_str())
        .bind(order.account_id.as_str())
        .bind(order.stall_id.as_str())
        .bind(order.status.as_str())
        .bind(order.total.as_cents())
        .bind(order.created_at.as_ms())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    /// Insert one order line with its frozen unit price.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_order_line(
        &mut self,
        line: &OrderLine,
        created_at: TimeMs,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO order_lines (order_id, item_id, qty, unit_price_cents, created_at_ms)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(line.order_id.as_str())
        .bind(line.item_id.as_str())
        .bind(line.qty)
        .bind(line.unit_price.as_cents())
        .bind(created_at.as_ms())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}

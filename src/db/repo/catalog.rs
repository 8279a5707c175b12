//! Stall-menu catalog operations for the repository.
//!
//! Items and discounts are administered elsewhere; this crate reads them at
//! checkout time and writes them only through the registration endpoints.

use crate::domain::{
    CatalogItem, CatalogSource, Decimal, Discount, DiscountId, ItemId, StallId, TimeMs,
};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Repository;

fn map_item(row: &SqliteRow) -> CatalogItem {
    CatalogItem {
        id: ItemId::new(row.get("id")),
        stall_id: StallId::new(row.get("stall_id")),
        name: row.get("name"),
        price: Decimal::from_cents(row.get("price_cents")),
        category: row.get("category"),
        created_at: TimeMs::new(row.get("created_at_ms")),
    }
}

fn map_discount(row: &SqliteRow) -> Discount {
    let percent_str: String = row.get("percent");
    Discount {
        id: DiscountId::new(row.get("id")),
        name: row.get("name"),
        percent: Decimal::from_str_canonical(&percent_str).unwrap_or_default(),
        starts_at: row.get::<Option<i64>, _>("starts_at_ms").map(TimeMs::new),
        ends_at: row.get::<Option<i64>, _>("ends_at_ms").map(TimeMs::new),
        created_at: TimeMs::new(row.get("created_at_ms")),
    }
}

impl Repository {
    /// Insert a catalog item.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_catalog_item(&self, item: &CatalogItem) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO catalog_items (id, stall_id, name, price_cents, category, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.as_str())
        .bind(item.stall_id.as_str())
        .bind(&item.name)
        .bind(item.price.as_cents())
        .bind(&item.category)
        .bind(item.created_at.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a catalog item by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_catalog_item(
        &self,
        id: &ItemId,
    ) -> Result<Option<CatalogItem>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, stall_id, name, price_cents, category, created_at_ms FROM catalog_items WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| map_item(&r)))
    }

    /// Insert a discount record.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_discount(&self, discount: &Discount) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO discounts (id, name, percent, starts_at_ms, ends_at_ms, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(discount.id.as_str())
        .bind(&discount.name)
        .bind(discount.percent.to_canonical_string())
        .bind(discount.starts_at.map(|t| t.as_ms()))
        .bind(discount.ends_at.map(|t| t.as_ms()))
        .bind(discount.created_at.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Associate a discount with an item. Idempotent.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn link_discount_item(
        &self,
        discount_id: &DiscountId,
        item_id: &ItemId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO discount_items (discount_id, item_id)
            VALUES (?, ?)
            ON CONFLICT(discount_id, item_id) DO NOTHING
            "#,
        )
        .bind(discount_id.as_str())
        .bind(item_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for Repository {
    async fn item(&self, id: &ItemId) -> Result<Option<CatalogItem>, sqlx::Error> {
        self.get_catalog_item(id).await
    }

    async fn discounts_for_item(&self, id: &ItemId) -> Result<Vec<Discount>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.name, d.percent, d.starts_at_ms, d.ends_at_ms, d.created_at_ms
            FROM discounts d
            JOIN discount_items di ON di.discount_id = d.id
            WHERE di.item_id = ?
            ORDER BY d.created_at_ms ASC, d.id ASC
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_discount).collect())
    }
}

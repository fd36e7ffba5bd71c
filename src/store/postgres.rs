//! PostgreSQL document store. Each table keeps its entity document in a JSONB column
//! next to the store-owned id, display order and timestamps.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

use super::{
    CategoryRename, Document, DocumentStore, ProfileDocument, ReadOrder, StoreError, StoreResult,
    Table,
};

const DOCUMENT_COLUMNS: &str = "id, display_order, data, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }
}

fn order_clause(table: Table) -> &'static str {
    match table.read_order() {
        ReadOrder::DisplayOrder => "ORDER BY display_order ASC, created_at ASC",
        ReadOrder::NewestFirst => "ORDER BY created_at DESC",
    }
}

/// Serializes writers that read and then rewrite `display_order`. The mode conflicts
/// with itself, so concurrent appends cannot both read the same maximum.
fn lock_order_sql(table: Table) -> String {
    format!("LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE", table.name())
}

/// Renumber a table's rows to 1..n in their current order
fn compact_sql(table: Table) -> String {
    format!(
        r#"
        UPDATE {t} SET display_order = ranked.rank
        FROM (
            SELECT id, (ROW_NUMBER() OVER (ORDER BY display_order, created_at))::INTEGER AS rank
            FROM {t}
        ) ranked
        WHERE {t}.id = ranked.id AND {t}.display_order <> ranked.rank
        "#,
        t = table.name()
    )
}

#[async_trait]
impl DocumentStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<Duration> {
        let start = std::time::Instant::now();
        sqlx::query("SELECT 1").fetch_one(self.pool()).await?;
        Ok(start.elapsed())
    }

    async fn list(&self, table: Table) -> StoreResult<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM {} {}",
            DOCUMENT_COLUMNS,
            table.name(),
            order_clause(table)
        );
        Ok(sqlx::query_as::<_, Document>(&sql)
            .fetch_all(self.pool())
            .await?)
    }

    async fn get(&self, table: Table, id: Uuid) -> StoreResult<Option<Document>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            DOCUMENT_COLUMNS,
            table.name()
        );
        Ok(sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn insert(&self, table: Table, data: Value) -> StoreResult<Document> {
        let sql = format!(
            r#"
            INSERT INTO {t} (display_order, data, created_at, updated_at)
            SELECT COALESCE(MAX(display_order), 0) + 1, $1, now(), now() FROM {t}
            RETURNING {cols}
            "#,
            t = table.name(),
            cols = DOCUMENT_COLUMNS
        );
        let mut tx = self.pool().begin().await?;
        sqlx::query(&lock_order_sql(table)).execute(&mut *tx).await?;
        let doc = sqlx::query_as::<_, Document>(&sql)
            .bind(&data)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(doc)
    }

    async fn update(&self, table: Table, id: Uuid, data: Value) -> StoreResult<Option<Document>> {
        let sql = format!(
            "UPDATE {} SET data = $1, updated_at = now() WHERE id = $2 RETURNING {}",
            table.name(),
            DOCUMENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Document>(&sql)
            .bind(&data)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn delete(&self, table: Table, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool().begin().await?;
        sqlx::query(&lock_order_sql(table)).execute(&mut *tx).await?;

        let sql = format!("DELETE FROM {} WHERE id = $1", table.name());
        let removed = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if removed && table.read_order() == ReadOrder::DisplayOrder {
            sqlx::query(&compact_sql(table)).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    async fn reorder(&self, table: Table, ids: &[Uuid]) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query(&lock_order_sql(table)).execute(&mut *tx).await?;
        let sql = format!(
            "UPDATE {} SET display_order = $1, updated_at = now() WHERE id = $2",
            table.name()
        );

        for (idx, id) in ids.iter().enumerate() {
            let affected = sqlx::query(&sql)
                .bind(idx as i32 + 1)
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            if affected == 0 {
                // Dropping the transaction rolls back the rows already written
                return Err(StoreError::UnknownId {
                    table: table.name(),
                    id: *id,
                });
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_field(
        &self,
        table: Table,
        id: Uuid,
        field: &str,
        value: Value,
    ) -> StoreResult<Option<Document>> {
        let sql = format!(
            r#"
            UPDATE {} SET data = jsonb_set(data, ARRAY[$1::TEXT], $2, true), updated_at = now()
            WHERE id = $3
            RETURNING {}
            "#,
            table.name(),
            DOCUMENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Document>(&sql)
            .bind(field)
            .bind(&value)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn get_profile(&self, owner_id: &str) -> StoreResult<Option<ProfileDocument>> {
        Ok(sqlx::query_as::<_, ProfileDocument>(
            "SELECT owner_id, data, updated_at FROM profile WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(self.pool())
        .await?)
    }

    async fn put_profile(&self, owner_id: &str, data: Value) -> StoreResult<ProfileDocument> {
        Ok(sqlx::query_as::<_, ProfileDocument>(
            r#"
            INSERT INTO profile (owner_id, data, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (owner_id) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = now()
            RETURNING owner_id, data, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&data)
        .fetch_one(self.pool())
        .await?)
    }

    async fn save_categories(
        &self,
        owner_id: &str,
        categories: Value,
        rename: Option<CategoryRename>,
    ) -> StoreResult<u64> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO profile (owner_id, data, updated_at)
            VALUES ($1, jsonb_build_object('skill_categories', $2::JSONB), now())
            ON CONFLICT (owner_id) DO UPDATE SET
                data = jsonb_set(profile.data, '{skill_categories}', $2::JSONB, true),
                updated_at = now()
            "#,
        )
        .bind(owner_id)
        .bind(&categories)
        .execute(&mut *tx)
        .await?;

        let rewritten = match rename {
            Some(rename) => {
                sqlx::query(
                    r#"
                    UPDATE skills
                    SET data = jsonb_set(data, '{category}', to_jsonb($2::TEXT), true),
                        updated_at = now()
                    WHERE data->>'category' = $1
                    "#,
                )
                .bind(&rename.from)
                .bind(&rename.to)
                .execute(&mut *tx)
                .await?
                .rows_affected()
            }
            None => 0,
        };

        tx.commit().await?;
        Ok(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_per_table() {
        assert!(order_clause(Table::Projects).contains("display_order ASC"));
        assert!(order_clause(Table::Messages).contains("created_at DESC"));
    }

    #[test]
    fn test_order_lock_conflicts_with_itself() {
        assert_eq!(
            lock_order_sql(Table::Experience),
            "LOCK TABLE experience IN SHARE ROW EXCLUSIVE MODE"
        );
    }

    /// Runs only against a scratch database named by `TEST_DATABASE_URL`; the
    /// projects table is emptied first.
    #[tokio::test]
    async fn test_concurrent_inserts_get_distinct_orders() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let pool = crate::db::init_pool(&crate::db::DbConfig {
            url,
            ..Default::default()
        })
        .await
        .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        sqlx::query("DELETE FROM projects")
            .execute(pool.as_ref())
            .await
            .unwrap();

        let store = Arc::new(PgStore::new(pool));
        let inserts = (0..10).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .insert(Table::Projects, serde_json::json!({ "title": i.to_string() }))
                    .await
                    .unwrap()
            })
        });
        for handle in inserts.collect::<Vec<_>>() {
            handle.await.unwrap();
        }

        let orders: Vec<i32> = store
            .list(Table::Projects)
            .await
            .unwrap()
            .iter()
            .map(|d| d.display_order)
            .collect();
        assert_eq!(orders, (1..=10).collect::<Vec<i32>>());
    }

    #[test]
    fn test_compact_sql_targets_table() {
        let sql = compact_sql(Table::SocialLinks);
        assert!(sql.contains("UPDATE social_links"));
        assert!(sql.contains("ROW_NUMBER()"));
    }
}

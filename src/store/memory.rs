//! In-memory document store, used when no database is configured and in tests.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CategoryRename, Document, DocumentStore, ProfileDocument, ReadOrder, StoreError, StoreResult,
    Table,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    // Rows are kept in insertion order
    tables: RwLock<HashMap<Table, Vec<Document>>>,
    profiles: RwLock<HashMap<String, ProfileDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted(table: Table, rows: &[Document]) -> Vec<Document> {
    let mut rows = rows.to_vec();
    match table.read_order() {
        ReadOrder::DisplayOrder => rows.sort_by_key(|d| (d.display_order, d.created_at)),
        ReadOrder::NewestFirst => {
            // Equal timestamps keep the later insert first
            rows.reverse();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
    }
    rows
}

/// Renumber rows to 1..n following their current display order
fn compact(rows: &mut [Document]) {
    let mut order: Vec<(i32, usize)> = rows
        .iter()
        .enumerate()
        .map(|(idx, d)| (d.display_order, idx))
        .collect();
    order.sort();
    for (rank, (_, idx)) in order.into_iter().enumerate() {
        rows[idx].display_order = rank as i32 + 1;
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<Duration> {
        Ok(Duration::ZERO)
    }

    async fn list(&self, table: Table) -> StoreResult<Vec<Document>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| sorted(table, rows))
            .unwrap_or_default())
    }

    async fn get(&self, table: Table, id: Uuid) -> StoreResult<Option<Document>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .and_then(|rows| rows.iter().find(|d| d.id == id).cloned()))
    }

    async fn insert(&self, table: Table, data: Value) -> StoreResult<Document> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let next_order = rows.iter().map(|d| d.display_order).max().unwrap_or(0) + 1;
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            display_order: next_order,
            data,
            created_at: now,
            updated_at: now,
        };
        rows.push(document.clone());
        Ok(document)
    }

    async fn update(&self, table: Table, id: Uuid, data: Value) -> StoreResult<Option<Document>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|d| d.id == id))
        else {
            return Ok(None);
        };
        row.data = data;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, table: Table, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|d| d.id != id);
        let removed = rows.len() != before;
        if removed && table.read_order() == ReadOrder::DisplayOrder {
            compact(rows);
        }
        Ok(removed)
    }

    async fn reorder(&self, table: Table, ids: &[Uuid]) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();

        // Validate everything before touching a row so a bad id changes nothing
        let mut positions = Vec::with_capacity(ids.len());
        for id in ids {
            match rows.iter().position(|d| d.id == *id) {
                Some(pos) => positions.push(pos),
                None => {
                    return Err(StoreError::UnknownId {
                        table: table.name(),
                        id: *id,
                    })
                }
            }
        }

        let now = Utc::now();
        for (rank, pos) in positions.into_iter().enumerate() {
            rows[pos].display_order = rank as i32 + 1;
            rows[pos].updated_at = now;
        }
        Ok(())
    }

    async fn set_field(
        &self,
        table: Table,
        id: Uuid,
        field: &str,
        value: Value,
    ) -> StoreResult<Option<Document>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|d| d.id == id))
        else {
            return Ok(None);
        };
        if let Value::Object(map) = &mut row.data {
            map.insert(field.to_string(), value);
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn get_profile(&self, owner_id: &str) -> StoreResult<Option<ProfileDocument>> {
        Ok(self.profiles.read().await.get(owner_id).cloned())
    }

    async fn put_profile(&self, owner_id: &str, data: Value) -> StoreResult<ProfileDocument> {
        let document = ProfileDocument {
            owner_id: owner_id.to_string(),
            data,
            updated_at: Utc::now(),
        };
        self.profiles
            .write()
            .await
            .insert(owner_id.to_string(), document.clone());
        Ok(document)
    }

    async fn save_categories(
        &self,
        owner_id: &str,
        categories: Value,
        rename: Option<CategoryRename>,
    ) -> StoreResult<u64> {
        // Lock order: tables then profiles, same as every other path holding both
        let mut tables = self.tables.write().await;
        let mut profiles = self.profiles.write().await;
        let now = Utc::now();

        let profile = profiles
            .entry(owner_id.to_string())
            .or_insert_with(|| ProfileDocument {
                owner_id: owner_id.to_string(),
                data: Value::Object(Default::default()),
                updated_at: now,
            });
        if let Value::Object(map) = &mut profile.data {
            map.insert("skill_categories".to_string(), categories);
        }
        profile.updated_at = now;

        let mut rewritten = 0;
        if let Some(rename) = rename {
            for skill in tables.entry(Table::Skills).or_default().iter_mut() {
                if skill.data.get("category").and_then(Value::as_str) == Some(rename.from.as_str())
                {
                    if let Value::Object(map) = &mut skill.data {
                        map.insert("category".to_string(), Value::String(rename.to.clone()));
                    }
                    skill.updated_at = now;
                    rewritten += 1;
                }
            }
        }
        Ok(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_appends_display_order() {
        let store = MemoryStore::new();
        let a = store.insert(Table::Projects, json!({"title": "a"})).await.unwrap();
        let b = store.insert(Table::Projects, json!({"title": "b"})).await.unwrap();
        assert_eq!(a.display_order, 1);
        assert_eq!(b.display_order, 2);
    }

    #[tokio::test]
    async fn test_delete_compacts_display_order() {
        let store = MemoryStore::new();
        let a = store.insert(Table::Skills, json!({"name": "a"})).await.unwrap();
        store.insert(Table::Skills, json!({"name": "b"})).await.unwrap();
        store.insert(Table::Skills, json!({"name": "c"})).await.unwrap();

        assert!(store.delete(Table::Skills, a.id).await.unwrap());
        let orders: Vec<i32> = store
            .list(Table::Skills)
            .await
            .unwrap()
            .iter()
            .map(|d| d.display_order)
            .collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_reorder_with_unknown_id_changes_nothing() {
        let store = MemoryStore::new();
        let a = store.insert(Table::Projects, json!({})).await.unwrap();
        let b = store.insert(Table::Projects, json!({})).await.unwrap();

        let result = store
            .reorder(Table::Projects, &[b.id, Uuid::new_v4(), a.id])
            .await;
        assert!(matches!(result, Err(StoreError::UnknownId { .. })));

        let ids: Vec<Uuid> = store
            .list(Table::Projects)
            .await
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_messages_list_newest_first() {
        let store = MemoryStore::new();
        let first = store.insert(Table::Messages, json!({"name": "1"})).await.unwrap();
        let second = store.insert(Table::Messages, json!({"name": "2"})).await.unwrap();

        let ids: Vec<Uuid> = store
            .list(Table::Messages)
            .await
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_save_categories_creates_profile_and_cascades() {
        let store = MemoryStore::new();
        store
            .insert(Table::Skills, json!({"name": "Rust", "category": "Backend"}))
            .await
            .unwrap();
        store
            .insert(Table::Skills, json!({"name": "CSS", "category": "Frontend"}))
            .await
            .unwrap();

        let rewritten = store
            .save_categories(
                "owner",
                json!([{"name": "Systems", "icon": "Cpu"}]),
                Some(CategoryRename {
                    from: "Backend".to_string(),
                    to: "Systems".to_string(),
                }),
            )
            .await
            .unwrap();
        assert_eq!(rewritten, 1);

        let profile = store.get_profile("owner").await.unwrap().unwrap();
        assert_eq!(profile.data["skill_categories"][0]["name"], "Systems");

        let categories: Vec<String> = store
            .list(Table::Skills)
            .await
            .unwrap()
            .iter()
            .map(|d| d.data["category"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(categories, vec!["Systems", "Frontend"]);
    }
}

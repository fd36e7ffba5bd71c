/*!
 * Content
 * Typed access to the portfolio documents, scoped to the site owner
 */
pub mod categories;
pub mod entity;
pub mod messages;

use std::{collections::HashSet, marker::PhantomData, sync::Arc};

use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{Profile, ProfileRecord, Record};
use crate::store::{Document, DocumentStore, StoreError};

pub use categories::DEFAULT_CATEGORIES;
pub use entity::Entity;
pub use messages::{MessagePage, PageRequest};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{0}")]
    Validation(String),

    #[error("{label} not found")]
    NotFound { label: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for ContentError {
    fn from(e: serde_json::Error) -> Self {
        ContentError::Store(StoreError::Encoding(e))
    }
}

pub type ContentResult<T> = Result<T, ContentError>;

fn decode<E: Entity>(document: Document) -> ContentResult<Record<E>> {
    Ok(Record {
        id: document.id,
        display_order: document.display_order,
        created_at: document.created_at,
        updated_at: document.updated_at,
        data: serde_json::from_value(document.data)?,
    })
}

/// Owner-scoped entry point to every collection and the profile
#[derive(Clone)]
pub struct Content {
    store: Arc<dyn DocumentStore>,
    owner_id: String,
}

impl Content {
    pub fn new(store: Arc<dyn DocumentStore>, owner_id: impl Into<String>) -> Self {
        Self {
            store,
            owner_id: owner_id.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn collection<E: Entity>(&self) -> Collection<E> {
        Collection {
            content: self.clone(),
            _entity: PhantomData,
        }
    }

    /// The owner's profile; an unsaved default when none exists yet
    pub async fn profile(&self) -> ContentResult<ProfileRecord> {
        match self.store.get_profile(&self.owner_id).await? {
            Some(doc) => Ok(ProfileRecord {
                owner_id: doc.owner_id,
                updated_at: Some(doc.updated_at),
                profile: serde_json::from_value(doc.data)?,
            }),
            None => Ok(ProfileRecord {
                owner_id: self.owner_id.clone(),
                updated_at: None,
                profile: Profile::default(),
            }),
        }
    }

    /// Full-document upsert of the profile. Skill categories are owned by the
    /// category operations, so the stored list is kept as is.
    pub async fn save_profile(&self, mut profile: Profile) -> ContentResult<ProfileRecord> {
        let current = self.store.get_profile(&self.owner_id).await?;
        profile.skill_categories = match current {
            Some(doc) => serde_json::from_value::<Profile>(doc.data)?.skill_categories,
            None => None,
        };
        profile.full_name = profile.full_name.trim().to_string();

        let doc = self
            .store
            .put_profile(&self.owner_id, serde_json::to_value(&profile)?)
            .await?;
        tracing::info!(owner = %self.owner_id, "profile saved");

        Ok(ProfileRecord {
            owner_id: doc.owner_id,
            updated_at: Some(doc.updated_at),
            profile: serde_json::from_value(doc.data)?,
        })
    }
}

/// Typed view over one table
pub struct Collection<E> {
    content: Content,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Collection<E> {
    fn clone(&self) -> Self {
        Self {
            content: self.content.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Collection<E> {
    fn not_found(id: Uuid) -> ContentError {
        ContentError::NotFound {
            label: E::LABEL,
            id: id.to_string(),
        }
    }

    pub async fn list(&self) -> ContentResult<Vec<Record<E>>> {
        self.content
            .store
            .list(E::TABLE)
            .await?
            .into_iter()
            .map(decode::<E>)
            .collect()
    }

    /// Records whose searchable fields contain `query`, ignoring case.
    /// A blank query lists everything.
    pub async fn search(&self, query: &str) -> ContentResult<Vec<Record<E>>> {
        let needle = query.trim().to_lowercase();
        let records = self.list().await?;
        if needle.is_empty() {
            return Ok(records);
        }
        Ok(records.into_iter().filter(|r| r.data.matches(&needle)).collect())
    }

    pub async fn get(&self, id: Uuid) -> ContentResult<Record<E>> {
        match self.content.store.get(E::TABLE, id).await? {
            Some(doc) => decode(doc),
            None => Err(Self::not_found(id)),
        }
    }

    /// Insert when `id` is `None`, otherwise replace the stored document
    pub async fn save(&self, id: Option<Uuid>, mut data: E) -> ContentResult<Record<E>> {
        data.normalize();
        data.validate()?;

        if let Some(category) = data.category_ref() {
            let categories = self.content.categories().await?;
            if !categories.iter().any(|c| c.name == category) {
                return Err(ContentError::Validation(format!(
                    "Unknown skill category '{}'",
                    category
                )));
            }
        }

        let value = serde_json::to_value(&data)?;
        let doc = match id {
            None => self.content.store.insert(E::TABLE, value).await?,
            Some(id) => self
                .content
                .store
                .update(E::TABLE, id, value)
                .await?
                .ok_or_else(|| Self::not_found(id))?,
        };

        tracing::info!(
            table = E::TABLE.name(),
            id = %doc.id,
            created = id.is_none(),
            "{} saved",
            E::LABEL
        );
        decode(doc)
    }

    pub async fn delete(&self, id: Uuid) -> ContentResult<()> {
        if !self.content.store.delete(E::TABLE, id).await? {
            return Err(Self::not_found(id));
        }
        tracing::info!(table = E::TABLE.name(), id = %id, "{} deleted", E::LABEL);
        Ok(())
    }

    /// Persist a new order and return the collection as stored afterwards.
    /// `ids` must name every record exactly once.
    pub async fn reorder(&self, ids: &[Uuid]) -> ContentResult<Vec<Record<E>>> {
        let current: HashSet<Uuid> = self
            .content
            .store
            .list(E::TABLE)
            .await?
            .iter()
            .map(|d| d.id)
            .collect();
        let requested: HashSet<Uuid> = ids.iter().copied().collect();

        if requested.len() != ids.len() || requested != current {
            return Err(ContentError::Conflict(format!(
                "Reorder must list every {} exactly once",
                E::LABEL
            )));
        }

        self.content.store.reorder(E::TABLE, ids).await?;
        tracing::info!(table = E::TABLE.name(), count = ids.len(), "order saved");
        self.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ChipSet, Project, SkillCategory};
    use crate::store::MemoryStore;

    fn content() -> Content {
        Content::new(Arc::new(MemoryStore::new()), "owner")
    }

    fn project(title: &str) -> Project {
        Project {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_rejects_missing_title() {
        let projects = content().collection::<Project>();
        let result = projects.save(None, project("  ")).await;
        assert!(matches!(result, Err(ContentError::Validation(_))));
        assert!(projects.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let projects = content().collection::<Project>();
        let result = projects.save(Some(Uuid::new_v4()), project("x")).await;
        assert!(matches!(result, Err(ContentError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let projects = content().collection::<Project>();
        let a = projects.save(None, project("a")).await.unwrap();
        projects.save(None, project("b")).await.unwrap();

        let mut edited = a.data.clone();
        edited.tags = ChipSet::from(["Rust"]);
        let saved = projects.save(Some(a.id), edited).await.unwrap();
        assert_eq!(saved.display_order, 1);
        assert_eq!(saved.data.tags.as_slice(), ["Rust"]);
    }

    #[tokio::test]
    async fn test_reorder_yields_contiguous_order() {
        let projects = content().collection::<Project>();
        let a = projects.save(None, project("a")).await.unwrap();
        let b = projects.save(None, project("b")).await.unwrap();
        let c = projects.save(None, project("c")).await.unwrap();

        let listed = projects.reorder(&[c.id, a.id, b.id]).await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|r| r.data.title.as_str()).collect();
        let orders: Vec<i32> = listed.iter().map(|r| r.display_order).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_partial_list() {
        let projects = content().collection::<Project>();
        let a = projects.save(None, project("a")).await.unwrap();
        projects.save(None, project("b")).await.unwrap();

        let result = projects.reorder(&[a.id]).await;
        assert!(matches!(result, Err(ContentError::Conflict(_))));
        let result = projects.reorder(&[a.id, a.id]).await;
        assert!(matches!(result, Err(ContentError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let projects = content().collection::<Project>();
        assert!(matches!(
            projects.delete(Uuid::new_v4()).await,
            Err(ContentError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_profile_defaults_until_first_save() {
        let content = content();
        let record = content.profile().await.unwrap();
        assert!(record.updated_at.is_none());

        let saved = content
            .save_profile(Profile {
                full_name: " Ada ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(saved.updated_at.is_some());
        assert_eq!(saved.profile.full_name, "Ada");
    }

    #[tokio::test]
    async fn test_profile_save_keeps_categories() {
        let content = content();
        content
            .add_category(SkillCategory::new("Systems", "Cpu"))
            .await
            .unwrap();

        let saved = content
            .save_profile(Profile {
                full_name: "Ada".to_string(),
                skill_categories: Some(vec![]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(saved
            .profile
            .skill_categories
            .unwrap_or_default()
            .iter()
            .any(|c| c.name == "Systems"));
    }
}

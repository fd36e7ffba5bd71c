//! List/editor tab shared by projects, experience, skills and social links.
//!
//! Every mutation goes to the store first; the local list is only ever replaced
//! by what the store confirmed.

use std::fmt;

use uuid::Uuid;

use crate::content::{Collection, ContentError, ContentResult, Entity};
use crate::db::models::Record;

/// Identity of the record being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftKey {
    /// Client-side key of a record that has never been saved
    Temp(String),
    Stored(Uuid),
}

impl DraftKey {
    fn temp() -> Self {
        DraftKey::Temp(format!("tmp-{}", Uuid::new_v4().simple()))
    }

    pub fn stored_id(&self) -> Option<Uuid> {
        match self {
            DraftKey::Temp(_) => None,
            DraftKey::Stored(id) => Some(*id),
        }
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftKey::Temp(key) => f.write_str(key),
            DraftKey::Stored(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Draft<E> {
    pub key: DraftKey,
    pub data: E,
}

/// What the tab is showing
#[derive(Debug)]
pub enum EditorState<'a, E> {
    List,
    Editing(&'a Draft<E>),
}

pub struct ListEditor<E> {
    collection: Collection<E>,
    records: Vec<Record<E>>,
    draft: Option<Draft<E>>,
    last_error: Option<String>,
}

impl<E: Entity> ListEditor<E> {
    pub fn new(collection: Collection<E>) -> Self {
        Self {
            collection,
            records: Vec::new(),
            draft: None,
            last_error: None,
        }
    }

    pub fn records(&self) -> &[Record<E>] {
        &self.records
    }

    /// The loaded list narrowed by the search box
    pub fn filtered(&self, query: &str) -> Vec<&Record<E>> {
        let needle = query.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| needle.is_empty() || r.data.matches(&needle))
            .collect()
    }

    pub fn state(&self) -> EditorState<'_, E> {
        match &self.draft {
            Some(draft) => EditorState::Editing(draft),
            None => EditorState::List,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn fail<T>(&mut self, err: ContentError) -> ContentResult<T> {
        tracing::warn!(entity = E::LABEL, error = %err, "editor operation failed");
        self.last_error = Some(err.to_string());
        Err(err)
    }

    /// Fetch the collection. On failure the previous list stays in place.
    pub async fn load(&mut self) -> ContentResult<()> {
        match self.collection.list().await {
            Ok(records) => {
                self.records = records;
                self.last_error = None;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Open an empty draft under a temporary key
    pub fn create(&mut self) -> &mut E {
        self.open(Draft {
            key: DraftKey::temp(),
            data: E::default(),
        })
    }

    /// Open a copy of a listed record
    pub fn edit(&mut self, id: Uuid) -> ContentResult<&mut E> {
        let Some(record) = self.records.iter().find(|r| r.id == id) else {
            return Err(ContentError::NotFound {
                label: E::LABEL,
                id: id.to_string(),
            });
        };
        let draft = Draft {
            key: DraftKey::Stored(record.id),
            data: record.data.clone(),
        };
        Ok(self.open(draft))
    }

    fn open(&mut self, draft: Draft<E>) -> &mut E {
        self.last_error = None;
        &mut self.draft.insert(draft).data
    }

    pub fn draft(&self) -> Option<&Draft<E>> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut E> {
        self.draft.as_mut().map(|d| &mut d.data)
    }

    /// Discard the draft, no questions asked
    pub fn cancel(&mut self) {
        self.draft = None;
        self.last_error = None;
    }

    /// Persist the draft, re-fetch and go back to the list. On failure the editor
    /// stays open with the draft untouched. Once the store has the record the draft
    /// is closed; a failed re-fetch only shows up in `last_error`.
    pub async fn save(&mut self) -> ContentResult<Uuid> {
        let Some(draft) = self.draft().cloned() else {
            return Err(ContentError::Conflict("No draft is open".to_string()));
        };

        let saved = match self.collection.save(draft.key.stored_id(), draft.data).await {
            Ok(saved) => saved,
            Err(e) => return self.fail(e),
        };

        self.draft = None;
        let id = saved.id;
        if self.load().await.is_err() {
            match self.records.iter_mut().find(|r| r.id == id) {
                Some(record) => *record = saved,
                None => self.records.push(saved),
            }
        }
        Ok(id)
    }

    /// Delete after confirmation. Nothing happens without it; the record leaves
    /// the local list only once the store has deleted it.
    pub async fn delete(&mut self, id: Uuid, confirmed: bool) -> ContentResult<bool> {
        if !confirmed {
            return Ok(false);
        }
        if let Err(e) = self.collection.delete(id).await {
            return self.fail(e);
        }
        self.records.retain(|r| r.id != id);
        self.last_error = None;
        Ok(true)
    }

    /// Drag-and-drop: move the record at `from` to `to`, persist the whole order
    /// and show what the store holds afterwards.
    pub async fn reorder(&mut self, from: usize, to: usize) -> ContentResult<()> {
        let len = self.records.len();
        if from >= len || to >= len {
            return self.fail(ContentError::Validation(format!(
                "position out of range (0..{})",
                len
            )));
        }
        if from == to {
            return Ok(());
        }

        let mut ids: Vec<Uuid> = self.records.iter().map(|r| r.id).collect();
        let moved = ids.remove(from);
        ids.insert(to, moved);

        match self.collection.reorder(&ids).await {
            Ok(records) => {
                self.records = records;
                self.last_error = None;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }
}

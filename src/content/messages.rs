//! Contact inbox: visitors submit, the owner reads and deletes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::db::models::{Message, Record};

use super::{Content, ContentError, ContentResult, Entity};

pub const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// One page of the inbox, newest first
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub items: Vec<Record<Message>>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub unread: usize,
}

impl MessagePage {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size.max(1))
    }
}

impl Content {
    /// Store a contact submission. Submissions always arrive unread.
    pub async fn submit_message(&self, mut message: Message) -> ContentResult<Record<Message>> {
        message.is_read = false;
        self.collection::<Message>().save(None, message).await
    }

    /// Messages newest first. Without a page request the whole inbox is returned.
    pub async fn list_messages(&self, page: Option<PageRequest>) -> ContentResult<MessagePage> {
        let all = self.collection::<Message>().list().await?;
        let total = all.len();
        let unread = all.iter().filter(|m| !m.data.is_read).count();

        let Some(request) = page.map(PageRequest::clamped) else {
            return Ok(MessagePage {
                page: 1,
                page_size: total.max(1),
                total,
                unread,
                items: all,
            });
        };

        let items = all
            .into_iter()
            .skip((request.page - 1).saturating_mul(request.page_size))
            .take(request.page_size)
            .collect();

        Ok(MessagePage {
            items,
            page: request.page,
            page_size: request.page_size,
            total,
            unread,
        })
    }

    /// Flag a message as read. Already-read messages are returned without a write.
    pub async fn mark_read(&self, id: Uuid) -> ContentResult<Record<Message>> {
        self.set_read(id, true).await
    }

    /// Put a message back into the unread state.
    pub async fn mark_unread(&self, id: Uuid) -> ContentResult<Record<Message>> {
        self.set_read(id, false).await
    }

    async fn set_read(&self, id: Uuid, read: bool) -> ContentResult<Record<Message>> {
        let current = self.collection::<Message>().get(id).await?;
        if current.data.is_read == read {
            return Ok(current);
        }

        let doc = self
            .store
            .set_field(Message::TABLE, id, "is_read", Value::Bool(read))
            .await?
            .ok_or(ContentError::NotFound {
                label: "message",
                id: id.to_string(),
            })?;
        tracing::debug!(id = %id, read, "message read state changed");
        super::decode(doc)
    }

    pub async fn delete_message(&self, id: Uuid) -> ContentResult<()> {
        self.collection::<Message>().delete(id).await
    }
}

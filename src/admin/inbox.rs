//! Messages tab: newest first, expand to read, confirm to delete.

use uuid::Uuid;

use crate::content::{Content, ContentError, ContentResult, MessagePage, PageRequest};
use crate::db::models::{Message, Record};

pub struct Inbox {
    content: Content,
    paging: Option<PageRequest>,
    page: Option<MessagePage>,
    expanded: Option<Uuid>,
    last_error: Option<String>,
}

impl Inbox {
    /// `paging` of `None` shows the whole inbox on one page
    pub fn new(content: Content, paging: Option<PageRequest>) -> Self {
        Self {
            content,
            paging,
            page: None,
            expanded: None,
            last_error: None,
        }
    }

    pub fn messages(&self) -> &[Record<Message>] {
        self.page.as_ref().map(|p| p.items.as_slice()).unwrap_or(&[])
    }

    pub fn page(&self) -> Option<&MessagePage> {
        self.page.as_ref()
    }

    pub fn unread_count(&self) -> usize {
        self.page.as_ref().map(|p| p.unread).unwrap_or(0)
    }

    pub fn expanded(&self) -> Option<Uuid> {
        self.expanded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn fail<T>(&mut self, err: ContentError) -> ContentResult<T> {
        tracing::warn!(error = %err, "inbox operation failed");
        self.last_error = Some(err.to_string());
        Err(err)
    }

    /// Fetch the current page; a failed fetch leaves the previous page shown
    pub async fn load(&mut self) -> ContentResult<()> {
        match self.content.list_messages(self.paging).await {
            Ok(page) => {
                self.page = Some(page);
                self.last_error = None;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn next_page(&mut self) -> ContentResult<bool> {
        let (Some(paging), Some(page)) = (self.paging.as_mut(), self.page.as_ref()) else {
            return Ok(false);
        };
        if paging.page >= page.total_pages() {
            return Ok(false);
        }
        paging.page += 1;
        self.load().await?;
        Ok(true)
    }

    pub async fn previous_page(&mut self) -> ContentResult<bool> {
        let Some(paging) = self.paging.as_mut() else {
            return Ok(false);
        };
        if paging.page <= 1 {
            return Ok(false);
        }
        paging.page -= 1;
        self.load().await?;
        Ok(true)
    }

    /// Open a message. The first expansion of an unread message marks it read;
    /// later ones do not write again.
    pub async fn expand(&mut self, id: Uuid) -> ContentResult<()> {
        let Some(position) = self.messages().iter().position(|m| m.id == id) else {
            return self.fail(ContentError::NotFound {
                label: "message",
                id: id.to_string(),
            });
        };
        self.expanded = Some(id);

        if self.messages()[position].data.is_read {
            return Ok(());
        }

        let updated = match self.content.mark_read(id).await {
            Ok(updated) => updated,
            Err(e) => return self.fail(e),
        };
        if let Some(page) = self.page.as_mut() {
            page.items[position] = updated;
            page.unread = page.unread.saturating_sub(1);
        }
        Ok(())
    }

    /// Flip a message between read and unread; returns the new state
    pub async fn toggle_read(&mut self, id: Uuid) -> ContentResult<bool> {
        let Some(position) = self.messages().iter().position(|m| m.id == id) else {
            return self.fail(ContentError::NotFound {
                label: "message",
                id: id.to_string(),
            });
        };

        let result = if self.messages()[position].data.is_read {
            self.content.mark_unread(id).await
        } else {
            self.content.mark_read(id).await
        };
        let updated = match result {
            Ok(updated) => updated,
            Err(e) => return self.fail(e),
        };

        let read = updated.data.is_read;
        if let Some(page) = self.page.as_mut() {
            page.items[position] = updated;
            page.unread = if read {
                page.unread.saturating_sub(1)
            } else {
                page.unread + 1
            };
        }
        self.last_error = None;
        Ok(read)
    }

    pub fn collapse(&mut self) {
        self.expanded = None;
    }

    pub async fn delete(&mut self, id: Uuid, confirmed: bool) -> ContentResult<bool> {
        if !confirmed {
            return Ok(false);
        }
        if let Err(e) = self.content.delete_message(id).await {
            return self.fail(e);
        }
        if self.expanded == Some(id) {
            self.expanded = None;
        }
        if let Some(page) = self.page.as_mut() {
            if let Some(idx) = page.items.iter().position(|m| m.id == id) {
                let removed = page.items.remove(idx);
                page.total = page.total.saturating_sub(1);
                if !removed.data.is_read {
                    page.unread = page.unread.saturating_sub(1);
                }
            }
        }
        self.last_error = None;
        Ok(true)
    }
}

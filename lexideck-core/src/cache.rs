//! Paginated card buffer.
//!
//! The cache holds exactly one fetched batch. Cards leave the buffer in fetch
//! order and are never served twice from the same batch; a new page is pulled
//! only after the current one is used up.

use crate::audio::ResetHook;
use crate::source::ContentSource;
use crate::{Card, FetchError};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cursor {
    /// Nothing fetched yet; the next fetch asks for the first page.
    Start,
    Token(String),
    /// The source reported no further pages.
    End,
}

impl Cursor {
    fn from_next(next: Option<String>) -> Self {
        match next {
            Some(t) => Cursor::Token(t),
            None => Cursor::End,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Cursor::End)
    }
}

pub struct PageCache {
    source: Arc<dyn ContentSource>,
    hook: Arc<dyn ResetHook>,
    buffer: Vec<Card>,
    cursor: Cursor,
    position: usize,
}

impl PageCache {
    pub fn new(source: Arc<dyn ContentSource>, hook: Arc<dyn ResetHook>) -> Self {
        Self {
            source,
            hook,
            buffer: Vec::new(),
            cursor: Cursor::Start,
            position: 0,
        }
    }

    pub fn buffer(&self) -> &[Card] {
        &self.buffer
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn has_more(&self) -> bool {
        self.position < self.buffer.len() || !self.cursor.is_terminal()
    }

    /// Hands out the next card, pulling one page from the source when the
    /// buffer is used up. On fetch failure nothing is mutated.
    pub async fn next(&mut self) -> Result<Option<Card>, FetchError> {
        if let Some(card) = self.buffer.get(self.position) {
            self.position += 1;
            return Ok(Some(card.clone()));
        }

        let token = match &self.cursor {
            Cursor::End => return Ok(None),
            Cursor::Start => None,
            Cursor::Token(t) => Some(t.as_str()),
        };

        let page = self.source.fetch_page(token).await?;
        info!(
            cards = page.cards.len(),
            more = page.next_cursor.is_some(),
            "fetched card page"
        );

        let old = std::mem::replace(&mut self.buffer, page.cards);
        self.cursor = Cursor::from_next(page.next_cursor);
        self.position = 0;
        if !self.buffer.is_empty() {
            self.hook.on_load(&self.buffer);
        }
        if !old.is_empty() {
            self.hook.on_discard(&old);
        }

        match self.buffer.first() {
            Some(card) => {
                self.position = 1;
                Ok(Some(card.clone()))
            }
            None => Ok(None),
        }
    }

    /// Drops the batch and rewinds to the first page.
    pub fn reset(&mut self) {
        debug!(discarded = self.buffer.len(), "resetting page cache");
        let old = std::mem::take(&mut self.buffer);
        self.cursor = Cursor::Start;
        self.position = 0;
        if !old.is_empty() {
            self.hook.on_discard(&old);
        }
    }
}

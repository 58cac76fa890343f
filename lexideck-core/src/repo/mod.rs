use crate::{filter_by_category, sort_deck_order, Card, CoreError, NewCard, Page, ReviewRecord};
use async_trait::async_trait;

pub mod memory;

/// One page request against a card store.
#[derive(Clone, Debug)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub limit: usize,
    pub category: Option<String>,
}

impl PageQuery {
    pub fn first(limit: usize) -> Self {
        Self {
            cursor: None,
            limit,
            category: None,
        }
    }

    /// Decodes the cursor into a row offset. Cursors are opaque to callers.
    pub fn offset(&self) -> Result<usize, CoreError> {
        match &self.cursor {
            None => Ok(0),
            Some(c) => c.parse().map_err(|_| CoreError::Invalid("cursor")),
        }
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.max(1)
    }
}

#[async_trait]
pub trait Repository: Send + Sync {
    // Cards
    async fn add_card(&self, new: NewCard) -> Result<Card, CoreError>;
    async fn get_card(&self, id: &str) -> Result<Card, CoreError>;
    async fn list_cards(&self) -> Result<Vec<Card>, CoreError>;
    async fn delete_card(&self, id: &str) -> Result<(), CoreError>;
    async fn page_cards(&self, query: &PageQuery) -> Result<Page, CoreError>;

    // Reviews
    async fn record_review(&self, review: &ReviewRecord) -> Result<(), CoreError>;
    async fn list_reviews_for_card(&self, card_id: &str) -> Result<Vec<ReviewRecord>, CoreError>;
}

/// Slices an unordered card set into one page; shared by the in-process stores.
pub fn paginate(cards: Vec<Card>, query: &PageQuery) -> Result<Page, CoreError> {
    let offset = query.offset()?;
    let mut cards = match &query.category {
        Some(cat) => filter_by_category(&cards, cat),
        None => cards,
    };
    sort_deck_order(&mut cards);

    let end = offset.saturating_add(query.effective_limit()).min(cards.len());
    let page: Vec<Card> = cards.get(offset..end).map(<[Card]>::to_vec).unwrap_or_default();
    let next_cursor = (end < cards.len()).then(|| end.to_string());
    Ok(Page {
        cards: page,
        next_cursor,
    })
}

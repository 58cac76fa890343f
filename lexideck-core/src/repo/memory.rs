use crate::repo::{paginate, PageQuery};
use crate::{Card, CardId, CoreError, NewCard, Page, ReviewRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryRepo {
    cards: RwLock<HashMap<CardId, Card>>,
    reviews: RwLock<HashMap<CardId, Vec<ReviewRecord>>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with ready-made cards, keeping their ids and timestamps.
    pub fn with_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let repo = Self::default();
        {
            let mut m = repo.cards.write();
            for c in cards {
                m.insert(c.id.clone(), c);
            }
        }
        repo
    }
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn add_card(&self, new: NewCard) -> Result<Card, CoreError> {
        if new.phrase.trim().is_empty() {
            return Err(CoreError::Invalid("empty phrase"));
        }
        let card = new.into_card();
        self.cards.write().insert(card.id.clone(), card.clone());
        Ok(card)
    }

    async fn get_card(&self, id: &str) -> Result<Card, CoreError> {
        self.cards
            .read()
            .get(id)
            .cloned()
            .ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self) -> Result<Vec<Card>, CoreError> {
        Ok(self.cards.read().values().cloned().collect())
    }

    async fn delete_card(&self, id: &str) -> Result<(), CoreError> {
        self.cards
            .write()
            .remove(id)
            .ok_or(CoreError::NotFound("card"))?;
        self.reviews.write().remove(id);
        Ok(())
    }

    async fn page_cards(&self, query: &PageQuery) -> Result<Page, CoreError> {
        let cards: Vec<Card> = self.cards.read().values().cloned().collect();
        paginate(cards, query)
    }

    async fn record_review(&self, review: &ReviewRecord) -> Result<(), CoreError> {
        {
            let mut m = self.cards.write();
            let Some(card) = m.get_mut(&review.card_id) else {
                return Err(CoreError::NotFound("card"));
            };
            card.apply_review(review);
        }
        self.reviews
            .write()
            .entry(review.card_id.clone())
            .or_default()
            .push(review.clone());
        Ok(())
    }

    async fn list_reviews_for_card(&self, card_id: &str) -> Result<Vec<ReviewRecord>, CoreError> {
        Ok(self
            .reviews
            .read()
            .get(card_id)
            .cloned()
            .unwrap_or_default())
    }
}

use crate::Card;

pub fn filter_by_text(cards: &[Card], query: &str) -> Vec<Card> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|c| {
            c.phrase.to_lowercase().contains(&q)
                || c.meaning.to_lowercase().contains(&q)
                || c.example
                    .as_ref()
                    .map(|e| e.to_lowercase().contains(&q))
                    .unwrap_or(false)
                || c.categories.iter().any(|t| t.to_lowercase().contains(&q))
        })
        .cloned()
        .collect()
}

pub fn filter_by_category(cards: &[Card], category: &str) -> Vec<Card> {
    let q = category.trim().to_lowercase();
    cards
        .iter()
        .filter(|c| c.categories.iter().any(|t| t.to_lowercase() == q))
        .cloned()
        .collect()
}

/// Deck order used for paging: oldest first, id as tie-breaker.
pub fn sort_deck_order(cards: &mut [Card]) {
    cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

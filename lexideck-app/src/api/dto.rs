use lexideck_core::{Card, InboundEvent};
use serde::{Deserialize, Serialize};

/// Body posted by the messaging platform bridge.
#[derive(Deserialize)]
pub struct WebhookIn {
    pub conversation_id: String,
    pub text: String,
}

impl WebhookIn {
    pub fn into_event(self) -> Option<InboundEvent> {
        if self.conversation_id.trim().is_empty() {
            return None;
        }
        Some(InboundEvent::new(self.conversation_id, self.text))
    }
}

#[derive(Serialize)]
pub struct CardOut {
    pub id: String,
    pub phrase: String,
    pub meaning: String,
    pub categories: Vec<String>,
    pub reviews: usize,
}

impl From<Card> for CardOut {
    fn from(c: Card) -> Self {
        Self {
            reviews: c.grades.len(),
            id: c.id,
            phrase: c.phrase,
            meaning: c.meaning,
            categories: c.categories,
        }
    }
}

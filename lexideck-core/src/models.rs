use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque card identity assigned by the content store.
pub type CardId = String;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Best,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Best, Grade::Good, Grade::Fair, Grade::Poor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Best => "best",
            Grade::Good => "good",
            Grade::Fair => "fair",
            Grade::Poor => "poor",
        }
    }

    pub fn parse(s: &str) -> Option<Grade> {
        Grade::ALL.into_iter().find(|g| g.as_str() == s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub phrase: String,
    pub meaning: String,
    pub example: Option<String>,
    pub categories: Vec<String>,

    pub grades: Vec<Grade>,
    pub last_reviewed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(phrase: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phrase: phrase.into(),
            meaning: meaning.into(),
            example: None,
            categories: Vec::new(),
            grades: Vec::new(),
            last_reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn last_grade(&self) -> Option<Grade> {
        self.grades.last().copied()
    }

    /// Folds a submitted review into the card's history.
    pub fn apply_review(&mut self, review: &ReviewRecord) {
        self.grades.push(review.grade);
        self.last_reviewed_at = Some(review.reviewed_at);
    }
}

/// Input for creating a card in a repository.
#[derive(Clone, Debug, Default)]
pub struct NewCard {
    pub phrase: String,
    pub meaning: String,
    pub example: Option<String>,
    pub categories: Vec<String>,
}

impl NewCard {
    pub fn into_card(self) -> Card {
        let mut card = Card::new(self.phrase, self.meaning);
        card.example = self.example;
        card.categories = self.categories;
        card
    }
}

/// One batch of cards from the content store. `next_cursor == None` means no more pages.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Page {
    pub cards: Vec<Card>,
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewRecord {
    pub card_id: CardId,
    pub grade: Grade,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewRecord {
    pub fn new(card_id: impl Into<CardId>, grade: Grade) -> Self {
        Self {
            card_id: card_id.into(),
            grade,
            reviewed_at: Utc::now(),
        }
    }
}

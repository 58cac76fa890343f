//! Outbound message shapes and the text templates that fill them.

use crate::audio::AudioRef;
use crate::classify::{grade_label, ADVANCE_LABEL, REVEAL_LABEL};
use crate::session::SessionState;
use crate::{Card, Grade};
use serde::Serialize;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Body {
    Text { text: String },
    Audio { url: String },
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Message {
    #[serde(flatten)]
    pub body: Body,
    pub suggested_actions: Vec<String>,
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            body: Body::Text { text: text.into() },
            suggested_actions: Vec::new(),
        }
    }

    pub fn audio(audio: AudioRef) -> Self {
        Self {
            body: Body::Audio { url: audio.url },
            suggested_actions: Vec::new(),
        }
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggested_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            Body::Text { text } => Some(text),
            Body::Audio { .. } => None,
        }
    }
}

/// Everything sent back for one inbound event.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ReplyBatch {
    pub conversation_id: String,
    pub messages: Vec<Message>,
}

impl ReplyBatch {
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().filter_map(Message::as_text).collect()
    }
}

fn grade_actions() -> Vec<&'static str> {
    Grade::ALL.into_iter().map(grade_label).collect()
}

pub fn card_shown(card: &Card) -> Message {
    Message::text(card.phrase.clone()).with_actions([REVEAL_LABEL])
}

pub fn card_details(card: &Card) -> Message {
    let mut text = format!("{}\n\nMeaning: {}", card.phrase, card.meaning);
    if let Some(example) = card.example.as_deref().filter(|e| !e.is_empty()) {
        text.push_str(&format!("\nExample: {example}"));
    }
    if !card.categories.is_empty() {
        text.push_str(&format!("\nCategories: {}", card.categories.join(", ")));
    }
    match card.last_grade() {
        Some(g) => text.push_str(&format!(
            "\nReviewed {} time(s), last: {}",
            card.grades.len(),
            grade_label(g)
        )),
        None => text.push_str("\nFirst review"),
    }
    Message::text(text).with_actions(grade_actions())
}

pub fn deck_complete() -> Message {
    Message::text("That's every card in the deck. Well done!").with_actions([ADVANCE_LABEL])
}

pub fn press_advance() -> Message {
    Message::text(format!("Tap \"{ADVANCE_LABEL}\" to get a card.")).with_actions([ADVANCE_LABEL])
}

/// Echoes the card on screen with the buttons its phase accepts.
pub fn repeat_current(state: &SessionState) -> Message {
    match state {
        SessionState::Idle => press_advance(),
        SessionState::Shown { card, graded: false } => {
            Message::text(card.phrase.clone()).with_actions([REVEAL_LABEL])
        }
        SessionState::Shown { card, graded: true } => {
            Message::text(card.phrase.clone()).with_actions([ADVANCE_LABEL])
        }
        SessionState::Revealed { card } => {
            Message::text(card.phrase.clone()).with_actions(grade_actions())
        }
    }
}

pub fn fetch_failed() -> Message {
    Message::text("Couldn't load cards right now. Please try again.").with_actions([ADVANCE_LABEL])
}

pub fn grade_saved(grade: Grade) -> Message {
    Message::text(format!("Recorded: {}", grade_label(grade))).with_actions([ADVANCE_LABEL])
}

pub fn grade_not_saved(card: &Card) -> Message {
    Message::text(format!(
        "Could not save your answer for \"{}\". Please record it manually.",
        card.phrase
    ))
    .with_actions([ADVANCE_LABEL])
}

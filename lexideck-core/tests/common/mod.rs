#![allow(dead_code)]

use async_trait::async_trait;
use lexideck_core::{
    AudioError, AudioGenerator, AudioRef, Card, ContentSource, FetchError, Page, PersistError,
    ProgressSink, ResetHook, ReviewRecord,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn card(phrase: &str) -> Card {
    Card::new(phrase, format!("meaning of {phrase}"))
}

pub fn page(cards: Vec<Card>, next: Option<&str>) -> Page {
    Page {
        cards,
        next_cursor: next.map(str::to_string),
    }
}

/// Content source that plays back queued pages and remembers every cursor it was asked for.
#[derive(Default)]
pub struct ScriptedSource {
    pages: Mutex<VecDeque<Result<Page, FetchError>>>,
    pub calls: Mutex<Vec<Option<String>>>,
}

impl ScriptedSource {
    pub fn new(pages: impl IntoIterator<Item = Page>) -> Self {
        let s = Self::default();
        for p in pages {
            s.push(p);
        }
        s
    }

    pub fn push(&self, page: Page) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_error(&self, msg: &str) {
        self.pages.lock().unwrap().push_back(Err(FetchError::new(msg)));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn cursors(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, FetchError> {
        self.calls.lock().unwrap().push(cursor.map(str::to_string));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::new("no page queued")))
    }
}

/// Source that always serves the same single page, so a deck can be replayed after reset.
pub struct FixedDeck(pub Vec<Card>);

#[async_trait]
impl ContentSource for FixedDeck {
    async fn fetch_page(&self, _cursor: Option<&str>) -> Result<Page, FetchError> {
        Ok(page(self.0.clone(), None))
    }
}

/// Replays one deck like `FixedDeck`, failing the fetches marked in `schedule` (cycled).
pub struct FlakyDeck {
    deck: Vec<Card>,
    schedule: Vec<bool>,
    calls: AtomicUsize,
    failures: AtomicUsize,
}

impl FlakyDeck {
    pub fn new(deck: Vec<Card>, schedule: Vec<bool>) -> Self {
        Self {
            deck,
            schedule,
            calls: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for FlakyDeck {
    async fn fetch_page(&self, _cursor: Option<&str>) -> Result<Page, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = !self.schedule.is_empty() && self.schedule[n % self.schedule.len()];
        if fail {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(FetchError::new("content store unavailable"));
        }
        Ok(page(self.deck.clone(), None))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub fail: bool,
    pub records: Mutex<Vec<ReviewRecord>>,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn record(&self, review: &ReviewRecord) -> Result<(), PersistError> {
        self.records.lock().unwrap().push(review.clone());
        if self.fail {
            Err(PersistError::new("store offline"))
        } else {
            Ok(())
        }
    }
}

pub struct FakeSpeech {
    pub fail: bool,
}

#[async_trait]
impl AudioGenerator for FakeSpeech {
    async fn synthesize(&self, _text: &str, card_id: &str) -> Result<AudioRef, AudioError> {
        if self.fail {
            Err(AudioError::Request("tts down".into()))
        } else {
            Ok(AudioRef {
                url: format!("http://audio.test/{card_id}.mp3"),
            })
        }
    }
}

#[derive(Default)]
pub struct RecordingHook {
    pub discarded: Mutex<Vec<Vec<String>>>,
}

impl RecordingHook {
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.discarded.lock().unwrap().clone()
    }
}

impl ResetHook for RecordingHook {
    fn on_discard(&self, cards: &[Card]) {
        self.discarded
            .lock()
            .unwrap()
            .push(cards.iter().map(|c| c.phrase.clone()).collect());
    }
}

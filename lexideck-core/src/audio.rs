use crate::{AudioError, Card, CardId};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Where a generated clip can be fetched by the messaging client.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioRef {
    pub url: String,
}

/// Best-effort speech synthesis for a card's phrase.
#[async_trait]
pub trait AudioGenerator: Send + Sync {
    async fn synthesize(&self, text: &str, card_id: &str) -> Result<AudioRef, AudioError>;
}

/// Invoked with every batch the page cache loads and throws away.
pub trait ResetHook: Send + Sync {
    fn on_load(&self, _cards: &[Card]) {}

    fn on_discard(&self, cards: &[Card]);
}

pub struct NoSpeech;

#[async_trait]
impl AudioGenerator for NoSpeech {
    async fn synthesize(&self, _text: &str, _card_id: &str) -> Result<AudioRef, AudioError> {
        Err(AudioError::Disabled)
    }
}

pub struct NoopHook;

impl ResetHook for NoopHook {
    fn on_discard(&self, _cards: &[Card]) {}
}

/// Shares one cleanup hook between many page caches.
///
/// Counts how many live batches hold each card and only forwards a card to
/// the inner hook once no cache holds it any more.
pub struct SharedHook {
    inner: Arc<dyn ResetHook>,
    held: Mutex<HashMap<CardId, usize>>,
}

impl SharedHook {
    pub fn new(inner: Arc<dyn ResetHook>) -> Self {
        Self {
            inner,
            held: Mutex::new(HashMap::new()),
        }
    }

    pub fn holders(&self, card_id: &str) -> usize {
        self.held.lock().get(card_id).copied().unwrap_or(0)
    }
}

impl ResetHook for SharedHook {
    fn on_load(&self, cards: &[Card]) {
        let mut held = self.held.lock();
        for card in cards {
            *held.entry(card.id.clone()).or_insert(0) += 1;
        }
    }

    fn on_discard(&self, cards: &[Card]) {
        let released: Vec<Card> = {
            let mut held = self.held.lock();
            cards
                .iter()
                .filter(|card| match held.get(&card.id).copied() {
                    Some(n) if n > 1 => {
                        held.insert(card.id.clone(), n - 1);
                        false
                    }
                    Some(_) => {
                        held.remove(&card.id);
                        true
                    }
                    // Never loaded through this hook.
                    None => true,
                })
                .cloned()
                .collect()
        };
        if !released.is_empty() {
            self.inner.on_discard(&released);
        }
    }
}

//! Turns inbound chat events into session transitions and replies.
//!
//! Each conversation owns its own `SessionState` and `PageCache`. Events for
//! one conversation are serialized through a per-key async mutex; different
//! conversations never share state and can be handled in parallel.

use crate::audio::{AudioGenerator, NoSpeech, NoopHook, ResetHook, SharedHook};
use crate::cache::PageCache;
use crate::classify::{classify, Input};
use crate::progress::ProgressSink;
use crate::reply::{self, Message, ReplyBatch};
use crate::session::{Phase, SessionState};
use crate::source::ContentSource;
use crate::{AudioError, Card, Grade, ReviewRecord};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Deserialize)]
pub struct InboundEvent {
    pub conversation_id: String,
    pub text: String,
}

impl InboundEvent {
    pub fn new(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text: text.into(),
        }
    }
}

struct Conversation {
    state: SessionState,
    cache: PageCache,
}

pub struct DialogueController {
    source: Arc<dyn ContentSource>,
    progress: Arc<dyn ProgressSink>,
    audio: Arc<dyn AudioGenerator>,
    hook: Arc<dyn ResetHook>,
    sessions: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Conversation>>>>,
}

impl DialogueController {
    pub fn new(source: Arc<dyn ContentSource>, progress: Arc<dyn ProgressSink>) -> Self {
        Self {
            source,
            progress,
            audio: Arc::new(NoSpeech),
            hook: Arc::new(NoopHook),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Attaches speech synthesis and the hook that cleans up after discarded batches.
    /// All conversations share `hook`; a card reaches it only once no
    /// conversation's cache still holds that card.
    pub fn with_audio(mut self, audio: Arc<dyn AudioGenerator>, hook: Arc<dyn ResetHook>) -> Self {
        self.audio = audio;
        self.hook = Arc::new(SharedHook::new(hook));
        self
    }

    pub fn conversation_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub async fn phase(&self, conversation_id: &str) -> Phase {
        let Some(conv) = self.existing(conversation_id) else {
            return Phase::Idle;
        };
        let guard = conv.lock().await;
        guard.state.phase()
    }

    pub async fn current_card(&self, conversation_id: &str) -> Option<Card> {
        let conv = self.existing(conversation_id)?;
        let guard = conv.lock().await;
        guard.state.current().cloned()
    }

    fn existing(&self, conversation_id: &str) -> Option<Arc<tokio::sync::Mutex<Conversation>>> {
        self.sessions.lock().get(conversation_id).cloned()
    }

    fn conversation(&self, conversation_id: &str) -> Arc<tokio::sync::Mutex<Conversation>> {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                debug!(conversation = conversation_id, "opening conversation");
                Arc::new(tokio::sync::Mutex::new(Conversation {
                    state: SessionState::Idle,
                    cache: PageCache::new(self.source.clone(), self.hook.clone()),
                }))
            })
            .clone()
    }

    /// Processes one inbound event. `None` means the input was out of order for
    /// the current phase and was dropped without a reply.
    pub async fn handle(&self, event: &InboundEvent) -> Option<ReplyBatch> {
        let batch = self.handle_locked(event).await;
        self.evict_if_idle(&event.conversation_id);
        batch
    }

    async fn handle_locked(&self, event: &InboundEvent) -> Option<ReplyBatch> {
        let input = classify(&event.text);
        let conv = self.conversation(&event.conversation_id);
        let mut conv = conv.lock().await;
        debug!(
            conversation = %event.conversation_id,
            ?input,
            phase = ?conv.state.phase(),
            "inbound event"
        );

        let messages = match input {
            Input::Advance => Some(self.advance(&mut conv).await),
            Input::Reveal => self.reveal(&mut conv.state).await,
            Input::Grade(grade) => self.grade(&mut conv.state, grade).await,
            Input::Unrecognized => Some(vec![unrecognized(&mut conv.state)]),
        };

        match messages {
            Some(messages) => Some(ReplyBatch {
                conversation_id: event.conversation_id.clone(),
                messages,
            }),
            None => {
                debug!(conversation = %event.conversation_id, ?input, "ignored out-of-order input");
                None
            }
        }
    }

    /// An idle conversation has an empty cache at the first page, so dropping it
    /// loses nothing. Only entries no other task holds are removed, which keeps
    /// one mutex per key alive while events for it are in flight.
    fn evict_if_idle(&self, conversation_id: &str) {
        let mut sessions = self.sessions.lock();
        let idle = match sessions.get(conversation_id) {
            Some(conv) if Arc::strong_count(conv) == 1 => conv
                .try_lock()
                .map(|c| c.state.phase() == Phase::Idle)
                .unwrap_or(false),
            _ => false,
        };
        if idle {
            sessions.remove(conversation_id);
            debug!(conversation = conversation_id, "closed idle conversation");
        }
    }

    async fn advance(&self, conv: &mut Conversation) -> Vec<Message> {
        match conv.cache.next().await {
            Ok(Some(card)) => {
                let msg = reply::card_shown(&card);
                conv.state.show(card);
                vec![msg]
            }
            Ok(None) => {
                info!("deck complete");
                conv.state.clear();
                conv.cache.reset();
                vec![reply::deck_complete()]
            }
            Err(e) => {
                warn!(error = %e, "could not fetch next card");
                vec![reply::fetch_failed()]
            }
        }
    }

    async fn reveal(&self, state: &mut SessionState) -> Option<Vec<Message>> {
        let card = state.reveal()?.clone();
        let mut messages = Vec::with_capacity(2);
        match self.audio.synthesize(&card.phrase, &card.id).await {
            Ok(audio) => messages.push(Message::audio(audio)),
            Err(AudioError::Disabled) => {}
            Err(e) => warn!(card = %card.id, error = %e, "speech unavailable, replying with text only"),
        }
        messages.push(reply::card_details(&card));
        Some(messages)
    }

    async fn grade(&self, state: &mut SessionState, grade: Grade) -> Option<Vec<Message>> {
        let card = state.complete_grade()?.clone();
        let review = ReviewRecord::new(card.id.clone(), grade);
        match self.progress.record(&review).await {
            Ok(()) => {
                info!(card = %card.id, grade = grade.as_str(), "review recorded");
                Some(vec![reply::grade_saved(grade)])
            }
            Err(e) => {
                warn!(card = %card.id, grade = grade.as_str(), error = %e, "review not recorded");
                Some(vec![reply::grade_not_saved(&card)])
            }
        }
    }
}

fn unrecognized(state: &mut SessionState) -> Message {
    if state.current().is_none() {
        state.clear();
        return reply::press_advance();
    }
    reply::repeat_current(state)
}

//! HTTP text-to-speech client with an on-disk clip cache.

use async_trait::async_trait;
use lexideck_core::{AudioError, AudioGenerator, AudioRef, Card, ResetHook};
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
}

pub struct HttpSpeech {
    client: Client,
    endpoint: String,
    audio_dir: PathBuf,
    public_base: String,
}

impl HttpSpeech {
    pub fn new(
        endpoint: impl Into<String>,
        audio_dir: impl Into<PathBuf>,
        public_base: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let audio_dir = audio_dir.into();
        std::fs::create_dir_all(&audio_dir)?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            audio_dir,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    fn file_name(card_id: &str) -> String {
        let stem: String = card_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        format!("{stem}.mp3")
    }

    fn url_for(&self, name: &str) -> AudioRef {
        AudioRef {
            url: format!("{}/audio/{name}", self.public_base),
        }
    }
}

#[async_trait]
impl AudioGenerator for HttpSpeech {
    async fn synthesize(&self, text: &str, card_id: &str) -> Result<AudioRef, AudioError> {
        let name = Self::file_name(card_id);
        let path = self.audio_dir.join(&name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(self.url_for(&name));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SpeechRequest { text })
            .send()
            .await
            .map_err(|e| AudioError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AudioError::Request(format!("HTTP {status}")));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AudioError::Request(e.to_string()))?;
        tokio::fs::write(&path, &bytes).await?;
        debug!(card = card_id, bytes = bytes.len(), "stored speech clip");
        Ok(self.url_for(&name))
    }
}

impl ResetHook for HttpSpeech {
    fn on_discard(&self, cards: &[Card]) {
        for card in cards {
            let path = self.audio_dir.join(Self::file_name(&card.id));
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(card = %card.id, "removed speech clip"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "could not remove speech clip"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(HttpSpeech::file_name("ab-12_x"), "ab-12_x.mp3");
        assert_eq!(HttpSpeech::file_name("../etc/passwd"), "etcpasswd.mp3");
    }

    #[test]
    fn discard_removes_only_known_clips() {
        let dir = tempfile::tempdir().unwrap();
        let speech = HttpSpeech::new("http://127.0.0.1:9/tts", dir.path(), "http://host/").unwrap();
        let keep = Card::new("keep", "k");
        let gone = Card::new("gone", "g");
        let keep_path = dir.path().join(HttpSpeech::file_name(&keep.id));
        let gone_path = dir.path().join(HttpSpeech::file_name(&gone.id));
        std::fs::write(&keep_path, b"a").unwrap();
        std::fs::write(&gone_path, b"b").unwrap();

        speech.on_discard(&[gone, Card::new("never-synthesized", "x")]);

        assert!(keep_path.exists());
        assert!(!gone_path.exists());
    }

    #[tokio::test]
    async fn cached_clip_skips_the_request() {
        let dir = tempfile::tempdir().unwrap();
        // Port 9 is discard; any real request would fail.
        let speech = HttpSpeech::new("http://127.0.0.1:9/tts", dir.path(), "http://host/").unwrap();
        std::fs::write(dir.path().join("card1.mp3"), b"clip").unwrap();

        let audio = speech.synthesize("hola", "card1").await.unwrap();
        assert_eq!(audio.url, "http://host/audio/card1.mp3");
    }

    #[tokio::test]
    async fn clip_survives_while_another_conversation_shows_it() {
        use lexideck_core::memory::MemoryRepo;
        use lexideck_core::{
            DialogueController, InboundEvent, Phase, RepoProgress, RepoSource, Repository,
            ADVANCE_LABEL, REVEAL_LABEL,
        };
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let card = Card::new("hola", "hello");
        let clip = dir.path().join(HttpSpeech::file_name(&card.id));
        std::fs::write(&clip, b"clip").unwrap();

        let repo: Arc<dyn Repository> = Arc::new(MemoryRepo::with_cards([card]));
        let speech = Arc::new(HttpSpeech::new("http://127.0.0.1:9/tts", dir.path(), "http://host/").unwrap());
        let ctl = DialogueController::new(
            Arc::new(RepoSource::new(repo.clone(), 10)),
            Arc::new(RepoProgress::new(repo)),
        )
        .with_audio(speech.clone(), speech);

        ctl.handle(&InboundEvent::new("b", ADVANCE_LABEL)).await.unwrap();
        ctl.handle(&InboundEvent::new("b", REVEAL_LABEL)).await.unwrap();
        ctl.handle(&InboundEvent::new("a", ADVANCE_LABEL)).await.unwrap();
        ctl.handle(&InboundEvent::new("a", ADVANCE_LABEL)).await.unwrap();
        assert_eq!(ctl.phase("b").await, Phase::Revealed);
        assert!(clip.exists());

        ctl.handle(&InboundEvent::new("b", ADVANCE_LABEL)).await.unwrap();
        assert!(!clip.exists());
    }
}

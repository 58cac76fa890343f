use chrono::{DateTime, Utc};
use lexideck_core::{
    paginate, repo::Repository, Card, CardId, CoreError, NewCard, Page, PageQuery, ReviewRecord,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;
use tracing::debug;

pub mod paths;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cards: Vec<Card>,
    reviews: Vec<ReviewRecord>,
}

#[derive(Default, Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cards: HashMap<CardId, Card>,
    reviews: HashMap<CardId, Vec<ReviewRecord>>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            cards: HashMap::new(),
            reviews: HashMap::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            cards: self.cards.values().cloned().collect(),
            reviews: self.reviews.values().flatten().cloned().collect(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        let mut cards = HashMap::new();
        for c in img.cards {
            cards.insert(c.id.clone(), c);
        }
        let mut reviews: HashMap<CardId, Vec<ReviewRecord>> = HashMap::new();
        for r in img.reviews {
            reviews.entry(r.card_id.clone()).or_default().push(r);
        }
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            cards,
            reviews,
        }
    }
}

pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
    /// Held from snapshot to rename so file writes land in snapshot order.
    write_guard: Mutex<()>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let state = load_or_init(&path, &backups_dir).await?;
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            state: RwLock::new(state),
            write_guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self) -> Result<(), CoreError> {
        let _writing = self.write_guard.lock().await;
        let snapshot = {
            let mut s = self.state.write();
            s.updated_at = Utc::now();
            s.to_image()
        };
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        // Join error -> CoreError, inner io::Error -> CoreError
        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &snapshot))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|_| CoreError::Storage("io"))?;
        debug!(path = %self.path.display(), "saved card store");
        Ok(())
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path, backups_dir: &Path) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img: FileImage = task::spawn_blocking(move || {
            let mut f = fs::File::open(&p)?;
            let mut buf = String::new();
            f.read_to_string(&mut buf)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))
        .and_then(|r| r.map_err(|_| CoreError::Storage("corrupt store file")))?;
        let mut st = State::from_image(img);
        st.updated_at = Utc::now();
        Ok(st)
    } else {
        let st = State::new_empty();
        let img = st.to_image();
        write_with_backup(path, backups_dir, 1, &img).map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Backup rotation
    let ts = Utc::now().format("%Y%m%d-%H%M%S%.3f");
    let backup_path = backups_dir.join(format!("lexideck-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path).map_err(|e| e.error)?;

    rotate_backups(backups_dir, max_backups)?;

    Ok(())
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // Names embed the timestamp, so lexical order is age order.
    entries.sort_by_key(|e| e.file_name());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

use async_trait::async_trait;

#[async_trait]
impl Repository for JsonStore {
    async fn add_card(&self, new: NewCard) -> Result<Card, CoreError> {
        if new.phrase.trim().is_empty() {
            return Err(CoreError::Invalid("empty phrase"));
        }
        let card = new.into_card();
        {
            let mut s = self.state.write();
            s.cards.insert(card.id.clone(), card.clone());
        }
        self.save().await?;
        Ok(card)
    }

    async fn get_card(&self, id: &str) -> Result<Card, CoreError> {
        let s = self.state.read();
        s.cards.get(id).cloned().ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self) -> Result<Vec<Card>, CoreError> {
        let s = self.state.read();
        Ok(s.cards.values().cloned().collect())
    }

    async fn delete_card(&self, id: &str) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if s.cards.remove(id).is_none() {
                return Err(CoreError::NotFound("card"));
            }
            s.reviews.remove(id);
        }
        self.save().await
    }

    async fn page_cards(&self, query: &PageQuery) -> Result<Page, CoreError> {
        let cards: Vec<Card> = self.state.read().cards.values().cloned().collect();
        paginate(cards, query)
    }

    async fn record_review(&self, review: &ReviewRecord) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            let Some(card) = s.cards.get_mut(&review.card_id) else {
                return Err(CoreError::NotFound("card"));
            };
            card.apply_review(review);
            s.reviews
                .entry(review.card_id.clone())
                .or_default()
                .push(review.clone());
        }
        self.save().await
    }

    async fn list_reviews_for_card(&self, card_id: &str) -> Result<Vec<ReviewRecord>, CoreError> {
        let s = self.state.read();
        Ok(s.reviews.get(card_id).cloned().unwrap_or_default())
    }
}

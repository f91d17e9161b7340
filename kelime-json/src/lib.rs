use chrono::{DateTime, Utc};
use kelime_core::{push_session, CardId, CoreError, Repository, SessionSummary, VocabularyCard};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;
use tracing::{debug, warn};

pub mod paths;

const FILE_VERSION: u32 = 1;
pub const DEFAULT_MAX_BACKUPS: usize = 10;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cards: Vec<VocabularyCard>,
    #[serde(default)]
    sessions: Vec<SessionSummary>,
}

#[derive(Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cards: HashMap<CardId, VocabularyCard>,
    sessions: Vec<SessionSummary>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            cards: HashMap::new(),
            sessions: Vec::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        let mut cards: Vec<VocabularyCard> = self.cards.values().cloned().collect();
        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            cards,
            sessions: self.sessions.clone(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        let cards = img.cards.into_iter().map(|c| (c.id.clone(), c)).collect();
        let mut sessions = Vec::with_capacity(img.sessions.len());
        for s in img.sessions {
            push_session(&mut sessions, s);
        }
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            cards,
            sessions,
        }
    }
}

/// Repository backed by one JSON file, rewritten atomically on every change.
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, DEFAULT_MAX_BACKUPS).await
    }

    /// Opens `path`, with backups kept in a `backups` directory beside it.
    pub async fn open_at(path: PathBuf) -> Result<Self, CoreError> {
        let backups = paths::backups_dir_for(&path);
        Self::open_with(path, backups, DEFAULT_MAX_BACKUPS).await
    }

    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let state = load_or_init(&path).await?;
        debug!(path = %path.display(), cards = state.cards.len(), "opened json store");
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self) -> Result<(), CoreError> {
        let snapshot = {
            let mut s = self.state.write();
            s.updated_at = Utc::now();
            s.to_image()
        };
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &snapshot))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|e| {
                warn!(error = %e, "json store write failed");
                CoreError::Storage("io")
            })?;
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
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img: FileImage = task::spawn_blocking(move || {
            let buf = fs::read_to_string(&p)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))
        .and_then(|r| r.map_err(|_| CoreError::Storage("corrupt store file")))?;
        if img.version > FILE_VERSION {
            return Err(CoreError::Storage("store file written by a newer version"));
        }
        Ok(State::from_image(img))
    } else {
        let st = State::new_empty();
        write_atomic(path, &encode(&st.to_image())?).map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

fn encode(img: &FileImage) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec_pretty(img).map_err(|_| CoreError::Storage("serialize"))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), std::io::Error> {
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)?;
    write_atomic(path, &json)?;

    // Millisecond stamp keeps back-to-back saves from colliding.
    let ts = img.updated_at.format("%Y%m%d-%H%M%S%.3f");
    let backup_path = backups_dir.join(format!("kelime-{ts}.json"));
    write_atomic(&backup_path, &json)?;
    debug!(backup = %backup_path.display(), "wrote backup");

    rotate_backups(backups_dir, max_backups)
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // names embed a sortable timestamp
    entries.sort();
    if entries.len() > keep {
        for p in &entries[0..entries.len() - keep] {
            debug!(backup = %p.display(), "removing old backup");
            let _ = fs::remove_file(p);
        }
    }
    Ok(())
}

use async_trait::async_trait;

#[async_trait]
impl Repository for JsonStore {
    async fn add_card(&self, card: &VocabularyCard) -> Result<VocabularyCard, CoreError> {
        {
            let mut s = self.state.write();
            if s.cards.contains_key(&card.id) {
                return Err(CoreError::Conflict("card id already exists"));
            }
            s.cards.insert(card.id.clone(), card.clone());
        }
        self.save().await?;
        Ok(card.clone())
    }

    async fn get_card(&self, id: &str) -> Result<VocabularyCard, CoreError> {
        let s = self.state.read();
        s.cards.get(id).cloned().ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self) -> Result<Vec<VocabularyCard>, CoreError> {
        Ok(self.state.read().to_image().cards)
    }

    async fn update_card(&self, card: &VocabularyCard) -> Result<VocabularyCard, CoreError> {
        {
            let mut s = self.state.write();
            let Some(slot) = s.cards.get_mut(&card.id) else {
                return Err(CoreError::NotFound("card"));
            };
            *slot = card.clone();
        }
        self.save().await?;
        Ok(card.clone())
    }

    async fn delete_card(&self, id: &str) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if s.cards.remove(id).is_none() {
                return Err(CoreError::NotFound("card"));
            }
        }
        self.save().await
    }

    async fn record_session(&self, summary: &SessionSummary) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            push_session(&mut s.sessions, summary.clone());
        }
        self.save().await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, CoreError> {
        Ok(self.state.read().sessions.clone())
    }
}

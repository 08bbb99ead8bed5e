//! # Storage Module - JSON Document Persistence
//!
//! Every engine keeps its whole state as one JSON document under the configured data
//! directory and rewrites that document after each mutation:
//!
//! ```text
//! data/
//! ├── economy.json          ← ledger accounts
//! ├── inventory.json        ← per-user inventories and equip slots
//! ├── pairings.json         ← pairing records (mirrored on both partners)
//! ├── word_chain.json       ← word-chain channels and player stats
//! └── channel_toggles.json  ← disabled commands and custom prefixes
//! ```
//!
//! Reads take a shared `fs2` lock and writes an exclusive one, so a second process
//! inspecting the data directory never observes a half-written file. There is no
//! transaction spanning documents: a crash between two saves can leave them out of step.
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use tavernbot::storage::JsonStore;
//!
//! # fn main() -> Result<(), tavernbot::errors::StoreError> {
//! let store = JsonStore::new("./data");
//! let mut doc: HashMap<String, u64> = store.load("counters.json")?;
//! doc.insert("greetings".into(), 1);
//! store.save("counters.json", &doc)?;
//! # Ok(())
//! # }
//! ```

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::errors::StoreError;

/// Document names, one per engine.
pub const ECONOMY_DOC: &str = "economy.json";
pub const INVENTORY_DOC: &str = "inventory.json";
pub const PAIRINGS_DOC: &str = "pairings.json";
pub const WORD_CHAIN_DOC: &str = "word_chain.json";
pub const TOGGLES_DOC: &str = "channel_toggles.json";
pub const AFK_DOC: &str = "afk.json";
pub const MUTES_DOC: &str = "mutes.json";

/// Whole-document JSON store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Load a document, returning `T::default()` when the file does not exist yet.
    ///
    /// A file that exists but does not parse is an error: silently replacing it with a
    /// default would wipe the data on the next save.
    pub fn load<T>(&self, name: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path_for(name);
        let mut file = match fs::OpenOptions::new().read(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("storage: {} not found, starting empty", path.display());
                return Ok(T::default());
            }
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let mut raw = String::new();
        let read = file.read_to_string(&mut raw);
        let _ = file.unlock();
        read?;
        // Files truncated by an interrupted write can start with NUL padding.
        let cleaned = raw.trim_start_matches('\0').trim();
        if cleaned.is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(cleaned)?)
    }

    /// Serialize `doc` and replace the whole file under an exclusive lock.
    pub fn save<T: Serialize>(&self, name: &str, doc: &T) -> Result<(), StoreError> {
        ensure_dir(&self.base_dir)?;
        let data = serde_json::to_string_pretty(doc)?;
        let path = self.path_for(name);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        file.lock_exclusive()?;
        let result = rewrite(&mut file, data.as_bytes());
        let _ = file.unlock();
        result?;
        log::trace!("storage: wrote {} ({} bytes)", path.display(), data.len());
        Ok(())
    }
}

fn rewrite(file: &mut fs::File, data: &[u8]) -> std::io::Result<()> {
    file.set_len(0)?;
    file.write_all(data)?;
    file.flush()?;
    file.sync_all()
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Optional store handle held by each engine; `None` keeps the engine purely in memory.
pub(crate) fn persist<T: Serialize>(store: Option<&JsonStore>, name: &str, doc: &T) {
    if let Some(store) = store {
        if let Err(e) = store.save(name, doc) {
            log::warn!("storage: failed to persist {}: {} (in-memory state kept)", name, e);
        }
    }
}

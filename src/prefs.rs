//! Local UI preferences in a small redb file.
//!
//! One row, postcard-encoded. Only the sidebar flag lives here today; the
//! record is a struct so new fields can be appended with `#[serde(default)]`.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, TableDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::ClientError;

const PREFS: TableDefinition<&str, &[u8]> = TableDefinition::new("prefs");
const UI_KEY: &str = "ui";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiPrefs {
    pub sidebar_open: bool,
}

/// Handle to the preferences file. Cloneable (Arc inside).
#[derive(Clone)]
pub struct Prefs {
    db: Arc<Database>,
}

impl Prefs {
    /// Open (or create) the preferences file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PrefsError> {
        let db = Database::create(path.as_ref())?;
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(PREFS)?;
        }
        txn.commit()?;
        debug!(path = %path.as_ref().display(), "preferences opened");
        Ok(Prefs { db: Arc::new(db) })
    }

    pub fn load(&self) -> Result<UiPrefs, PrefsError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(PREFS)?;
        match table.get(UI_KEY)? {
            Some(row) => postcard::from_bytes(row.value()).map_err(|e| PrefsError::Decode(e.to_string())),
            None => Ok(UiPrefs::default()),
        }
    }

    fn store(&self, prefs: &UiPrefs) -> Result<(), PrefsError> {
        let bytes = postcard::to_allocvec(prefs).map_err(|e| PrefsError::Encode(e.to_string()))?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PREFS)?;
            table.insert(UI_KEY, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Closed until the user opens it.
    pub fn sidebar_open(&self) -> Result<bool, PrefsError> {
        Ok(self.load()?.sidebar_open)
    }

    pub fn set_sidebar_open(&self, open: bool) -> Result<(), PrefsError> {
        let mut prefs = self.load()?;
        prefs.sidebar_open = open;
        self.store(&prefs)
    }

    /// Flip the flag and return the new value.
    pub fn toggle_sidebar(&self) -> Result<bool, PrefsError> {
        let open = !self.sidebar_open()?;
        self.set_sidebar_open(open)?;
        Ok(open)
    }
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("redb: {0}")]
    Redb(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("encode: {0}")]
    Encode(String),
}

macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for PrefsError {
            fn from(e: $t) -> Self { PrefsError::Redb(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

impl From<PrefsError> for ClientError {
    fn from(e: PrefsError) -> Self {
        ClientError::Prefs(e.to_string())
    }
}

// ── Tests ──────────────────────────────────────────────────────

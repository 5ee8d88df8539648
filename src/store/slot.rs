use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::ValueEnum;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{PrioError, Result};
use crate::model::{Priority, Task};
use crate::store::config::Config;

pub const TASKS_SLOT: &str = "tasks";
pub const THEME_SLOT: &str = "theme";
const PROBE_SLOT: &str = "__probe__";

/// Named JSON slots under a `.prio/` directory. One slot, one file; the
/// store itself is oblivious to what the slots hold. All reads are tolerant:
/// a missing or unparseable slot is absent state, never an error.
#[derive(Debug, Clone)]
pub struct SlotStore {
    root: PathBuf,
}

impl SlotStore {
    /// Open an existing `.prio` directory.
    pub fn open(dir_root: &Path) -> Result<Self> {
        let root = dir_root.join(".prio");
        if !root.join("config.json").exists() {
            return Err(PrioError::NotInitialized);
        }
        Ok(Self { root })
    }

    /// Initialize a new `.prio` directory with a default config.
    pub fn init(dir_root: &Path) -> Result<Self> {
        let root = dir_root.join(".prio");
        if root.join("config.json").exists() {
            return Err(PrioError::AlreadyInitialized);
        }
        fs::create_dir_all(&root)?;
        fs::write(
            root.join("config.json"),
            serde_json::to_string_pretty(&Config::default())?,
        )?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{slot}.json"))
    }

    /// Probe the store with a throwaway write/remove cycle. Any failure
    /// (missing directory, permissions, full disk) reads as unavailable;
    /// this never errors or panics.
    pub fn is_available(&self) -> bool {
        let path = self.slot_path(PROBE_SLOT);
        if fs::write(&path, b"{}").is_err() {
            return false;
        }
        fs::remove_file(&path).is_ok()
    }

    /// Serialize and write the tasks slot under an exclusive lock. Callers
    /// treat failures as best-effort; the in-memory store stays
    /// authoritative.
    pub fn save_tasks(&self, snapshot: &Snapshot) -> Result<()> {
        let _lock = self.lock()?;
        fs::write(
            self.slot_path(TASKS_SLOT),
            serde_json::to_string_pretty(snapshot)?,
        )?;
        Ok(())
    }

    /// Read the tasks slot. Missing slot or malformed content is an empty
    /// snapshot.
    pub fn load_tasks(&self) -> Snapshot {
        self.read_slot(TASKS_SLOT).unwrap_or_default()
    }

    pub fn theme(&self) -> Theme {
        self.read_slot(THEME_SLOT).unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        let _lock = self.lock()?;
        fs::write(self.slot_path(THEME_SLOT), serde_json::to_string(&theme)?)?;
        Ok(())
    }

    fn read_slot<T: DeserializeOwned>(&self, slot: &str) -> Option<T> {
        let data = fs::read_to_string(self.slot_path(slot)).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Exclusive lock guarding slot writes against a concurrent process.
    /// Released when the returned handle drops.
    fn lock(&self) -> Result<File> {
        let path = self.root.join(".lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| PrioError::Locked(path.display().to_string()))?;
        Ok(file)
    }
}

/// Color scheme slot, owned by the view layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dark => write!(f, "dark"),
            Self::Light => write!(f, "light"),
        }
    }
}

/// Wire format of the tasks slot. Field names and the empty-string date are
/// load-bearing: existing slots use exactly this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub pending: Vec<SnapshotTask>,
    #[serde(default)]
    pub completed: Vec<SnapshotTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTask {
    pub task_text: String,
    pub priority: Priority,
    /// ISO date or empty string; older slots omit the field entirely.
    #[serde(default)]
    pub due_date: String,
}

impl SnapshotTask {
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_text: task.text.clone(),
            priority: task.priority,
            due_date: task.due_date.map(|d| d.to_string()).unwrap_or_default(),
        }
    }

    /// Parsed due date; the empty string and unparseable values both read as
    /// absent.
    pub fn due(&self) -> Option<NaiveDate> {
        self.due_date.parse().ok()
    }
}

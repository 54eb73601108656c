//! File-based storage implementation.

use super::{
    new_diagram_id, BoxFuture, DiagramStore, SaveReceipt, StorageError, StorageResult,
    StoredDiagram,
};
use crate::document::DiagramState;
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage.
///
/// Stores each diagram record as a JSON file in a directory.
pub struct FileStore {
    /// Base directory for diagram storage.
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a file store in the default location.
    ///
    /// On Unix: `~/.local/share/flowsketch/diagrams/`
    /// On Windows: `%LOCALAPPDATA%\flowsketch\diagrams\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("flowsketch").join("diagrams"))
    }

    fn diagram_path(&self, id: &str) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn read(&self, id: &str) -> StorageResult<StoredDiagram> {
        let path = self.diagram_path(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        read_record(&path)
    }

    fn write(&self, stored: &StoredDiagram) -> StorageResult<()> {
        let path = self.diagram_path(&stored.id);
        let json = serde_json::to_string_pretty(stored)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn records(&self) -> StorageResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;
        Ok(entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "json"))
            .collect())
    }
}

fn read_record(path: &Path) -> StorageResult<StoredDiagram> {
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

impl DiagramStore for FileStore {
    fn load_diagram(&self, id: &str) -> BoxFuture<'_, StorageResult<StoredDiagram>> {
        let id = id.to_string();
        Box::pin(async move { self.read(&id) })
    }

    fn load_shared(&self, share_id: &str) -> BoxFuture<'_, StorageResult<StoredDiagram>> {
        let share_id = share_id.to_string();
        Box::pin(async move {
            for path in self.records()? {
                let stored = match read_record(&path) {
                    Ok(stored) => stored,
                    Err(e) => {
                        log::warn!("storage: skipping unreadable record: {e}");
                        continue;
                    }
                };
                if stored.share_id != share_id {
                    continue;
                }
                if !stored.is_public {
                    return Err(StorageError::PermissionDenied(share_id));
                }
                return Ok(stored);
            }
            Err(StorageError::NotFound(share_id))
        })
    }

    fn save_diagram(
        &self,
        id: Option<&str>,
        owner: Option<&str>,
        state: &DiagramState,
    ) -> BoxFuture<'_, StorageResult<SaveReceipt>> {
        let id = id.map_or_else(new_diagram_id, str::to_string);
        let owner = owner.map(str::to_string);
        let state = state.clone();
        Box::pin(async move {
            let stored = match self.read(&id) {
                Ok(mut stored) => {
                    stored.overwrite(owner.as_deref(), &state)?;
                    stored
                }
                Err(StorageError::NotFound(_)) => StoredDiagram::new(id, owner, state),
                Err(e) => return Err(e),
            };
            self.write(&stored)?;
            Ok(stored.receipt())
        })
    }

    fn set_visibility(&self, id: &str, is_public: bool) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut stored = self.read(&id)?;
            stored.is_public = is_public;
            self.write(&stored)
        })
    }

    fn delete_diagram(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.diagram_path(id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            Ok(self
                .records()?
                .iter()
                .filter_map(|path| read_record(path).ok())
                .map(|stored| stored.id)
                .collect())
        })
    }
}

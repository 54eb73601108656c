//! In-memory storage implementation.

use super::{
    new_diagram_id, BoxFuture, DiagramStore, SaveReceipt, StorageError, StorageResult,
    StoredDiagram,
};
use crate::document::DiagramState;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    diagrams: RwLock<HashMap<String, StoredDiagram>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl DiagramStore for MemoryStore {
    fn load_diagram(&self, id: &str) -> BoxFuture<'_, StorageResult<StoredDiagram>> {
        let id = id.to_string();
        Box::pin(async move {
            let diagrams = self.diagrams.read().map_err(lock_error)?;
            diagrams
                .get(&id)
                .cloned()
                .ok_or(StorageError::NotFound(id))
        })
    }

    fn load_shared(&self, share_id: &str) -> BoxFuture<'_, StorageResult<StoredDiagram>> {
        let share_id = share_id.to_string();
        Box::pin(async move {
            let diagrams = self.diagrams.read().map_err(lock_error)?;
            let stored = diagrams
                .values()
                .find(|d| d.share_id == share_id)
                .ok_or_else(|| StorageError::NotFound(share_id.clone()))?;
            if !stored.is_public {
                return Err(StorageError::PermissionDenied(share_id));
            }
            Ok(stored.clone())
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
            let mut diagrams = self.diagrams.write().map_err(lock_error)?;
            match diagrams.get_mut(&id) {
                Some(stored) => {
                    stored.overwrite(owner.as_deref(), &state)?;
                    Ok(stored.receipt())
                }
                None => {
                    let stored = StoredDiagram::new(id.clone(), owner, state);
                    let receipt = stored.receipt();
                    diagrams.insert(id, stored);
                    Ok(receipt)
                }
            }
        })
    }

    fn set_visibility(&self, id: &str, is_public: bool) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut diagrams = self.diagrams.write().map_err(lock_error)?;
            let stored = diagrams
                .get_mut(&id)
                .ok_or_else(|| StorageError::NotFound(id.clone()))?;
            stored.is_public = is_public;
            Ok(())
        })
    }

    fn delete_diagram(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut diagrams = self.diagrams.write().map_err(lock_error)?;
            diagrams.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let diagrams = self.diagrams.read().map_err(lock_error)?;
            Ok(diagrams.keys().cloned().collect())
        })
    }
}

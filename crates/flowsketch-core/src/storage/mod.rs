//! Storage abstraction for saved and shared diagrams.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::document::{DiagramIdentity, DiagramState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Diagram not found: {0}")]
    NotFound(String),
    #[error("Not allowed to modify diagram {0}")]
    PermissionDenied(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A diagram as held by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDiagram {
    pub id: String,
    pub share_id: String,
    #[serde(default)]
    pub is_public: bool,
    /// User that first saved the diagram, if any.
    #[serde(default)]
    pub owner_id: Option<String>,
    pub state: DiagramState,
}

impl StoredDiagram {
    /// A fresh record with a new share id.
    pub fn new(id: String, owner_id: Option<String>, state: DiagramState) -> Self {
        Self {
            id,
            share_id: new_share_id(),
            is_public: false,
            owner_id,
            state,
        }
    }

    pub fn identity(&self) -> DiagramIdentity {
        DiagramIdentity {
            id: Some(self.id.clone()),
            share_id: Some(self.share_id.clone()),
            is_public: self.is_public,
        }
    }

    /// Whether `user` may overwrite this record.
    pub fn can_write(&self, user: Option<&str>) -> bool {
        match self.owner_id.as_deref() {
            None => true,
            Some(owner) => self.is_public || user == Some(owner),
        }
    }

    /// Apply a save: replace the contents and claim ownership if unowned.
    pub(crate) fn overwrite(&mut self, owner: Option<&str>, state: &DiagramState) -> StorageResult<()> {
        if !self.can_write(owner) {
            return Err(StorageError::PermissionDenied(self.id.clone()));
        }
        if self.owner_id.is_none() {
            self.owner_id = owner.map(str::to_string);
        }
        self.state = state.clone();
        Ok(())
    }

    pub fn receipt(&self) -> SaveReceipt {
        SaveReceipt {
            id: self.id.clone(),
            share_id: self.share_id.clone(),
        }
    }
}

/// Identifiers returned by a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub id: String,
    pub share_id: String,
}

pub(crate) fn new_diagram_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn new_share_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Trait for diagram storage backends.
pub trait DiagramStore: Send + Sync {
    /// Load a diagram by its id.
    fn load_diagram(&self, id: &str) -> BoxFuture<'_, StorageResult<StoredDiagram>>;

    /// Load a public diagram by its share id.
    fn load_shared(&self, share_id: &str) -> BoxFuture<'_, StorageResult<StoredDiagram>>;

    /// Save a diagram. `None` creates a new record with fresh ids.
    fn save_diagram(
        &self,
        id: Option<&str>,
        owner: Option<&str>,
        state: &DiagramState,
    ) -> BoxFuture<'_, StorageResult<SaveReceipt>>;

    /// Make a diagram public or private.
    fn set_visibility(&self, id: &str, is_public: bool) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete a diagram. Unknown ids succeed.
    fn delete_diagram(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all diagram ids.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// How a share link opens the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMode {
    /// Read-only.
    View,
    /// Editable by anyone with the link.
    Collaborate,
}

impl ShareMode {
    fn segment(self) -> &'static str {
        match self {
            ShareMode::View => "view",
            ShareMode::Collaborate => "collaborate",
        }
    }
}

/// A `/view/{shareId}` or `/collaborate/{shareId}` link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub mode: ShareMode,
    pub share_id: String,
}

impl ShareLink {
    pub fn new(mode: ShareMode, share_id: impl Into<String>) -> Self {
        Self {
            mode,
            share_id: share_id.into(),
        }
    }

    /// Parse a link path. A full URL is accepted; only its path is read.
    pub fn parse(link: &str) -> Option<Self> {
        let path = match link.find("://") {
            Some(scheme_end) => {
                let rest = &link[scheme_end + 3..];
                &rest[rest.find('/')?..]
            }
            None => link,
        };
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut segments = path.trim_matches('/').split('/');
        let mode = match segments.next()? {
            "view" => ShareMode::View,
            "collaborate" => ShareMode::Collaborate,
            _ => return None,
        };
        let share_id = segments.next().filter(|s| !s.is_empty())?;
        if segments.next().is_some() {
            return None;
        }
        Some(Self::new(mode, share_id))
    }

    /// The link prefixed with `base` (e.g. `https://host`).
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self)
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.mode.segment(), self.share_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_link_format_and_parse() {
        let link = ShareLink::new(ShareMode::Collaborate, "abc123");
        assert_eq!(link.to_string(), "/collaborate/abc123");
        assert_eq!(ShareLink::parse("/collaborate/abc123"), Some(link.clone()));
        assert_eq!(
            link.url("https://example.com/"),
            "https://example.com/collaborate/abc123"
        );
    }

    #[test]
    fn test_share_link_parse_full_url() {
        let link = ShareLink::parse("https://example.com/view/xyz?ref=mail").unwrap();
        assert_eq!(link.mode, ShareMode::View);
        assert_eq!(link.share_id, "xyz");
    }

    #[test]
    fn test_share_link_rejects_other_paths() {
        assert!(ShareLink::parse("/edit/xyz").is_none());
        assert!(ShareLink::parse("/view/").is_none());
        assert!(ShareLink::parse("/view/a/b").is_none());
        assert!(ShareLink::parse("https://example.com").is_none());
    }

    #[test]
    fn test_write_permission() {
        let mut stored = StoredDiagram::new("d".into(), Some("alice".into()), DiagramState::default());
        assert!(stored.can_write(Some("alice")));
        assert!(!stored.can_write(Some("bob")));
        assert!(!stored.can_write(None));
        stored.is_public = true;
        assert!(stored.can_write(Some("bob")));
    }
}

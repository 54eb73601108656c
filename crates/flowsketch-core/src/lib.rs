//! FlowSketch Core Library
//!
//! Diagram model, connector geometry, freehand drawing and undo history for
//! the FlowSketch diagram editor. Rendering lives in `flowsketch-render`.

pub mod config;
pub mod document;
pub mod drawing;
pub mod editor;
pub mod export;
pub mod geometry;
pub mod history;
pub mod input;
pub mod request;
pub mod router;
pub mod selection;
pub mod session;
pub mod shapes;
pub mod storage;
pub mod suggest;
pub mod text_edit;

pub use config::EditorConfig;
pub use document::{DiagramDocument, DiagramIdentity, DiagramState, ImportError};
pub use drawing::{DrawingEngine, DrawingOutcome, DrawingTool};
pub use editor::{Editor, Notice, NoticeLevel, SaveRequest};
pub use export::{ExportFormat, export_bounds};
pub use geometry::{ConnectorCurve, ConnectorPath, boundary_intersection, center_of, connector_path};
pub use history::{ActionKind, DrawingHistory, History, HistoryAction};
pub use input::{KeyCommand, Modifiers, ShortcutRegistry};
pub use request::{RequestKind, RequestTicket};
pub use router::{ConnectionRequest, ConnectionRouter, RouterState};
pub use selection::{Corner, Gesture, ManipulationState, Selection};
pub use session::{AnonymousSession, SessionContext, UserSession};
pub use storage::{DiagramStore, FileStore, MemoryStore, ShareLink, ShareMode, StorageError};
pub use suggest::{Suggestion, SuggestionError, SuggestionMode, SuggestionSource};
pub use text_edit::{TextEditResult, TextKey, TextModifiers};

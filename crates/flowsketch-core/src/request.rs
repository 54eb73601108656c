//! Bookkeeping for outstanding asynchronous requests.
//!
//! At most one request per kind may be in flight. A ticket remembers the
//! view generation it was issued in; finishing a ticket from an older
//! generation reports it as stale so the response can be dropped.

use std::collections::HashSet;

/// Kinds of collaborator calls the editor makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Save,
    Load,
    Export,
    Suggest,
    Visibility,
}

/// Proof that a request was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    generation: u64,
    pending: HashSet<RequestKind>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, or `None` while one of this kind is in flight.
    pub fn begin(&mut self, kind: RequestKind) -> Option<RequestTicket> {
        if !self.pending.insert(kind) {
            log::debug!("request: {kind:?} already in flight");
            return None;
        }
        Some(RequestTicket {
            kind,
            generation: self.generation,
        })
    }

    /// Close a request. Returns false when the ticket belongs to an earlier
    /// view and its response must be ignored.
    pub fn finish(&mut self, ticket: RequestTicket) -> bool {
        if ticket.generation != self.generation {
            log::warn!("request: discarding stale {:?} response", ticket.kind);
            return false;
        }
        self.pending.remove(&ticket.kind)
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending.contains(&kind)
    }

    /// Invalidate every outstanding ticket.
    pub fn unmount(&mut self) {
        self.generation += 1;
        self.pending.clear();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

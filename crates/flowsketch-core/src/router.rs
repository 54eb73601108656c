//! Two-click connection gesture.

use crate::shapes::ShapeId;

/// Gesture state of the connection router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    /// Waiting for the first shape. `armed` is true while connect mode is on.
    Idle { armed: bool },
    /// First shape picked, waiting for a different second one.
    AwaitingSecondShape(ShapeId),
}

impl Default for RouterState {
    fn default() -> Self {
        Self::Idle { armed: false }
    }
}

/// A completed gesture: connect `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub from: ShapeId,
    pub to: ShapeId,
}

/// State machine for creating connections by clicking two shapes.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRouter {
    state: RouterState,
}

impl ConnectionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    /// Whether connect mode is on (armed or mid-gesture).
    pub fn is_active(&self) -> bool {
        !matches!(self.state, RouterState::Idle { armed: false })
    }

    /// Turn connect mode on.
    pub fn enter_connect_mode(&mut self) {
        self.state = RouterState::Idle { armed: true };
    }

    /// Turn connect mode off, dropping any pending first shape.
    pub fn cancel(&mut self) {
        if self.is_active() {
            log::debug!("router: connect mode cancelled");
        }
        self.state = RouterState::default();
    }

    /// Toggle connect mode. Returns whether it is now on.
    pub fn toggle(&mut self) -> bool {
        if self.is_active() {
            self.cancel();
            false
        } else {
            self.enter_connect_mode();
            true
        }
    }

    /// Feed a shape click into the gesture.
    ///
    /// Returns a request once two different shapes have been picked; the
    /// router then leaves connect mode.
    pub fn select_shape(&mut self, id: ShapeId) -> Option<ConnectionRequest> {
        match self.state {
            RouterState::Idle { armed: false } => None,
            RouterState::Idle { armed: true } => {
                self.state = RouterState::AwaitingSecondShape(id);
                None
            }
            RouterState::AwaitingSecondShape(first) if first == id => None,
            RouterState::AwaitingSecondShape(first) => {
                self.state = RouterState::default();
                Some(ConnectionRequest { from: first, to: id })
            }
        }
    }
}

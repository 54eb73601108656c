//! Signed-in user capability.

/// Who is using the editor. Only the user id is visible to the engine.
pub trait SessionContext {
    fn current_user_id(&self) -> Option<String>;
}

/// No signed-in user.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSession;

impl SessionContext for AnonymousSession {
    fn current_user_id(&self) -> Option<String> {
        None
    }
}

/// A fixed signed-in user.
#[derive(Debug, Clone)]
pub struct UserSession {
    user_id: String,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl SessionContext for UserSession {
    fn current_user_id(&self) -> Option<String> {
        Some(self.user_id.clone())
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Dead-session guard: cloned into detached work (lookup tasks) so that
/// callbacks resolving after the dialog closed cannot mutate torn-down
/// state.
#[derive(Debug, Clone)]
pub struct SessionToken {
    live: Arc<AtomicBool>,
}

impl SessionToken {
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn revoke(&self) {
        self.live.store(false, Ordering::Release);
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

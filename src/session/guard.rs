//! Single-flight guard for enrichment-backed actions.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{Action, SessionError};

#[derive(Debug, Default, Clone)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<Action>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `action`, or fail with [`SessionError::Busy`] if it is already running.
    pub fn acquire(&self, action: Action) -> Result<InFlightToken, SessionError> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(action) {
            tracing::debug!(%action, "rejected overlapping call");
            return Err(SessionError::Busy(action));
        }
        Ok(InFlightToken {
            action,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, action: Action) -> bool {
        self.active
            .lock()
            .map(|a| a.contains(&action))
            .unwrap_or(false)
    }
}

/// Releases its action when dropped.
#[derive(Debug)]
pub struct InFlightToken {
    action: Action,
    active: Arc<Mutex<HashSet<Action>>>,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.action);
    }
}

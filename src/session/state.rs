//! Session lifecycle states and the one-time mode decision.

use crate::config::{ModePreference, SessionConfig};

/// Which persistence backend the session runs against. Fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Signed-in identity, per-change writes to the document store.
    Remote,
    /// No identity, snapshot writes to local slots.
    Demo,
}

impl Mode {
    /// Decide the mode from config and whether the process is running embedded.
    pub fn select(config: &SessionConfig, embedded: bool) -> Self {
        match config.mode {
            ModePreference::Remote => Self::Remote,
            ModePreference::Demo => Self::Demo,
            ModePreference::Auto if embedded => Self::Demo,
            ModePreference::Auto => Self::Remote,
        }
    }

    /// Whether the current process looks embedded in a host that owns its storage.
    pub fn detect_embedded() -> bool {
        std::env::var_os("THOUGHTWEAVE_EMBEDDED").is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Demo => "demo",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session lifecycle.
///
/// `Uninitialized → AuthResolving → {Authenticated, Unauthenticated, DemoMode} →
/// DataLoading → Ready`, and `{DataLoading, Ready} → Unauthenticated` on remote
/// sign-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    AuthResolving,
    Authenticated,
    Unauthenticated,
    DemoMode,
    DataLoading,
    Ready,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::AuthResolving => "auth_resolving",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
            Self::DemoMode => "demo_mode",
            Self::DataLoading => "data_loading",
            Self::Ready => "ready",
        }
    }

    /// Whether moving to `next` is a legal edge.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Uninitialized, AuthResolving)
                | (AuthResolving, Authenticated)
                | (AuthResolving, Unauthenticated)
                | (AuthResolving, DemoMode)
                | (Authenticated, DataLoading)
                | (DemoMode, DataLoading)
                | (DataLoading, Ready)
                | (Ready, Unauthenticated)
                // signed out before the load finished
                | (DataLoading, Unauthenticated)
                // a later sign-in from the signed-out screen
                | (Unauthenticated, Authenticated)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Lifecycle states of one streaming exchange.

use crate::core::error::DomainError;

/// State of a streaming session.
///
/// ```text
/// Opening ──► Streaming ──► Finalizing ──► Closed
///    │            │              │
///    └────────────┴──────────────┴──► Errored
/// ```
///
/// `Closed` and `Errored` are terminal; a session is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Opening,
    Streaming,
    Finalizing,
    Closed,
    Errored,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Opening => "opening",
            SessionState::Streaming => "streaming",
            SessionState::Finalizing => "finalizing",
            SessionState::Closed => "closed",
            SessionState::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Errored)
    }

    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Opening, Streaming)
                | (Streaming, Finalizing)
                | (Finalizing, Closed)
                | (Opening | Streaming | Finalizing, Errored)
        )
    }

    /// Move to `next`, rejecting edges the lifecycle does not allow.
    pub fn transition(self, next: SessionState) -> Result<SessionState, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

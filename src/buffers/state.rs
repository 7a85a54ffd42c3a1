use serde::{Deserialize, Serialize};

/// Lifecycle state of one buffer lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferState {
    /// Allocated buffer, no longer in use
    Free,
    /// Allocated buffer actively in use by one client
    Locked,
    /// Buffer returned from the client, contents final
    Emitted,
    /// Buffer blocked by a protocol failure
    Blocked,
}

impl BufferState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: BufferState) -> bool {
        use BufferState::*;

        matches!(
            (self, target),
            (Free, Locked)
                | (Locked, Emitted)
                | (Locked, Blocked)
                | (Locked, Free)
                | (Emitted, Blocked)
                | (Emitted, Free)
                | (Blocked, Free)
        )
    }

    /// A handle may be dereferenced only in these states
    pub fn is_accessible(&self) -> bool {
        matches!(self, BufferState::Locked | BufferState::Emitted)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Free => "Free",
            Self::Locked => "Locked",
            Self::Emitted => "Emitted",
            Self::Blocked => "Blocked",
        }
    }
}

impl Default for BufferState {
    fn default() -> Self {
        Self::Free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_lifecycle() {
        assert!(BufferState::Free.can_transition_to(BufferState::Locked));
        assert!(BufferState::Locked.can_transition_to(BufferState::Emitted));
        assert!(BufferState::Emitted.can_transition_to(BufferState::Free));
    }

    #[test]
    fn test_no_double_emit() {
        assert!(!BufferState::Emitted.can_transition_to(BufferState::Emitted));
        assert!(!BufferState::Free.can_transition_to(BufferState::Emitted));
    }

    #[test]
    fn test_blocked_only_back_to_free() {
        assert!(BufferState::Blocked.can_transition_to(BufferState::Free));
        assert!(!BufferState::Blocked.can_transition_to(BufferState::Locked));
        assert!(!BufferState::Free.can_transition_to(BufferState::Blocked));
    }

    #[test]
    fn test_accessible_states() {
        assert!(BufferState::Locked.is_accessible());
        assert!(BufferState::Emitted.is_accessible());
        assert!(!BufferState::Free.is_accessible());
        assert!(!BufferState::Blocked.is_accessible());
    }
}

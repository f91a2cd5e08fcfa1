//! Prefixed ID generation.
//!
//! IDs are UUIDv7 with a short type prefix (`sess_`, `msg_`) so a bare ID
//! in a log line is self-describing. User IDs are issued by the auth
//! provider and carry no prefix.

use uuid::Uuid;

/// Generate a new session ID (`sess_<uuidv7>`).
#[must_use]
pub fn new_session_id() -> String {
    format!("sess_{}", Uuid::now_v7())
}

/// Generate a new message ID (`msg_<uuidv7>`).
#[must_use]
pub fn new_message_id() -> String {
    format!("msg_{}", Uuid::now_v7())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_has_prefix() {
        assert!(new_session_id().starts_with("sess_"));
    }

    #[test]
    fn message_id_has_prefix() {
        assert!(new_message_id().starts_with("msg_"));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
        assert_ne!(new_message_id(), new_message_id());
    }

    #[test]
    fn ids_sort_by_creation_order() {
        // UUIDv7 embeds a millisecond timestamp, so later IDs sort later.
        let a = new_message_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = new_message_id();
        assert!(a < b);
    }
}

use thiserror::Error;

/// Outcomes the core reports to the transport layer.
///
/// Neither variant is a fault: `Denied` becomes a user-visible reply and
/// `NotFound` is swallowed by [`SessionStore::record_interaction`].
///
/// [`SessionStore::record_interaction`]: crate::session::SessionStore::record_interaction
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("user {user_id} is not an administrator")]
    Denied { user_id: u64 },

    #[error("no session for chat {chat_id}")]
    NotFound { chat_id: i64 },
}

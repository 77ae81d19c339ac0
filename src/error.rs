//! Menu engine error types

use crate::state::UserId;
use thiserror::Error;

/// Errors raised by the menu engine
///
/// Builder and registry variants are programming errors and should reach the
/// operator. `PermissionDenied` is recoverable: the manager turns it into a
/// denial render instead of propagating it.
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("Invalid menu '{menu_id}': {reason}")]
    Validation { menu_id: String, reason: String },
    #[error("Menu already registered: {0}")]
    DuplicateMenu(String),
    #[error("Group '{group}' references unknown menu: {menu_id}")]
    UnknownMenu { group: String, menu_id: String },
    #[error("Menu not found: {0}")]
    MenuNotFound(String),
    #[error("User {user_id} may not open menu '{menu_id}'")]
    PermissionDenied { user_id: UserId, menu_id: String },
    #[error("Handler for '{pattern}' failed: {source}")]
    Handler {
        pattern: String,
        #[source]
        source: HandlerError,
    },
    #[error("Menu config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl MenuError {
    pub fn validation(menu_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            menu_id: menu_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller can recover without operator intervention
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::Handler { .. })
    }
}

pub type MenuResult<T> = Result<T, MenuError>;

/// Failure reported by a business callback handler or menu-open hook
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

//! API request and response types

use crate::manager::{CallbackOutcome, NavigationExport, NavigationOutcome};
use crate::state::{Context, UserId};
use serde::{Deserialize, Serialize};

/// A button press forwarded by the chat platform
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub user_id: UserId,
    pub token: String,
    #[serde(default)]
    pub context: Context,
}

/// Request to open a menu directly (e.g. from a slash command)
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub user_id: UserId,
    pub menu_id: String,
    #[serde(default)]
    pub context: Option<Context>,
}

#[derive(Debug, Deserialize)]
pub struct BackRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub context: Option<Context>,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub handled: bool,
    pub outcome: CallbackOutcome,
}

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub outcome: NavigationOutcome,
}

#[derive(Debug, Serialize)]
pub struct UserStateResponse {
    pub state: NavigationExport,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

//! HTTP transport for the menu engine
//!
//! A thin JSON adapter: chat platforms (or their webhook bridges) post
//! callbacks here and render the returned [`RenderedResponse`](crate::render::RenderedResponse).

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::manager::MenuManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<MenuManager>,
}

impl AppState {
    pub fn new(manager: Arc<MenuManager>) -> Self {
        Self { manager }
    }
}

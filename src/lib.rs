//! Menu navigation engine for chat bots
//!
//! Declarative menus, per-user navigation state with bounded history,
//! admin gating, and callback routing with exact and wildcard patterns.
//! The engine is transport-agnostic: it produces [`RenderedResponse`]s and
//! consumes [`CallbackEvent`]s.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod menu;
pub mod pagination;
pub mod registry;
pub mod render;
pub mod router;
pub mod state;

pub use config::EngineConfig;
pub use error::{HandlerError, MenuError, MenuResult};
pub use manager::{CallbackOutcome, MenuManager, MenuStatistics, NavigationExport, NavigationOutcome};
pub use menu::{Button, ButtonKind, MenuBuilder, MenuConfig, MenuStructure};
pub use render::RenderedResponse;
pub use router::{CallbackEvent, CallbackHandler, MenuOpener};
pub use state::{Context, UserId};

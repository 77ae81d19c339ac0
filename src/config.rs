//! Engine configuration from the environment

use crate::state::UserId;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Users allowed into admin-only menus
    pub admin_ids: BTreeSet<UserId>,
    /// JSON menu definitions loaded at startup
    pub menu_config_path: Option<PathBuf>,
    pub port: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin_ids: BTreeSet::new(),
            menu_config_path: None,
            port: DEFAULT_PORT,
        }
    }
}

impl EngineConfig {
    /// Read `MENU_ADMIN_IDS`, `MENU_CONFIG_PATH` and `MENU_PORT`
    pub fn from_env() -> Self {
        Self {
            admin_ids: std::env::var("MENU_ADMIN_IDS")
                .map(|ids| parse_admin_ids(&ids))
                .unwrap_or_default(),
            menu_config_path: std::env::var("MENU_CONFIG_PATH").ok().map(PathBuf::from),
            port: std::env::var("MENU_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Comma-separated user ids; entries that don't parse are skipped
pub fn parse_admin_ids(raw: &str) -> BTreeSet<UserId> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(entry, "Ignoring invalid admin id");
                None
            }
        })
        .collect()
}

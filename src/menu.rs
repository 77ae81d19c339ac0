//! Menu definitions
//!
//! Immutable description of one menu's content and layout. Menus are built
//! once (see [`MenuBuilder`]) and replaced wholesale, never patched in place.

mod builder;

pub use builder::MenuBuilder;

use crate::error::{MenuError, MenuResult};
use crate::render::CustomRenderer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Callback prefix that routes a button press to a menu transition
pub const MENU_PREFIX: &str = "menu_";

/// Reserved callback token for "return to the previous menu"
pub const BACK_TOKEN: &str = "back";

pub const DEFAULT_BACK_TEXT: &str = "◀️ Back";

/// What pressing a button does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonKind {
    /// Fires a business callback
    Action,
    /// Navigates to another menu
    MenuLink,
    /// Opens an external link, no state change
    Url,
    Confirm,
    Cancel,
    /// Returns to the previous menu
    Back,
}

impl ButtonKind {
    /// Confirm/cancel pairs are laid out on their own full-width row
    pub fn is_confirmation(self) -> bool {
        matches!(self, Self::Confirm | Self::Cancel)
    }
}

/// A single menu button
///
/// `payload` is the callback token for action/confirm/cancel buttons, the
/// `menu_<id>` token for menu links, the target menu id for back buttons and
/// the address for URL buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    pub kind: ButtonKind,
    pub payload: String,
    #[serde(default)]
    pub admin_only: bool,
}

impl Button {
    fn new(kind: ButtonKind, text: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon: String::new(),
            kind,
            payload: payload.into(),
            admin_only: false,
        }
    }

    pub fn action(text: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(ButtonKind::Action, text, token)
    }

    /// Link to another menu; the payload becomes `menu_<target>`
    pub fn menu_link(text: impl Into<String>, target: &str) -> Self {
        Self::new(ButtonKind::MenuLink, text, format!("{MENU_PREFIX}{target}"))
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(ButtonKind::Url, text, url)
    }

    pub fn confirm(text: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(ButtonKind::Confirm, text, token)
    }

    pub fn cancel(text: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(ButtonKind::Cancel, text, token)
    }

    pub fn back(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(ButtonKind::Back, text, target)
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    #[must_use]
    pub fn with_admin_only(mut self, admin_only: bool) -> Self {
        self.admin_only = admin_only;
        self
    }

    /// Label shown to the user, icon first
    pub fn display_text(&self) -> String {
        if self.icon.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.icon, self.text).trim().to_string()
        }
    }

    /// Token the transport sends back when this button is pressed.
    ///
    /// URL buttons never produce a callback.
    pub fn callback_token(&self) -> Option<&str> {
        match self.kind {
            ButtonKind::Url => None,
            ButtonKind::Back => Some(BACK_TOKEN),
            ButtonKind::Action
            | ButtonKind::MenuLink
            | ButtonKind::Confirm
            | ButtonKind::Cancel => Some(&self.payload),
        }
    }

    pub fn url_target(&self) -> Option<&str> {
        (self.kind == ButtonKind::Url).then_some(self.payload.as_str())
    }

    /// Menu this button leads to, for menu links and back buttons
    pub fn target_menu(&self) -> Option<&str> {
        match self.kind {
            ButtonKind::MenuLink => self.payload.strip_prefix(MENU_PREFIX),
            ButtonKind::Back => Some(&self.payload),
            _ => None,
        }
    }
}

fn default_columns() -> u8 {
    1
}

fn default_back_text() -> String {
    DEFAULT_BACK_TEXT.to_string()
}

/// Content and layout of one menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuConfig {
    pub id: String,
    pub title: String,
    /// May contain `{key}` placeholders filled from the render context
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default = "default_columns")]
    pub columns: u8,
    #[serde(default)]
    pub admin_only: bool,
    /// `None` means the menu renders no back row
    #[serde(default)]
    pub back_target: Option<String>,
    #[serde(default = "default_back_text")]
    pub back_text: String,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl MenuConfig {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            columns: default_columns(),
            admin_only: false,
            back_target: None,
            back_text: default_back_text(),
            buttons: Vec::new(),
        }
    }

    /// Check the invariants every registered menu must satisfy
    pub fn validate(&self) -> MenuResult<()> {
        let invalid = |reason: String| Err(MenuError::validation(&self.id, reason));

        if self.id.trim().is_empty() {
            return invalid("menu id is empty".to_string());
        }
        if self.title.trim().is_empty() {
            return invalid("menu has no title".to_string());
        }
        if !(1..=3).contains(&self.columns) {
            return invalid(format!("columns must be 1-3, got {}", self.columns));
        }
        if self.back_target.as_deref().is_some_and(str::is_empty) {
            return invalid("back target is empty".to_string());
        }

        let mut seen = HashSet::new();
        for button in &self.buttons {
            if button.payload.is_empty() {
                return invalid(format!("button '{}' has an empty payload", button.text));
            }
            if button.kind == ButtonKind::MenuLink
                && button.target_menu().is_none_or(str::is_empty)
            {
                return invalid(format!(
                    "menu link '{}' must carry a '{MENU_PREFIX}<id>' payload",
                    button.text
                ));
            }
            if !seen.insert((button.kind == ButtonKind::Url, button.payload.as_str())) {
                return invalid(format!("duplicate button payload '{}'", button.payload));
            }
        }
        Ok(())
    }
}

/// A validated, immutable menu ready for registration
#[derive(Clone)]
pub struct MenuStructure {
    config: MenuConfig,
    renderer: Option<CustomRenderer>,
}

impl MenuStructure {
    /// Validate a raw config (e.g. one read from an exported file)
    pub fn from_config(config: MenuConfig) -> MenuResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            renderer: None,
        })
    }

    pub(crate) fn with_renderer(config: MenuConfig, renderer: Option<CustomRenderer>) -> Self {
        Self { config, renderer }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn buttons(&self) -> &[Button] {
        &self.config.buttons
    }

    pub fn is_admin_only(&self) -> bool {
        self.config.admin_only
    }

    pub fn back_target(&self) -> Option<&str> {
        self.config.back_target.as_deref()
    }

    pub fn custom_renderer(&self) -> Option<&CustomRenderer> {
        self.renderer.as_ref()
    }

    /// Buttons the given caller may see, in insertion order
    pub fn visible_buttons(&self, is_admin: bool) -> impl Iterator<Item = &Button> {
        self.config
            .buttons
            .iter()
            .filter(move |b| is_admin || !b.admin_only)
    }
}

impl fmt::Debug for MenuStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuStructure")
            .field("config", &self.config)
            .field("custom_renderer", &self.renderer.is_some())
            .finish()
    }
}

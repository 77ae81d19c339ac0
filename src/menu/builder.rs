//! Fluent menu construction

use super::{Button, MenuConfig, MenuStructure, DEFAULT_BACK_TEXT};
use crate::error::{MenuError, MenuResult};
use crate::render::{CustomRenderer, RenderedResponse};
use crate::state::Context;
use std::sync::Arc;

/// Whether the menu gets a back row
#[derive(Debug, Clone, PartialEq, Eq)]
enum BackChoice {
    Unset,
    To { target: String, text: String },
    Disabled,
}

/// Builder for [`MenuStructure`]
///
/// Every setter returns the builder; problems are reported by [`build`](Self::build).
/// A menu must either name a back target or opt out with
/// [`no_back_button`](Self::no_back_button).
#[derive(Clone)]
pub struct MenuBuilder {
    id: String,
    title: String,
    description: String,
    columns: usize,
    admin_only: bool,
    back: BackChoice,
    buttons: Vec<Button>,
    renderer: Option<CustomRenderer>,
}

impl MenuBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            columns: 1,
            admin_only: false,
            back: BackChoice::Unset,
            buttons: Vec::new(),
            renderer: None,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Description template; `{key}` placeholders are filled at render time
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Buttons per row, 1-3 (checked in `build`)
    #[must_use]
    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn admin_only(mut self, admin_only: bool) -> Self {
        self.admin_only = admin_only;
        self
    }

    #[must_use]
    pub fn add_action(
        mut self,
        text: impl Into<String>,
        token: impl Into<String>,
        icon: impl Into<String>,
        admin_only: bool,
    ) -> Self {
        self.buttons.push(
            Button::action(text, token)
                .with_icon(icon)
                .with_admin_only(admin_only),
        );
        self
    }

    /// Link to `target_id`; the button's payload is `menu_<target_id>`
    #[must_use]
    pub fn add_menu_link(
        mut self,
        text: impl Into<String>,
        target_id: &str,
        icon: impl Into<String>,
        admin_only: bool,
    ) -> Self {
        self.buttons.push(
            Button::menu_link(text, target_id)
                .with_icon(icon)
                .with_admin_only(admin_only),
        );
        self
    }

    #[must_use]
    pub fn add_url(
        mut self,
        text: impl Into<String>,
        url: impl Into<String>,
        icon: impl Into<String>,
        admin_only: bool,
    ) -> Self {
        self.buttons.push(
            Button::url(text, url)
                .with_icon(icon)
                .with_admin_only(admin_only),
        );
        self
    }

    /// Add a confirm/cancel pair, rendered on its own row
    #[must_use]
    pub fn add_confirm_cancel(
        mut self,
        confirm_text: impl Into<String>,
        confirm_token: impl Into<String>,
        cancel_text: impl Into<String>,
        cancel_token: impl Into<String>,
    ) -> Self {
        self.buttons.push(Button::confirm(confirm_text, confirm_token));
        self.buttons.push(Button::cancel(cancel_text, cancel_token));
        self
    }

    /// Add a prebuilt button as-is
    #[must_use]
    pub fn add_button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }

    #[must_use]
    pub fn back_button(self, target: impl Into<String>) -> Self {
        self.back_button_with_text(target, DEFAULT_BACK_TEXT)
    }

    #[must_use]
    pub fn back_button_with_text(
        mut self,
        target: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.back = BackChoice::To {
            target: target.into(),
            text: text.into(),
        };
        self
    }

    #[must_use]
    pub fn no_back_button(mut self) -> Self {
        self.back = BackChoice::Disabled;
        self
    }

    /// Replace default rendering for this menu
    #[must_use]
    pub fn renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&MenuStructure, &Context) -> RenderedResponse + Send + Sync + 'static,
    {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn build(self) -> MenuResult<MenuStructure> {
        let columns = u8::try_from(self.columns)
            .ok()
            .filter(|c| (1..=3).contains(c))
            .ok_or_else(|| {
                MenuError::validation(
                    &self.id,
                    format!("columns must be 1-3, got {}", self.columns),
                )
            })?;

        let (back_target, back_text) = match self.back {
            BackChoice::To { target, text } => (Some(target), text),
            BackChoice::Disabled => (None, DEFAULT_BACK_TEXT.to_string()),
            BackChoice::Unset => {
                return Err(MenuError::validation(
                    &self.id,
                    "no back target set and back button not disabled",
                ))
            }
        };

        let config = MenuConfig {
            id: self.id,
            title: self.title,
            description: self.description,
            columns,
            admin_only: self.admin_only,
            back_target,
            back_text,
            buttons: self.buttons,
        };
        config.validate()?;

        Ok(MenuStructure::with_renderer(config, self.renderer))
    }
}

// Presets for menus that show up in every bot

impl MenuBuilder {
    /// "Create" and "List" actions for an entity, tokens `<id>_create` / `<id>_list`
    pub fn crud(menu_id: &str, entity_name: &str, back_target: &str) -> Self {
        Self::new(menu_id)
            .title(format!("📋 {entity_name}"))
            .description(format!("Manage {}", entity_name.to_lowercase()))
            .add_action("Create", format!("{menu_id}_create"), "➕", false)
            .add_action("List", format!("{menu_id}_list"), "📋", false)
            .back_button(back_target)
    }

    /// Confirm/cancel screen; without a back target the menu has no back row
    pub fn confirmation(
        menu_id: &str,
        title: &str,
        confirm_token: &str,
        cancel_token: &str,
        back_target: Option<&str>,
    ) -> Self {
        let builder = Self::new(menu_id).title(title).add_confirm_cancel(
            "✅ Confirm",
            confirm_token,
            "❌ Cancel",
            cancel_token,
        );
        match back_target {
            Some(target) => builder.back_button(target),
            None => builder.no_back_button(),
        }
    }

    pub fn simple(menu_id: &str, title: &str, description: &str, back_target: &str) -> Self {
        Self::new(menu_id)
            .title(title)
            .description(description)
            .back_button(back_target)
    }
}

//! Menu rendering
//!
//! Turns a [`MenuStructure`] plus a context into a platform-neutral
//! [`RenderedResponse`]. Rendering is pure and never fails.

use crate::menu::{Button, ButtonKind, MenuStructure};
use crate::state::Context;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Context key the manager sets to tell the renderer who is looking
pub const IS_ADMIN_KEY: &str = "is_admin";

/// `{name}` placeholders in description templates
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid placeholder regex")
});

/// Replacement for default rendering of one menu
pub type CustomRenderer = Arc<dyn Fn(&MenuStructure, &Context) -> RenderedResponse + Send + Sync>;

/// Text plus button layout, handed to the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedResponse {
    pub text: String,
    pub rows: Vec<Vec<Button>>,
}

impl RenderedResponse {
    pub fn new(text: impl Into<String>, rows: Vec<Vec<Button>>) -> Self {
        Self {
            text: text.into(),
            rows,
        }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    /// Shown instead of an admin-only menu
    pub fn access_denied() -> Self {
        Self::text_only("❌ Access denied\n\nYou don't have permission to view this menu.")
    }

    pub fn has_buttons(&self) -> bool {
        self.rows.iter().any(|row| !row.is_empty())
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// Default renderer with per-menu overrides
#[derive(Default, Clone)]
pub struct Renderer {
    custom: HashMap<String, CustomRenderer>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully replace default rendering for `menu_id`
    pub fn register_custom_renderer<F>(&mut self, menu_id: impl Into<String>, renderer: F)
    where
        F: Fn(&MenuStructure, &Context) -> RenderedResponse + Send + Sync + 'static,
    {
        self.custom.insert(menu_id.into(), Arc::new(renderer));
    }

    pub fn has_custom_renderer(&self, menu_id: &str) -> bool {
        self.custom.contains_key(menu_id)
    }

    /// Render a menu. Custom output is returned untouched.
    pub fn render(&self, menu: &MenuStructure, context: &Context) -> RenderedResponse {
        if let Some(custom) = self
            .custom
            .get(menu.id())
            .or_else(|| menu.custom_renderer())
        {
            return custom(menu, context);
        }

        let is_admin = context
            .get(IS_ADMIN_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        RenderedResponse {
            text: render_text(menu, context),
            rows: layout_rows(menu, is_admin),
        }
    }
}

fn render_text(menu: &MenuStructure, context: &Context) -> String {
    let description = &menu.config().description;
    if description.is_empty() {
        return menu.title().to_string();
    }
    format!("{}\n\n{}", menu.title(), substitute(description, context))
}

/// Fill `{key}` placeholders from `context`; missing keys become empty
pub fn substitute(template: &str, context: &Context) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            context.get(&caps[1]).map(value_text).unwrap_or_default()
        })
        .into_owned()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Regular buttons packed `columns` per row, then the confirm/cancel row,
/// then the back row. The last two are always full width.
fn layout_rows(menu: &MenuStructure, is_admin: bool) -> Vec<Vec<Button>> {
    let columns = usize::from(menu.config().columns.clamp(1, 3));

    let mut regular = Vec::new();
    let mut confirmation = Vec::new();
    let mut back = Vec::new();
    for button in menu.visible_buttons(is_admin) {
        match button.kind {
            ButtonKind::Confirm | ButtonKind::Cancel => confirmation.push(button.clone()),
            ButtonKind::Back => back.push(button.clone()),
            ButtonKind::Action | ButtonKind::MenuLink | ButtonKind::Url => {
                regular.push(button.clone());
            }
        }
    }

    if let Some(target) = menu.back_target() {
        back.push(Button::back(menu.config().back_text.clone(), target));
    }

    let mut rows: Vec<Vec<Button>> = regular.chunks(columns).map(<[Button]>::to_vec).collect();
    if !confirmation.is_empty() {
        rows.push(confirmation);
    }
    if !back.is_empty() {
        rows.push(back);
    }
    rows
}

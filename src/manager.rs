//! Menu manager
//!
//! Façade tying the registry, navigation store, renderer and callback router
//! together. One instance is built at startup and shared by `Arc`.
//!
//! Locking: registry/router/renderer tables sit behind their own `RwLock`s;
//! each user's navigation state behind its own mutex (see [`NavigationStore`]).
//! When both are needed the registry is taken first. No lock is held while a
//! handler or opener runs, so those may call back into the manager.

use crate::config::EngineConfig;
use crate::error::{HandlerError, MenuError, MenuResult};
use crate::menu::MenuStructure;
use crate::registry::{MenuConfigFile, MenuRegistry};
use crate::render::{RenderedResponse, Renderer, IS_ADMIN_KEY};
use crate::router::{
    CallbackEvent, CallbackHandler, CallbackRouter, FnHandler, FnOpener, MenuOpener, Route,
};
use crate::state::{Context, NavigationState, NavigationStore, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(test)]
mod proptests;

/// Result of a navigation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// The user is now on `menu_id`
    Shown {
        menu_id: String,
        response: RenderedResponse,
    },
    /// Access refused; navigation state untouched
    Denied {
        menu_id: String,
        response: RenderedResponse,
    },
    /// No current menu and nowhere to go back to
    Empty,
}

impl NavigationOutcome {
    fn denied(menu_id: &str) -> Self {
        Self::Denied {
            menu_id: menu_id.to_string(),
            response: RenderedResponse::access_denied(),
        }
    }

    pub fn response(&self) -> Option<&RenderedResponse> {
        match self {
            Self::Shown { response, .. } | Self::Denied { response, .. } => Some(response),
            Self::Empty => None,
        }
    }

    pub fn is_shown(&self) -> bool {
        matches!(self, Self::Shown { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// Result of [`MenuManager::handle_callback`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallbackOutcome {
    /// A registered handler ran
    Handled { pattern: String },
    /// The token was a menu transition
    Navigation(NavigationOutcome),
    /// The token belongs to an admin-only button and the user is not an admin
    Denied {
        token: String,
        response: RenderedResponse,
    },
    /// Nothing matched; the transport should show a "not found" hint
    Unhandled,
}

impl CallbackOutcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Unhandled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuStatistics {
    pub total_menus: usize,
    pub active_users: usize,
    pub menu_list: Vec<String>,
    pub callback_handlers: usize,
}

/// Portable snapshot of one user's navigation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationExport {
    pub user_id: UserId,
    pub current_menu: Option<String>,
    pub history: Vec<String>,
    #[serde(default)]
    pub context: Context,
}

/// Where `go_back` decided to go
enum BackStep {
    Moved(Arc<MenuStructure>, NavigationState),
    Stayed(Option<Arc<MenuStructure>>, NavigationState),
    Denied(String),
}

pub struct MenuManager {
    admins: HashSet<UserId>,
    registry: RwLock<MenuRegistry>,
    renderer: RwLock<Renderer>,
    router: RwLock<CallbackRouter>,
    openers: RwLock<HashMap<String, Arc<dyn MenuOpener>>>,
    store: NavigationStore,
}

impl MenuManager {
    pub fn new(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
            registry: RwLock::new(MenuRegistry::new()),
            renderer: RwLock::new(Renderer::new()),
            router: RwLock::new(CallbackRouter::new()),
            openers: RwLock::new(HashMap::new()),
            store: NavigationStore::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.admin_ids.iter().copied())
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admins.contains(&user_id)
    }

    fn can_open(&self, menu: &MenuStructure, user_id: UserId) -> bool {
        !menu.is_admin_only() || self.is_admin(user_id)
    }

    // ==================== Registration ====================

    pub async fn register_menu(&self, menu: MenuStructure) -> MenuResult<()> {
        let menu_id = menu.id().to_string();
        self.registry.write().await.register_menu(menu)?;
        tracing::info!(menu_id = %menu_id, "Menu registered");
        Ok(())
    }

    pub async fn unregister_menu(&self, menu_id: &str) -> bool {
        self.registry.write().await.unregister_menu(menu_id)
    }

    pub async fn get_menu(&self, menu_id: &str) -> MenuResult<Arc<MenuStructure>> {
        self.registry.read().await.get_menu(menu_id)
    }

    pub async fn has_menu(&self, menu_id: &str) -> bool {
        self.registry.read().await.has_menu(menu_id)
    }

    pub async fn register_menu_group(&self, name: &str, menu_ids: Vec<String>) -> MenuResult<()> {
        self.registry.write().await.register_menu_group(name, menu_ids)
    }

    pub async fn get_menu_group(&self, name: &str) -> Vec<Arc<MenuStructure>> {
        self.registry.read().await.get_menu_group(name)
    }

    pub async fn register_feature_menus(
        &self,
        feature: &str,
        menus: Vec<MenuStructure>,
    ) -> MenuResult<()> {
        self.registry
            .write()
            .await
            .register_feature_menus(feature, menus)?;
        tracing::info!(feature, "Feature menus registered");
        Ok(())
    }

    /// Bind a handler to an exact token or a `prefix*` pattern.
    /// A repeated pattern replaces the previous handler.
    pub async fn register_callback_handler(
        &self,
        pattern: &str,
        handler: Arc<dyn CallbackHandler>,
    ) {
        let replaced = self.router.write().await.register(pattern, handler);
        if replaced {
            tracing::debug!(pattern, "Callback handler replaced");
        }
    }

    /// Bind an async closure to a callback pattern
    pub async fn menu_handler<F, Fut>(&self, pattern: &str, handler: F)
    where
        F: Fn(CallbackEvent, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.register_callback_handler(pattern, Arc::new(FnHandler(handler)))
            .await;
    }

    /// Run `opener` each time `menu_id` is opened
    pub async fn register_menu_opener(&self, menu_id: &str, opener: Arc<dyn MenuOpener>) {
        self.openers
            .write()
            .await
            .insert(menu_id.to_string(), opener);
    }

    /// Bind an async closure to the opening of `menu_id`
    pub async fn menu_opener<F, Fut>(&self, menu_id: &str, opener: F)
    where
        F: Fn(RenderedResponse, UserId, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.register_menu_opener(menu_id, Arc::new(FnOpener(opener)))
            .await;
    }

    pub async fn register_custom_renderer<F>(&self, menu_id: &str, renderer: F)
    where
        F: Fn(&MenuStructure, &Context) -> RenderedResponse + Send + Sync + 'static,
    {
        self.renderer
            .write()
            .await
            .register_custom_renderer(menu_id, renderer);
    }

    // ==================== Navigation ====================

    /// Look up a menu and check the user may open it
    pub async fn authorize(&self, menu_id: &str, user_id: UserId) -> MenuResult<Arc<MenuStructure>> {
        let menu = self.get_menu(menu_id).await?;
        if !self.can_open(&menu, user_id) {
            return Err(MenuError::PermissionDenied {
                user_id,
                menu_id: menu_id.to_string(),
            });
        }
        Ok(menu)
    }

    /// Open `menu_id` for `user_id`, pushing the previous menu onto history
    /// and merging `context` into the user's context.
    pub async fn navigate_to(
        &self,
        menu_id: &str,
        user_id: UserId,
        context: Option<Context>,
    ) -> MenuResult<NavigationOutcome> {
        let menu = match self.authorize(menu_id, user_id).await {
            Ok(menu) => menu,
            Err(MenuError::PermissionDenied { .. }) => {
                tracing::warn!(user_id, menu_id, "Navigation denied");
                return Ok(NavigationOutcome::denied(menu_id));
            }
            Err(e) => return Err(e),
        };

        let state = self
            .store
            .update(user_id, |state| {
                state.enter(menu_id);
                if let Some(values) = context {
                    state.merge_context(values);
                }
                state.clone()
            })
            .await;
        tracing::debug!(user_id, menu_id, depth = state.history.len(), "Navigated");

        Ok(self.open(&menu, user_id, &state, true).await)
    }

    /// Return to the most recent history entry, falling back to the current
    /// menu's back target. With neither, re-render the current menu.
    pub async fn go_back(
        &self,
        user_id: UserId,
        context: Option<Context>,
    ) -> MenuResult<NavigationOutcome> {
        let registry = self.registry.read().await;
        let step = self
            .store
            .update(user_id, |state| {
                let from_history = state
                    .history
                    .iter()
                    .enumerate()
                    .rev()
                    .find_map(|(index, id)| registry.get_menu(id).ok().map(|m| (Some(index), m)));
                let target = from_history.or_else(|| {
                    let current = registry.get_menu(state.current_menu.as_deref()?).ok()?;
                    let back = registry.get_menu(current.back_target()?).ok()?;
                    Some((None, back))
                });

                match target {
                    Some((index, menu)) if !self.can_open(&menu, user_id) => {
                        // Drop the unreachable entry so the next press gets further
                        if let Some(index) = index {
                            state.history.truncate(index);
                        }
                        BackStep::Denied(menu.id().to_string())
                    }
                    Some((index, menu)) => {
                        // Also drops entries for menus unregistered since
                        if let Some(index) = index {
                            state.history.truncate(index);
                        }
                        state.current_menu = Some(menu.id().to_string());
                        if let Some(values) = context {
                            state.merge_context(values);
                        }
                        BackStep::Moved(menu, state.clone())
                    }
                    None => {
                        if let Some(values) = context {
                            state.merge_context(values);
                        }
                        let current = state
                            .current_menu
                            .as_deref()
                            .and_then(|id| registry.get_menu(id).ok());
                        BackStep::Stayed(current, state.clone())
                    }
                }
            })
            .await;
        drop(registry);

        match step {
            BackStep::Moved(menu, state) => {
                tracing::debug!(user_id, menu_id = %menu.id(), "Went back");
                Ok(self.open(&menu, user_id, &state, true).await)
            }
            BackStep::Stayed(Some(menu), state) => Ok(self.open(&menu, user_id, &state, false).await),
            BackStep::Stayed(None, _) => Ok(NavigationOutcome::Empty),
            BackStep::Denied(menu_id) => {
                tracing::warn!(user_id, menu_id = %menu_id, "Back navigation denied");
                Ok(NavigationOutcome::denied(&menu_id))
            }
        }
    }

    /// Route a button press: registered handler, menu transition, or miss
    pub async fn handle_callback(&self, event: CallbackEvent) -> MenuResult<CallbackOutcome> {
        let user_id = event.user_id;
        if let Some(menu_id) = self.admin_button_menu(user_id, &event.token).await {
            tracing::warn!(user_id, menu_id = %menu_id, token = %event.token, "Admin button pressed by non-admin");
            return Ok(CallbackOutcome::Denied {
                token: event.token,
                response: RenderedResponse::access_denied(),
            });
        }

        let route = self.router.read().await.resolve(&event.token);
        tracing::debug!(user_id, token = %event.token, ?route, "Resolved callback");

        match route {
            Route::Handler { pattern, handler } => {
                let mut state = self.store.get_or_create(user_id).await;
                state.context.extend(event.context.clone());
                let context = self.render_context(user_id, &state);

                if let Err(source) = handler.handle(self, event, context).await {
                    tracing::warn!(user_id, pattern = %pattern, error = %source, "Callback handler failed");
                    return Err(MenuError::Handler { pattern, source });
                }
                Ok(CallbackOutcome::Handled { pattern })
            }
            Route::Navigate(menu_id) => {
                match self.navigate_to(&menu_id, user_id, Some(event.context)).await {
                    Ok(outcome) => Ok(CallbackOutcome::Navigation(outcome)),
                    Err(MenuError::MenuNotFound(_)) => {
                        tracing::debug!(user_id, menu_id = %menu_id, "Callback names unknown menu");
                        Ok(CallbackOutcome::Unhandled)
                    }
                    Err(e) => Err(e),
                }
            }
            Route::Back => Ok(CallbackOutcome::Navigation(
                self.go_back(user_id, Some(event.context)).await?,
            )),
            Route::Unhandled => Ok(CallbackOutcome::Unhandled),
        }
    }

    /// Menu whose admin-only button `token` belongs to, for a non-admin user.
    ///
    /// The user's current menu is checked first; otherwise any registered
    /// menu counts when no ungated button shares the token.
    async fn admin_button_menu(&self, user_id: UserId, token: &str) -> Option<String> {
        if self.is_admin(user_id) {
            return None;
        }
        let current = self.get_current_menu(user_id).await;
        let registry = self.registry.read().await;
        if let Some(menu) = current.as_deref().and_then(|id| registry.get_menu(id).ok()) {
            if menu
                .buttons()
                .iter()
                .any(|b| b.admin_only && b.callback_token() == Some(token))
            {
                return Some(menu.id().to_string());
            }
        }
        registry.admin_token_owner(token)
    }

    /// Re-render the user's current menu without touching history
    pub async fn render_current(&self, user_id: UserId) -> MenuResult<NavigationOutcome> {
        let Some(menu_id) = self.get_current_menu(user_id).await else {
            return Ok(NavigationOutcome::Empty);
        };
        let menu = match self.authorize(&menu_id, user_id).await {
            Ok(menu) => menu,
            Err(MenuError::PermissionDenied { .. }) => return Ok(NavigationOutcome::denied(&menu_id)),
            Err(e) => return Err(e),
        };
        let state = self.store.get_or_create(user_id).await;
        Ok(self.open(&menu, user_id, &state, false).await)
    }

    /// Render `menu` with the user's enriched context and, for real
    /// transitions, run its opener
    async fn open(
        &self,
        menu: &MenuStructure,
        user_id: UserId,
        state: &NavigationState,
        transition: bool,
    ) -> NavigationOutcome {
        let context = self.render_context(user_id, state);
        let response = self.renderer.read().await.render(menu, &context);

        if transition {
            let opener = self.openers.read().await.get(menu.id()).cloned();
            if let Some(opener) = opener {
                if let Err(e) = opener.on_open(self, &response, user_id, &context).await {
                    tracing::warn!(user_id, menu_id = %menu.id(), error = %e, "Menu opener failed");
                }
            }
        }

        NavigationOutcome::Shown {
            menu_id: menu.id().to_string(),
            response,
        }
    }

    /// The user's context plus who/where they are, for renderers and handlers
    fn render_context(&self, user_id: UserId, state: &NavigationState) -> Context {
        let mut context = state.context.clone();
        context.insert("user_id".to_string(), json!(user_id));
        context.insert("current_menu".to_string(), json!(state.current_menu));
        context.insert("navigation_history".to_string(), json!(state.history));
        context.insert(IS_ADMIN_KEY.to_string(), json!(self.is_admin(user_id)));
        context
    }

    // ==================== State Accessors ====================

    /// Current menu, if it is still registered
    pub async fn get_current_menu(&self, user_id: UserId) -> Option<String> {
        let current = self.store.peek(user_id).await?.current_menu?;
        self.has_menu(&current).await.then_some(current)
    }

    pub async fn get_history(&self, user_id: UserId) -> Vec<String> {
        self.store
            .peek(user_id)
            .await
            .map(|state| state.history_vec())
            .unwrap_or_default()
    }

    pub async fn get_user_context(&self, user_id: UserId) -> Context {
        self.store.get_or_create(user_id).await.context
    }

    pub async fn get_context_value(&self, user_id: UserId, key: &str, default: Value) -> Value {
        self.store.get_context(user_id, key, default).await
    }

    pub async fn set_user_context(&self, user_id: UserId, key: &str, value: Value) {
        self.store.set_context(user_id, key, value).await;
    }

    pub async fn update_user_context(&self, user_id: UserId, values: Context) {
        self.store
            .update(user_id, |state| state.merge_context(values))
            .await;
    }

    pub async fn clear_user_context(&self, user_id: UserId) {
        self.store
            .update(user_id, |state| state.context.clear())
            .await;
    }

    /// Forget the user's current menu, history and context
    pub async fn clear_navigation(&self, user_id: UserId) {
        self.store.clear(user_id).await;
    }

    // ==================== Diagnostics / Export ====================

    pub async fn get_menu_statistics(&self) -> MenuStatistics {
        let (total_menus, menu_list) = {
            let registry = self.registry.read().await;
            (registry.len(), registry.menu_ids())
        };
        MenuStatistics {
            total_menus,
            active_users: self.store.active_users().await,
            menu_list,
            callback_handlers: self.router.read().await.len(),
        }
    }

    pub async fn export_navigation_state(&self, user_id: UserId) -> Option<NavigationExport> {
        let state = self.store.peek(user_id).await?;
        Some(NavigationExport {
            user_id,
            current_menu: state.current_menu.clone(),
            history: state.history_vec(),
            context: state.context,
        })
    }

    /// Restore a snapshot produced by [`export_navigation_state`](Self::export_navigation_state)
    pub async fn import_navigation_state(&self, user_id: UserId, export: NavigationExport) {
        let state = NavigationState {
            current_menu: export.current_menu,
            history: export.history.into(),
            context: export.context,
        };
        self.store.replace(user_id, state).await;
    }

    /// Serialize every registered menu and group as JSON
    pub async fn export_menu_config(&self) -> MenuResult<String> {
        self.registry.read().await.export_config().to_json()
    }

    /// Register menus and groups from JSON; all-or-nothing
    pub async fn import_menu_config(&self, json: &str) -> MenuResult<usize> {
        let file = MenuConfigFile::from_json(json)?;
        self.registry.write().await.import_config(file)
    }
}

//! Callback routing
//!
//! Decides what an incoming callback token means. Resolution order:
//! 1. exact binding
//! 2. longest matching wildcard binding (first registered wins a tie)
//! 3. the reserved `back` token, then `menu_<id>` tokens
//!
//! Anything else is a routing miss. The router only decides; the manager
//! performs the transition or invokes the handler.

use crate::error::HandlerError;
use crate::manager::MenuManager;
use crate::menu::{BACK_TOKEN, MENU_PREFIX};
use crate::render::RenderedResponse;
use crate::state::{Context, UserId};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A button press delivered by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackEvent {
    pub user_id: UserId,
    pub token: String,
    /// Extra values supplied with the event, merged over the user's context
    pub context: Context,
}

impl CallbackEvent {
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        Self {
            user_id,
            token: token.into(),
            context: Context::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

/// Business handler bound to a callback pattern
///
/// Handlers get the manager so they can navigate themselves; no engine lock
/// is held while they run.
#[async_trait]
pub trait CallbackHandler: Send + Sync {
    async fn handle(
        &self,
        manager: &MenuManager,
        event: CallbackEvent,
        context: Context,
    ) -> Result<(), HandlerError>;
}

/// Hook run right after a menu has been opened successfully
#[async_trait]
pub trait MenuOpener: Send + Sync {
    async fn on_open(
        &self,
        manager: &MenuManager,
        response: &RenderedResponse,
        user_id: UserId,
        context: &Context,
    ) -> Result<(), HandlerError>;
}

/// Adapts an async closure into a [`CallbackHandler`]
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> CallbackHandler for FnHandler<F>
where
    F: Fn(CallbackEvent, Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(
        &self,
        _manager: &MenuManager,
        event: CallbackEvent,
        context: Context,
    ) -> Result<(), HandlerError> {
        (self.0)(event, context).await
    }
}

/// Adapts an async closure into a [`MenuOpener`]
pub struct FnOpener<F>(pub F);

#[async_trait]
impl<F, Fut> MenuOpener for FnOpener<F>
where
    F: Fn(RenderedResponse, UserId, Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn on_open(
        &self,
        _manager: &MenuManager,
        response: &RenderedResponse,
        user_id: UserId,
        context: &Context,
    ) -> Result<(), HandlerError> {
        (self.0)(response.clone(), user_id, context.clone()).await
    }
}

/// How a binding's pattern matches tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Exact(String),
    /// Literal prefix (pattern without its trailing `*`)
    Wildcard(String),
}

impl BindingKind {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(prefix) => Self::Wildcard(prefix.to_string()),
            None => Self::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, token: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == token,
            Self::Wildcard(prefix) => token.starts_with(prefix.as_str()),
        }
    }

    /// The pattern as it was registered
    pub fn pattern(&self) -> String {
        match self {
            Self::Exact(exact) => exact.clone(),
            Self::Wildcard(prefix) => format!("{prefix}*"),
        }
    }
}

pub struct CallbackBinding {
    pub kind: BindingKind,
    pub handler: Arc<dyn CallbackHandler>,
}

/// Outcome of resolving a token
#[derive(Clone)]
pub enum Route {
    Handler {
        pattern: String,
        handler: Arc<dyn CallbackHandler>,
    },
    Navigate(String),
    Back,
    Unhandled,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Handler { pattern, .. } => f.debug_tuple("Handler").field(pattern).finish(),
            Route::Navigate(menu_id) => f.debug_tuple("Navigate").field(menu_id).finish(),
            Route::Back => f.write_str("Back"),
            Route::Unhandled => f.write_str("Unhandled"),
        }
    }
}

/// Binding table in registration order
#[derive(Default)]
pub struct CallbackRouter {
    bindings: Vec<CallbackBinding>,
}

impl CallbackRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `pattern`. Re-registering a pattern replaces its
    /// handler but keeps its priority slot. Returns `true` on replacement.
    pub fn register(&mut self, pattern: &str, handler: Arc<dyn CallbackHandler>) -> bool {
        let kind = BindingKind::parse(pattern);
        if let Some(existing) = self.bindings.iter_mut().find(|b| b.kind == kind) {
            existing.handler = handler;
            return true;
        }
        self.bindings.push(CallbackBinding { kind, handler });
        false
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn patterns(&self) -> Vec<String> {
        self.bindings.iter().map(|b| b.kind.pattern()).collect()
    }

    pub fn resolve(&self, token: &str) -> Route {
        if let Some(binding) = self
            .bindings
            .iter()
            .find(|b| matches!(&b.kind, BindingKind::Exact(exact) if exact == token))
        {
            return Self::handler_route(binding);
        }

        let mut best: Option<(&CallbackBinding, usize)> = None;
        for binding in &self.bindings {
            if let BindingKind::Wildcard(prefix) = &binding.kind {
                let longer = best.is_none_or(|(_, len)| prefix.len() > len);
                if longer && token.starts_with(prefix.as_str()) {
                    best = Some((binding, prefix.len()));
                }
            }
        }
        if let Some((binding, _)) = best {
            return Self::handler_route(binding);
        }

        if token == BACK_TOKEN {
            return Route::Back;
        }
        match token.strip_prefix(MENU_PREFIX) {
            Some(menu_id) if !menu_id.is_empty() => Route::Navigate(menu_id.to_string()),
            _ => Route::Unhandled,
        }
    }

    fn handler_route(binding: &CallbackBinding) -> Route {
        Route::Handler {
            pattern: binding.kind.pattern(),
            handler: Arc::clone(&binding.handler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl CallbackHandler for Noop {
        async fn handle(
            &self,
            _manager: &MenuManager,
            _event: CallbackEvent,
            _context: Context,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    fn router(patterns: &[&str]) -> CallbackRouter {
        let mut router = CallbackRouter::new();
        for pattern in patterns {
            router.register(pattern, Arc::new(Noop));
        }
        router
    }

    fn matched(route: &Route) -> Option<&str> {
        match route {
            Route::Handler { pattern, .. } => Some(pattern),
            _ => None,
        }
    }

    #[test]
    fn test_binding_kind_parse() {
        assert_eq!(BindingKind::parse("create_*"), BindingKind::Wildcard("create_".into()));
        assert_eq!(BindingKind::parse("create"), BindingKind::Exact("create".into()));
        assert_eq!(BindingKind::parse("*").pattern(), "*");
    }

    #[test]
    fn test_exact_beats_wildcard_regardless_of_order() {
        for patterns in [["create_*", "create_template"], ["create_template", "create_*"]] {
            let router = router(&patterns);
            assert_eq!(
                matched(&router.resolve("create_template")),
                Some("create_template")
            );
            assert_eq!(matched(&router.resolve("create_group")), Some("create_*"));
        }
    }

    #[test]
    fn test_longest_wildcard_wins() {
        let router = router(&["tpl_*", "tpl_edit_*"]);
        assert_eq!(matched(&router.resolve("tpl_edit_7")), Some("tpl_edit_*"));
        assert_eq!(matched(&router.resolve("tpl_view_7")), Some("tpl_*"));
    }

    #[test]
    fn test_sibling_wildcards_route_independently() {
        let mut router = router(&["ab_c*"]);
        router.register("ab_*", Arc::new(Noop));
        router.register("ab_d*", Arc::new(Noop));
        assert_eq!(matched(&router.resolve("ab_c1")), Some("ab_c*"));
        assert_eq!(matched(&router.resolve("ab_d1")), Some("ab_d*"));
        assert_eq!(matched(&router.resolve("ab_e1")), Some("ab_*"));
    }

    #[test]
    fn test_reregistering_replaces_in_place() {
        let mut router = router(&["a*", "b"]);
        assert!(router.register("a*", Arc::new(Noop)));
        assert_eq!(router.len(), 2);
        assert_eq!(router.patterns(), ["a*", "b"]);
    }

    #[test]
    fn test_menu_and_back_tokens() {
        let router = CallbackRouter::new();
        assert!(matches!(router.resolve("menu_settings"), Route::Navigate(ref id) if id == "settings"));
        assert!(matches!(router.resolve("back"), Route::Back));
        assert!(matches!(router.resolve("menu_"), Route::Unhandled));
        assert!(matches!(router.resolve("whatever"), Route::Unhandled));
    }

    #[test]
    fn test_bindings_shadow_menu_prefix() {
        let router = router(&["menu_*"]);
        assert_eq!(matched(&router.resolve("menu_settings")), Some("menu_*"));
    }
}

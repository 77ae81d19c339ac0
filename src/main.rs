//! Menu navigation server
//!
//! Runs the menu engine behind a small JSON API. Menus come from
//! `MENU_CONFIG_PATH` when set, otherwise a demo menu tree is registered.

use async_trait::async_trait;
use menu_nav::api::{create_router, AppState};
use menu_nav::menu::DEFAULT_BACK_TEXT;
use menu_nav::pagination::{paginated_rows, parse_page_token, PaginationConfig, NOOP_TOKEN};
use menu_nav::{
    Button, CallbackEvent, CallbackHandler, Context, EngineConfig, HandlerError, MenuBuilder,
    MenuManager, MenuResult, RenderedResponse,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TEMPLATE_PAGE_PREFIX: &str = "tpl_page";
const TEMPLATE_OPEN_PREFIX: &str = "tpl_open";

const DEMO_TEMPLATES: [&str; 10] = [
    "Weekly report",
    "Standup",
    "Release notes",
    "Incident",
    "Onboarding",
    "Retro",
    "Roadmap",
    "Changelog",
    "Announcement",
    "Survey",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "menu_nav=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = EngineConfig::from_env();
    let manager = Arc::new(MenuManager::from_config(&config));

    if config.admin_ids.is_empty() {
        tracing::warn!("No admin ids configured, admin-only menus are unreachable. Set MENU_ADMIN_IDS.");
    }

    if let Some(path) = &config.menu_config_path {
        tracing::info!(path = %path.display(), "Loading menu definitions");
        let json = std::fs::read_to_string(path)?;
        manager.import_menu_config(&json).await?;
    } else {
        tracing::info!("MENU_CONFIG_PATH not set, registering demo menus");
        register_demo_menus(&manager).await?;
    }

    let stats = manager.get_menu_statistics().await;
    tracing::info!(menus = stats.total_menus, handlers = stats.callback_handlers, "Menu engine ready");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let app = create_router(AppState::new(manager))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Menu server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================
// Demo menu tree
// ============================================================

async fn register_demo_menus(manager: &MenuManager) -> MenuResult<()> {
    manager
        .register_menu(
            MenuBuilder::new("main")
                .title("🏠 Main menu")
                .description("Welcome! Pick a section.")
                .columns(2)
                .add_menu_link("Templates", "templates", "📝", false)
                .add_menu_link("Settings", "settings", "⚙️", true)
                .add_url("Docs", "https://example.com/docs", "📖", false)
                .no_back_button()
                .build()?,
        )
        .await?;

    manager
        .register_feature_menus(
            "templates",
            vec![
                MenuBuilder::crud("templates", "Templates", "main")
                    .add_menu_link("Browse", "template_list", "📚", false)
                    .build()?,
                MenuBuilder::simple("template_list", "📚 All templates", "", "templates").build()?,
            ],
        )
        .await?;

    manager
        .register_menu(
            MenuBuilder::new("settings")
                .title("⚙️ Settings")
                .description("Signed in as {user_id}")
                .admin_only(true)
                .add_action("Backup", "backup_create", "💾", true)
                .add_menu_link("Reset", "confirm_reset", "♻️", true)
                .back_button("main")
                .build()?,
        )
        .await?;

    manager
        .register_menu(
            MenuBuilder::confirmation(
                "confirm_reset",
                "Reset all your settings?",
                "reset_yes",
                "reset_no",
                Some("settings"),
            )
            .admin_only(true)
            .build()?,
        )
        .await?;

    manager
        .register_menu_group(
            "core",
            vec!["main".into(), "templates".into(), "settings".into()],
        )
        .await?;

    manager
        .register_custom_renderer("template_list", |menu, context| {
            let page = context
                .get("page")
                .and_then(Value::as_u64)
                .and_then(|p| usize::try_from(p).ok())
                .unwrap_or(0);
            let items: Vec<Button> = DEMO_TEMPLATES
                .iter()
                .enumerate()
                .map(|(i, name)| Button::action(*name, format!("{TEMPLATE_OPEN_PREFIX}_{i}")))
                .collect();
            let config = PaginationConfig {
                items_per_page: 4,
                token_prefix: TEMPLATE_PAGE_PREFIX.to_string(),
                ..Default::default()
            };

            let mut rows = paginated_rows(&items, page, &config);
            rows.push(vec![Button::back(DEFAULT_BACK_TEXT, "templates")]);
            RenderedResponse::new(menu.title(), rows)
        })
        .await;

    manager
        .register_callback_handler(&format!("{TEMPLATE_PAGE_PREFIX}_*"), Arc::new(TemplatePager))
        .await;
    manager
        .register_callback_handler("reset_*", Arc::new(ResetHandler))
        .await;
    manager
        .menu_handler(&format!("{TEMPLATE_OPEN_PREFIX}_*"), |event, _context| async move {
            match template_for_token(&event.token) {
                Some(name) => {
                    tracing::info!(user_id = event.user_id, template = %name, "Template opened");
                    Ok(())
                }
                None => Err(HandlerError::new(format!("Unknown template: {}", event.token))),
            }
        })
        .await;
    manager
        .menu_handler(NOOP_TOKEN, |_event, _context| async { Ok(()) })
        .await;
    manager
        .menu_handler("templates_create", |event, _context| async move {
            tracing::info!(user_id = event.user_id, "Template creation requested");
            Ok(())
        })
        .await;
    manager
        .menu_opener("settings", |_response, user_id, _context| async move {
            tracing::info!(user_id, "Settings opened");
            Ok(())
        })
        .await;

    Ok(())
}

/// Demo template a `tpl_open_<index>` token points at
fn template_for_token(token: &str) -> Option<&'static str> {
    let index = token
        .strip_prefix(TEMPLATE_OPEN_PREFIX)?
        .strip_prefix('_')?
        .parse::<usize>()
        .ok()?;
    DEMO_TEMPLATES.get(index).copied()
}

/// Remembers the requested page; the client re-renders the current menu
struct TemplatePager;

#[async_trait]
impl CallbackHandler for TemplatePager {
    async fn handle(
        &self,
        manager: &MenuManager,
        event: CallbackEvent,
        _context: Context,
    ) -> Result<(), HandlerError> {
        let page = parse_page_token(&event.token, TEMPLATE_PAGE_PREFIX);
        manager
            .set_user_context(event.user_id, "page", json!(page))
            .await;
        Ok(())
    }
}

struct ResetHandler;

#[async_trait]
impl CallbackHandler for ResetHandler {
    async fn handle(
        &self,
        manager: &MenuManager,
        event: CallbackEvent,
        _context: Context,
    ) -> Result<(), HandlerError> {
        let result = if event.token == "reset_yes" {
            manager.clear_user_context(event.user_id).await;
            tracing::info!(user_id = event.user_id, "User settings reset");
            manager.navigate_to("main", event.user_id, None).await
        } else {
            manager.go_back(event.user_id, None).await
        };
        result
            .map(|_| ())
            .map_err(|e| HandlerError::new(e.to_string()))
    }
}

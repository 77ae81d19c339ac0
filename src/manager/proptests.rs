//! Property-based tests for the menu manager
//!
//! These tests verify navigation and rendering invariants across arbitrary
//! navigation sequences and contexts.

use super::*;
use crate::menu::{Button, MenuBuilder, MenuConfig};
use crate::registry::MenuConfigFile;
use crate::state::MAX_HISTORY;
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// Test Helpers
// ============================================================================

const MENU_IDS: [&str; 4] = ["main", "templates", "groups", "help"];

fn run<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

async fn manager() -> MenuManager {
    let manager = MenuManager::new([1]);
    for id in MENU_IDS {
        let builder = MenuBuilder::new(id)
            .title(id)
            .description("{name} has {count} items ({missing})");
        let builder = if id == "main" {
            builder.no_back_button()
        } else {
            builder.back_button("main")
        };
        manager.register_menu(builder.build().unwrap()).await.unwrap();
    }
    manager
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_menu_id() -> impl Strategy<Value = &'static str> {
    prop::sample::select(MENU_IDS.to_vec())
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::from),
    ]
}

fn arb_context() -> impl Strategy<Value = Context> {
    prop::collection::btree_map("[a-z_]{1,8}", arb_value(), 0..6)
        .prop_map(|map| map.into_iter().collect())
}

fn arb_menu_config() -> impl Strategy<Value = MenuConfig> {
    ("[a-z]{1,10}", "[A-Z][A-Za-z ]{0,19}", 1u8..=3, any::<bool>()).prop_map(
        |(id, title, columns, admin_only)| {
            let mut config = MenuConfig::new(id, title);
            config.columns = columns;
            config.admin_only = admin_only;
            config.back_target = Some("main".to_string());
            config.buttons = vec![
                Button::action("Go", "go"),
                Button::menu_link("Main", "main"),
            ];
            config
        },
    )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// From an open menu, N further navigations leave min(N, MAX_HISTORY)
    /// history entries, the most recent ones, with the last target current.
    #[test]
    fn prop_history_bounded(targets in prop::collection::vec(arb_menu_id(), 0..40)) {
        let (current, history) = run(async {
            let manager = manager().await;
            manager.navigate_to("main", 7, None).await.unwrap();
            for target in &targets {
                manager.navigate_to(target, 7, None).await.unwrap();
            }
            (manager.get_current_menu(7).await, manager.get_history(7).await)
        });

        prop_assert_eq!(current.as_deref(), Some(targets.last().copied().unwrap_or("main")));
        prop_assert_eq!(history.len(), targets.len().min(MAX_HISTORY));

        let mut visited = vec!["main"];
        visited.extend(targets.iter().copied());
        let expected: Vec<String> = visited[..visited.len() - 1]
            .iter()
            .rev()
            .take(MAX_HISTORY)
            .rev()
            .map(|s| (*s).to_string())
            .collect();
        prop_assert_eq!(history, expected);
    }

    /// go_back never grows history
    #[test]
    fn prop_go_back_shrinks_history(
        targets in prop::collection::vec(arb_menu_id(), 1..20),
        backs in 1usize..30,
    ) {
        let lengths = run(async {
            let manager = manager().await;
            for target in &targets {
                manager.navigate_to(target, 3, None).await.unwrap();
            }
            let mut lengths = vec![manager.get_history(3).await.len()];
            for _ in 0..backs {
                manager.go_back(3, None).await.unwrap();
                lengths.push(manager.get_history(3).await.len());
            }
            lengths
        });

        for pair in lengths.windows(2) {
            prop_assert!(pair[1] <= pair[0]);
        }
    }

    /// Rendering succeeds for any context; unknown placeholders vanish
    #[test]
    fn prop_render_never_fails(context in arb_context(), target in arb_menu_id()) {
        let outcome = run(async move {
            let manager = manager().await;
            manager.navigate_to(target, 5, Some(context)).await
        });

        let outcome = outcome.unwrap();
        let text = &outcome.response().unwrap().text;
        prop_assert!(text.starts_with(target));
        prop_assert!(!text.contains("{missing}"), "placeholder left in {:?}", text);
    }

    /// Exported menu definitions import into an identical registry
    #[test]
    fn prop_menu_config_round_trip(
        configs in prop::collection::btree_map("[a-z]{1,10}", arb_menu_config(), 1..6)
    ) {
        let menus: Vec<MenuConfig> = configs
            .into_iter()
            .map(|(id, mut config)| {
                config.id = id;
                config
            })
            .collect();
        let file = MenuConfigFile { menus, groups: BTreeMap::new() };

        let (first, second) = run(async {
            let source = MenuManager::new([1]);
            source.import_menu_config(&file.to_json().unwrap()).await.unwrap();
            let exported = source.export_menu_config().await.unwrap();

            let copy = MenuManager::new([1]);
            copy.import_menu_config(&exported).await.unwrap();
            (exported, copy.export_menu_config().await.unwrap())
        });

        prop_assert_eq!(first, second);
    }
}

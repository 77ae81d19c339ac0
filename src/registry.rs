//! Menu registry
//!
//! Maps menu ids to built menus and keeps named groups of menu ids.

use crate::error::{MenuError, MenuResult};
use crate::menu::{ButtonKind, MenuConfig, MenuStructure};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Exchange format for menu definitions.
///
/// One object per menu mirroring [`MenuConfig`], one array of ids per group.
/// Custom renderers are code and are not part of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuConfigFile {
    pub menus: Vec<MenuConfig>,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl MenuConfigFile {
    pub fn from_json(json: &str) -> MenuResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> MenuResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Default)]
pub struct MenuRegistry {
    menus: HashMap<String, Arc<MenuStructure>>,
    groups: BTreeMap<String, Vec<String>>,
}

impl MenuRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_menu(&mut self, menu: MenuStructure) -> MenuResult<()> {
        if self.menus.contains_key(menu.id()) {
            return Err(MenuError::DuplicateMenu(menu.id().to_string()));
        }
        tracing::debug!(menu_id = %menu.id(), "Registered menu");
        self.menus.insert(menu.id().to_string(), Arc::new(menu));
        Ok(())
    }

    pub fn get_menu(&self, menu_id: &str) -> MenuResult<Arc<MenuStructure>> {
        self.menus
            .get(menu_id)
            .cloned()
            .ok_or_else(|| MenuError::MenuNotFound(menu_id.to_string()))
    }

    pub fn has_menu(&self, menu_id: &str) -> bool {
        self.menus.contains_key(menu_id)
    }

    /// Remove a menu and prune it from every group
    pub fn unregister_menu(&mut self, menu_id: &str) -> bool {
        if self.menus.remove(menu_id).is_none() {
            return false;
        }
        for members in self.groups.values_mut() {
            members.retain(|id| id != menu_id);
        }
        true
    }

    /// Create or overwrite a group. Every id must already be registered.
    pub fn register_menu_group(&mut self, name: &str, menu_ids: Vec<String>) -> MenuResult<()> {
        if let Some(missing) = menu_ids.iter().find(|id| !self.menus.contains_key(*id)) {
            return Err(MenuError::UnknownMenu {
                group: name.to_string(),
                menu_id: missing.clone(),
            });
        }
        self.groups.insert(name.to_string(), menu_ids);
        Ok(())
    }

    /// Menus of a group, skipping ids that are no longer registered
    pub fn get_menu_group(&self, name: &str) -> Vec<Arc<MenuStructure>> {
        self.groups
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.menus.get(id).cloned())
            .collect()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    /// Register a feature's menus and group them under the feature name.
    /// Nothing is registered if any id clashes.
    pub fn register_feature_menus(
        &mut self,
        feature: &str,
        menus: Vec<MenuStructure>,
    ) -> MenuResult<()> {
        self.check_new_ids(menus.iter().map(MenuStructure::id))?;

        let ids: Vec<String> = menus.iter().map(|m| m.id().to_string()).collect();
        for menu in menus {
            self.register_menu(menu)?;
        }
        self.register_menu_group(feature, ids)
    }

    pub fn len(&self) -> usize {
        self.menus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }

    /// Menu owning an admin-gated button with `token`, unless some ungated
    /// button carries the same token.
    ///
    /// A button is gated when it is admin-only or sits in an admin-only menu.
    /// Back buttons share one token and only follow their menu's gating
    /// through navigation.
    pub fn admin_token_owner(&self, token: &str) -> Option<String> {
        let mut owner = None;
        for menu in self.menus.values() {
            for button in menu.buttons() {
                if button.callback_token() != Some(token) {
                    continue;
                }
                let gated = button.admin_only
                    || (menu.is_admin_only() && button.kind != ButtonKind::Back);
                if !gated {
                    return None;
                }
                owner.get_or_insert_with(|| menu.id().to_string());
            }
        }
        owner
    }

    /// Registered ids, sorted
    pub fn menu_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.menus.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn export_config(&self) -> MenuConfigFile {
        MenuConfigFile {
            menus: self
                .menu_ids()
                .iter()
                .filter_map(|id| self.menus.get(id))
                .map(|menu| menu.config().clone())
                .collect(),
            groups: self.groups.clone(),
        }
    }

    /// Validate every menu and group in `file`, then register them all.
    /// On error the registry is left untouched. Returns the number of menus added.
    pub fn import_config(&mut self, file: MenuConfigFile) -> MenuResult<usize> {
        self.check_new_ids(file.menus.iter().map(|c| c.id.as_str()))?;
        let menus = file
            .menus
            .into_iter()
            .map(MenuStructure::from_config)
            .collect::<MenuResult<Vec<_>>>()?;

        for (group, ids) in &file.groups {
            let known = |id: &str| {
                self.menus.contains_key(id) || menus.iter().any(|m| m.id() == id)
            };
            if let Some(missing) = ids.iter().find(|id| !known(id.as_str())) {
                return Err(MenuError::UnknownMenu {
                    group: group.clone(),
                    menu_id: missing.clone(),
                });
            }
        }

        let added = menus.len();
        for menu in menus {
            self.register_menu(menu)?;
        }
        self.groups.extend(file.groups);
        tracing::info!(menus = added, "Imported menu config");
        Ok(added)
    }

    fn check_new_ids<'a>(&self, ids: impl Iterator<Item = &'a str>) -> MenuResult<()> {
        let mut seen = HashSet::new();
        for id in ids {
            if self.menus.contains_key(id) || !seen.insert(id) {
                return Err(MenuError::DuplicateMenu(id.to_string()));
            }
        }
        Ok(())
    }
}

//! Paged button lists
//!
//! Long lists (templates, chat groups) are shown a page at a time with a
//! `[prev] [n/m] [next]` navigation row. Page buttons carry `<prefix>_<page>`
//! tokens, typically routed through a `<prefix>_*` wildcard handler.

use crate::menu::Button;
use std::ops::Range;

/// Token of the inert page-counter button
pub const NOOP_TOKEN: &str = "noop";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    pub items_per_page: usize,
    pub show_page_info: bool,
    pub token_prefix: String,
    pub previous_text: String,
    pub next_text: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            items_per_page: 5,
            show_page_info: true,
            token_prefix: "page".to_string(),
            previous_text: "◀️".to_string(),
            next_text: "▶️".to_string(),
        }
    }
}

impl PaginationConfig {
    pub fn page_token(&self, page: usize) -> String {
        format!("{}_{page}", self.token_prefix)
    }
}

/// Page arithmetic over `total_items` items. Pages are zero-based and the
/// current page is always clamped into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total_items: usize,
    items_per_page: usize,
    current_page: usize,
}

impl Paginator {
    pub fn new(total_items: usize, items_per_page: usize, page: usize) -> Self {
        let mut paginator = Self {
            total_items,
            items_per_page: items_per_page.max(1),
            current_page: 0,
        };
        paginator.current_page = page.min(paginator.total_pages() - 1);
        paginator
    }

    /// At least one page, even when empty
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.items_per_page).max(1)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 0
    }

    pub fn has_next(&self) -> bool {
        self.current_page + 1 < self.total_pages()
    }

    /// Index range of the current page's items
    pub fn range(&self) -> Range<usize> {
        let start = (self.current_page * self.items_per_page).min(self.total_items);
        let end = (start + self.items_per_page).min(self.total_items);
        start..end
    }

    /// One-based "current/total", e.g. "2/5"
    pub fn page_info(&self) -> String {
        format!("{}/{}", self.current_page + 1, self.total_pages())
    }
}

/// One button per row for the requested page, plus a navigation row when
/// there is more than one page
pub fn paginated_rows(buttons: &[Button], page: usize, config: &PaginationConfig) -> Vec<Vec<Button>> {
    let paginator = Paginator::new(buttons.len(), config.items_per_page, page);

    let mut rows: Vec<Vec<Button>> = buttons
        .get(paginator.range())
        .unwrap_or_default()
        .iter()
        .map(|b| vec![b.clone()])
        .collect();

    if paginator.total_pages() > 1 {
        let current = paginator.current_page();
        let mut nav = Vec::new();
        if paginator.has_previous() {
            nav.push(Button::action(
                config.previous_text.clone(),
                config.page_token(current - 1),
            ));
        }
        if config.show_page_info {
            nav.push(Button::action(paginator.page_info(), NOOP_TOKEN));
        }
        if paginator.has_next() {
            nav.push(Button::action(
                config.next_text.clone(),
                config.page_token(current + 1),
            ));
        }
        rows.push(nav);
    }
    rows
}

/// Page number from a `<prefix>_<n>` token; 0 when the token is malformed
pub fn parse_page_token(token: &str, prefix: &str) -> usize {
    token
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<Button> {
        (0..n)
            .map(|i| Button::action(format!("Item {i}"), format!("item_{i}")))
            .collect()
    }

    #[test]
    fn test_paginator_clamps_page() {
        let p = Paginator::new(12, 5, 99);
        assert_eq!(p.total_pages(), 3);
        assert_eq!(p.current_page(), 2);
        assert_eq!(p.range(), 10..12);
        assert!(p.has_previous());
        assert!(!p.has_next());
        assert_eq!(p.page_info(), "3/3");
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let p = Paginator::new(0, 5, 0);
        assert_eq!(p.total_pages(), 1);
        assert_eq!(p.range(), 0..0);
        assert!(!p.has_next());
    }

    #[test]
    fn test_zero_items_per_page_treated_as_one() {
        let p = Paginator::new(3, 0, 1);
        assert_eq!(p.total_pages(), 3);
        assert_eq!(p.range(), 1..2);
    }

    #[test]
    fn test_paginated_rows_middle_page() {
        let config = PaginationConfig {
            items_per_page: 2,
            ..Default::default()
        };
        let rows = paginated_rows(&items(5), 1, &config);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].payload, "item_2");
        assert_eq!(rows[1][0].payload, "item_3");

        let nav: Vec<_> = rows[2].iter().map(|b| b.payload.as_str()).collect();
        assert_eq!(nav, ["page_0", NOOP_TOKEN, "page_2"]);
        assert_eq!(rows[2][1].text, "2/3");
    }

    #[test]
    fn test_single_page_has_no_nav_row() {
        let rows = paginated_rows(&items(3), 0, &PaginationConfig::default());
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_parse_page_token() {
        assert_eq!(parse_page_token("page_4", "page"), 4);
        assert_eq!(parse_page_token("tpl_page_2", "tpl_page"), 2);
        assert_eq!(parse_page_token("page_x", "page"), 0);
        assert_eq!(parse_page_token("other_3", "page"), 0);
    }
}

//! Query-time selection: search-prefix gating, substring matching, and the
//! effective ordering for a type.

use crate::config::SearchEntry;
use crate::model::{ItemType, SearchItem};
use crate::order::OrderBy;
use std::collections::HashMap;

/// Remainder of `query` after `prefix:`, if the query carries that prefix.
pub fn strip_search_prefix<'q>(prefix: &str, query: &'q str) -> Option<&'q str> {
    query.strip_prefix(prefix)?.strip_prefix(':')
}

/// Order of the first entry of `item_type`, used when there is no query.
pub fn default_order(entries: &[SearchEntry], item_type: ItemType) -> OrderBy {
    entries
        .iter()
        .find(|e| e.item_type == item_type)
        .and_then(|e| e.order_by.as_deref())
        .map(OrderBy::parse)
        .unwrap_or_default()
}

/// Order to apply for `item_type` given the current query.
///
/// The first entry whose search prefix the query carries wins, then the
/// first entry without a search prefix, then the first entry of the type.
pub fn effective_order(entries: &[SearchEntry], item_type: ItemType, query: &str) -> OrderBy {
    let of_type: Vec<&SearchEntry> = entries.iter().filter(|e| e.item_type == item_type).collect();
    let chosen = of_type
        .iter()
        .find(|e| {
            e.search_prefix
                .as_deref()
                .is_some_and(|p| strip_search_prefix(p, query).is_some())
        })
        .or_else(|| of_type.iter().find(|e| e.search_prefix.is_none()))
        .or_else(|| of_type.first());
    chosen
        .and_then(|e| e.order_by.as_deref())
        .map(OrderBy::parse)
        .unwrap_or_default()
}

/// Decides which cached items answer a query.
pub struct QueryMatcher<'a> {
    prefixes: HashMap<(ItemType, String), Option<&'a str>>,
}

impl<'a> QueryMatcher<'a> {
    pub fn new(entries: &'a [SearchEntry]) -> Self {
        let mut prefixes = HashMap::new();
        for entry in entries {
            prefixes
                .entry((entry.item_type, entry.source_id()))
                .or_insert(entry.search_prefix.as_deref());
        }
        Self { prefixes }
    }

    /// Items from prefixed entries only answer queries carrying `prefix:`;
    /// the rest of the query is then matched case-insensitively against the
    /// name or description.
    pub fn matches(&self, item: &SearchItem, query: &str) -> bool {
        let prefix = self
            .prefixes
            .get(&(item.item_type, item.source_id.clone()))
            .copied()
            .flatten();
        let term = match prefix {
            Some(prefix) => match strip_search_prefix(prefix, query) {
                Some(rest) => rest,
                None => return false,
            },
            None => query,
        };
        matches_text(item, term)
    }
}

fn matches_text(item: &SearchItem, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    item.name.to_lowercase().contains(&term) || item.description.to_lowercase().contains(&term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{Direction, SortField};
    use std::path::PathBuf;

    fn entry(path: &str, prefix: Option<&str>, order: Option<&str>) -> SearchEntry {
        let mut e = SearchEntry::new(ItemType::Mention, path, "*.md", "{basename}", "");
        e.search_prefix = prefix.map(str::to_string);
        e.order_by = order.map(str::to_string);
        e
    }

    fn item(name: &str, description: &str, source: &SearchEntry) -> SearchItem {
        SearchItem::new(
            name.to_string(),
            description.to_string(),
            source.item_type,
            PathBuf::from("/x"),
            source.source_id(),
        )
    }

    #[test]
    fn strips_prefix_with_colon() {
        assert_eq!(strip_search_prefix("agent", "agent:xy"), Some("xy"));
        assert_eq!(strip_search_prefix("agent", "agent:"), Some(""));
        assert_eq!(strip_search_prefix("agent", "agentxy"), None);
        assert_eq!(strip_search_prefix("agent", "Agent:xy"), None);
    }

    #[test]
    fn prefixed_entries_are_gated() {
        let entries = vec![entry("/agents", Some("agent"), None), entry("/files", None, None)];
        let matcher = QueryMatcher::new(&entries);
        let agent = item("xylophone", "", &entries[0]);
        let file = item("xyz-notes", "", &entries[1]);

        assert!(!matcher.matches(&agent, "xyz"));
        assert!(matcher.matches(&file, "xyz"));
        assert!(matcher.matches(&agent, "agent:xy"));
        assert!(matcher.matches(&agent, "agent:"));
        assert!(!matcher.matches(&agent, "agent:zzz"));
        assert!(!matcher.matches(&agent, ""));
    }

    #[test]
    fn prefix_lookup_is_scoped_by_type() {
        let mut mention = entry("/shared", Some("agent"), None);
        mention.item_type = ItemType::Mention;
        let mut command = entry("/shared", None, None);
        command.item_type = ItemType::Command;
        let entries = vec![mention, command];
        let matcher = QueryMatcher::new(&entries);

        let cmd = item("deploy", "", &entries[1]);
        let agent = item("deploy", "", &entries[0]);
        assert!(matcher.matches(&cmd, "dep"));
        assert!(!matcher.matches(&agent, "dep"));
        assert!(matcher.matches(&agent, "agent:dep"));
    }

    #[test]
    fn substring_matches_name_or_description() {
        let entries = vec![entry("/files", None, None)];
        let matcher = QueryMatcher::new(&entries);
        let it = item("deploy", "Ship To Production", &entries[0]);
        assert!(matcher.matches(&it, "PLO"));
        assert!(matcher.matches(&it, "production"));
        assert!(!matcher.matches(&it, "staging"));
        assert!(matcher.matches(&it, ""));
    }

    #[test]
    fn effective_order_selection() {
        let entries = vec![
            entry("/a", Some("agent"), Some("updatedAt desc")),
            entry("/b", None, Some("name desc")),
            entry("/c", None, Some("description")),
        ];
        let order = effective_order(&entries, ItemType::Mention, "agent:x");
        assert_eq!(order.field, SortField::UpdatedAt);

        let order = effective_order(&entries, ItemType::Mention, "x");
        assert_eq!((order.field, order.direction), (SortField::Name, Direction::Desc));

        let only_prefixed = vec![entry("/a", Some("agent"), Some("description desc"))];
        let order = effective_order(&only_prefixed, ItemType::Mention, "x");
        assert_eq!(order.field, SortField::Description);

        assert_eq!(effective_order(&entries, ItemType::Command, ""), OrderBy::default());
    }

    #[test]
    fn default_order_uses_first_entry_of_type() {
        let entries = vec![
            entry("/a", Some("agent"), Some("updatedAt desc")),
            entry("/b", None, Some("name desc")),
        ];
        let order = default_order(&entries, ItemType::Mention);
        assert_eq!((order.field, order.direction), (SortField::UpdatedAt, Direction::Desc));
        assert_eq!(default_order(&entries, ItemType::Command), OrderBy::default());
    }
}

//! Cached catalog of items across all configured entries.

use crate::assembler::dedup;
use crate::cache::{Clock, ItemCache, SystemClock};
use crate::config::{default_entries, Config, SearchEntry, Settings};
use crate::matcher::{default_order, effective_order, QueryMatcher};
use crate::model::{ItemType, SearchItem};
use crate::query::{JsonQuery, PathQuery};
use crate::sources::entry::EntrySource;
use crate::sources::Source;
use crate::template::{PlaceholderResolver, TemplateResolver};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(5_000);

pub struct Loader {
    entries: Vec<SearchEntry>,
    settings: Settings,
    cache: ItemCache,
    resolver: Box<dyn TemplateResolver>,
    query: Box<dyn JsonQuery>,
}

impl Loader {
    /// `None` or an empty list selects the built-in entries.
    pub fn new(entries: Option<Vec<SearchEntry>>, settings: Settings) -> Self {
        Self {
            entries: resolve_entries(entries),
            settings,
            cache: ItemCache::new(DEFAULT_CACHE_TTL, Box::new(SystemClock)),
            resolver: Box::new(PlaceholderResolver::<PathQuery>::default()),
            query: Box::new(PathQuery),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Some(config.entries.clone()), config.settings.clone())
            .with_ttl(Duration::from_millis(config.general.cache_ttl_ms))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache.set_ttl(ttl);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.cache.set_clock(Box::new(clock));
        self
    }

    pub fn with_resolver(mut self, resolver: impl TemplateResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Evaluator for nested `@.query` patterns. Template `json@` paths are
    /// evaluated by the resolver.
    pub fn with_json_query(mut self, query: impl JsonQuery + 'static) -> Self {
        self.query = Box::new(query);
        self
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Every item from every entry, scanning only when the cache is stale.
    pub fn load_all(&mut self) -> Arc<Vec<SearchItem>> {
        if let Some(items) = self.cache.get() {
            debug!("Loader: cache hit ({} items)", items.len());
            return items;
        }

        let mut items = Vec::new();
        for entry in &self.entries {
            let source = EntrySource::new(entry, self.resolver.as_ref(), self.query.as_ref());
            items.extend(source.scan());
        }
        let items = dedup(items);

        info!("Loader: loaded {} items from {} entries", items.len(), self.entries.len());
        self.cache.store(items)
    }

    /// All enabled items of a type, in the type's default order.
    pub fn get_items(&mut self, item_type: ItemType) -> Vec<SearchItem> {
        self.select(item_type, None)
    }

    /// Items of a type answering `query`, honouring search prefixes.
    pub fn search_items(&mut self, item_type: ItemType, query: &str) -> Vec<SearchItem> {
        self.select(item_type, Some(query))
    }

    fn select(&mut self, item_type: ItemType, query: Option<&str>) -> Vec<SearchItem> {
        let all = self.load_all();
        let filter = self.settings.filter_for(item_type).compile();
        let matcher = QueryMatcher::new(&self.entries);

        let mut items: Vec<SearchItem> = all
            .iter()
            .filter(|item| item.item_type == item_type)
            .filter(|item| filter.is_enabled(&item.name))
            .filter(|item| query.is_none_or(|q| matcher.matches(item, q)))
            .cloned()
            .collect();

        let order = match query {
            Some(q) => effective_order(&self.entries, item_type, q),
            None => default_order(&self.entries, item_type),
        };
        order.sort(&mut items);
        debug!(
            "Loader: {} {} items for query {:?}",
            items.len(),
            item_type,
            query
        );
        items
    }

    /// Replace the entries. An identical list keeps the cache.
    pub fn update_config(&mut self, entries: Option<Vec<SearchEntry>>) {
        let entries = resolve_entries(entries);
        if entries == self.entries {
            debug!("Loader: config unchanged, keeping cache");
            return;
        }
        self.entries = entries;
        self.invalidate_cache();
    }

    /// Replace the global filters. Identical settings keep the cache.
    pub fn update_settings(&mut self, settings: Settings) {
        if settings == self.settings {
            debug!("Loader: settings unchanged, keeping cache");
            return;
        }
        self.settings = settings;
        self.invalidate_cache();
    }

    pub fn invalidate_cache(&mut self) {
        debug!("Loader: cache invalidated");
        self.cache.invalidate();
    }
}

fn resolve_entries(entries: Option<Vec<SearchEntry>>) -> Vec<SearchEntry> {
    match entries {
        Some(entries) if !entries.is_empty() => entries,
        _ => default_entries(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::ManualClock;
    use crate::config::NameFilter;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const TTL: u64 = 1_000;

    fn command_entry(root: &Path, pattern: &str) -> SearchEntry {
        SearchEntry::new(
            ItemType::Command,
            root.to_string_lossy(),
            pattern,
            "{basename}",
            "{frontmatter@description}",
        )
    }

    fn loader(entries: Vec<SearchEntry>, clock: &ManualClock) -> Loader {
        Loader::new(Some(entries), Settings::default())
            .with_ttl(Duration::from_millis(TTL))
            .with_clock(clock.clone())
    }

    fn names(items: &[SearchItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn cache_hit_within_ttl_and_rescan_after() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.md", "# a");
        let clock = ManualClock::at(10_000);
        let mut loader = loader(vec![command_entry(temp.path(), "*.md")], &clock);

        let first = loader.load_all();
        write(temp.path(), "b.md", "# b");

        clock.set(10_000 + TTL - 1);
        let second = loader.load_all();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        clock.set(10_000 + TTL + 1);
        let third = loader.load_all();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn update_config_compares_deeply() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.md", "# a");
        let clock = ManualClock::at(0);
        let entries = vec![command_entry(temp.path(), "*.md")];
        let mut loader = loader(entries.clone(), &clock);

        let first = loader.load_all();
        loader.update_config(Some(entries.clone()));
        assert!(Arc::ptr_eq(&first, &loader.load_all()));

        let mut changed = entries;
        changed[0].description = "{heading}".to_string();
        loader.update_config(Some(changed));
        let reloaded = loader.load_all();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(reloaded[0].description, "a");
    }

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let loader = Loader::new(Some(Vec::new()), Settings::default());
        assert_eq!(loader.entries(), default_entries().as_slice());
        let loader = Loader::new(None, Settings::default());
        assert_eq!(loader.entries().len(), default_entries().len());
    }

    #[test]
    fn invalidate_forces_rescan() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.md", "# a");
        let clock = ManualClock::at(0);
        let mut loader = loader(vec![command_entry(temp.path(), "*.md")], &clock);
        let first = loader.load_all();
        loader.invalidate_cache();
        assert!(!Arc::ptr_eq(&first, &loader.load_all()));
    }

    #[test]
    fn same_name_from_different_entries_both_survive() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "one/deploy.md", "# d");
        write(temp.path(), "two/deploy.md", "# d");
        let clock = ManualClock::at(0);
        let mut loader = loader(
            vec![
                command_entry(&temp.path().join("one"), "*.md"),
                command_entry(&temp.path().join("two"), "*.md"),
            ],
            &clock,
        );
        let items = loader.get_items(ItemType::Command);
        assert_eq!(names(&items), vec!["deploy", "deploy"]);
        assert_ne!(items[0].source_id, items[1].source_id);
    }

    #[test]
    fn same_root_entries_of_different_types_both_survive() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "deploy.md", "# d");
        let clock = ManualClock::at(0);
        let cmd = command_entry(temp.path(), "*.md");
        let mut mention = command_entry(temp.path(), "*.md");
        mention.item_type = ItemType::Mention;
        mention.search_prefix = Some("at".to_string());
        let mut loader = loader(vec![cmd, mention], &clock);

        assert_eq!(names(&loader.get_items(ItemType::Command)), vec!["deploy"]);
        assert_eq!(names(&loader.get_items(ItemType::Mention)), vec!["deploy"]);
        assert_eq!(names(&loader.search_items(ItemType::Command, "dep")), vec!["deploy"]);
        assert!(loader.search_items(ItemType::Mention, "dep").is_empty());
        assert_eq!(names(&loader.search_items(ItemType::Mention, "at:dep")), vec!["deploy"]);
    }

    #[test]
    fn get_items_uses_first_entry_order_even_when_prefixed() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "p/x.md", "# x");
        write(temp.path(), "p/y.md", "# y");
        let clock = ManualClock::at(0);
        let mut prefixed = command_entry(&temp.path().join("p"), "*.md");
        prefixed.search_prefix = Some("p".to_string());
        prefixed.order_by = Some("name desc".to_string());
        let plain = command_entry(&temp.path().join("empty"), "*.md");
        let mut loader = loader(vec![prefixed, plain], &clock);

        assert_eq!(names(&loader.get_items(ItemType::Command)), vec!["y", "x"]);
        assert_eq!(names(&loader.search_items(ItemType::Command, "p:")), vec!["y", "x"]);
    }

    #[test]
    fn get_items_filters_type_and_settings() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "cmd/build.md", "---\ndescription: Build\n---\n");
        write(temp.path(), "cmd/test.md", "---\ndescription: Test\n---\n");
        write(temp.path(), "cmd/lint.md", "---\ndescription: Lint\n---\n");
        write(temp.path(), "people/ann.md", "# Ann");
        let clock = ManualClock::at(0);

        let mut mention = command_entry(&temp.path().join("people"), "*.md");
        mention.item_type = ItemType::Mention;
        let mut cmd = command_entry(&temp.path().join("cmd"), "*.md");
        cmd.order_by = Some("name desc".to_string());
        let mut loader = loader(vec![cmd, mention], &clock);

        assert_eq!(names(&loader.get_items(ItemType::Command)), vec!["test", "lint", "build"]);
        assert_eq!(names(&loader.get_items(ItemType::Mention)), vec!["ann"]);

        loader.update_settings(Settings {
            command: NameFilter {
                enable: vec![],
                disable: vec!["lint".to_string()],
            },
            ..Settings::default()
        });
        assert_eq!(names(&loader.get_items(ItemType::Command)), vec!["test", "build"]);
    }

    #[test]
    fn update_settings_keeps_cache_when_identical() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.md", "# a");
        let clock = ManualClock::at(0);
        let mut loader = loader(vec![command_entry(temp.path(), "*.md")], &clock);
        let first = loader.load_all();
        loader.update_settings(Settings::default());
        assert!(Arc::ptr_eq(&first, &loader.load_all()));
    }

    #[test]
    fn search_prefix_gating_and_ordering() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "agents/xylo.md", "---\ndescription: agent\n---\n");
        write(temp.path(), "agents/xyber.md", "---\ndescription: agent\n---\n");
        write(temp.path(), "files/xyz.md", "---\ndescription: file\n---\n");
        let clock = ManualClock::at(0);

        let mut agents = command_entry(&temp.path().join("agents"), "*.md");
        agents.item_type = ItemType::Mention;
        agents.search_prefix = Some("agent".to_string());
        agents.order_by = Some("name desc".to_string());
        let mut files = command_entry(&temp.path().join("files"), "*.md");
        files.item_type = ItemType::Mention;
        let mut loader = loader(vec![agents, files], &clock);

        assert_eq!(names(&loader.search_items(ItemType::Mention, "xyz")), vec!["xyz"]);
        assert_eq!(
            names(&loader.search_items(ItemType::Mention, "agent:xy")),
            vec!["xylo", "xyber"]
        );
        assert_eq!(
            names(&loader.search_items(ItemType::Mention, "agent:")),
            vec!["xylo", "xyber"]
        );
        assert_eq!(loader.get_items(ItemType::Mention).len(), 3);
    }
}

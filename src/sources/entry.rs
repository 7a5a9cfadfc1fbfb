use crate::assembler::{dedup, ItemAssembler};
use crate::config::SearchEntry;
use crate::model::SearchItem;
use crate::parser::{parse_file, split_query, ContentFormat};
use crate::pattern::find_files;
use crate::query::JsonQuery;
use crate::sources::Source;
use crate::template::TemplateResolver;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Scans the files selected by one configured search entry.
pub struct EntrySource<'a> {
    entry: &'a SearchEntry,
    resolver: &'a dyn TemplateResolver,
    query: &'a dyn JsonQuery,
}

impl<'a> EntrySource<'a> {
    pub fn new(entry: &'a SearchEntry, resolver: &'a dyn TemplateResolver, query: &'a dyn JsonQuery) -> Self {
        Self { entry, resolver, query }
    }
}

impl Source for EntrySource<'_> {
    fn scan(&self) -> Vec<SearchItem> {
        let root = self.entry.root();
        if !root.is_dir() {
            debug!("Search root {:?} does not exist, skipping", root);
            return Vec::new();
        }

        let (glob, query) = split_query(&self.entry.pattern);
        let assembler = ItemAssembler::new(self.entry, self.resolver);

        debug!("Scanning {:?} for '{}'", root, glob);
        let mut items = Vec::new();
        for path in find_files(&root, glob) {
            let format = ContentFormat::detect(&path, query.is_some());
            let records = match parse_file(&path, format, query, self.query) {
                Ok(records) => records,
                Err(skip) => {
                    warn!("Skipping file: {}", skip);
                    continue;
                }
            };
            if records.is_empty() {
                debug!("No records in {:?}", path);
                continue;
            }

            let updated_at = modified_ms(&path);
            let prefix = assembler.resolve_prefix(&path, &records);
            items.extend(
                records
                    .iter()
                    .filter_map(|r| assembler.assemble(r, &path, prefix.as_deref(), updated_at)),
            );
        }

        let filter = self.entry.filter.compile();
        items.retain(|item| {
            let enabled = filter.is_enabled(&item.name);
            if !enabled {
                debug!("'{}' disabled by entry {}", item.name, item.source_id);
            }
            enabled
        });
        let mut items = dedup(items);
        assembler.order().sort(&mut items);

        info!("EntrySource {}: found {} items", self.entry.source_id(), items.len());
        items
    }
}

/// File modification time in epoch milliseconds.
fn modified_ms(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_millis() as i64)
}

//! Building search items from parsed records.

use crate::config::SearchEntry;
use crate::model::{DisplayTime, SearchItem};
use crate::order::{field_name, OrderBy};
use crate::parser::Record;
use crate::template::{TemplateContext, TemplateResolver};
use log::debug;
use std::collections::HashSet;
use std::path::Path;

const DEFAULT_ICON_PREFIX: &str = "codicon-";
const KNOWN_ICON_PREFIXES: [&str; 5] = ["codicon-", "http:", "https:", "file:", "data:"];
const HIDDEN_DISPLAY_TIME: &str = "none";

/// Resolves one entry's templates into items.
pub struct ItemAssembler<'a> {
    entry: &'a SearchEntry,
    resolver: &'a dyn TemplateResolver,
    source_id: String,
    order: OrderBy,
}

impl<'a> ItemAssembler<'a> {
    pub fn new(entry: &'a SearchEntry, resolver: &'a dyn TemplateResolver) -> Self {
        Self {
            entry,
            resolver,
            source_id: entry.source_id(),
            order: entry.order_by.as_deref().map(OrderBy::parse).unwrap_or_default(),
        }
    }

    pub fn order(&self) -> &OrderBy {
        &self.order
    }

    /// Resolve `prefixPattern` once for a file.
    ///
    /// For expanded records the template sees the containing document as
    /// `json`, otherwise it sees the file's own record.
    pub fn resolve_prefix(&self, path: &Path, records: &[Record]) -> Option<String> {
        let template = self.entry.prefix_pattern.as_deref()?;
        let first = records.first()?;
        let scope;
        let record = if first.expanded {
            scope = Record {
                json: first.json.iter().skip(1).cloned().collect(),
                ..Record::default()
            };
            &scope
        } else {
            first
        };
        non_empty(self.resolver.resolve(template, &record.context(path, None)))
    }

    /// Build the item for one record. Expanded records without a name are dropped.
    pub fn assemble(
        &self,
        record: &Record,
        path: &Path,
        prefix: Option<&str>,
        updated_at: Option<i64>,
    ) -> Option<SearchItem> {
        let ctx = record.context(path, prefix);
        let name = self.resolve(&self.entry.name, &ctx);
        if record.expanded && name.is_empty() {
            debug!("Dropping unnamed record from {:?}", path);
            return None;
        }

        let mut item = SearchItem::new(
            name,
            self.resolve(&self.entry.description, &ctx),
            self.entry.item_type,
            path.to_path_buf(),
            self.source_id.clone(),
        );
        item.frontmatter = non_empty(record.raw_frontmatter.clone());
        item.label = self.optional(self.entry.label.as_deref(), &ctx);
        item.color = self.entry.color.as_deref().and_then(|t| self.resolve_color(t, &ctx));
        item.icon = self.optional(self.entry.icon.as_deref(), &ctx).map(with_icon_prefix);
        item.argument_hint = self.optional(self.entry.argument_hint.as_deref(), &ctx);
        item.input_format = self.optional(self.entry.input_format.as_deref(), &ctx);
        item.updated_at = updated_at;
        item.display_time = self.display_time(&ctx, updated_at);
        if self.order.needs_sort_key() {
            item.sort_key = non_empty(self.resolve(&self.order.template, &ctx));
        }
        Some(item)
    }

    fn resolve(&self, template: &str, ctx: &TemplateContext<'_>) -> String {
        self.resolver.resolve(template, ctx)
    }

    fn optional(&self, template: Option<&str>, ctx: &TemplateContext<'_>) -> Option<String> {
        template.and_then(|t| non_empty(self.resolve(t, ctx)))
    }

    /// `template|literal`: the literal is used when the template resolves empty.
    fn resolve_color(&self, template: &str, ctx: &TemplateContext<'_>) -> Option<String> {
        let (template, fallback) = split_fallback(template);
        non_empty(self.resolve(template, ctx)).or_else(|| fallback.and_then(|f| non_empty(f.trim().to_string())))
    }

    fn display_time(&self, ctx: &TemplateContext<'_>, updated_at: Option<i64>) -> Option<DisplayTime> {
        let template = self.entry.display_time.as_deref()?.trim();
        if template == HIDDEN_DISPLAY_TIME {
            return Some(DisplayTime::Hidden);
        }
        if field_name(template) == "updatedAt" {
            return updated_at.map(DisplayTime::At);
        }
        let resolved = self.resolve(template, ctx);
        resolved.trim().parse::<f64>().ok().map(|n| DisplayTime::At(n as i64))
    }
}

/// Split on the last `|` outside any `{...}` placeholder.
fn split_fallback(template: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    let mut split = None;
    for (i, c) in template.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => split = Some(i),
            _ => {}
        }
    }
    match split {
        Some(i) => (&template[..i], Some(&template[i + 1..])),
        None => (template, None),
    }
}

fn with_icon_prefix(icon: String) -> String {
    if KNOWN_ICON_PREFIXES.iter().any(|p| icon.starts_with(p)) {
        icon
    } else {
        format!("{DEFAULT_ICON_PREFIX}{icon}")
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Drop later items whose `(type, source, name[:label])` was already seen.
pub fn dedup(items: Vec<SearchItem>) -> Vec<SearchItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let fresh = seen.insert((item.item_type, item.source_id.clone(), item.dedup_key()));
            if !fresh {
                debug!(
                    "Skipping duplicate '{}' from {:?} (source {})",
                    item.name, item.file_path, item.source_id
                );
            }
            fresh
        })
        .collect()
}

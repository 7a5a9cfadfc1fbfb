//! Template resolution against a per-record context.
//!
//! Templates are literal text with `{...}` placeholders. A placeholder lists
//! alternatives separated by `|`; the first one that resolves to a non-empty
//! string is used:
//!
//! - `basename`, `filename`, `dirname`, `filepath`, `heading`, `prefix`
//! - `frontmatter@KEY`
//! - `json@PATH` for the current record, `json:N@PATH` for the document N
//!   levels up (`json:1` is the parent)
//! - `"literal"`

use crate::query::{JsonQuery, PathQuery};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Everything a template can refer to for one record.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub file_path: &'a Path,
    pub frontmatter: &'a BTreeMap<String, String>,
    pub heading: &'a str,
    pub prefix: Option<&'a str>,
    /// `json[0]` is the record itself, `json[1]` its parent document.
    pub json: &'a [Value],
}

impl TemplateContext<'_> {
    pub fn basename(&self) -> &str {
        self.file_path.file_stem().and_then(|s| s.to_str()).unwrap_or("")
    }

    pub fn filename(&self) -> &str {
        self.file_path.file_name().and_then(|s| s.to_str()).unwrap_or("")
    }

    pub fn dirname(&self) -> &str {
        self.file_path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }
}

pub trait TemplateResolver {
    fn resolve(&self, template: &str, ctx: &TemplateContext<'_>) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct PlaceholderResolver<Q = PathQuery> {
    query: Q,
}

impl<Q: JsonQuery> PlaceholderResolver<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }

    fn resolve_placeholder(&self, body: &str, ctx: &TemplateContext<'_>) -> String {
        body.split('|')
            .map(|alt| self.resolve_alternative(alt.trim(), ctx))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }

    fn resolve_alternative(&self, alt: &str, ctx: &TemplateContext<'_>) -> String {
        if let Some(literal) = alt.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            return literal.to_string();
        }
        if let Some(key) = alt.strip_prefix("frontmatter@") {
            return ctx.frontmatter.get(key).cloned().unwrap_or_default();
        }
        if let Some((head, path)) = alt.split_once('@') {
            let level = match head {
                "json" => 0,
                _ => match head.strip_prefix("json:").and_then(|n| n.parse::<usize>().ok()) {
                    Some(level) => level,
                    None => return String::new(),
                },
            };
            return self.resolve_json(ctx.json.get(level), path);
        }
        match alt {
            "basename" => ctx.basename().to_string(),
            "filename" => ctx.filename().to_string(),
            "dirname" => ctx.dirname().to_string(),
            "filepath" => ctx.file_path.to_string_lossy().into_owned(),
            "heading" => ctx.heading.to_string(),
            "prefix" => ctx.prefix.unwrap_or_default().to_string(),
            _ => String::new(),
        }
    }

    fn resolve_json(&self, document: Option<&Value>, path: &str) -> String {
        let Some(document) = document else {
            return String::new();
        };
        let expression = if path.starts_with('.') {
            path.to_string()
        } else {
            format!(".{path}")
        };
        self.query
            .evaluate(document, &expression)
            .map(|v| render_value(&v))
            .unwrap_or_default()
    }
}

impl<Q: JsonQuery> TemplateResolver for PlaceholderResolver<Q> {
    fn resolve(&self, template: &str, ctx: &TemplateContext<'_>) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            out.push_str(&rest[..open]);
            out.push_str(&self.resolve_placeholder(&rest[open + 1..close], ctx));
            rest = &rest[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// Scalars render bare; arrays and objects as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

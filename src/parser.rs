//! Turning a matched file into raw records ready for template resolution.

use crate::error::Skip;
use crate::query::JsonQuery;
use crate::template::TemplateContext;
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Split `pattern` on the first `@.` into the file glob and a nested query
/// (the query keeps its leading `.`).
pub fn split_query(pattern: &str) -> (&str, Option<&str>) {
    match pattern.find("@.") {
        Some(i) => (&pattern[..i], Some(&pattern[i + 1..])),
        None => (pattern, None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Markdown,
    Json,
    JsonWithQuery,
    Jsonl,
    JsonlWithQuery,
    PlainText,
}

impl ContentFormat {
    pub fn detect(path: &Path, has_query: bool) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match (ext.as_str(), has_query) {
            ("json", true) => ContentFormat::JsonWithQuery,
            ("json", false) => ContentFormat::Json,
            ("jsonl", true) => ContentFormat::JsonlWithQuery,
            ("jsonl", false) => ContentFormat::Jsonl,
            ("md" | "yaml" | "yml", _) => ContentFormat::Markdown,
            _ => ContentFormat::PlainText,
        }
    }
}

/// One unit of content that becomes (at most) one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub frontmatter: BTreeMap<String, String>,
    pub raw_frontmatter: String,
    pub heading: String,
    /// Record data first, then its parent document when expanded.
    pub json: Vec<Value>,
    /// Produced by nested-query or JSONL expansion.
    pub expanded: bool,
}

impl Record {
    fn from_expansion(data: Value, parent: Option<&Value>) -> Self {
        let mut json = vec![data];
        json.extend(parent.cloned());
        Self {
            json,
            expanded: true,
            ..Self::default()
        }
    }

    pub fn context<'a>(&'a self, file_path: &'a Path, prefix: Option<&'a str>) -> TemplateContext<'a> {
        TemplateContext {
            file_path,
            frontmatter: &self.frontmatter,
            heading: &self.heading,
            prefix,
            json: &self.json,
        }
    }
}

/// Read and parse one file according to its format.
pub fn parse_file(
    path: &Path,
    format: ContentFormat,
    query: Option<&str>,
    evaluator: &dyn JsonQuery,
) -> Result<Vec<Record>, Skip> {
    let content = fs::read_to_string(path).map_err(|source| Skip::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_content(path, &content, format, query, evaluator)
}

pub fn parse_content(
    path: &Path,
    content: &str,
    format: ContentFormat,
    query: Option<&str>,
    evaluator: &dyn JsonQuery,
) -> Result<Vec<Record>, Skip> {
    match format {
        ContentFormat::JsonWithQuery => {
            let document = parse_json(path, content)?;
            let query = query.unwrap_or(".");
            Ok(expand(evaluator.evaluate(&document, query), &document))
        }
        ContentFormat::Jsonl | ContentFormat::JsonlWithQuery => {
            Ok(parse_jsonl(path, content, query, evaluator))
        }
        ContentFormat::Json => {
            let document = parse_json(path, content)?;
            let mut record = parse_markdown(path, content)?;
            record.json.push(document);
            Ok(vec![record])
        }
        ContentFormat::Markdown => Ok(vec![parse_markdown(path, content)?]),
        ContentFormat::PlainText => Ok(vec![Record {
            heading: content
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or_default()
                .to_string(),
            ..Record::default()
        }]),
    }
}

fn parse_json(path: &Path, content: &str) -> Result<Value, Skip> {
    serde_json::from_str(content).map_err(|source| Skip::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Each object element of an array result becomes a record; anything else yields none.
fn expand(result: Option<Value>, parent: &Value) -> Vec<Record> {
    match result {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .map(|item| Record::from_expansion(item, Some(parent)))
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_jsonl(path: &Path, content: &str, query: Option<&str>, evaluator: &dyn JsonQuery) -> Vec<Record> {
    let mut records = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                debug!("Skipping invalid line {} of {:?}: {}", n + 1, path, e);
                continue;
            }
        };
        match query {
            Some(q) => records.extend(expand(evaluator.evaluate(&value, q), &value)),
            None if value.is_object() => records.push(Record::from_expansion(value, None)),
            None => debug!("Skipping non-object line {} of {:?}", n + 1, path),
        }
    }
    records
}

/// Frontmatter, its raw text, and the first heading of a Markdown-like file.
fn parse_markdown(path: &Path, content: &str) -> Result<Record, Skip> {
    let content = content.trim_start_matches('\u{feff}');
    let (raw, body) = split_frontmatter(content);
    let frontmatter = match raw {
        Some(raw) => parse_frontmatter(path, raw)?,
        None => BTreeMap::new(),
    };
    Ok(Record {
        frontmatter,
        raw_frontmatter: raw.unwrap_or_default().to_string(),
        heading: first_heading(body).unwrap_or_default().to_string(),
        ..Record::default()
    })
}

/// Returns the text between `---` delimiters and the remaining body.
/// A missing closing delimiter means there is no frontmatter.
fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let Some(first_line_end) = content.find('\n') else {
        return (None, content);
    };
    if content[..first_line_end].trim_end() != "---" {
        return (None, content);
    }
    let rest = &content[first_line_end + 1..];

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let raw = rest[..offset].trim_end_matches(['\r', '\n']);
            return (Some(raw), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, content)
}

fn parse_frontmatter(path: &Path, raw: &str) -> Result<BTreeMap<String, String>, Skip> {
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|source| Skip::Frontmatter {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        serde_yaml::Value::Null => Ok(BTreeMap::new()),
        serde_yaml::Value::Mapping(map) => Ok(map
            .iter()
            .map(|(k, v)| (yaml_to_string(k), yaml_to_string(v)))
            .collect()),
        _ => Err(Skip::FrontmatterShape(path.to_path_buf())),
    }
}

fn yaml_to_string(value: &serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Null => String::new(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::String(s) => s.clone(),
        Yaml::Sequence(items) => items.iter().map(yaml_to_string).collect::<Vec<_>>().join(", "),
        Yaml::Mapping(_) => serde_json::to_string(value).unwrap_or_default(),
        Yaml::Tagged(tagged) => yaml_to_string(&tagged.value),
    }
}

/// Text of the first ATX heading (`# Title`), markers stripped.
fn first_heading(body: &str) -> Option<&str> {
    body.lines().find_map(|line| {
        let line = line.trim();
        let level = line.chars().take_while(|&c| c == '#').count();
        if level == 0 || level > 6 {
            return None;
        }
        let rest = &line[level..];
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            Some(rest.trim())
        } else {
            None
        }
    })
}

use crate::model::ItemType;
use crate::pattern::Segment;
use anyhow::Result;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub entries: Vec<SearchEntry>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
}

fn default_cache_ttl_ms() -> u64 { 5_000 }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: default_cache_ttl_ms(),
        }
    }
}

/// Allow/deny lists keyed by item name.
///
/// Entries may use `*` and `?` wildcards. An empty allow-list places no
/// restriction; a deny match always wins.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    #[serde(default)]
    pub enable: Vec<String>,
    #[serde(default)]
    pub disable: Vec<String>,
}

impl NameFilter {
    /// Compile the wildcard lists once for repeated checks.
    pub fn compile(&self) -> CompiledFilter {
        CompiledFilter {
            enable: self.enable.iter().map(|p| Segment::new(p)).collect(),
            disable: self.disable.iter().map(|p| Segment::new(p)).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledFilter {
    enable: Vec<Segment>,
    disable: Vec<Segment>,
}

impl CompiledFilter {
    pub fn is_enabled(&self, name: &str) -> bool {
        if self.disable.iter().any(|s| s.matches(name)) {
            return false;
        }
        self.enable.is_empty() || self.enable.iter().any(|s| s.matches(name))
    }
}

/// Global filters applied at query time.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub command: NameFilter,
    #[serde(default)]
    pub mention: NameFilter,
}

impl Settings {
    pub fn filter_for(&self, item_type: ItemType) -> &NameFilter {
        match item_type {
            ItemType::Command => &self.command,
            ItemType::Mention => &self.mention,
        }
    }
}

/// A configured content source: where to look and how to turn matches into items.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub path: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_pattern: Option<String>,
    #[serde(flatten)]
    pub filter: NameFilter,
}

impl SearchEntry {
    pub fn new(
        item_type: ItemType,
        path: impl Into<String>,
        pattern: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            item_type,
            path: path.into(),
            pattern: pattern.into(),
            label: None,
            color: None,
            icon: None,
            argument_hint: None,
            input_format: None,
            search_prefix: None,
            order_by: None,
            display_time: None,
            prefix_pattern: None,
            filter: NameFilter::default(),
        }
    }

    /// Identifier scoping deduplication to this entry.
    pub fn source_id(&self) -> String {
        format!("{}:{}", self.path, self.pattern)
    }

    /// Root directory with a leading `~` expanded.
    pub fn root(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };
    match (rest, BaseDirs::new()) {
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => PathBuf::from(path),
    }
}

/// Entries used when no configuration supplies any.
pub fn default_entries() -> Vec<SearchEntry> {
    let mut commands = SearchEntry::new(
        ItemType::Command,
        "~/.claude/commands",
        "*.md",
        "{basename}",
        "{frontmatter@description|heading}",
    );
    commands.argument_hint = Some("{frontmatter@argument-hint}".to_string());

    let mut skills = SearchEntry::new(
        ItemType::Command,
        "~/.claude/skills",
        "**/SKILL.md",
        "{frontmatter@name|dirname}",
        "{frontmatter@description}",
    );
    skills.label = Some("skill".to_string());

    let mut agents = SearchEntry::new(
        ItemType::Mention,
        "~/.claude/agents",
        "*.md",
        "{frontmatter@name|basename}",
        "{frontmatter@description|heading}",
    );
    agents.label = Some("agent".to_string());
    agents.search_prefix = Some("agent".to_string());

    vec![commands, skills, agents]
}

pub fn config_path() -> PathBuf {
    match ProjectDirs::from("org", "runner", "runner-index") {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

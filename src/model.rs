use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Command,
    Mention,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Command => f.write_str("command"),
            ItemType::Mention => f.write_str("mention"),
        }
    }
}

/// Timestamp shown next to an item, or an explicit request to show none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTime {
    At(i64),
    Hidden,
}

impl Serialize for DisplayTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DisplayTime::At(ms) => serializer.serialize_i64(*ms),
            DisplayTime::Hidden => serializer.serialize_str("none"),
        }
    }
}

/// A resolved, display-ready search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub file_path: PathBuf,
    pub source_id: String, // `path:pattern` of the originating entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<String>, // raw block, for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>, // epoch ms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_time: Option<DisplayTime>,
}

impl SearchItem {
    pub fn new(
        name: String,
        description: String,
        item_type: ItemType,
        file_path: PathBuf,
        source_id: String,
    ) -> Self {
        Self {
            name,
            description,
            item_type,
            file_path,
            source_id,
            sort_key: None,
            frontmatter: None,
            label: None,
            color: None,
            icon: None,
            argument_hint: None,
            input_format: None,
            updated_at: None,
            display_time: None,
        }
    }

    /// Key that identifies duplicates within one source.
    pub fn dedup_key(&self) -> String {
        match &self.label {
            Some(label) => format!("{}:{}", self.name, label),
            None => self.name.clone(),
        }
    }
}

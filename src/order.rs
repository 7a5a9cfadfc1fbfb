//! `orderBy` parsing and item comparison.

use crate::model::SearchItem;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    Name,
    Description,
    UpdatedAt,
    /// Compared through the item's `sort_key`.
    Custom(String),
}

/// A parsed `"<field> [asc|desc]"` specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SortField,
    /// The field part with the direction token removed; resolved per item
    /// into `sort_key` when the field is custom.
    pub template: String,
    pub direction: Direction,
}

impl Default for OrderBy {
    fn default() -> Self {
        Self {
            field: SortField::Name,
            template: "name".to_string(),
            direction: Direction::Asc,
        }
    }
}

impl OrderBy {
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        let (template, direction) = match spec.rsplit_once(char::is_whitespace) {
            Some((rest, dir)) if dir.eq_ignore_ascii_case("desc") => (rest.trim_end(), Direction::Desc),
            Some((rest, dir)) if dir.eq_ignore_ascii_case("asc") => (rest.trim_end(), Direction::Asc),
            _ => (spec, Direction::Asc),
        };
        if template.is_empty() {
            return Self::default();
        }
        let field = match field_name(template).as_str() {
            "name" => SortField::Name,
            "description" => SortField::Description,
            "updatedAt" => SortField::UpdatedAt,
            other => SortField::Custom(other.to_string()),
        };
        Self {
            field,
            template: template.to_string(),
            direction,
        }
    }

    pub fn needs_sort_key(&self) -> bool {
        matches!(self.field, SortField::Custom(_))
    }

    pub fn compare(&self, a: &SearchItem, b: &SearchItem) -> Ordering {
        let ordering = match &self.field {
            SortField::Name => compare_text(&a.name, &b.name),
            SortField::Description => compare_text(&a.description, &b.description),
            SortField::UpdatedAt => a.updated_at.unwrap_or(0).cmp(&b.updated_at.unwrap_or(0)),
            SortField::Custom(_) => compare_text(
                a.sort_key.as_deref().unwrap_or(&a.name),
                b.sort_key.as_deref().unwrap_or(&b.name),
            ),
        };
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    /// Stable sort.
    pub fn sort(&self, items: &mut [SearchItem]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

/// Field name referenced by an order/display template.
///
/// `{json@meta.updated}` yields `updated`, `{frontmatter@priority|json@p}`
/// yields `priority`, a bare `name` stays `name`.
pub fn field_name(template: &str) -> String {
    let template = template.trim();
    let Some(inner) = template.strip_prefix('{').and_then(|t| t.strip_suffix('}')) else {
        return template.to_string();
    };
    let first = inner.split('|').next().unwrap_or_default().trim();
    let path = first.rsplit_once('@').map_or(first, |(_, path)| path);
    let last = path.rsplit('.').next().unwrap_or(path);
    last.split('[').next().unwrap_or(last).to_string()
}

/// Case-insensitive ordering with a byte-wise tiebreak.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

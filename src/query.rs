//! Nested queries into parsed JSON documents.

use serde_json::Value;

/// Evaluates a query expression such as `.members` against a JSON document.
///
/// Implementations return `None` for malformed expressions and undefined
/// paths; they never panic.
pub trait JsonQuery {
    fn evaluate(&self, document: &Value, expression: &str) -> Option<Value>;
}

/// Path queries: `.`, `.a.b`, `.["key"]`, `.a[0]`, `.a[-1]`, `.items[].name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathQuery;

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Key(String),
    Index(i64),
    Iterate,
}

impl JsonQuery for PathQuery {
    fn evaluate(&self, document: &Value, expression: &str) -> Option<Value> {
        let steps = parse_steps(expression.trim())?;
        apply(document, &steps)
    }
}

fn parse_steps(expr: &str) -> Option<Vec<Step>> {
    let mut rest = expr.strip_prefix('.')?;
    let mut steps = Vec::new();

    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('[') {
            let close = inner.find(']')?;
            let body = inner[..close].trim();
            rest = &inner[close + 1..];
            if body.is_empty() {
                steps.push(Step::Iterate);
            } else if let Some(quoted) = body.strip_prefix('"') {
                steps.push(Step::Key(quoted.strip_suffix('"')?.to_string()));
            } else {
                steps.push(Step::Index(body.parse().ok()?));
            }
            rest = rest.strip_prefix('.').unwrap_or(rest);
            continue;
        }

        let end = rest.find(['.', '[']).unwrap_or(rest.len());
        let key = &rest[..end];
        if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return None;
        }
        steps.push(Step::Key(key.to_string()));
        rest = &rest[end..];
        if let Some(after) = rest.strip_prefix('.') {
            if after.is_empty() {
                return None;
            }
            rest = after;
        }
    }

    Some(steps)
}

fn apply(value: &Value, steps: &[Step]) -> Option<Value> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(value.clone());
    };
    match step {
        Step::Key(key) => apply(value.as_object()?.get(key)?, rest),
        Step::Index(index) => {
            let array = value.as_array()?;
            let i = if *index < 0 {
                array.len().checked_sub(index.unsigned_abs() as usize)?
            } else {
                *index as usize
            };
            apply(array.get(i)?, rest)
        }
        Step::Iterate => {
            let elements: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                Value::Object(map) => map.values().collect(),
                _ => return None,
            };
            Some(Value::Array(
                elements
                    .into_iter()
                    .map(|v| apply(v, rest).unwrap_or(Value::Null))
                    .collect(),
            ))
        }
    }
}

//! Localized line text

use crate::error::DialogueError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A line delivered by the interpreter: an id into the string table plus
/// already-evaluated substitution values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Line {
    pub id: String,
    #[serde(default)]
    pub substitutions: Vec<String>,
}

impl Line {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            substitutions: Vec::new(),
        }
    }

    pub fn with_substitutions(id: impl Into<String>, substitutions: Vec<String>) -> Self {
        Self {
            id: id.into(),
            substitutions,
        }
    }
}

/// Line id to display text for a single locale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StringTable {
    pub locale: String,
    pub lines: HashMap<String, String>,
}

impl StringTable {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            lines: HashMap::new(),
        }
    }

    pub fn with_line(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.lines.insert(id.into(), text.into());
        self
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render a line to display text, filling `{n}` placeholders
    pub fn render(&self, line: &Line) -> Result<String, DialogueError> {
        let text = self
            .lines
            .get(&line.id)
            .ok_or_else(|| DialogueError::MissingLine {
                id: line.id.clone(),
            })?;
        Ok(substitute(text, &line.substitutions))
    }
}

/// Replace `{0}`, `{1}`, ... with the matching substitution.
///
/// Placeholders without a matching value are left untouched.
pub fn substitute(text: &str, substitutions: &[String]) -> String {
    if substitutions.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            let value = substitutions.get(index)?;
            Some((value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

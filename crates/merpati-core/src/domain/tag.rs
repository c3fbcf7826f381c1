use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag entity - a named label shared by every post that uses the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Outcome of resolving a batch of tag names.
///
/// `failed` holds the names that could not be resolved under the
/// skip-and-log policy; `tags` never contains the same identity twice.
#[derive(Debug, Clone, Default)]
pub struct TagResolution {
    pub tags: Vec<Tag>,
    pub failed: Vec<String>,
}

impl TagResolution {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

/// Canonical form of a tag name: trimmed and lowercased.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalize a list of names, dropping blanks and duplicates while
/// keeping first-seen order.
pub fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let normalized = normalize_tag_name(name.as_ref());
        if !normalized.is_empty() && !out.contains(&normalized) {
            out.push(normalized);
        }
    }
    out
}

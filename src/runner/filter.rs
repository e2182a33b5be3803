use std::collections::BTreeSet;

/// Include/exclude filter over invocation tags.
///
/// Exclusion always wins. An empty include set admits every invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    include: BTreeSet<String>,
    exclude: BTreeSet<String>,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, tag: impl Into<String>) -> Self {
        self.include.insert(tag.into());
        self
    }

    pub fn exclude(mut self, tag: impl Into<String>) -> Self {
        self.exclude.insert(tag.into());
        self
    }

    /// Returns `None` if the tags are admitted, otherwise the reason they are not.
    pub fn rejection(&self, tags: &BTreeSet<String>) -> Option<String> {
        if let Some(tag) = tags.iter().find(|t| self.exclude.contains(*t)) {
            return Some(format!("tag '{tag}' is excluded"));
        }
        if !self.include.is_empty() && !tags.iter().any(|t| self.include.contains(t)) {
            return Some("no included tag present".to_string());
        }
        None
    }

    pub fn allows(&self, tags: &BTreeSet<String>) -> bool {
        self.rejection(tags).is_none()
    }
}

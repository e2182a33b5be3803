use std::collections::BTreeSet;

/// Invocation currently being resolved.
///
/// Resolvers may read it to decide whether they apply, but never mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Stable identifier of the invocation (e.g. `suite::test_name`)
    test_id: String,

    /// Human-readable name, defaults to the id
    display_name: String,

    /// Tags attached to the invocation
    tags: BTreeSet<String>,
}

impl InvocationContext {
    pub fn new(test_id: impl Into<String>) -> Self {
        let test_id = test_id.into();
        Self {
            display_name: test_id.clone(),
            test_id,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

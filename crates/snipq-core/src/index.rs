use crate::models::{Group, Snippet};
use crate::trigger::strip_prefix;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Read-only map from base trigger to eligible snippets.
///
/// Only snippets in enabled groups are indexed. When several snippets share a
/// trigger, candidates are ordered by the owning group's `order` (absent = 0),
/// then group id, then snippet id; the first candidate wins.
#[derive(Debug, Default)]
pub struct SnippetIndex {
    by_trigger: HashMap<String, Vec<Arc<Snippet>>>,
    len: usize,
}

impl SnippetIndex {
    pub fn build(groups: &[Group], snippets: &[Arc<Snippet>], prefix: &str) -> Self {
        let enabled: HashMap<&str, &Group> = groups
            .iter()
            .filter(|group| group.enabled)
            .map(|group| (group.id.as_str(), group))
            .collect();

        let mut by_trigger: HashMap<String, Vec<Arc<Snippet>>> = HashMap::new();
        let mut len = 0;
        for snippet in snippets {
            if !enabled.contains_key(snippet.group_id.as_str()) {
                continue;
            }
            let key = strip_prefix(snippet.trigger.trim(), prefix).to_string();
            by_trigger.entry(key).or_default().push(Arc::clone(snippet));
            len += 1;
        }

        for candidates in by_trigger.values_mut() {
            candidates.sort_by(|a, b| {
                let group_a = enabled[a.group_id.as_str()].sort_key();
                let group_b = enabled[b.group_id.as_str()].sort_key();
                group_a.cmp(&group_b).then_with(|| a.id.cmp(&b.id))
            });
        }

        Self { by_trigger, len }
    }

    /// All eligible candidates in priority order; empty when nothing matches
    pub fn lookup(&self, base_trigger: &str) -> &[Arc<Snippet>] {
        self.by_trigger
            .get(base_trigger)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The winning candidate for a base trigger
    pub fn resolve(&self, base_trigger: &str) -> Option<&Arc<Snippet>> {
        let candidates = self.lookup(base_trigger);
        if candidates.len() > 1 {
            debug!(
                trigger = base_trigger,
                winner = %candidates[0].id,
                candidates = candidates.len(),
                "Ambiguous trigger resolved by group priority"
            );
        }
        candidates.first()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

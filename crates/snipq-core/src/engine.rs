//! The expansion service: resolves a raw trigger against the current vault
//! snapshot and renders it.
//!
//! Lookups read an immutable [`Snapshot`] behind an `Arc`. Publishing a new
//! vault builds the replacement snapshot first and only takes the write lock
//! to swap the pointer, so in-flight expansions keep the snapshot they
//! started with.

use crate::boundary::{self, Capture};
use crate::config::Settings;
use crate::error::{ExpandError, Result};
use crate::history::{HistoryEntry, HistoryRecorder};
use crate::index::SnippetIndex;
use crate::models::{Group, Params, Rendered, Snippet, VaultInfo};
use crate::storage::Vault;
use crate::template::{Bindings, Template};
use crate::trigger::{merge_params, parse_trigger};
use crate::variables::{VariableContext, VariableResolver};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Immutable view of settings, groups and the trigger index
#[derive(Debug)]
pub struct Snapshot {
    pub settings: Settings,
    /// Sorted by `order`, then id
    pub groups: Vec<Group>,
    pub snippets: Vec<Arc<Snippet>>,
    pub index: SnippetIndex,
}

impl Snapshot {
    fn build(settings: Settings, mut groups: Vec<Group>, snippets: Vec<Arc<Snippet>>) -> Self {
        groups.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let index = SnippetIndex::build(&groups, &snippets, &settings.prefix);
        Self {
            settings,
            groups,
            snippets,
            index,
        }
    }

    fn from_vault(vault: Vault) -> Self {
        let snippets = vault.snippets.into_iter().map(Arc::new).collect();
        Self::build(vault.settings, vault.groups, snippets)
    }
}

/// Per-call context threaded through an expansion
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandContext {
    pub variables: VariableContext,
    /// Text around a live-captured trigger; `None` treats the trigger as isolated
    pub capture: Option<Capture>,
    /// Overrides `Settings::strict_boundaries` for this call
    pub strict_boundaries: Option<bool>,
}

impl ExpandContext {
    pub fn new(variables: VariableContext) -> Self {
        Self {
            variables,
            capture: None,
            strict_boundaries: None,
        }
    }

    pub fn with_capture(mut self, capture: Capture) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn with_strict_boundaries(mut self, strict: bool) -> Self {
        self.strict_boundaries = Some(strict);
        self
    }

    pub fn app_id(&self) -> Option<&str> {
        self.variables.app_id.as_deref()
    }
}

#[derive(Debug)]
pub struct ExpansionService {
    current: RwLock<Arc<Snapshot>>,
    history: HistoryRecorder,
}

impl ExpansionService {
    pub fn new(vault: Vault) -> Result<Self> {
        vault.validate()?;
        let history = HistoryRecorder::new(vault.settings.history_limit);
        Ok(Self {
            current: RwLock::new(Arc::new(Snapshot::from_vault(vault))),
            history,
        })
    }

    /// The snapshot lookups currently run against
    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self.current.read() {
            Ok(current) => Arc::clone(&current),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Validate a new vault and swap it in
    pub fn publish(&self, vault: Vault) -> Result<()> {
        vault.validate()?;
        self.swap(Snapshot::from_vault(vault));
        Ok(())
    }

    /// Republish the current groups and snippets under new settings
    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        let current = self.snapshot();
        self.swap(Snapshot::build(
            settings,
            current.groups.clone(),
            current.snippets.clone(),
        ));
        Ok(())
    }

    fn swap(&self, next: Snapshot) {
        info!(
            groups = next.groups.len(),
            snippets = next.snippets.len(),
            indexed = next.index.len(),
            "Publishing vault snapshot"
        );
        let next = Arc::new(next);
        match self.current.write() {
            Ok(mut current) => *current = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    pub fn expand(
        &self,
        raw: &str,
        context: &ExpandContext,
    ) -> std::result::Result<Rendered, ExpandError> {
        self.expand_with(raw, context, &Params::new())
    }

    /// Expand with an explicit parameter map merged over the trigger's own
    pub fn expand_with(
        &self,
        raw: &str,
        context: &ExpandContext,
        explicit: &Params,
    ) -> std::result::Result<Rendered, ExpandError> {
        let snapshot = self.snapshot();
        let settings = &snapshot.settings;
        let (snippet, params) = lookup(&snapshot, raw, explicit)?;

        boundary::validate(
            raw,
            context.capture.as_ref(),
            context.strict_boundaries,
            context.app_id(),
            settings,
        )?;

        let rendered = render(settings, snippet, &params, &context.variables)?;
        self.history.record(
            snippet,
            &rendered.output,
            context.app_id(),
            context.variables.now,
            settings,
        );
        Ok(rendered)
    }

    /// Render without boundary checks or history
    pub fn preview(
        &self,
        raw: &str,
        context: &ExpandContext,
    ) -> std::result::Result<String, ExpandError> {
        self.preview_with(raw, context, &Params::new())
    }

    pub fn preview_with(
        &self,
        raw: &str,
        context: &ExpandContext,
        explicit: &Params,
    ) -> std::result::Result<String, ExpandError> {
        let snapshot = self.snapshot();
        let (snippet, params) = lookup(&snapshot, raw, explicit)?;
        render(&snapshot.settings, snippet, &params, &context.variables)
            .map(|rendered| rendered.output)
    }

    pub fn groups(&self) -> Vec<Group> {
        self.snapshot().groups.clone()
    }

    /// Snippets of one group, sorted by name then id
    pub fn snippets(&self, group_id: &str) -> Vec<Snippet> {
        let snapshot = self.snapshot();
        let mut snippets: Vec<Snippet> = snapshot
            .snippets
            .iter()
            .filter(|snippet| snippet.group_id == group_id)
            .map(|snippet| Snippet::clone(snippet))
            .collect();
        snippets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        snippets
    }

    /// Case-insensitive substring match on name, trigger and tags, sorted by
    /// name then id. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<Snippet> {
        let query = query.trim().to_lowercase();
        let matches = |text: &str| text.to_lowercase().contains(&query);
        let mut found: Vec<Snippet> = self
            .snapshot()
            .snippets
            .iter()
            .filter(|snippet| {
                matches(snippet.name.as_str())
                    || matches(snippet.trigger.as_str())
                    || snippet.tags.iter().any(|tag| matches(tag.as_str()))
            })
            .map(|snippet| Snippet::clone(snippet))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        found
    }

    pub fn vault_info(&self) -> VaultInfo {
        let snapshot = self.snapshot();
        VaultInfo {
            groups: snapshot.groups.len(),
            snippets: snapshot.snippets.len(),
        }
    }

    pub fn settings(&self) -> Settings {
        self.snapshot().settings.clone()
    }

    /// Recorded expansions, oldest first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }
}

fn lookup<'s>(
    snapshot: &'s Snapshot,
    raw: &str,
    explicit: &Params,
) -> std::result::Result<(&'s Arc<Snippet>, Params), ExpandError> {
    let parsed = parse_trigger(raw, &snapshot.settings.prefix)?;
    let snippet = snapshot
        .index
        .resolve(&parsed.base)
        .ok_or_else(|| ExpandError::TriggerNotFound(raw.trim().to_string()))?;
    debug!(trigger = %parsed.base, snippet = %snippet.id, "Trigger resolved");
    Ok((snippet, merge_params(parsed.params, explicit)))
}

fn render(
    settings: &Settings,
    snippet: &Snippet,
    params: &Params,
    variables: &VariableContext,
) -> std::result::Result<Rendered, ExpandError> {
    let template = Template::parse(&snippet.template)?;
    let resolver = VariableResolver::new(settings, variables);
    let bindings = Bindings {
        params,
        defaults: &snippet.defaults,
        variables: &resolver,
    };
    let output = template.render(&bindings, snippet.strict, &snippet.id)?;
    Ok(Rendered {
        output: output.text,
        cursor_offset: output.cursor_offset,
        used_snippet: snippet.id.clone(),
        used_params: output.used_params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn service() -> ExpansionService {
        let mut work = Group::new("work", "Work");
        work.order = Some(1);
        let mut archive = Group::new("archive", "Archive");
        archive.enabled = false;
        let vault = Vault::new(
            Settings::default(),
            vec![work, Group::new("personal", "Personal"), archive],
            vec![
                Snippet::new("hello", ":hello", "Hello, {{name|friend}}!", "personal"),
                Snippet::new("sig-work", ":sig", "Work sig", "work"),
                Snippet::new("sig-home", ":sig", "Home sig", "personal"),
                Snippet::new("old", ":old", "Old", "archive"),
            ],
        );
        ExpansionService::new(vault).unwrap()
    }

    fn context() -> ExpandContext {
        ExpandContext::new(VariableContext::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 5, 7).unwrap(),
        ))
    }

    #[test]
    fn group_order_breaks_trigger_ties() {
        let rendered = service().expand(":sig", &context()).unwrap();
        assert_eq!(rendered.used_snippet, "sig-home");
    }

    #[test]
    fn disabled_groups_are_not_indexed() {
        let err = service().expand(":old", &context()).unwrap_err();
        assert_eq!(err, ExpandError::TriggerNotFound(":old".into()));
    }

    #[test]
    fn groups_are_sorted_by_order_then_id() {
        let ids: Vec<_> = service().groups().into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["archive", "personal", "work"]);
    }

    #[test]
    fn explicit_params_override_trigger_params() {
        let explicit: Params = [("name", "Ana")].into_iter().collect();
        let rendered = service()
            .expand_with(":hello?name=John", &context(), &explicit)
            .unwrap();
        assert_eq!(rendered.output, "Hello, Ana!");
    }

    #[test]
    fn preview_skips_boundaries_and_history() {
        let service = service();
        let ctx = context().with_capture(Capture::new("xx:helloxx"));
        assert!(service.expand(":hello", &ctx).is_err());
        assert_eq!(service.preview(":hello", &ctx).unwrap(), "Hello, friend!");
        assert!(service.history().is_empty());
    }

    #[test]
    fn update_settings_applies_to_later_calls() {
        let service = service();
        let ctx = context().with_capture(Capture::new("xx:helloxx"));
        assert!(service.expand(":hello", &ctx).is_err());

        let relaxed = Settings {
            strict_boundaries: false,
            ..Settings::default()
        };
        service.update_settings(relaxed).unwrap();
        assert!(service.expand(":hello", &ctx).is_ok());
        assert!(!service.settings().strict_boundaries);
    }

    #[test]
    fn search_matches_name_trigger_and_tags() {
        let mut tagged = Snippet::new("addr", ":addr", "1 Main St", "personal");
        tagged.name = "Home address".into();
        tagged.tags.insert("Contact".into());
        let vault = Vault::new(
            Settings::default(),
            vec![Group::new("personal", "Personal")],
            vec![
                tagged,
                Snippet::new("hello", ":hello", "Hello!", "personal"),
                Snippet::new("sig", ":sig", "Sig", "personal"),
            ],
        );
        let service = ExpansionService::new(vault).unwrap();
        let ids = |query: &str| -> Vec<String> {
            service.search(query).into_iter().map(|s| s.id).collect()
        };

        assert_eq!(ids("HOME"), vec!["addr"]);
        assert_eq!(ids(":sig"), vec!["sig"]);
        assert_eq!(ids("contact"), vec!["addr"]);
        assert_eq!(ids(""), vec!["addr", "hello", "sig"]);
        assert!(ids("nothing").is_empty());
    }

    #[test]
    fn clear_history_empties_recorded_expansions() {
        let service = service();
        service.expand(":hello", &context()).unwrap();
        assert_eq!(service.history().len(), 1);
        service.clear_history();
        assert!(service.history().is_empty());
    }

    #[test]
    fn publish_rejects_invalid_vaults() {
        let service = service();
        let bad = Vault::new(
            Settings::default(),
            vec![],
            vec![Snippet::new("x", ":x", "x", "missing")],
        );
        assert!(service.publish(bad).is_err());
        assert_eq!(service.vault_info().snippets, 4);
    }
}

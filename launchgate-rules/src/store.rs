use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::{AuthorizationRule, RuleDraft, RuleError};

/// Persistence boundary for authorization rules.
///
/// Listings are ordered by ascending id, which is the order the engine
/// evaluates them in.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn list_rules(&self) -> Result<Vec<AuthorizationRule>, RuleError>;

    async fn list_rules_for_app(&self, app: &str) -> Result<Vec<AuthorizationRule>, RuleError>;

    async fn get_rule(&self, id: i64) -> Result<Option<AuthorizationRule>, RuleError>;

    async fn create_rule(&self, draft: RuleDraft) -> Result<AuthorizationRule, RuleError>;

    /// Replaces the contents of an existing rule, keeping its id and creation time.
    async fn update_rule(&self, id: i64, draft: RuleDraft) -> Result<AuthorizationRule, RuleError>;

    async fn delete_rule(&self, id: i64) -> Result<(), RuleError>;
}

#[derive(Default)]
struct MemoryRules {
    next_id: i64,
    rules: BTreeMap<i64, AuthorizationRule>,
}

/// In-memory rule store.
#[derive(Default, Clone)]
pub struct MemoryRuleStore {
    inner: Arc<RwLock<MemoryRules>>,
}

impl MemoryRuleStore {
    /// Creates a new empty rule store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given drafts, numbered from 1 in order.
    pub fn with_drafts(drafts: impl IntoIterator<Item = RuleDraft>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for draft in drafts {
                insert(&mut inner, draft);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.inner.read().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn insert(inner: &mut MemoryRules, draft: RuleDraft) -> AuthorizationRule {
    inner.next_id += 1;
    let rule = draft.into_rule(inner.next_id, Utc::now());
    inner.rules.insert(rule.id, rule.clone());
    rule
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn list_rules(&self) -> Result<Vec<AuthorizationRule>, RuleError> {
        Ok(self.inner.read().rules.values().cloned().collect())
    }

    async fn list_rules_for_app(&self, app: &str) -> Result<Vec<AuthorizationRule>, RuleError> {
        Ok(self
            .inner
            .read()
            .rules
            .values()
            .filter(|rule| rule.app == app)
            .cloned()
            .collect())
    }

    async fn get_rule(&self, id: i64) -> Result<Option<AuthorizationRule>, RuleError> {
        Ok(self.inner.read().rules.get(&id).cloned())
    }

    async fn create_rule(&self, draft: RuleDraft) -> Result<AuthorizationRule, RuleError> {
        let mut inner = self.inner.write();
        Ok(insert(&mut inner, draft))
    }

    async fn update_rule(&self, id: i64, draft: RuleDraft) -> Result<AuthorizationRule, RuleError> {
        let mut inner = self.inner.write();
        let existing = inner.rules.get_mut(&id).ok_or(RuleError::NotFound(id))?;
        *existing = draft.into_rule(id, existing.created_at);
        Ok(existing.clone())
    }

    async fn delete_rule(&self, id: i64) -> Result<(), RuleError> {
        let mut inner = self.inner.write();
        inner
            .rules
            .remove(&id)
            .map(|_| ())
            .ok_or(RuleError::NotFound(id))
    }
}

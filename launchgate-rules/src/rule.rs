use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored authorization rule scoped to one application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizationRule {
    /// Store-assigned identifier. Only used for CRUD addressing.
    pub id: i64,
    /// Application namespace the rule applies to.
    pub app: String,
    /// Version expression, see [`crate::version`].
    pub version_rule: String,
    /// Comma separated IP expressions, see [`crate::ip`].
    pub ip_rule: String,
    /// Opaque payload released to the client on match.
    pub detail_info: String,
    pub created_at: DateTime<Utc>,
}

impl AuthorizationRule {
    /// Builds an unsaved rule, mostly useful when evaluating ad-hoc snapshots.
    pub fn new(
        app: impl Into<String>,
        version_rule: impl Into<String>,
        ip_rule: impl Into<String>,
        detail_info: impl Into<String>,
    ) -> Self {
        RuleDraft::new(app, version_rule, ip_rule, detail_info).into_rule(0, Utc::now())
    }

    pub fn draft(&self) -> RuleDraft {
        RuleDraft {
            app: self.app.clone(),
            version_rule: self.version_rule.clone(),
            ip_rule: self.ip_rule.clone(),
            detail_info: self.detail_info.clone(),
        }
    }
}

/// Rule contents as submitted for creation or update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleDraft {
    pub app: String,
    pub version_rule: String,
    pub ip_rule: String,
    #[serde(default)]
    pub detail_info: String,
}

impl RuleDraft {
    pub fn new(
        app: impl Into<String>,
        version_rule: impl Into<String>,
        ip_rule: impl Into<String>,
        detail_info: impl Into<String>,
    ) -> Self {
        Self {
            app: app.into(),
            version_rule: version_rule.into(),
            ip_rule: ip_rule.into(),
            detail_info: detail_info.into(),
        }
    }

    pub fn into_rule(self, id: i64, created_at: DateTime<Utc>) -> AuthorizationRule {
        AuthorizationRule {
            id,
            app: self.app,
            version_rule: self.version_rule,
            ip_rule: self.ip_rule,
            detail_info: self.detail_info,
            created_at,
        }
    }
}

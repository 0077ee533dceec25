use tracing::debug;

use crate::error::RuleError;
use crate::ip::match_ip;
use crate::outcome::Decision;
use crate::rule::AuthorizationRule;
use crate::store::RuleStore;
use crate::version::match_version;

/// Evaluates start requests against one snapshot of an application's rules.
///
/// The engine keeps the order it was given; the first rule whose version and
/// IP expressions both match wins.
#[derive(Debug, Default, Clone)]
pub struct RuleEngine {
    rules: Vec<AuthorizationRule>,
}

impl RuleEngine {
    pub fn new(rules: Vec<AuthorizationRule>) -> Self {
        Self { rules }
    }

    /// Borrow the underlying rule snapshot.
    pub fn rules(&self) -> &[AuthorizationRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, app: &str, version: &str, client_ip: &str) -> Decision {
        evaluate(app, version, client_ip, &self.rules)
    }

    /// Loads a fresh snapshot for `app` from the store and evaluates it.
    ///
    /// Store failures are returned as errors and never reported as `Denied`.
    pub async fn authorize(
        store: &dyn RuleStore,
        app: &str,
        version: &str,
        client_ip: &str,
    ) -> Result<Decision, RuleError> {
        let engine = Self::new(store.list_rules_for_app(app).await?);
        Ok(engine.evaluate(app, version, client_ip))
    }
}

/// Returns the detail of the first rule in `rules` that grants the request.
pub fn evaluate(app: &str, version: &str, client_ip: &str, rules: &[AuthorizationRule]) -> Decision {
    let matched = rules
        .iter()
        .filter(|rule| rule.app == app)
        .find(|rule| match_version(version, &rule.version_rule) && match_ip(client_ip, &rule.ip_rule));

    match matched {
        Some(rule) => {
            debug!(rule_id = rule.id, %app, %version, %client_ip, "rule granted request");
            Decision::Granted {
                detail: rule.detail_info.clone(),
            }
        }
        None => {
            debug!(%app, %version, %client_ip, candidates = rules.len(), "no rule granted request");
            Decision::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRuleStore;
    use crate::RuleDraft;

    fn rule(id: i64, version_rule: &str, ip_rule: &str, detail: &str) -> AuthorizationRule {
        let mut rule = AuthorizationRule::new("foo", version_rule, ip_rule, detail);
        rule.id = id;
        rule
    }

    #[test]
    fn grants_matching_rule() {
        let rules = vec![rule(1, ">=1.0.0", "10.0.0.0/8,192.168.1.*", "X")];

        assert_eq!(
            evaluate("foo", "1.5.0", "10.1.2.3", &rules),
            Decision::Granted { detail: "X".into() }
        );
        assert_eq!(evaluate("foo", "1.5.0", "172.16.0.1", &rules), Decision::Denied);
    }

    #[test]
    fn first_match_wins_in_supplied_order() {
        let broad = rule(1, ">=0.0.0", "0.0.0.0/0", "broad");
        let specific = rule(2, "1.5.0", "10.1.2.3", "specific");

        let engine = RuleEngine::new(vec![broad.clone(), specific.clone()]);
        assert_eq!(engine.evaluate("foo", "1.5.0", "10.1.2.3").detail(), Some("broad"));

        let engine = RuleEngine::new(vec![specific, broad]);
        assert_eq!(engine.evaluate("foo", "1.5.0", "10.1.2.3").detail(), Some("specific"));
    }

    #[test]
    fn version_mismatch_falls_through_to_later_rules() {
        let rules = vec![
            rule(1, "<=0.9.0", "10.0.0.0/8", "legacy"),
            rule(2, "1.0.0-2.0.0", "10.0.0.0/8", "current"),
        ];
        assert_eq!(evaluate("foo", "1.2.0", "10.9.9.9", &rules).detail(), Some("current"));
    }

    #[test]
    fn malformed_rules_deny() {
        let rules = vec![
            rule(1, "abc-def", "10.0.0.0/8", "bad-version"),
            rule(2, ">=1.0.0", "999.1.1.1/33", "bad-ip"),
        ];
        assert_eq!(evaluate("foo", "1.0.0", "10.0.0.1", &rules), Decision::Denied);
    }

    #[test]
    fn rules_for_other_apps_are_ignored() {
        let mut other = rule(1, ">=0.0.0", "0.0.0.0/0", "other");
        other.app = "bar".into();
        assert_eq!(evaluate("foo", "1.0.0", "10.0.0.1", &[other]), Decision::Denied);
    }

    #[test]
    fn empty_snapshot_denies() {
        let engine = RuleEngine::default();
        assert!(engine.is_empty());
        assert_eq!(engine.evaluate("foo", "1.0.0", "10.0.0.1"), Decision::Denied);
    }

    #[tokio::test]
    async fn authorize_reads_fresh_snapshot_each_call() {
        let store = MemoryRuleStore::new();
        assert_eq!(
            RuleEngine::authorize(&store, "foo", "1.0.0", "10.0.0.1")
                .await
                .expect("store available"),
            Decision::Denied
        );

        store
            .create_rule(RuleDraft::new("foo", ">=1.0.0", "10.0.0.0/8", "X"))
            .await
            .expect("create");

        assert_eq!(
            RuleEngine::authorize(&store, "foo", "1.0.0", "10.0.0.1")
                .await
                .expect("store available"),
            Decision::Granted { detail: "X".into() }
        );
    }
}

//! Authorization rule engine for LaunchGate.
//!
//! A start request `(app, version, client_ip)` is granted when one of the
//! application's rules accepts both the version (see [`version`]) and the
//! client address (see [`ip`]). Rules are evaluated in the order the store
//! returns them and the first match wins. Malformed expressions never match,
//! so the engine fails closed and never errors on bad input.

mod engine;
mod error;
pub mod ip;
mod loader;
mod outcome;
mod rule;
mod store;
pub mod version;

pub use engine::{evaluate, RuleEngine};
pub use error::RuleError;
pub use ip::{match_ip, IpSubRule};
pub use loader::{load_rules, load_store};
pub use outcome::Decision;
pub use rule::{AuthorizationRule, RuleDraft};
pub use store::{MemoryRuleStore, RuleStore};
pub use version::{match_version, VersionRule};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_and_denies_end_to_end() {
        let rules = vec![AuthorizationRule::new(
            "foo",
            ">=1.0.0",
            "10.0.0.0/8,192.168.1.*",
            "X",
        )];

        let engine = RuleEngine::new(rules);
        assert_eq!(
            engine.evaluate("foo", "1.5.0", "10.1.2.3"),
            Decision::Granted { detail: "X".into() }
        );
        assert_eq!(engine.evaluate("foo", "1.5.0", "172.16.0.1"), Decision::Denied);
        assert_eq!(engine.evaluate("foo", "0.9.0", "10.1.2.3"), Decision::Denied);
    }
}

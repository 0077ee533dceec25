use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use launchgate_rules::ip::sub_rules;
use launchgate_rules::{
    load_rules, AuthorizationRule, Decision, IpSubRule, RuleEngine, RuleError, VersionRule,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Rules(#[from] RuleError),
    #[error("no rules found at {0}")]
    Empty(String),
}

/// Evaluates one start request against the rules stored at `path`.
pub fn check(
    path: &Path,
    app: &str,
    version: &str,
    client_ip: &str,
) -> Result<Decision, CliError> {
    let loaded_at = Utc::now();
    let rules: Vec<AuthorizationRule> = load_rules(path)?
        .into_iter()
        .zip(1..)
        .map(|(draft, id)| draft.into_rule(id, loaded_at))
        .collect();
    debug!(path = %path.display(), rules = rules.len(), "checking request");

    Ok(RuleEngine::new(rules).evaluate(app, version, client_ip))
}

/// Problems found in one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    /// 1-based position in evaluation order.
    pub position: usize,
    pub app: String,
    pub problems: Vec<String>,
}

impl LintFinding {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Reports, per rule, the expressions that can never match.
pub fn lint(path: &Path) -> Result<Vec<LintFinding>, CliError> {
    let drafts = load_rules(path)?;
    if drafts.is_empty() {
        return Err(CliError::Empty(path.display().to_string()));
    }

    Ok(drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| LintFinding {
            position: index + 1,
            problems: lint_expressions(&draft.version_rule, &draft.ip_rule),
            app: draft.app,
        })
        .collect())
}

fn lint_expressions(version_rule: &str, ip_rule: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if VersionRule::parse(version_rule).is_none() {
        problems.push(format!("version rule {version_rule:?} does not parse"));
    }

    let mut seen = 0;
    for sub_rule in sub_rules(ip_rule) {
        seen += 1;
        match IpSubRule::parse(sub_rule) {
            None => problems.push(format!("ip sub-rule {sub_rule:?} does not parse")),
            // Clients are always IPv4, so other literals are dead.
            Some(IpSubRule::Exact(literal)) if Ipv4Addr::from_str(&literal).is_err() => {
                problems.push(format!("ip sub-rule {sub_rule:?} is not an IPv4 address"))
            }
            Some(_) => {}
        }
    }
    if seen == 0 {
        problems.push("ip rule is empty".to_string());
    }

    problems
}

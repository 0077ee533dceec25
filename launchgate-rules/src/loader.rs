use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::RuleError;
use crate::rule::RuleDraft;
use crate::store::MemoryRuleStore;

/// Loads rule drafts from a YAML/JSON file or from every such file in a directory.
///
/// Directory entries are read in file name order, and rules keep the order in
/// which they appear, so the resulting list is the evaluation order.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<RuleDraft>, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleError::MissingPath(path.display().to_string()));
    }

    let rules = if path.is_dir() {
        load_from_directory(path)?
    } else {
        load_from_file(path)?
    };

    debug!(path = %path.display(), count = rules.len(), "loaded rule drafts");
    Ok(rules)
}

/// Builds an in-memory store seeded with the rules found at `path`.
pub fn load_store(path: impl AsRef<Path>) -> Result<MemoryRuleStore, RuleError> {
    Ok(MemoryRuleStore::with_drafts(load_rules(path)?))
}

fn load_from_directory(path: &Path) -> Result<Vec<RuleDraft>, RuleError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| RuleError::from_io(path, err))? {
        let entry = entry.map_err(|err| RuleError::from_io(path, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| RuleError::from_io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }

        if let Some(ext) = entry.path().extension().and_then(|value| value.to_str()) {
            if matches!(ext, "json" | "yaml" | "yml") {
                files.push(entry.path());
            }
        }
    }
    files.sort();

    let mut rules = Vec::new();
    for file in files {
        let mut file_rules = load_from_file(&file)?;
        rules.append(&mut file_rules);
    }

    Ok(rules)
}

fn load_from_file(path: &Path) -> Result<Vec<RuleDraft>, RuleError> {
    let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
    let rules = parse_rules(&raw, path)?;
    if let Some(index) = rules.iter().position(|rule| rule.app.trim().is_empty()) {
        return Err(RuleError::parse_error(
            path,
            format!("rule #{} has an empty app name", index + 1),
        ));
    }
    Ok(rules)
}

/// Accepts a `rules:` mapping, a bare sequence of rules, or one rule mapping.
fn parse_rules(raw: &str, path: &Path) -> Result<Vec<RuleDraft>, RuleError> {
    let malformed = |err: serde_yaml::Error| RuleError::parse_error(path, err.to_string());

    let value: serde_yaml::Value = serde_yaml::from_str(raw).map_err(malformed)?;
    let is_document = value.get("rules").is_some();
    match value {
        serde_yaml::Value::Sequence(_) => serde_yaml::from_value(value).map_err(malformed),
        serde_yaml::Value::Mapping(_) if is_document => {
            let document: RuleDocument = serde_yaml::from_value(value).map_err(malformed)?;
            Ok(document.rules)
        }
        serde_yaml::Value::Mapping(_) => {
            let rule: RuleDraft = serde_yaml::from_value(value).map_err(malformed)?;
            Ok(vec![rule])
        }
        _ => Err(RuleError::parse_error(
            path,
            "expected a `rules:` mapping, a list of rules or a single rule",
        )),
    }
}

#[derive(Debug, Deserialize)]
struct RuleDocument {
    rules: Vec<RuleDraft>,
}

//! Version rule expressions.
//!
//! A rule is one of, checked in this order:
//!
//! * `"<min>-<max>"` inclusive range (any rule containing `-`)
//! * `">=<v>"` at least
//! * `"<=<v>"` at most
//! * anything else, exact equality
//!
//! Versions are compared with SemVer precedence after normalization: a leading
//! `v` is dropped, missing minor/patch components are filled with `0` (so
//! `"1.0"` equals `"1.0.0"`) and build metadata is discarded.
//!
//! Unlike PEP 440, versions with four or more release components such as
//! `"1.2.3.4"` do not parse, so no rule ever matches them.

use std::cmp::Ordering;

use semver::{BuildMetadata, Version};

/// Parsed form of a version rule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRule {
    Range { min: Version, max: Version },
    AtLeast(Version),
    AtMost(Version),
    Exact(Version),
}

impl VersionRule {
    /// Parses a rule expression, returning `None` when it is malformed.
    pub fn parse(rule: &str) -> Option<Self> {
        let rule = rule.trim();
        if rule.contains('-') {
            let (min, max) = split_once_exact(rule, '-')?;
            return Some(VersionRule::Range {
                min: parse_version(min)?,
                max: parse_version(max)?,
            });
        }

        if let Some(bound) = rule.strip_prefix(">=") {
            return parse_version(bound).map(VersionRule::AtLeast);
        }

        if let Some(bound) = rule.strip_prefix("<=") {
            return parse_version(bound).map(VersionRule::AtMost);
        }

        parse_version(rule).map(VersionRule::Exact)
    }

    pub fn matches(&self, current: &Version) -> bool {
        match self {
            VersionRule::Range { min, max } => min <= current && current <= max,
            VersionRule::AtLeast(bound) => current >= bound,
            VersionRule::AtMost(bound) => current <= bound,
            VersionRule::Exact(expected) => current.cmp(expected) == Ordering::Equal,
        }
    }
}

/// Whether `current` satisfies `rule`. Any parse failure is a non-match.
pub fn match_version(current: &str, rule: &str) -> bool {
    let Some(current) = parse_version(current) else {
        return false;
    };

    VersionRule::parse(rule)
        .map(|rule| rule.matches(&current))
        .unwrap_or(false)
}

/// Parses a version string using the normalization documented on this module.
pub fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let without_build = match trimmed.split_once('+') {
        Some((head, _)) => head,
        None => trimmed,
    };

    let (core, pre) = match without_build.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (without_build, None),
    };

    let components: Vec<&str> = core.split('.').collect();
    if components.is_empty() || components.len() > 3 {
        return None;
    }
    if components
        .iter()
        .any(|part| part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()))
    {
        return None;
    }

    let mut normalized = components.join(".");
    for _ in components.len()..3 {
        normalized.push_str(".0");
    }
    if let Some(pre) = pre {
        normalized.push('-');
        normalized.push_str(pre);
    }

    let mut version = Version::parse(&normalized).ok()?;
    version.build = BuildMetadata::EMPTY;
    Some(version)
}

fn split_once_exact(value: &str, separator: char) -> Option<(&str, &str)> {
    let mut parts = value.split(separator);
    let first = parts.next()?;
    let second = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(match_version("1.0.0", "1.0.0-2.0.0"));
        assert!(match_version("1.5.3", "1.0.0-2.0.0"));
        assert!(match_version("2.0.0", "1.0.0-2.0.0"));
        assert!(!match_version("0.9.9", "1.0.0-2.0.0"));
        assert!(!match_version("2.0.1", "1.0.0-2.0.0"));
    }

    #[test]
    fn range_tolerates_spaces_around_separator() {
        assert!(match_version("1.2.0", "1.0.0 - 2.0.0"));
    }

    #[test]
    fn at_least_and_at_most() {
        assert!(match_version("1.2.0", ">=1.2.0"));
        assert!(match_version("1.3.0", ">=1.2.0"));
        assert!(!match_version("1.1.9", ">=1.2.0"));

        assert!(match_version("1.2.0", "<=1.2.0"));
        assert!(match_version("0.1.0", "<=1.2.0"));
        assert!(!match_version("1.2.1", "<=1.2.0"));
    }

    #[test]
    fn components_compare_numerically() {
        assert!(match_version("1.10.0", ">=1.9.0"));
        assert!(!match_version("1.9.0", ">=1.10.0"));
    }

    #[test]
    fn trailing_zero_components_are_normalized() {
        assert!(match_version("1.0.0", "1.0"));
        assert!(match_version("1.0", "1.0.0"));
        assert!(match_version("1", "1.0.0"));
        assert!(!match_version("1.0.1", "1.0"));
    }

    #[test]
    fn leading_v_and_build_metadata_are_ignored() {
        assert!(match_version("v1.2.3", "1.2.3"));
        assert!(match_version("1.2.3+build.7", "1.2.3"));
    }

    #[test]
    fn pre_release_sorts_before_release() {
        assert!(!match_version("1.2.0-beta", ">=1.2.0"));
        assert!(match_version("1.2.0-beta", "<=1.2.0"));
    }

    #[test]
    fn hyphenated_rules_always_take_the_range_route() {
        // "1.0.0-beta" is read as a range whose upper bound is "beta".
        assert!(!match_version("1.0.0-beta", "1.0.0-beta"));
        assert!(!match_version("1.0.0", ">=1.0.0-rc.1"));
        assert!(!match_version("1.5.0", "1.0.0-1.5.0-2.0.0"));
    }

    #[test]
    fn malformed_input_never_matches() {
        assert!(!match_version("1.0.0", "abc-def"));
        assert!(!match_version("1.0.0", "abc"));
        assert!(!match_version("1.0.0", ""));
        assert!(!match_version("1.0.0", ">="));
        assert!(!match_version("not-a-version", ">=0.0.0"));
        assert!(!match_version("", "<=9.9.9"));
        assert!(!match_version("1.2.3.4", "<=9.9.9"));
        assert!(!match_version("1..2", "<=9.9.9"));
    }

    #[test]
    fn parses_rule_forms() {
        assert!(matches!(
            VersionRule::parse("1.0-2.0"),
            Some(VersionRule::Range { .. })
        ));
        assert!(matches!(
            VersionRule::parse(">=3"),
            Some(VersionRule::AtLeast(_))
        ));
        assert!(matches!(
            VersionRule::parse("<=3"),
            Some(VersionRule::AtMost(_))
        ));
        assert!(matches!(
            VersionRule::parse("3.1.4"),
            Some(VersionRule::Exact(_))
        ));
        assert_eq!(VersionRule::parse("=>3"), None);
    }
}

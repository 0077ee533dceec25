//! IP rule expressions.
//!
//! An IP rule is a comma separated list of sub-rules; the rule matches when any
//! sub-rule does. Each sub-rule is classified by the first marker it contains:
//!
//! | marker | form                 | meaning                                  |
//! |--------|----------------------|------------------------------------------|
//! | `-`    | `10.0.0.1-10.0.0.10` | inclusive numeric range                  |
//! | `*`    | `192.168.1.*`        | the `/24` network of the first 3 octets  |
//! | `/`    | `10.0.0.0/8`         | CIDR block, host bits ignored            |
//! | none   | `203.0.113.5`        | literal string equality                  |
//!
//! Only IPv4 clients can match. Sub-rules that fail to parse are skipped.

use std::net::Ipv4Addr;
use std::str::FromStr;

/// Parsed form of a single IP sub-rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpSubRule {
    Range { start: u32, end: u32 },
    Network { base: u32, prefix: u8 },
    Exact(String),
}

impl IpSubRule {
    /// Parses one trimmed sub-rule, returning `None` when it is malformed.
    pub fn parse(rule: &str) -> Option<Self> {
        if rule.contains('-') {
            let (start, end) = rule.split_once('-')?;
            if end.contains('-') {
                return None;
            }
            return Some(IpSubRule::Range {
                start: dotted_quad_to_u32(start.trim())?,
                end: dotted_quad_to_u32(end.trim())?,
            });
        }

        if rule.contains('*') {
            // Only a trailing `*` octet is understood, always as a /24 block.
            let (network, last) = rule.rsplit_once('.')?;
            if last != "*" || network.contains('*') {
                return None;
            }
            let base = Ipv4Addr::from_str(&format!("{network}.0")).ok()?;
            return Some(IpSubRule::Network {
                base: u32::from(base),
                prefix: 24,
            });
        }

        if rule.contains('/') {
            let (address, prefix) = rule.split_once('/')?;
            let base = Ipv4Addr::from_str(address.trim()).ok()?;
            let prefix = prefix.trim();
            if prefix.is_empty() || !prefix.bytes().all(|byte| byte.is_ascii_digit()) {
                return None;
            }
            let prefix: u8 = prefix.parse().ok()?;
            if prefix > 32 {
                return None;
            }
            return Some(IpSubRule::Network {
                base: u32::from(base),
                prefix,
            });
        }

        Some(IpSubRule::Exact(rule.to_string()))
    }

    /// `raw` is the client string as received, used for literal comparisons.
    pub fn matches(&self, client: Ipv4Addr, raw: &str) -> bool {
        let value = u32::from(client);
        match self {
            IpSubRule::Range { start, end } => *start <= value && value <= *end,
            IpSubRule::Network { base, prefix } => {
                let mask = prefix_mask(*prefix);
                value & mask == base & mask
            }
            IpSubRule::Exact(literal) => literal == raw,
        }
    }
}

/// Whether `client` satisfies any sub-rule of `rule`.
///
/// A client that is not a valid IPv4 address never matches.
pub fn match_ip(client: &str, rule: &str) -> bool {
    let Ok(address) = Ipv4Addr::from_str(client) else {
        return false;
    };

    sub_rules(rule).any(|sub_rule| {
        IpSubRule::parse(sub_rule)
            .map(|parsed| parsed.matches(address, client))
            .unwrap_or(false)
    })
}

/// Iterates the trimmed, non-empty sub-rules of an IP rule.
pub fn sub_rules(rule: &str) -> impl Iterator<Item = &str> {
    rule.split(',').map(str::trim).filter(|part| !part.is_empty())
}

/// Converts four decimal octets (most significant first) into a `u32`.
pub fn dotted_quad_to_u32(value: &str) -> Option<u32> {
    let mut result: u32 = 0;
    let mut count = 0;
    for part in value.split('.') {
        count += 1;
        if count > 4 || part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        let octet: u32 = part.parse().ok()?;
        if octet > 255 {
            return None;
        }
        result = (result << 8) | octet;
    }
    (count == 4).then_some(result)
}

fn prefix_mask(prefix: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive() {
        let rule = "10.0.0.1-10.0.0.10";
        assert!(match_ip("10.0.0.1", rule));
        assert!(match_ip("10.0.0.5", rule));
        assert!(match_ip("10.0.0.10", rule));
        assert!(!match_ip("10.0.0.11", rule));
        assert!(!match_ip("10.0.0.0", rule));
    }

    #[test]
    fn range_spans_octet_boundaries() {
        assert!(match_ip("10.0.1.0", "10.0.0.250 - 10.0.1.5"));
    }

    #[test]
    fn range_with_bad_endpoint_never_matches() {
        assert!(!match_ip("10.0.0.5", "10.0.0.1-10.0.0.256"));
        assert!(!match_ip("10.0.0.5", "garbage-10.0.0.10"));
        assert!(!match_ip("10.0.0.5", "10.0.0-10.0.0.10"));
        assert!(!match_ip("10.0.0.5", "10.0.0.1-10.0.0.7-10.0.0.9"));
    }

    #[test]
    fn wildcard_covers_the_last_octet() {
        let rule = "192.168.1.*";
        assert!(match_ip("192.168.1.0", rule));
        assert!(match_ip("192.168.1.255", rule));
        assert!(!match_ip("192.168.2.1", rule));
    }

    #[test]
    fn wildcard_only_understands_a_trailing_octet() {
        assert!(!match_ip("10.1.2.3", "10.*.*.*"));
        assert!(!match_ip("10.1.2.3", "10.1.*"));
        assert!(!match_ip("10.1.2.3", "10.1.2*"));
        assert_eq!(
            IpSubRule::parse("10.1.2.*"),
            Some(IpSubRule::Network {
                base: u32::from(Ipv4Addr::new(10, 1, 2, 0)),
                prefix: 24,
            })
        );
    }

    #[test]
    fn cidr_ignores_host_bits() {
        assert!(match_ip("10.0.0.200", "10.0.0.0/24"));
        assert!(!match_ip("10.0.1.1", "10.0.0.0/24"));
        assert!(match_ip("10.0.0.200", "10.0.0.77/24"));
        assert!(match_ip("8.8.8.8", "0.0.0.0/0"));
        assert!(match_ip("10.0.0.1", "10.0.0.1/32"));
        assert!(!match_ip("10.0.0.2", "10.0.0.1/32"));
    }

    #[test]
    fn invalid_cidr_never_matches() {
        assert!(!match_ip("999.1.1.1", "999.1.1.1/33"));
        assert!(!match_ip("10.0.0.1", "10.0.0.0/33"));
        assert!(!match_ip("10.0.0.1", "10.0.0.0/"));
        assert!(!match_ip("10.0.0.1", "10.0.0/8"));
    }

    #[test]
    fn exact_match_is_literal() {
        assert!(match_ip("203.0.113.5", "203.0.113.5"));
        assert!(!match_ip("203.0.113.6", "203.0.113.5"));
        assert!(!match_ip("192.168.1.1", "192.168.001.1"));
    }

    #[test]
    fn sub_rules_are_ored_and_bad_ones_skipped() {
        let rule = "999.1.1.1/33, 10.0.0.0/8 ,192.168.1.*";
        assert!(match_ip("10.1.2.3", rule));
        assert!(match_ip("192.168.1.40", rule));
        assert!(!match_ip("172.16.0.1", rule));
    }

    #[test]
    fn non_ipv4_clients_fail_closed() {
        assert!(!match_ip("", "0.0.0.0/0"));
        assert!(!match_ip("::1", "0.0.0.0/0"));
        assert!(!match_ip("unknown", "unknown"));
        assert!(!match_ip("10.0.0.1 ", "10.0.0.0/8"));
    }

    #[test]
    fn empty_rule_matches_nothing() {
        assert!(!match_ip("10.0.0.1", ""));
        assert!(!match_ip("10.0.0.1", " , "));
    }

    #[test]
    fn converts_dotted_quads() {
        assert_eq!(dotted_quad_to_u32("1.0.0.0"), Some(1 << 24));
        assert_eq!(dotted_quad_to_u32("255.255.255.255"), Some(u32::MAX));
        assert_eq!(dotted_quad_to_u32("1.2.3"), None);
        assert_eq!(dotted_quad_to_u32("1.2.3.4.5"), None);
        assert_eq!(dotted_quad_to_u32("1.2.3.-4"), None);
    }
}

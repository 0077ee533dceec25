//! LaunchGate: launch authorization for client applications.
//!
//! A client asks permission to start by reporting its application name,
//! version and address. Authorization rules scoped per application decide,
//! first match wins, whether the launch is granted and which detail payload
//! is released. Granted starts and every stop are recorded as lifecycle
//! events for reporting.
//!
//! # Crates
//!
//! * [`rules`]: version and IP matching plus the first-match rule engine
//! * [`protocol`]: event and API envelope types shared over HTTP
//! * [`common`]: configuration, logging, errors and the SQLite pool
//! * [`gateway`]: the `axum` service with public and administrative routes

pub use launchgate_core as common;
pub use launchgate_gateway as gateway;
pub use launchgate_protocol as protocol;
pub use launchgate_rules as rules;

pub use launchgate_rules::{evaluate, match_ip, match_version, Decision, RuleEngine};

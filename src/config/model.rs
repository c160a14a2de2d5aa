//! Serde data structures for the edgeip configuration file.
//!
//! Contains [`Config`] (the root), [`Defaults`], and [`Middleware`] /
//! [`Plugin`] for the request middleware chain. All types derive
//! `Serialize` and `Deserialize` with `deny_unknown_fields` for strict
//! parsing.

use serde::{Deserialize, Serialize};

use crate::middleware::rename_headers;

const fn default_timeout() -> u64 {
    5000
}

const fn default_true() -> bool {
    true
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_default_defaults(v: &Defaults) -> bool {
    v.timeout == default_timeout() && v.proxy_headers && v.strip_hop_by_hop
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL every request is forwarded to.
    pub upstream: String,

    #[serde(default, skip_serializing_if = "is_default_defaults")]
    pub defaults: Defaults,

    /// Applied in order: the first entry sees the request first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<Middleware>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub proxy_headers: bool,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub strip_hop_by_hop: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            proxy_headers: default_true(),
            strip_hop_by_hop: default_true(),
        }
    }
}

/// A named middleware instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Middleware {
    pub name: String,
    pub plugin: Plugin,
}

/// Which plugin a middleware instance runs, written as a single-key map
/// (`rename_headers: {}`) so every config format spells it the same way.
///
/// Exactly one key must be set; [`validate`](super::validation::validate)
/// reports an empty selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Plugin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_headers: Option<rename_headers::Config>,
}

impl Plugin {
    /// Config key of the selected plugin, `None` when nothing is selected.
    #[must_use]
    pub const fn kind(&self) -> Option<&'static str> {
        if self.rename_headers.is_some() {
            Some("rename_headers")
        } else {
            None
        }
    }
}

impl From<rename_headers::Config> for Plugin {
    fn from(config: rename_headers::Config) -> Self {
        Self {
            rename_headers: Some(config),
        }
    }
}

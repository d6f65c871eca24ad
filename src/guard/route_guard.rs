use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::SessionUser;
use crate::session::Readiness;

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_home_path() -> String {
    "/".to_string()
}

fn default_public_prefixes() -> Vec<String> {
    vec!["/share".to_string()]
}

fn default_ready_timeout_ms() -> u64 {
    5000
}

/// Paths the guard redirects between, and which paths need no session.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct GuardConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_home_path")]
    pub home_path: String,
    #[serde(default = "default_public_prefixes")]
    pub public_prefixes: Vec<String>,
    /// How long a navigation may wait for the session to be known.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            login_path: default_login_path(),
            home_path: default_home_path(),
            public_prefixes: default_public_prefixes(),
            ready_timeout_ms: default_ready_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(String),
}

/// Decides, without side effects, whether a navigation may proceed.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_path: String,
    home_path: String,
    public_prefixes: Vec<String>,
}

impl RouteGuard {
    pub fn new(config: &GuardConfig) -> Self {
        RouteGuard {
            login_path: config.login_path.clone(),
            home_path: config.home_path.clone(),
            public_prefixes: config.public_prefixes.clone(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// True when `path` starts with one of the public prefixes. This is a
    /// plain string match: `/share` also covers `/shared` and `/share-links`.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Public paths always pass; otherwise signed-out users go to the login
    /// page and signed-in users are sent home from it.
    pub fn decide(&self, target_path: &str, session: Option<&SessionUser>) -> Decision {
        if self.is_public(target_path) {
            return Decision::Allow;
        }
        let on_login = target_path == self.login_path;
        match session {
            None if !on_login => Decision::RedirectTo(self.login_path.clone()),
            Some(_) if on_login => Decision::RedirectTo(self.home_path.clone()),
            _ => Decision::Allow,
        }
    }

    /// Like [`RouteGuard::decide`], but an unresolved session counts as
    /// signed out.
    pub fn decide_with(&self, target_path: &str, readiness: &Readiness) -> Decision {
        self.decide(target_path, readiness.session())
    }
}

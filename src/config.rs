use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{LdapdexError, Result};
use crate::models::SearchScope;

/// Object class clause ANDed into every group search
pub const DEFAULT_GROUP_OBJECT_CLASS: &str = "groupOfNames";

pub const ENV_LDAP_URI: &str = "alt_ldap_uri";
pub const ENV_BIND_DN: &str = "alt_bind_dn";
pub const ENV_BIND_PASSWORD: &str = "alt_bindpasswd";
pub const ENV_BASE_DN: &str = "alt_base_dn";
pub const ENV_TIMEOUT_SECS: &str = "LDAPDEX_TIMEOUT_SECS";

/// Connection and search settings for the group directory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub uri: String,
    pub bind_dn: String,
    pub bind_password: String,
    pub base_dn: String,
    /// Base for group searches, falls back to `base_dn` when empty
    pub groups_base: String,
    pub groups_scope: SearchScope,
    pub group_object_class: String,
    pub timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            uri: "ldap://localhost:389".to_string(),
            bind_dn: String::new(),
            bind_password: String::new(),
            base_dn: String::new(),
            groups_base: String::new(),
            groups_scope: SearchScope::Subtree,
            group_object_class: DEFAULT_GROUP_OBJECT_CLASS.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl DirectoryConfig {
    /// Create a configuration for the given server and search base
    pub fn new(uri: impl Into<String>, base_dn: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            base_dn: base_dn.into(),
            ..Default::default()
        }
    }

    /// Load the configuration from the process environment.
    ///
    /// Unset variables keep their defaults; a malformed timeout is an error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(uri) = env::var(ENV_LDAP_URI) {
            config.uri = uri;
        }
        if let Ok(dn) = env::var(ENV_BIND_DN) {
            config.bind_dn = dn;
        }
        if let Ok(pw) = env::var(ENV_BIND_PASSWORD) {
            config.bind_password = pw;
        }
        if let Ok(base) = env::var(ENV_BASE_DN) {
            config.base_dn = base;
        }
        if let Ok(secs) = env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                LdapdexError::Config(format!(
                    "{} must be a number of seconds, got {:?}",
                    ENV_TIMEOUT_SECS, secs
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_bind(mut self, bind_dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = bind_dn.into();
        self.bind_password = password.into();
        self
    }

    pub fn with_groups_base(mut self, base: impl Into<String>) -> Self {
        self.groups_base = base.into();
        self
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.groups_scope = scope;
        self
    }

    pub fn with_group_object_class(mut self, object_class: impl Into<String>) -> Self {
        self.group_object_class = object_class.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Effective base for group searches
    pub fn groups_base(&self) -> &str {
        if self.groups_base.is_empty() {
            &self.base_dn
        } else {
            &self.groups_base
        }
    }

    /// `(objectClass=...)` clause restricting results to group entries
    pub fn object_class_filter(&self) -> String {
        format!(
            "(objectClass={})",
            ldap3::ldap_escape(self.group_object_class.as_str())
        )
    }
}

/// Posting list index settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexSettings {
    pub initial_capacity: usize,
    /// Number of map shards, must be a power of two
    pub shard_amount: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            shard_amount: (num_cpus::get() * 4).next_power_of_two(),
        }
    }
}

impl IndexSettings {
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_shard_amount(mut self, shards: usize) -> Self {
        self.shard_amount = shards.max(2).next_power_of_two();
        self
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::query::SearchScope;

/// Credentials used to bind before a search
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindCredentials {
    pub dn: String,
    pub password: String,
}

impl BindCredentials {
    pub fn new(dn: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            password: password.into(),
        }
    }
}

/// Request handed to a directory-search backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub base: String,
    pub scope: SearchScope,
    pub filter: String,
    pub attrs: Vec<String>,              // Empty means all attributes
    pub bind: Option<BindCredentials>,   // None uses the backend's own bind
    pub timeout: Option<Duration>,
}

impl SearchRequest {
    pub fn new(base: impl Into<String>, scope: SearchScope, filter: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            scope,
            filter: filter.into(),
            attrs: Vec::new(),
            bind: None,
            timeout: None,
        }
    }

    pub fn with_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs = attrs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_bind(mut self, bind: Option<BindCredentials>) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One entry of a raw search response
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub dn: String,
    pub attributes: Vec<(String, Vec<String>)>,
}

impl RawEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attr<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Values of an attribute, compared case-insensitively
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }
}

/// Raw response of a directory-search backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawSearchResult {
    /// The search failed; the message is surfaced to callers
    Exception(String),
    Entries(Vec<RawEntry>),
}

impl RawSearchResult {
    pub fn exception(message: impl Into<String>) -> Self {
        RawSearchResult::Exception(message.into())
    }

    pub fn size(&self) -> usize {
        match self {
            RawSearchResult::Exception(_) => 0,
            RawSearchResult::Entries(entries) => entries.len(),
        }
    }
}

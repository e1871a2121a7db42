use std::time::{Duration, Instant};

use ldap3::{LdapConn, LdapConnSettings, SearchEntry};
use tracing::debug;

use crate::config::DirectoryConfig;
use crate::directory::filter::guid_to_filter_string;
use crate::directory::search::DirectorySearch;
use crate::error::{LdapdexError, Result};
use crate::models::{BindCredentials, RawEntry, RawSearchResult, SearchRequest};

/// Directory backend talking to an LDAP server through a synchronous
/// `ldap3` connection, opened per search.
pub struct LdapDirectory {
    uri: String,
    bind: Option<BindCredentials>,
    timeout: Duration,
}

impl LdapDirectory {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            bind: None,
            timeout: DirectoryConfig::default().timeout,
        }
    }

    pub fn from_config(config: &DirectoryConfig) -> Self {
        let bind = if config.bind_dn.is_empty() {
            None
        } else {
            Some(BindCredentials::new(&config.bind_dn, &config.bind_password))
        };
        Self {
            uri: config.uri.clone(),
            bind,
            timeout: config.timeout,
        }
    }

    pub fn with_bind(mut self, bind: BindCredentials) -> Self {
        self.bind = Some(bind);
        self
    }

    /// Overall time allowed for one search; zero means no limit
    fn search_timeout(&self, request: &SearchRequest) -> Option<Duration> {
        request
            .timeout
            .or(Some(self.timeout))
            .filter(|timeout| !timeout.is_zero())
    }

    fn connect(&self, timeout: Option<Duration>) -> Result<LdapConn> {
        let mut settings = LdapConnSettings::new();
        if let Some(timeout) = timeout {
            settings = settings.set_conn_timeout(timeout);
        }
        Ok(LdapConn::with_settings(settings, &self.uri)?)
    }

    fn run(&self, request: &SearchRequest) -> Result<Vec<RawEntry>> {
        let deadline = self
            .search_timeout(request)
            .map(|timeout| Instant::now() + timeout);
        let mut ldap = self.connect(remaining(deadline)?)?;

        if let Some(bind) = request.bind.as_ref().or(self.bind.as_ref()) {
            if !bind.dn.is_empty() {
                if let Some(left) = remaining(deadline)? {
                    ldap.with_timeout(left);
                }
                ldap.simple_bind(&bind.dn, &bind.password)?.success()?;
            }
        }

        let attrs: Vec<&str> = if request.attrs.is_empty() {
            vec!["*"]
        } else {
            request.attrs.iter().map(String::as_str).collect()
        };

        debug!(base = %request.base, filter = %request.filter, "ldap search");
        if let Some(left) = remaining(deadline)? {
            ldap.with_timeout(left);
        }
        let (entries, _) = ldap
            .search(&request.base, request.scope.into(), &request.filter, attrs)?
            .success()?;

        if let Err(e) = ldap.unbind() {
            debug!(error = %e, "ldap unbind failed");
        }

        Ok(entries
            .into_iter()
            .map(|entry| to_raw_entry(SearchEntry::construct(entry)))
            .collect())
    }
}

/// Time left before `deadline`, shared by the connect, bind and search
/// phases. `None` means no limit.
fn remaining(deadline: Option<Instant>) -> Result<Option<Duration>> {
    match deadline {
        None => Ok(None),
        Some(deadline) => {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                Err(LdapdexError::Directory("timeout".to_string()))
            } else {
                Ok(Some(left))
            }
        }
    }
}

/// Binary attributes are rendered in their filter-escaped `\xx` form.
fn to_raw_entry(entry: SearchEntry) -> RawEntry {
    let mut attributes: Vec<(String, Vec<String>)> = entry.attrs.into_iter().collect();
    attributes.extend(entry.bin_attrs.into_iter().map(|(name, values)| {
        let rendered = values.iter().map(|v| guid_to_filter_string(v)).collect();
        (name, rendered)
    }));
    attributes.sort_by(|a, b| a.0.cmp(&b.0));

    RawEntry {
        dn: entry.dn,
        attributes,
    }
}

impl DirectorySearch for LdapDirectory {
    fn search(&self, request: &SearchRequest) -> Result<RawSearchResult> {
        self.run(request).map(RawSearchResult::Entries)
    }
}

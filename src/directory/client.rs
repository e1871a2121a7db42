use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};
use tracing::{debug, warn};

use crate::config::DirectoryConfig;
use crate::directory::dn::leading_rdn_value;
use crate::directory::filter::{membership_filter, plan_search, FilterPlan};
use crate::directory::search::DirectorySearch;
use crate::error::{LdapdexError, Result};
use crate::metrics::LdapdexMetrics;
use crate::models::{
    BindCredentials, GroupField, GroupQuery, GroupRecord, GroupSummary, RawSearchResult,
    SearchRequest,
};

/// Client for group lookups against an injected directory backend.
///
/// Failures before a search is issued are returned as errors. Failures of
/// the search itself, timeouts included, come back as a single exception
/// record and a warning.
pub struct GroupDirectoryClient {
    directory: Arc<dyn DirectorySearch>,
    config: DirectoryConfig,
    metrics: Option<LdapdexMetrics>,
}

impl GroupDirectoryClient {
    pub fn new<D: DirectorySearch + 'static>(directory: D, config: DirectoryConfig) -> Self {
        Self::from_arc(Arc::new(directory), config)
    }

    pub fn from_arc(directory: Arc<dyn DirectorySearch>, config: DirectoryConfig) -> Self {
        Self {
            directory,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: LdapdexMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Build the filter, base and scope for a query without searching
    pub fn build_filter(&self, query: &GroupQuery) -> Result<FilterPlan> {
        plan_search(query, &self.config)
    }

    /// Search for groups matching `query`.
    ///
    /// `requested_attrs` limits the attributes fetched and kept in each
    /// record; empty means all of them.
    pub fn search_groups(
        &self,
        query: &GroupQuery,
        requested_attrs: &[&str],
    ) -> Result<Vec<GroupRecord>> {
        let plan = self.build_filter(query)?;
        let request = SearchRequest::new(plan.base, plan.scope, plan.filter.clone())
            .with_attrs(requested_attrs.iter().copied())
            .with_bind(self.bind());

        let raw = self.execute("search_groups", request);
        Ok(normalize_results(raw, requested_attrs, &plan.filter))
    }

    /// List groups, or only the groups `member` belongs to, as `(cn, dn)`
    /// pairs sorted by name.
    ///
    /// Entries without a `cn` value take the value of their leading RDN.
    pub fn get_groups(&self, member: Option<&str>) -> Vec<GroupSummary> {
        let filter = membership_filter(&self.config.object_class_filter(), member);
        let request = SearchRequest::new(
            self.config.groups_base(),
            self.config.groups_scope,
            filter.clone(),
        )
        .with_attrs(["cn"])
        .with_bind(self.bind());

        match self.execute("get_groups", request) {
            RawSearchResult::Exception(message) => {
                warn!(exception = %message, filter = %filter, "get_groups exception");
                vec![GroupSummary::new("", message)]
            }
            RawSearchResult::Entries(entries) => {
                let mut groups: Vec<GroupSummary> = entries
                    .into_iter()
                    .map(|entry| {
                        let cn = entry
                            .values("cn")
                            .and_then(|values| values.first().cloned())
                            .or_else(|| leading_rdn_value(&entry.dn))
                            .unwrap_or_default();
                        GroupSummary::new(cn, entry.dn)
                    })
                    .collect();
                groups.sort();
                groups
            }
        }
    }

    /// Same listing as [`get_groups`](Self::get_groups), reduced to one
    /// column.
    ///
    /// An exception still yields a single value: the message for
    /// [`GroupField::Dn`], an empty string for [`GroupField::Cn`].
    pub fn get_group_values(&self, member: Option<&str>, field: GroupField) -> Vec<String> {
        self.get_groups(member)
            .into_iter()
            .map(|group| group.field(field).to_string())
            .collect()
    }

    fn bind(&self) -> Option<BindCredentials> {
        if self.config.bind_dn.is_empty() {
            None
        } else {
            Some(BindCredentials::new(
                &self.config.bind_dn,
                &self.config.bind_password,
            ))
        }
    }

    fn execute(&self, kind: &str, request: SearchRequest) -> RawSearchResult {
        let start = Instant::now();
        let timeout = self.config.timeout;
        debug!(kind, base = %request.base, filter = %request.filter, "directory search");

        let request = if timeout.is_zero() {
            request
        } else {
            request.with_timeout(timeout)
        };
        let result = search_with_timeout(self.directory.clone(), request, timeout)
            .unwrap_or_else(|e| RawSearchResult::Exception(e.to_exception_message()));

        if let Some(metrics) = &self.metrics {
            metrics.record_search(kind, start.elapsed().as_secs_f64());
            if matches!(result, RawSearchResult::Exception(_)) {
                metrics.record_search_error();
            }
        }
        result
    }
}

/// Run a search on a worker thread and give up after `timeout`.
///
/// A zero timeout runs the search inline with no deadline. A timed out
/// worker is left to finish on its own; its result is discarded. Backends
/// given the same timeout bound their whole search by it, so a detached
/// worker ends shortly after the deadline.
fn search_with_timeout(
    directory: Arc<dyn DirectorySearch>,
    request: SearchRequest,
    timeout: Duration,
) -> Result<RawSearchResult> {
    if timeout.is_zero() {
        return directory.search(&request);
    }

    let (tx, rx) = channel::bounded(1);
    thread::Builder::new()
        .name("ldapdex-search".to_string())
        .spawn(move || {
            let _ = tx.send(directory.search(&request));
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(LdapdexError::Directory("timeout".to_string())),
        Err(RecvTimeoutError::Disconnected) => Err(LdapdexError::Directory(
            "directory search aborted".to_string(),
        )),
    }
}

/// Turn a raw search response into group records.
///
/// An exception becomes exactly one record with the message as `dn` and
/// `cn` set to `n/a`, and is logged together with `attempted_filter`.
/// Otherwise each entry yields one record, in response order, holding the
/// first value of every non-empty attribute.
pub fn normalize_results(
    raw: RawSearchResult,
    requested_attrs: &[&str],
    attempted_filter: &str,
) -> Vec<GroupRecord> {
    match raw {
        RawSearchResult::Exception(message) => {
            warn!(exception = %message, "search_groups exception");
            warn!(filter = %attempted_filter, "search_groups searched");
            vec![GroupRecord::exception(message)]
        }
        RawSearchResult::Entries(entries) => entries
            .into_iter()
            .map(|entry| {
                let attributes: BTreeMap<String, String> = entry
                    .attributes
                    .into_iter()
                    .filter(|(name, _)| is_requested(name, requested_attrs))
                    .filter_map(|(name, values)| values.into_iter().next().map(|v| (name, v)))
                    .collect();
                GroupRecord::new(entry.dn, attributes)
            })
            .collect(),
    }
}

fn is_requested(name: &str, requested_attrs: &[&str]) -> bool {
    requested_attrs.is_empty()
        || requested_attrs
            .iter()
            .any(|attr| *attr == "*" || attr.eq_ignore_ascii_case(name))
}

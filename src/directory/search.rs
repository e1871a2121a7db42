use std::sync::Arc;

use crate::error::Result;
use crate::models::{RawSearchResult, SearchRequest};

/// Capability to run a search against a hierarchical directory.
///
/// Implementations may return `Ok(RawSearchResult::Exception(..))` or an
/// `Err`; the group client treats both as a degraded result.
pub trait DirectorySearch: Send + Sync {
    fn search(&self, request: &SearchRequest) -> Result<RawSearchResult>;
}

impl<T: DirectorySearch + ?Sized> DirectorySearch for Arc<T> {
    fn search(&self, request: &SearchRequest) -> Result<RawSearchResult> {
        (**self).search(request)
    }
}

impl<T: DirectorySearch + ?Sized> DirectorySearch for Box<T> {
    fn search(&self, request: &SearchRequest) -> Result<RawSearchResult> {
        (**self).search(request)
    }
}

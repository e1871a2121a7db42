pub mod query;
pub mod record;
pub mod search;

pub use query::{GroupAttribute, GroupQuery, SearchScope, SearchTerm};
pub use record::{GroupField, GroupRecord, GroupSummary, NOT_APPLICABLE};
pub use search::{BindCredentials, RawEntry, RawSearchResult, SearchRequest};

/// Document identifier stored in posting lists
pub type DocumentId = u64;

//! LDAP group directory client
//!
//! - `filter`: search filter construction from a [`GroupQuery`](crate::models::GroupQuery)
//! - `dn`: distinguished name helpers
//! - `search`: the backend capability the client is composed with
//! - `ldap`: `ldap3` backed implementation of that capability
//! - `client`: searches, group listing, result normalization

pub mod client;
pub mod dn;
pub mod filter;
pub mod ldap;
pub mod search;

pub use client::{normalize_results, GroupDirectoryClient};
pub use dn::explode_dn;
pub use filter::{build_filter, guid_to_filter_string, plan_search, FilterPlan};
pub use ldap::LdapDirectory;
pub use search::DirectorySearch;

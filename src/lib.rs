pub mod config;
pub mod directory;
pub mod error;
pub mod index;
pub mod marshal;
pub mod metrics;
pub mod models;

pub use config::{DirectoryConfig, IndexSettings};
pub use directory::{DirectorySearch, GroupDirectoryClient, LdapDirectory};
pub use error::{LdapdexError, Result};
pub use index::PostingIndex;
pub use metrics::LdapdexMetrics;
pub use models::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Posting list index
//!
//! Maps normalized tokens to sets of document ids. Tokens that are not valid
//! UTF-8 are folded to ASCII before use, and rows stored as a single id by
//! older releases are upgraded to sets on their next insert.

pub mod normalize;
pub mod posting_index;
pub mod row;
pub mod snapshot;

pub use normalize::{fold_to_ascii, normalize_token, TokenKey};
pub use posting_index::PostingIndex;
pub use row::{IndexRow, RowInsert};
pub use snapshot::{IndexSnapshot, SNAPSHOT_VERSION};

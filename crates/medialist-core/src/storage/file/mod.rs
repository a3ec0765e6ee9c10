//! Flat-file backend
//!
//! Each store owns one delimited file and one local cache. Inserts
//! append a line; removals rewrite the file through a temp file and an
//! atomic rename, so a crash leaves either the old or the new file in
//! place and never a partial one.

pub mod entity;
pub mod io;
pub mod list;
pub mod membership;
pub mod record;

pub use entity::FileEntityStore;
pub use list::FileListStore;
pub use membership::FileMembershipStore;
pub use record::{RecordFormat, DEFAULT_DELIMITER};

//! Database access for the registry service
//!
//! Schema creation lives in certsync-common so tests and other services
//! share one definition; this module holds the store operations.

pub mod certificates;
pub mod directory;
pub mod qualifications;

pub use directory::DirectoryReader;

//! star-follower - mirror the GitHub stars of the accounts you follow
//!
//! The sync engine walks the public GitHub REST API page by page, reconciles
//! every starred repository against a local SQLite store and commits once per
//! followed account. The store can then be exported as a report.
//!
//! ## Modules
//!
//! - [`store`]: SQLite record store with an uncommitted staging area
//! - [`paginate`]: sequential page walker over collection endpoints
//! - [`ingest`]: page-to-record conversion and dedup rules
//! - [`follow`]: resolution of the accounts to mirror
//! - [`sync`]: per-account orchestration
//! - [`export`]: Excel, JSON, HTML and Markdown reports
//! - [`config`]: configuration management and parsing

pub mod config;
pub mod error;
pub mod export;
pub mod follow;
pub mod github;
pub mod ingest;
pub mod model;
pub mod paginate;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::{ParseError, RemoteError, StoreError, SyncError};
pub use export::{export, ExportFormat, ExportOptions};
pub use github::GitHubClient;
pub use model::StarRecord;
pub use store::{SortColumn, StarStore};
pub use sync::{SyncEngine, SyncOutcome, SyncSummary};

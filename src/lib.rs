//! drive_keeper - take ownership of Drive files owned by someone else.
//!
//! The maintenance job lists every file visible to a principal, finds the
//! ones another account owns, and replaces each with a copy the principal
//! owns. Two modes are available:
//! - mirror: copy foreign files into a new `Backup_<yyyyMMddHHmm>` folder
//! - rename: rename the original to `backupxx_<name>` and copy it back
//!
//! # Example
//!
//! ```no_run
//! use drive_keeper::driver::{self, Config, Mode};
//! use drive_keeper::{RetryPolicy, Wildcard};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config {
//!         principal: "me@example.org".to_string(),
//!         client_secret: "client_secret.json".into(),
//!         credential_store: "credentials".into(),
//!         mode: Mode::RenameInPlace {
//!             wildcard: Wildcard::parse("report~"),
//!         },
//!         retry: RetryPolicy::default(),
//!     };
//!
//!     let report = driver::run(&config, &CancellationToken::new()).await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod classify;
pub mod client;
pub mod credential_store;
pub mod driver;
pub mod enumerator;
pub mod error;
pub mod executor;
pub mod folder_ref;
pub mod gateway;
pub mod graph;
pub mod logging;
pub mod models;

// Re-exports for convenience
pub use auth::Authenticator;
pub use classify::{Classifier, Wildcard};
pub use client::DriveClient;
pub use credential_store::CredentialStore;
pub use error::{DriveError, Result};
pub use executor::RunReport;
pub use gateway::{DriveGateway, Page, RetryPolicy, Retrying};
pub use graph::Graph;
pub use models::FileRecord;

//! An async Rust client for the [data.gouv.fr](https://www.data.gouv.fr) API.
//!
//! The crate covers the dataset maintenance flow of the Python `DataGouvPy`
//! wrapper: read a dataset, push a table as a CSV resource, replace or delete
//! that resource, and edit dataset metadata.
//!
//! ## Quick start
//! - Configure authentication via environment variables (`DATAGOUV_URL`,
//!   `DATAGOUV_API_KEY`) or a `.datagouvrc` file (current directory or home
//!   directory), or build a [`ClientConfig`] yourself.
//! - Call the operations on [`Client::datasets`]. Each one is bounded by the
//!   client deadline (30 seconds unless configured otherwise).
//!
//! ```no_run
//! use datagouv::{Client, Table};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = Client::from_env()?;
//! let table = Table::new(["region", "restaurants"])
//!     .with_row(["Bretagne", "42"])
//!     .with_row(["Normandie", "17"]);
//!
//! let resource = client
//!     .datasets()
//!     .upload_resource("5f1e0c3b8b4c4154b6d0ec7b", &table, "report.csv", "Monthly report")
//!     .await?;
//! println!("uploaded {}", resource["id"]);
//! # Ok(())
//! # }
//! ```
//!
//! Every failure is a [`Error`]; its message always starts with
//! `API call failed`.

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod metadata;
mod table;
mod transport;
mod util;

pub use client::{Client, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, Datasets};
pub use error::{Error, Result};
pub use metadata::ResourceMetadata;
pub use table::Table;
pub use transport::{API_KEY_HEADER, CLIENT_USER_AGENT, Transport};

//! Access layer for the remote tabular store.
//!
//! [`TableSource`] is the seam the rest of the crate consumes: a named
//! collection in, an unordered sequence of records out. The production
//! implementation is [`SupabaseSource`]; tests substitute their own.

pub mod config;
pub mod supabase;

pub use config::StoreConfig;
pub use supabase::SupabaseSource;

use thiserror::Error;

use crate::model::types::Table;

/// Failure to reach or read the backing store.
///
/// Deliberately distinct from an empty-but-successful fetch: a table that
/// exists but holds no rows is `Ok` with an empty [`Table`], never an
/// error, and a connectivity problem is never a silent empty result.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required credential env var is unset. Surfaces on first use, not
    /// at process start.
    #[error("{0} is not set — configure the store connection first")]
    MissingCredentials(&'static str),

    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Connect(#[source] reqwest::Error),

    /// The request never produced a response (unreachable host, timeout).
    #[error("request for table '{table}' failed: {source}")]
    Transport {
        table: String,
        #[source]
        source: reqwest::Error,
    },

    /// The store answered with a non-success status (including credential
    /// rejection).
    #[error("store returned HTTP {status} for table '{table}'")]
    Status { table: String, status: u16 },

    /// The response body was not valid JSON.
    #[error("could not decode response for table '{table}': {source}")]
    Decode {
        table: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A named-collection fetcher over some remote tabular store.
pub trait TableSource: Send + Sync {
    /// Fetch every record of `table`.
    ///
    /// Empty tables are a normal `Ok`; only connectivity or credential
    /// problems are errors. Implementations must return all rows or an
    /// error — never a partial result.
    fn get(&self, table: &str) -> Result<Table, StoreError>;
}

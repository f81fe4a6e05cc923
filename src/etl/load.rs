//! Loader trait for writing data to a destination

use async_trait::async_trait;
use eyre::Result;

/// Loader trait for loading data to a destination
///
/// `load` returns `Err` only for failures that must abort the run. Failures
/// the loader recovers from belong in the `Report`.
#[async_trait]
pub trait Loader: Send + Sync {
    /// The data to load
    type Input: Send;

    /// What the loader reports back once it is done
    type Report: Send;

    /// Load the input to the destination
    ///
    /// # Errors
    /// Returns an error if loading cannot proceed (connection, DDL, schema)
    async fn load(&self, input: Self::Input) -> Result<Self::Report>;
}

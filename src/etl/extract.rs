//! Extractor trait for pulling a table out of a source

use eyre::Result;

/// Extractor trait for materializing a source into memory
///
/// # Example
/// ```no_run
/// use pg2teradata::etl::Extractor;
/// use pg2teradata::table::TableSnapshot;
/// use eyre::Result;
///
/// struct EmptySource;
///
/// impl Extractor for EmptySource {
///     type Output = TableSnapshot;
///
///     async fn extract(&self) -> Result<Self::Output> {
///         Ok(TableSnapshot::default())
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// What the extractor produces
    type Output: Send;

    /// Extract everything from the source
    ///
    /// # Errors
    /// Returns an error if the source cannot be reached or read
    fn extract(&self) -> impl std::future::Future<Output = Result<Self::Output>> + Send;
}

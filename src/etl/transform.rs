//! Transformer trait for in-memory rewrites

use eyre::Result;

/// Transformer trait for rewriting extracted data before load
pub trait Transformer: Send + Sync {
    /// Input type
    type Input: Send;

    /// Output type after transformation
    type Output: Send;

    /// Transform the input
    ///
    /// # Errors
    /// Returns an error if a value cannot be converted
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
}

//! Extract, Transform, Load abstractions
//!
//! A replication run is one [`Pipeline`]: an [`Extractor`] materializes the
//! source table, a [`Transformer`] rewrites it in memory, and a [`Loader`]
//! writes it to the destination and reports what happened.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::{Pipeline, PipelineRun, RowCount};
pub use transform::Transformer;

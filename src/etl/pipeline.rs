//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use eyre::Result;
use std::time::{Duration, Instant};

/// Anything that can say how many rows it carries
pub trait RowCount {
    fn row_count(&self) -> usize;
}

impl<T> RowCount for Vec<T> {
    fn row_count(&self) -> usize {
        self.len()
    }
}

impl RowCount for crate::table::TableSnapshot {
    fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// What a completed pipeline run hands back
#[derive(Debug)]
pub struct PipelineRun<R> {
    /// Rows produced by the extractor
    pub extracted: usize,
    /// The loader's report
    pub report: R,
    /// Wall-clock time from the caller's start instant to the end of load
    pub elapsed: Duration,
}

/// ETL Pipeline that runs Extract, Transform, and Load once, in order
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Output)
/// - `L`: Loader type (must load T::Output)
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    E::Output: RowCount,
    T: Transformer<Input = E::Output>,
    L: Loader<Input = T::Output>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract from source
    /// 2. Transform in memory
    /// 3. Load to destination
    ///
    /// # Errors
    /// Returns an error if any stage fails in a way the stage itself does not recover from
    pub async fn run(&self) -> Result<PipelineRun<L::Report>> {
        self.run_since(Instant::now()).await
    }

    /// Run the pipeline, timing it from `started` rather than from now
    ///
    /// Lets the caller count its own setup in the reported elapsed time.
    pub async fn run_since(&self, started: Instant) -> Result<PipelineRun<L::Report>> {
        log::info!("Starting ETL pipeline");

        log::debug!("Extracting from source...");
        let extracted = self.extractor.extract().await?;
        let count = extracted.row_count();
        log::info!("Extracted {} row(s)", count);

        log::debug!("Transforming...");
        let transformed = self.transformer.transform(extracted)?;

        log::debug!("Loading to destination...");
        let report = self.loader.load(transformed).await?;

        Ok(PipelineRun {
            extracted: count,
            report,
            elapsed: started.elapsed(),
        })
    }
}

/// Batched trimming and marker annotation
///
/// Walks a read store in fixed-size, offset-addressed batches. Every read of
/// a batch gets its clamped trim bounds and marker count computed (in
/// parallel), then the whole batch is written in one atomic store call
/// before the next batch is fetched.
use crate::bio::trimming::FORWARD_PRIMER_OFFSET;
use crate::bio::{MarkerScanner, QualityTrimmer, Read, ReadKey, TrimBounds};
use crate::core::config::Config;
use crate::storage::traits::{columns, ColumnValue, Columns, ReadStore};
use crate::utils::parallel::chunk_size_for_parallelism;
use crate::utils::progress::create_progress_bar;
use crate::{AmpliclusterError, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Per-read result of the annotation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadAnnotation {
    pub bounds: TrimBounds,
    pub marker_count: usize,
    pub malformed: bool,
}

impl ReadAnnotation {
    fn skipped() -> Self {
        Self {
            bounds: TrimBounds::Undefined,
            marker_count: 0,
            malformed: true,
        }
    }

    /// Store cells for this annotation. Undefined bounds are written as nulls.
    pub fn to_columns(&self) -> Columns {
        let (start, end) = match self.bounds {
            TrimBounds::Region { start, end } => (Some(start as i64), Some(end as i64)),
            TrimBounds::Undefined => (None, None),
        };
        let mut cells = Columns::new();
        cells.insert(columns::TRIM_START.to_string(), ColumnValue::from(start));
        cells.insert(columns::TRIM_END.to_string(), ColumnValue::from(end));
        cells.insert(
            columns::MARKER_COUNT.to_string(),
            ColumnValue::Integer(self.marker_count as i64),
        );
        cells
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub batches: usize,
    pub processed: usize,
    pub malformed: usize,
    pub marker_positive: usize,
}

pub struct BatchOrchestrator {
    trimmer: QualityTrimmer,
    scanner: MarkerScanner,
    primer_offset: usize,
    silent: bool,
    processed: AtomicUsize,
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("trimmer", &self.trimmer)
            .field("scanner", &self.scanner)
            .field("primer_offset", &self.primer_offset)
            .field("processed", &self.processed())
            .finish()
    }
}

impl BatchOrchestrator {
    pub fn new(trimmer: QualityTrimmer, scanner: MarkerScanner) -> Self {
        Self {
            trimmer,
            scanner,
            primer_offset: FORWARD_PRIMER_OFFSET,
            silent: false,
            processed: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let trimmer = QualityTrimmer::new(config.trimming.threshold, config.trimming.window_width)?;
        let pattern = config.marker.require_pattern()?;
        let scanner = MarkerScanner::new(pattern.as_bytes(), config.marker.params())?;
        Ok(Self::new(trimmer, scanner)
            .with_primer_offset(config.trimming.primer_offset)
            .with_silent(config.batch.silent))
    }

    pub fn with_primer_offset(mut self, offset: usize) -> Self {
        self.primer_offset = offset;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Reads processed so far, across every run of this orchestrator.
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    /// Trim bounds and marker count for one read.
    ///
    /// A malformed probability sequence is not an error: the read is reported
    /// with undefined bounds and no markers. Matcher failures are returned.
    pub fn annotate(&self, read: &Read) -> Result<ReadAnnotation> {
        if let Err(reason) = read.validate_probabilities() {
            let err = AmpliclusterError::MalformedProbabilities {
                read: read.key.to_string(),
                reason,
            };
            tracing::warn!("Skipping read: {}", err);
            return Ok(ReadAnnotation::skipped());
        }

        let raw = self.trimmer.trim(&read.error_probs);
        let bounds = TrimBounds::clamp(raw, self.primer_offset);
        let marker_count = self.scanner.count_matches(read)?;

        Ok(ReadAnnotation {
            bounds,
            marker_count,
            malformed: false,
        })
    }

    /// Annotates one fetched batch, in fetch order.
    pub fn annotate_batch(&self, reads: &[Read]) -> Result<Vec<ReadAnnotation>> {
        let min_len = chunk_size_for_parallelism(reads.len(), 0);
        reads
            .par_iter()
            .with_min_len(min_len)
            .map(|read| self.annotate(read))
            .collect()
    }

    /// Annotates every read of the store, or of one sample.
    ///
    /// Each batch is written atomically after all of its reads are computed;
    /// a matcher failure aborts the run before that batch is written.
    pub fn run<S: ReadStore + ?Sized>(
        &self,
        store: &mut S,
        sample: Option<&str>,
        batch_size: usize,
    ) -> Result<BatchSummary> {
        if batch_size == 0 {
            return Err(AmpliclusterError::InvalidInput(
                "batch size must be positive".to_string(),
            ));
        }

        let total = store.count(sample)?;
        tracing::info!(
            "Annotating {} reads{} in batches of {}",
            total,
            sample.map(|s| format!(" of sample {}", s)).unwrap_or_default(),
            batch_size
        );
        let pb = create_progress_bar(total as u64, "Annotating reads", self.silent);

        let mut summary = BatchSummary::default();
        let mut offset = 0;
        while offset < total {
            let _span = tracing::info_span!("batch", offset).entered();

            let reads = store.fetch_batch(sample, offset, batch_size)?;
            if reads.is_empty() {
                break;
            }

            let annotations = self.annotate_batch(&reads)?;
            let updates: Vec<(ReadKey, Columns)> = reads
                .iter()
                .zip(&annotations)
                .map(|(read, annotation)| (read.key.clone(), annotation.to_columns()))
                .collect();
            store.append_batch(&updates)?;

            let malformed = annotations.iter().filter(|a| a.malformed).count();
            let positive = annotations.iter().filter(|a| a.marker_count > 0).count();
            summary.batches += 1;
            summary.processed += reads.len();
            summary.malformed += malformed;
            summary.marker_positive += positive;

            self.processed.fetch_add(reads.len(), Ordering::Relaxed);
            pb.inc(reads.len() as u64);
            tracing::debug!(
                "Batch {}: {} reads, {} malformed, {} with markers",
                summary.batches,
                reads.len(),
                malformed,
                positive
            );

            offset += batch_size;
        }

        pb.finish_and_clear();
        tracing::info!(
            "Annotated {} reads in {} batches ({} malformed, {} with markers)",
            summary.processed,
            summary.batches,
            summary.malformed,
            summary.marker_positive
        );
        Ok(summary)
    }
}

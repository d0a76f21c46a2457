/// Greedy first-fit identity clustering of one sample
///
/// Qualifying reads (at least one marker hit and a long enough trim region)
/// are visited in read id order. Each read joins the first existing cluster
/// whose representative lies within the identity cutoff, or founds a new
/// cluster. Only representatives are ever compared, so no distance matrix is
/// built.
use crate::bio::alignment::{AlignmentDistance, PairwiseDistance};
use crate::bio::ReadKey;
use crate::core::config::Config;
use crate::storage::traits::{columns, AnnotatedRead, AnnotationFilter, ColumnValue, Columns, ReadStore};
use crate::{AmpliclusterError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_MIN_LENGTH: usize = 100;
pub const DEFAULT_IDENTITY_CUTOFF: f64 = 0.03;

/// Page size used to collect the keys of a sample.
const KEY_PAGE: usize = 10_000;

/// Cluster id per read id, 1-based in creation order.
pub type ClusterAssignments = BTreeMap<String, u32>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub sample: String,
    pub qualifying: usize,
    pub clusters: usize,
    pub comparisons: usize,
}

struct Cluster<'a> {
    id: u32,
    representative: &'a [u8],
}

pub struct IdentityClusterer {
    distance: Box<dyn PairwiseDistance>,
    min_length: usize,
    identity_cutoff: f64,
}

impl std::fmt::Debug for IdentityClusterer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityClusterer")
            .field("distance", &self.distance.name())
            .field("min_length", &self.min_length)
            .field("identity_cutoff", &self.identity_cutoff)
            .finish()
    }
}

impl Default for IdentityClusterer {
    fn default() -> Self {
        Self {
            distance: Box::new(AlignmentDistance::default()),
            min_length: DEFAULT_MIN_LENGTH,
            identity_cutoff: DEFAULT_IDENTITY_CUTOFF,
        }
    }
}

impl IdentityClusterer {
    pub fn new(min_length: usize, identity_cutoff: f64) -> Result<Self> {
        Self::default()
            .with_min_length(min_length)
            .with_identity_cutoff(identity_cutoff)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.clustering.min_length, config.clustering.identity_cutoff)
    }

    pub fn with_distance(mut self, distance: Box<dyn PairwiseDistance>) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn with_identity_cutoff(mut self, cutoff: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&cutoff) {
            return Err(AmpliclusterError::InvalidInput(format!(
                "identity cutoff must be in [0, 1], got {}",
                cutoff
            )));
        }
        self.identity_cutoff = cutoff;
        Ok(self)
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn identity_cutoff(&self) -> f64 {
        self.identity_cutoff
    }

    pub fn filter(&self) -> AnnotationFilter {
        AnnotationFilter::qualifying(self.min_length)
    }

    fn distance(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        let d = self
            .distance
            .fractional_distance(a, b)
            .map_err(|e| match e {
                AmpliclusterError::Distance(_) => e,
                other => AmpliclusterError::Distance(other.to_string()),
            })?;
        if !(0.0..=1.0).contains(&d) {
            return Err(AmpliclusterError::Distance(format!(
                "{} returned {} outside [0, 1]",
                self.distance.name(),
                d
            )));
        }
        Ok(d)
    }

    /// Assigns clusters to already selected reads without touching a store.
    ///
    /// Returns the assignments and the number of distance evaluations.
    pub fn assign(&self, reads: &[AnnotatedRead]) -> Result<(ClusterAssignments, usize)> {
        let mut ordered: Vec<&AnnotatedRead> = reads.iter().collect();
        ordered.sort_by(|a, b| a.read.id().cmp(b.read.id()));

        let mut clusters: Vec<Cluster<'_>> = Vec::new();
        let mut assignments = ClusterAssignments::new();
        let mut comparisons = 0;

        for annotated in ordered {
            let trimmed = annotated.trimmed();
            let mut joined = None;
            for cluster in &clusters {
                comparisons += 1;
                if self.distance(trimmed, cluster.representative)? <= self.identity_cutoff {
                    joined = Some(cluster.id);
                    break;
                }
            }

            let id = match joined {
                Some(id) => id,
                None => {
                    let id = clusters.len() as u32 + 1;
                    clusters.push(Cluster {
                        id,
                        representative: trimmed,
                    });
                    id
                }
            };
            assignments.insert(annotated.read.id().to_string(), id);
        }

        Ok((assignments, comparisons))
    }

    /// Clusters the qualifying reads of `sample` and stores the assignments.
    pub fn cluster<S: ReadStore + ?Sized>(&self, store: &mut S, sample: &str) -> Result<ClusterAssignments> {
        self.cluster_with_summary(store, sample).map(|(assignments, _)| assignments)
    }

    /// Like [`cluster`](Self::cluster), also reporting what was done.
    ///
    /// Every read of the sample gets its `cluster` column written in one
    /// atomic call: the assigned id, or null for reads that do not qualify.
    /// Nothing is written when a distance evaluation fails.
    pub fn cluster_with_summary<S: ReadStore + ?Sized>(
        &self,
        store: &mut S,
        sample: &str,
    ) -> Result<(ClusterAssignments, ClusterSummary)> {
        let _span = tracing::info_span!("cluster", sample).entered();

        let reads = store.list_columns(sample, &self.filter())?;
        tracing::debug!(
            "Sample {}: {} qualifying reads (min length {}, cutoff {})",
            sample,
            reads.len(),
            self.min_length,
            self.identity_cutoff
        );

        let (assignments, comparisons) = self.assign(&reads)?;
        let clusters = assignments.values().collect::<BTreeSet<_>>().len();

        let updates = self.cluster_updates(store, sample, &assignments)?;
        store.append_batch(&updates)?;

        let summary = ClusterSummary {
            sample: sample.to_string(),
            qualifying: reads.len(),
            clusters,
            comparisons,
        };
        tracing::info!(
            "Sample {}: {} reads in {} clusters ({} comparisons)",
            summary.sample,
            summary.qualifying,
            summary.clusters,
            summary.comparisons
        );
        Ok((assignments, summary))
    }

    fn cluster_updates<S: ReadStore + ?Sized>(
        &self,
        store: &S,
        sample: &str,
        assignments: &ClusterAssignments,
    ) -> Result<Vec<(ReadKey, Columns)>> {
        let total = store.count(Some(sample))?;
        let mut updates = Vec::with_capacity(total);
        let mut offset = 0;
        while offset < total {
            let page = store.fetch_batch(Some(sample), offset, KEY_PAGE)?;
            if page.is_empty() {
                break;
            }
            offset += page.len();
            for read in page {
                let value = assignments
                    .get(read.id())
                    .map_or(ColumnValue::Null, |&id| ColumnValue::Integer(id as i64));
                let mut cells = Columns::new();
                cells.insert(columns::CLUSTER.to_string(), value);
                updates.push((read.key, cells));
            }
        }
        Ok(updates)
    }
}

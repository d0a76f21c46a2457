/// Annotation pass followed by per-sample clustering
use crate::core::clusterer::{ClusterSummary, IdentityClusterer};
use crate::core::config::Config;
use crate::core::orchestrator::{BatchOrchestrator, BatchSummary};
use crate::storage::traits::ReadStore;
use crate::{AmpliclusterError, Result};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub annotation: BatchSummary,
    pub clusters: Vec<ClusterSummary>,
}

impl PipelineReport {
    pub fn total_clusters(&self) -> usize {
        self.clusters.iter().map(|c| c.clusters).sum()
    }
}

#[derive(Debug)]
pub struct Pipeline {
    orchestrator: BatchOrchestrator,
    clusterer: IdentityClusterer,
    batch_size: usize,
}

impl Pipeline {
    pub fn new(orchestrator: BatchOrchestrator, clusterer: IdentityClusterer, batch_size: usize) -> Self {
        Self {
            orchestrator,
            clusterer,
            batch_size,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            BatchOrchestrator::from_config(config)?,
            IdentityClusterer::from_config(config)?,
            config.batch.batch_size,
        ))
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    pub fn clusterer(&self) -> &IdentityClusterer {
        &self.clusterer
    }

    /// Annotates the selected reads, then clusters each sample in ascending order.
    ///
    /// Clustering starts only once every annotation batch has been written.
    pub fn run<S: ReadStore + ?Sized>(&self, store: &mut S, sample: Option<&str>) -> Result<PipelineReport> {
        let samples = match sample {
            Some(name) => {
                if !store.samples()?.iter().any(|s| s == name) {
                    return Err(AmpliclusterError::NotFound(format!("sample {}", name)));
                }
                vec![name.to_string()]
            }
            None => store.samples()?,
        };

        let annotation = self.orchestrator.run(store, sample, self.batch_size)?;

        let mut clusters = Vec::with_capacity(samples.len());
        for name in &samples {
            let (_, summary) = self.clusterer.cluster_with_summary(store, name)?;
            clusters.push(summary);
        }

        let report = PipelineReport { annotation, clusters };
        tracing::info!(
            "Pipeline finished: {} reads annotated, {} clusters across {} samples",
            report.annotation.processed,
            report.total_clusters(),
            report.clusters.len()
        );
        Ok(report)
    }
}

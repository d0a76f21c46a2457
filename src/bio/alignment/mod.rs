pub mod distance;
pub mod scoring;

pub use distance::{AlignmentCounts, AlignmentDistance, PairwiseDistance};
pub use scoring::NucleotideMatrix;

#[cfg(test)]
pub use distance::MockPairwiseDistance;

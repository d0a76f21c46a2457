/// Pairwise sequence distance from a global alignment
use crate::bio::alignment::scoring::NucleotideMatrix;
use crate::Result;
use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation;

/// Distance between two sequences, `1 - fractional identity`, in `[0, 1]`.
#[cfg_attr(test, mockall::automock)]
pub trait PairwiseDistance: Send + Sync {
    fn fractional_distance(&self, a: &[u8], b: &[u8]) -> Result<f64>;

    fn name(&self) -> &'static str {
        "pairwise"
    }
}

/// Summary of a global alignment between two sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlignmentCounts {
    pub matches: usize,
    pub mismatches: usize,
    pub gaps: usize,
}

impl AlignmentCounts {
    pub fn columns(&self) -> usize {
        self.matches + self.mismatches + self.gaps
    }

    pub fn identity(&self) -> f64 {
        match self.columns() {
            0 => 1.0,
            n => self.matches as f64 / n as f64,
        }
    }
}

/// Global alignment distance scored with a nucleotide matrix.
#[derive(Debug, Clone, Default)]
pub struct AlignmentDistance {
    matrix: NucleotideMatrix,
}

impl AlignmentDistance {
    pub fn align(&self, a: &[u8], b: &[u8]) -> AlignmentCounts {
        if a.is_empty() || b.is_empty() {
            return AlignmentCounts {
                gaps: a.len().max(b.len()),
                ..Default::default()
            };
        }

        let matrix = &self.matrix;
        let score = |x: u8, y: u8| matrix.score(x, y);
        let (gap_open, gap_extend) = matrix.bio_gap_scores();

        let mut aligner = Aligner::with_capacity(a.len(), b.len(), gap_open, gap_extend, &score);
        let alignment = aligner.global(a, b);

        let mut counts = AlignmentCounts::default();
        for op in &alignment.operations {
            match op {
                AlignmentOperation::Match => counts.matches += 1,
                AlignmentOperation::Subst => counts.mismatches += 1,
                AlignmentOperation::Ins | AlignmentOperation::Del => counts.gaps += 1,
                AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {}
            }
        }
        counts
    }
}

impl PairwiseDistance for AlignmentDistance {
    fn fractional_distance(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        Ok(1.0 - self.align(a, b).identity())
    }

    fn name(&self) -> &'static str {
        "global-alignment"
    }
}

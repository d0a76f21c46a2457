/// Linear nucleotide scores for global alignment

/// Match and mismatch scores plus affine gap scores.
///
/// A gap of length `k` scores `gap_open + (k - 1) * gap_extend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NucleotideMatrix {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for NucleotideMatrix {
    fn default() -> Self {
        Self {
            match_score: 10,
            mismatch_score: -5,
            gap_open: -20,
            gap_extend: -10,
        }
    }
}

impl NucleotideMatrix {
    pub fn score(&self, a: u8, b: u8) -> i32 {
        if a.eq_ignore_ascii_case(&b) {
            self.match_score
        } else {
            self.mismatch_score
        }
    }

    /// Gap scores as `bio` expects them, where a gap of length `k` costs `open + k * extend`.
    pub fn bio_gap_scores(&self) -> (i32, i32) {
        (self.gap_open - self.gap_extend, self.gap_extend)
    }
}

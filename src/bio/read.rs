use serde::{Deserialize, Serialize};
use std::fmt;

/// Phred scores are stored with this ASCII offset.
pub const PHRED_OFFSET: u8 = 33;

/// Addresses a read: identifiers are only unique within their sample.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReadKey {
    pub sample: String,
    pub id: String,
}

impl ReadKey {
    pub fn new(sample: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ReadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.sample, self.id)
    }
}

/// A sequenced read with its per-base error probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Read {
    pub key: ReadKey,
    pub sequence: Vec<u8>,
    pub error_probs: Vec<f64>,
}

impl Read {
    pub fn new(key: ReadKey, sequence: Vec<u8>, error_probs: Vec<f64>) -> Self {
        Self {
            key,
            sequence,
            error_probs,
        }
    }

    /// Builds a read from Phred+33 quality text.
    pub fn from_phred(key: ReadKey, sequence: Vec<u8>, quality: &[u8]) -> Self {
        let error_probs = quality.iter().map(|&q| phred_to_error(q)).collect();
        Self::new(key, sequence, error_probs)
    }

    pub fn id(&self) -> &str {
        &self.key.id
    }

    pub fn sample(&self) -> &str {
        &self.key.sample
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Checks that the probabilities line up with the sequence and lie in `[0, 1]`.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate_probabilities(&self) -> Result<(), String> {
        if self.error_probs.len() != self.sequence.len() {
            return Err(format!(
                "length {} does not match sequence length {}",
                self.error_probs.len(),
                self.sequence.len()
            ));
        }
        if let Some((pos, p)) = self
            .error_probs
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(format!("value {} at position {} is outside [0, 1]", p, pos + 1));
        }
        Ok(())
    }

    /// Returns the 1-based inclusive slice `[start, end]`, clipped to the read.
    pub fn subsequence(&self, start: usize, end: usize) -> &[u8] {
        let from = start.saturating_sub(1).min(self.sequence.len());
        let to = end.min(self.sequence.len()).max(from);
        &self.sequence[from..to]
    }
}

/// Converts one Phred+33 quality character to an error probability.
pub fn phred_to_error(quality: u8) -> f64 {
    let score = quality.saturating_sub(PHRED_OFFSET) as f64;
    10f64.powf(-score / 10.0)
}

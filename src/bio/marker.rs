/// Approximate marker screening
///
/// A marker is a short concrete nucleotide pattern (typically a
/// genus-specific primer site). Reads are screened by counting approximate,
/// non-overlapping occurrences of the marker, leftmost first.
use crate::bio::iupac;
use crate::bio::read::Read;
use crate::{AmpliclusterError, Result};
use bio::pattern_matching::myers::{Myers, MyersBuilder};
use serde::{Deserialize, Serialize};

/// Longest pattern the bit-parallel matcher supports.
pub const MAX_PATTERN_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchParams {
    /// Edits tolerated per occurrence.
    pub max_mismatches: usize,
    /// Whether insertions and deletions count as edits. Otherwise only substitutions.
    pub allow_indels: bool,
    /// Whether ambiguity codes in the read match any compatible base.
    pub subject_ambiguity: bool,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            max_mismatches: 4,
            allow_indels: true,
            subject_ambiguity: true,
        }
    }
}

/// Counts approximate occurrences of a pattern in a sequence.
#[cfg_attr(test, mockall::automock)]
pub trait ApproximateMatcher: Send + Sync {
    fn approximate_count(&self, sequence: &[u8], pattern: &[u8], params: &MatchParams) -> Result<usize>;

    fn name(&self) -> &'static str {
        "approximate"
    }
}

/// Myers bit-parallel search when indels are allowed, Hamming scan otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyersMatcher;

impl MyersMatcher {
    /// Each concrete pattern base also accepts the read codes that cover it.
    fn build(pattern: &[u8], subject_ambiguity: bool) -> Myers<u64> {
        let mut builder = MyersBuilder::new();
        if subject_ambiguity {
            for &base in b"ACGT" {
                builder.ambig(base, iupac::codes_covering(base));
            }
        }
        builder.build_64(pattern)
    }

    fn count_with_indels(sequence: &[u8], pattern: &[u8], params: &MatchParams) -> usize {
        let mut myers = Self::build(pattern, params.subject_ambiguity);
        let max_dist = params.max_mismatches.min(u8::MAX as usize) as u8;

        let mut count = 0;
        let mut last_end = 0;
        for (start, end, _dist) in myers.find_all(sequence.iter(), max_dist) {
            if start >= last_end {
                count += 1;
                last_end = end;
            }
        }
        count
    }

    fn count_substitutions(sequence: &[u8], pattern: &[u8], params: &MatchParams) -> usize {
        let m = pattern.len();
        let mut count = 0;
        let mut i = 0;
        while i + m <= sequence.len() {
            let mismatches = sequence[i..i + m]
                .iter()
                .zip(pattern)
                .filter(|(&r, &p)| !iupac::compatible(r, p, params.subject_ambiguity))
                .count();
            if mismatches <= params.max_mismatches {
                count += 1;
                i += m;
            } else {
                i += 1;
            }
        }
        count
    }
}

impl ApproximateMatcher for MyersMatcher {
    fn approximate_count(&self, sequence: &[u8], pattern: &[u8], params: &MatchParams) -> Result<usize> {
        validate_pattern(pattern)?;
        let sequence = sequence.to_ascii_uppercase();
        let pattern = pattern.to_ascii_uppercase();

        if params.allow_indels {
            Ok(Self::count_with_indels(&sequence, &pattern, params))
        } else {
            Ok(Self::count_substitutions(&sequence, &pattern, params))
        }
    }

    fn name(&self) -> &'static str {
        "myers"
    }
}

/// Marker patterns must be non-empty, concrete and short enough for the matcher.
pub fn validate_pattern(pattern: &[u8]) -> Result<()> {
    if pattern.is_empty() {
        return Err(AmpliclusterError::InvalidInput("marker pattern is empty".to_string()));
    }
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(AmpliclusterError::InvalidInput(format!(
            "marker pattern has {} bases, at most {} are supported",
            pattern.len(),
            MAX_PATTERN_LEN
        )));
    }
    if let Some(&base) = pattern.iter().find(|&&b| !iupac::is_concrete(b)) {
        return Err(AmpliclusterError::InvalidInput(format!(
            "marker pattern contains non-ACGT symbol '{}'",
            base as char
        )));
    }
    Ok(())
}

/// Screens reads for one marker pattern.
pub struct MarkerScanner {
    pattern: Vec<u8>,
    params: MatchParams,
    matcher: Box<dyn ApproximateMatcher>,
}

impl std::fmt::Debug for MarkerScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerScanner")
            .field("pattern", &String::from_utf8_lossy(&self.pattern))
            .field("params", &self.params)
            .field("matcher", &self.matcher.name())
            .finish()
    }
}

impl MarkerScanner {
    pub fn new(pattern: impl Into<Vec<u8>>, params: MatchParams) -> Result<Self> {
        Self::with_matcher(pattern, params, Box::new(MyersMatcher))
    }

    pub fn with_matcher(
        pattern: impl Into<Vec<u8>>,
        params: MatchParams,
        matcher: Box<dyn ApproximateMatcher>,
    ) -> Result<Self> {
        let pattern = pattern.into();
        validate_pattern(&pattern)?;
        Ok(Self {
            pattern: pattern.to_ascii_uppercase(),
            params,
            matcher,
        })
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn params(&self) -> &MatchParams {
        &self.params
    }

    /// Number of approximate marker occurrences in the read.
    pub fn count_matches(&self, read: &Read) -> Result<usize> {
        self.matcher
            .approximate_count(&read.sequence, &self.pattern, &self.params)
            .map_err(|e| match e {
                AmpliclusterError::Matcher(_) => e,
                other => AmpliclusterError::Matcher(format!("read {}: {}", read.key, other)),
            })
    }
}

/// IUPAC nucleotide ambiguity codes

/// Ambiguity codes and the concrete bases each one stands for.
pub const AMBIGUITY_CODES: [(u8, &[u8]); 11] = [
    (b'R', b"AG"),
    (b'Y', b"CT"),
    (b'S', b"CG"),
    (b'W', b"AT"),
    (b'K', b"GT"),
    (b'M', b"AC"),
    (b'B', b"CGT"),
    (b'D', b"AGT"),
    (b'H', b"ACT"),
    (b'V', b"ACG"),
    (b'N', b"ACGT"),
];

pub fn is_concrete(base: u8) -> bool {
    matches!(base.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

/// Concrete bases compatible with `code`, or `None` if it is not an ambiguity code.
pub fn expand(code: u8) -> Option<&'static [u8]> {
    let code = code.to_ascii_uppercase();
    AMBIGUITY_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, bases)| *bases)
}

/// Whether a read base is compatible with a concrete pattern base.
///
/// Ambiguity codes in the read only expand when `ambiguity` is set.
pub fn compatible(read_base: u8, pattern_base: u8, ambiguity: bool) -> bool {
    let read_base = read_base.to_ascii_uppercase();
    let pattern_base = pattern_base.to_ascii_uppercase();
    if read_base == pattern_base {
        return true;
    }
    ambiguity && expand(read_base).is_some_and(|bases| bases.contains(&pattern_base))
}

/// `base` followed by every ambiguity code that can stand for it.
pub fn codes_covering(base: u8) -> Vec<u8> {
    let base = base.to_ascii_uppercase();
    std::iter::once(base)
        .chain(
            AMBIGUITY_CODES
                .iter()
                .filter(|(_, bases)| bases.contains(&base))
                .map(|(code, _)| *code),
        )
        .collect()
}

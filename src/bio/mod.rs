pub mod alignment;
pub mod iupac;
pub mod marker;
pub mod read;
pub mod trimming;

pub use marker::{ApproximateMatcher, MarkerScanner, MatchParams, MyersMatcher};
pub use read::{Read, ReadKey};
pub use trimming::{QualityTrimmer, TrimBounds, TrimRegion};

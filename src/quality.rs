use serde::Serialize;

/// Coarse drawing "substance" bucket, ordered from worst to best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QualityLabel {
    Incomplete,
    Basic,
    Good,
    Detailed,
}

/// Size-only stroke complexity bucket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StrokeComplexity {
    Simple,
    Moderate,
    Complex,
}

pub const BASIC_MIN_BYTES: usize = 10_000;
pub const GOOD_MIN_BYTES: usize = 15_000;
pub const DETAILED_MIN_BYTES: usize = 25_000;

pub const MODERATE_ABOVE_BYTES: usize = 15_000;
pub const COMPLEX_ABOVE_BYTES: usize = 20_000;

pub fn classify(payload_len: usize) -> QualityLabel {
    match payload_len {
        n if n < BASIC_MIN_BYTES => QualityLabel::Incomplete,
        n if n < GOOD_MIN_BYTES => QualityLabel::Basic,
        n if n < DETAILED_MIN_BYTES => QualityLabel::Good,
        _ => QualityLabel::Detailed,
    }
}

pub fn complexity(payload_len: usize) -> StrokeComplexity {
    match payload_len {
        n if n > COMPLEX_ABOVE_BYTES => StrokeComplexity::Complex,
        n if n > MODERATE_ABOVE_BYTES => StrokeComplexity::Moderate,
        _ => StrokeComplexity::Simple,
    }
}

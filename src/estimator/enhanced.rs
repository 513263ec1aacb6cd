use super::{
    pick_decoy, AnalysisResult, Alternative, EstimateInput, ScoreEstimator, StrokeAnalysis,
};
use crate::error::AnalysisError;
use crate::letters::{Alphabet, Letter};
use crate::random::{sample, RandomSource};
use std::ops::RangeInclusive;
use std::sync::Arc;

pub const CORRECT_CONFIDENCE: RangeInclusive<f64> = 0.78..=0.95;
pub const INCORRECT_CONFIDENCE: RangeInclusive<f64> = 0.45..=0.75;
pub const ALTERNATIVE_FLOOR: f64 = 0.15;
pub const ALTERNATIVE_COUNT: usize = 3;
/// Stroke count assumed when the client does not report one.
pub const DEFAULT_STROKES: u32 = 1;

/// Density-based complexity score in `[0.1, 0.95]`.
pub fn complexity_score(payload_len: usize) -> f64 {
    let density = (payload_len as f64 / 10_000.0).min(1.0);
    (0.3 + density * 0.7).clamp(0.1, 0.95)
}

/// Stroke-aware estimator that also reports ranked alternatives.
#[derive(Debug, Clone)]
pub struct EnhancedEstimator {
    alphabet: Arc<Alphabet>,
}

impl EnhancedEstimator {
    pub fn new(alphabet: Arc<Alphabet>) -> Self {
        Self { alphabet }
    }

    pub fn accuracy(&self, payload_len: usize, target: &Letter, strokes: &StrokeAnalysis) -> f64 {
        let base =
            0.60 + complexity_score(payload_len) * 0.25 + strokes.stroke_accuracy * 0.15;
        (base * self.alphabet.profile(target).multiplier).clamp(0.15, 0.95)
    }

    fn alternatives(
        &self,
        prediction: &Letter,
        confidence: f64,
        rng: &mut dyn RandomSource,
    ) -> Vec<Alternative> {
        let pool: Vec<Letter> = self
            .alphabet
            .catalog
            .letters()
            .iter()
            .filter(|l| *l != prediction)
            .cloned()
            .collect();

        let ceiling = (confidence - 0.1).max(ALTERNATIVE_FLOOR);
        sample(rng, &pool, ALTERNATIVE_COUNT)
            .into_iter()
            .map(|letter| Alternative {
                letter,
                confidence: rng.range_f64(ALTERNATIVE_FLOOR, ceiling),
            })
            .collect()
    }
}

fn draw(rng: &mut dyn RandomSource, range: &RangeInclusive<f64>) -> f64 {
    rng.range_f64(*range.start(), *range.end())
}

impl ScoreEstimator for EnhancedEstimator {
    fn estimate(
        &self,
        input: &EstimateInput<'_>,
        rng: &mut dyn RandomSource,
    ) -> Result<AnalysisResult, AnalysisError> {
        let observed = input.stroke_count.unwrap_or(DEFAULT_STROKES);
        let strokes = StrokeAnalysis::new(observed, self.alphabet.profile(input.target).strokes);
        let accuracy = self.accuracy(input.payload.len(), input.target, &strokes);

        let (prediction, confidence) = if rng.next_f64() < accuracy {
            (input.target.clone(), draw(rng, &CORRECT_CONFIDENCE))
        } else {
            let decoy = pick_decoy(&self.alphabet, input.target, rng);
            (decoy, draw(rng, &INCORRECT_CONFIDENCE))
        };
        let alternatives = self.alternatives(&prediction, confidence, rng);

        Ok(AnalysisResult::new(input, prediction, confidence)
            .with_alternatives(alternatives)
            .with_strokes(Some(strokes))
            .with_method(self.name()))
    }

    fn confidence_bounds(&self) -> (f64, f64) {
        (*INCORRECT_CONFIDENCE.start(), *CORRECT_CONFIDENCE.end())
    }

    fn name(&self) -> &'static str {
        "enhanced"
    }
}

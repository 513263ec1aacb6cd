use super::{pick_decoy, AnalysisResult, EstimateInput, ScoreEstimator, StrokeAnalysis};
use crate::error::AnalysisError;
use crate::letters::Alphabet;
use crate::quality::QualityLabel;
use crate::random::RandomSource;
use std::sync::Arc;

pub const BASE_ACCURACY: f64 = 0.5;
pub const CLASS_BONUS: f64 = 0.15;
pub const MIN_ACCURACY: f64 = 0.15;
pub const MAX_ACCURACY: f64 = 0.95;

pub fn quality_bonus(quality: QualityLabel) -> f64 {
    match quality {
        QualityLabel::Incomplete => -0.2,
        QualityLabel::Basic => 0.1,
        QualityLabel::Good => 0.2,
        QualityLabel::Detailed => 0.3,
    }
}

/// Size-and-table driven guesser; the default strategy.
#[derive(Debug, Clone)]
pub struct HeuristicEstimator {
    alphabet: Arc<Alphabet>,
}

impl HeuristicEstimator {
    pub fn new(alphabet: Arc<Alphabet>) -> Self {
        Self { alphabet }
    }

    /// Probability that the drawing is judged correct, already clamped.
    pub fn accuracy(&self, input: &EstimateInput<'_>) -> f64 {
        let profile = self.alphabet.profile(input.target);

        let class_bonus = match profile.class {
            Some(class) if class.matches(input.complexity) => CLASS_BONUS,
            _ => 0.0,
        };
        let raw = (BASE_ACCURACY + quality_bonus(input.quality) + class_bonus) * profile.multiplier;

        raw.clamp(MIN_ACCURACY, MAX_ACCURACY)
    }
}

impl ScoreEstimator for HeuristicEstimator {
    fn estimate(
        &self,
        input: &EstimateInput<'_>,
        rng: &mut dyn RandomSource,
    ) -> Result<AnalysisResult, AnalysisError> {
        let accuracy = self.accuracy(input);
        let strokes = input
            .stroke_count
            .map(|n| StrokeAnalysis::new(n, self.alphabet.profile(input.target).strokes));

        let result = if rng.next_f64() < accuracy {
            AnalysisResult::new(input, input.target.clone(), accuracy)
        } else {
            let decoy = pick_decoy(&self.alphabet, input.target, rng);
            AnalysisResult::new(input, decoy, 1.0 - accuracy)
        };

        Ok(result.with_strokes(strokes).with_method(self.name()))
    }

    fn confidence_bounds(&self) -> (f64, f64) {
        (1.0 - MAX_ACCURACY, MAX_ACCURACY)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

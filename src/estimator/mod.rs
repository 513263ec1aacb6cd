pub mod decoy;
pub mod enhanced;
pub mod ensemble;
pub mod heuristic;
pub mod neural;
pub mod stroke;

pub use decoy::pick_decoy;
pub use enhanced::EnhancedEstimator;
pub use ensemble::EnsembleEstimator;
pub use heuristic::HeuristicEstimator;
pub use neural::NeuralEstimator;
pub use stroke::{StrokeAnalysis, StrokeVerdict};

use crate::error::AnalysisError;
use crate::letters::{Alphabet, Letter};
use crate::quality::{QualityLabel, StrokeComplexity};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Everything an estimator may look at for one drawing.
#[derive(Debug, Clone, Copy)]
pub struct EstimateInput<'a> {
    pub payload: &'a [u8],
    pub quality: QualityLabel,
    pub complexity: StrokeComplexity,
    pub target: &'a Letter,
    pub stroke_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub letter: Letter,
    pub confidence: f64,
}

/// Outcome of a single simulated recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub target: Letter,
    pub prediction: Letter,
    pub confidence: f64,
    /// Score the estimator gave the target itself, when it scores every letter.
    pub target_confidence: Option<f64>,
    pub alternatives: Vec<Alternative>,
    pub quality: QualityLabel,
    pub complexity: StrokeComplexity,
    pub strokes: Option<StrokeAnalysis>,
    pub method: &'static str,
    pub processing_time: Duration,
}

impl AnalysisResult {
    pub fn new(input: &EstimateInput<'_>, prediction: Letter, confidence: f64) -> Self {
        Self {
            target: input.target.clone(),
            prediction,
            confidence: confidence.clamp(0.0, 1.0),
            target_confidence: None,
            alternatives: Vec::new(),
            quality: input.quality,
            complexity: input.complexity,
            strokes: None,
            method: "",
            processing_time: Duration::ZERO,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.prediction == self.target
    }

    pub fn with_alternatives(mut self, mut alternatives: Vec<Alternative>) -> Self {
        alternatives.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        self.alternatives = alternatives;
        self
    }

    pub fn with_target_confidence(mut self, confidence: f64) -> Self {
        self.target_confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn with_strokes(mut self, strokes: Option<StrokeAnalysis>) -> Self {
        self.strokes = strokes;
        self
    }

    pub fn with_method(mut self, method: &'static str) -> Self {
        self.method = method;
        self
    }
}

/// A strategy for turning a drawing into a simulated recognition result.
pub trait ScoreEstimator: Send + Sync {
    fn estimate(
        &self,
        input: &EstimateInput<'_>,
        rng: &mut dyn RandomSource,
    ) -> Result<AnalysisResult, AnalysisError>;

    /// Inclusive range every returned confidence falls in.
    fn confidence_bounds(&self) -> (f64, f64);

    fn name(&self) -> &'static str;
}

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EstimatorKind {
    #[default]
    Heuristic,
    Neural,
    Enhanced,
    Ensemble,
}

impl EstimatorKind {
    pub fn build(self, alphabet: Arc<Alphabet>, seed: Option<u64>) -> Box<dyn ScoreEstimator> {
        match self {
            EstimatorKind::Heuristic => Box::new(HeuristicEstimator::new(alphabet)),
            EstimatorKind::Enhanced => Box::new(EnhancedEstimator::new(alphabet)),
            EstimatorKind::Neural => Box::new(NeuralEstimator::new(alphabet, seed)),
            EstimatorKind::Ensemble => Box::new(EnsembleEstimator::new(alphabet, seed)),
        }
    }
}

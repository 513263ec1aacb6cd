use super::{
    pick_decoy, AnalysisResult, Alternative, EstimateInput, ScoreEstimator, StrokeAnalysis,
};
use crate::error::AnalysisError;
use crate::letters::Alphabet;
use crate::random::RandomSource;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub const HISTOGRAM_BINS: usize = 32;
pub const HIDDEN_UNITS: usize = 64;
pub const TOP_PREDICTIONS: usize = 3;

pub const FALLBACK_METHOD: &str = "neural-fallback";
/// Accuracy range of the stand-in prediction used when the network fails.
pub const FALLBACK_ACCURACY: (f64, f64) = (0.7, 0.9);
/// Upper bound for the target score reported on a fallback miss.
pub const FALLBACK_MISS_CEILING: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Relu,
    Identity,
}

#[derive(Debug, Clone)]
struct Dense {
    weights: Array2<f32>,
    biases: Array1<f32>,
    activation: Activation,
}

impl Dense {
    /// Uniform Glorot initialisation.
    fn random(dim_in: usize, dim_out: usize, activation: Activation, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (dim_in + dim_out) as f32).sqrt();
        let weights = Array2::from_shape_fn((dim_out, dim_in), |_| rng.gen_range(-limit..limit));
        let biases = Array1::zeros(dim_out);
        Self {
            weights,
            biases,
            activation,
        }
    }

    fn forward(&self, x: &Array1<f32>) -> Array1<f32> {
        let z = self.weights.dot(x) + &self.biases;
        match self.activation {
            Activation::Relu => z.mapv_into(|v| v.max(0.0)),
            Activation::Identity => z,
        }
    }
}

/// Untrained demo network: byte histogram in, one logit per letter out.
#[derive(Debug, Clone)]
pub struct DemoNetwork {
    layers: Vec<Dense>,
}

impl DemoNetwork {
    pub fn new(sizes: &[usize], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let last = sizes.len().saturating_sub(2);
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let activation = if i == last {
                    Activation::Identity
                } else {
                    Activation::Relu
                };
                Dense::random(pair[0], pair[1], activation, &mut rng)
            })
            .collect();
        Self { layers }
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, |l| l.weights.ncols())
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, |l| l.weights.nrows())
    }

    /// Class probabilities for one feature vector.
    pub fn predict(&self, features: Array1<f32>) -> Result<Array1<f32>, AnalysisError> {
        if features.len() != self.input_dim() {
            return Err(AnalysisError::Internal(format!(
                "feature vector has {} entries, network expects {}",
                features.len(),
                self.input_dim()
            )));
        }
        let logits = self
            .layers
            .iter()
            .fold(features, |x, layer| layer.forward(&x));
        Ok(softmax(logits))
    }
}

pub fn softmax(logits: Array1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let exp = logits.mapv_into(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Normalised byte-value histogram; the network never sees pixels.
pub fn byte_histogram(payload: &[u8]) -> Array1<f32> {
    let mut bins = Array1::<f32>::zeros(HISTOGRAM_BINS);
    if payload.is_empty() {
        return bins;
    }
    let width = 256 / HISTOGRAM_BINS;
    for &b in payload {
        bins[usize::from(b) / width] += 1.0;
    }
    bins / payload.len() as f32
}

/// Prediction from an untrained network; effectively an informed guess.
#[derive(Debug, Clone)]
pub struct NeuralEstimator {
    alphabet: Arc<Alphabet>,
    network: DemoNetwork,
}

impl NeuralEstimator {
    pub fn new(alphabet: Arc<Alphabet>, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        let classes = alphabet.catalog.len();
        let network = DemoNetwork::new(&[HISTOGRAM_BINS, HIDDEN_UNITS, classes], seed);
        tracing::info!(
            seed,
            inputs = HISTOGRAM_BINS,
            hidden = HIDDEN_UNITS,
            classes,
            "demo network initialised"
        );
        Self { alphabet, network }
    }

    pub fn with_network(alphabet: Arc<Alphabet>, network: DemoNetwork) -> Self {
        Self { alphabet, network }
    }
}

impl NeuralEstimator {
    fn network_estimate(&self, input: &EstimateInput<'_>) -> Result<AnalysisResult, AnalysisError> {
        let letters = self.alphabet.catalog.letters();
        let probabilities = self.network.predict(byte_histogram(input.payload))?;
        if probabilities.len() != letters.len() {
            return Err(AnalysisError::Internal(format!(
                "network scores {} classes for a catalog of {}",
                probabilities.len(),
                letters.len()
            )));
        }

        let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (best, best_p) = ranked[0];
        let alternatives = ranked[1..]
            .iter()
            .take(TOP_PREDICTIONS)
            .map(|&(idx, p)| Alternative {
                letter: letters[idx].clone(),
                confidence: f64::from(p),
            })
            .collect();
        let target_p = self
            .alphabet
            .catalog
            .position(input.target)
            .map_or(0.0, |idx| f64::from(probabilities[idx]));

        Ok(
            AnalysisResult::new(input, letters[best].clone(), f64::from(best_p))
                .with_target_confidence(target_p)
                .with_alternatives(alternatives)
                .with_method(self.name()),
        )
    }

    /// Stand-in answer when the network cannot score a drawing.
    fn fallback_estimate(&self, input: &EstimateInput<'_>, rng: &mut dyn RandomSource) -> AnalysisResult {
        let (low, high) = FALLBACK_ACCURACY;
        let accuracy = rng.range_f64(low, high);

        if rng.next_f64() < accuracy {
            AnalysisResult::new(input, input.target.clone(), accuracy)
                .with_target_confidence(accuracy)
                .with_method(FALLBACK_METHOD)
        } else {
            let decoy = pick_decoy(&self.alphabet, input.target, rng);
            let target_p = rng.range_f64(0.0, FALLBACK_MISS_CEILING);
            AnalysisResult::new(input, decoy, accuracy)
                .with_target_confidence(target_p)
                .with_method(FALLBACK_METHOD)
        }
    }
}

impl ScoreEstimator for NeuralEstimator {
    fn estimate(
        &self,
        input: &EstimateInput<'_>,
        rng: &mut dyn RandomSource,
    ) -> Result<AnalysisResult, AnalysisError> {
        let result = match self.network_estimate(input) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "network unavailable, using fallback prediction");
                self.fallback_estimate(input, rng)
            }
        };
        let strokes = input
            .stroke_count
            .map(|n| StrokeAnalysis::new(n, self.alphabet.profile(input.target).strokes));

        Ok(result.with_strokes(strokes))
    }

    fn confidence_bounds(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "neural"
    }
}

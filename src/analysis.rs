use crate::config::{Config, DelayRange};
use crate::error::{AnalysisError, DataError};
use crate::estimator::{AnalysisResult, EstimateInput, ScoreEstimator};
use crate::feedback::{FeedbackComposer, FeedbackMessage};
use crate::letters::{Alphabet, Letter};
use crate::payload::decode_payload;
use crate::quality::{classify, complexity};
use crate::random::{boxed_source, choose, RandomSource};
use crate::stats::StatsTracker;
use crate::util::round2;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_MIN_DRAWING_BYTES: usize = 8_000;
pub const UNKNOWN_REQUEST: &str = "unknown";
pub const FALLBACK_METHOD: &str = "fallback";
pub const FALLBACK_CONFIDENCE: (f64, f64) = (0.3, 0.6);

pub const PRACTICE_TIPS: &[&str] = &[
    "Focus on proper stroke order",
    "Maintain consistent letter size",
    "Practice slowly for accuracy",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzeRequest {
    pub payload: Option<String>,
    pub target: Option<String>,
    pub stroke_count: Option<u32>,
    pub request_id: Option<String>,
}

/// A validated drawing that is large enough to estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub target: Letter,
    pub bytes: Vec<u8>,
    pub stroke_count: Option<u32>,
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    NoDrawing { image_size: usize },
    Ready(Drawing),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub feedback: FeedbackMessage,
    pub image_size: usize,
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NoDrawing(FeedbackMessage),
    Analysed(Analysis),
}

/// Best-effort answer sent alongside an internal failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fallback {
    pub prediction: Letter,
    pub confidence: f64,
    pub is_correct: bool,
    pub method: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn for_multiplier(multiplier: f64) -> Self {
        if multiplier >= 0.85 {
            Difficulty::Easy
        } else if multiplier >= 0.75 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RandomLetter {
    pub letter: Letter,
    pub name: String,
    pub difficulty: Difficulty,
    pub tips: Vec<&'static str>,
}

/// Validation, classification, estimation and feedback for one drawing.
pub struct Analyzer {
    alphabet: Arc<Alphabet>,
    estimator: Box<dyn ScoreEstimator>,
    composer: FeedbackComposer,
    rng: Mutex<Box<dyn RandomSource>>,
    stats: Option<Arc<StatsTracker>>,
    min_drawing_bytes: usize,
    delay: Option<DelayRange>,
}

impl Analyzer {
    pub fn new(
        alphabet: Arc<Alphabet>,
        estimator: Box<dyn ScoreEstimator>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            alphabet,
            estimator,
            composer: FeedbackComposer,
            rng: Mutex::new(rng),
            stats: None,
            min_drawing_bytes: DEFAULT_MIN_DRAWING_BYTES,
            delay: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, DataError> {
        let alphabet = Arc::new(Alphabet::sinhala()?);
        let estimator = config.estimator.build(alphabet.clone(), config.seed);
        let analyzer = Self::new(alphabet, estimator, boxed_source(config.seed))
            .with_min_drawing_bytes(config.min_drawing_bytes)
            .with_delay(config.processing_delay_ms);

        Ok(if config.track_stats {
            analyzer.with_stats(Arc::new(StatsTracker::new()))
        } else {
            analyzer
        })
    }

    pub fn with_stats(mut self, stats: Arc<StatsTracker>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_min_drawing_bytes(mut self, min_drawing_bytes: usize) -> Self {
        self.min_drawing_bytes = min_drawing_bytes;
        self
    }

    pub fn with_delay(mut self, delay: Option<DelayRange>) -> Self {
        self.delay = delay;
        self
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn composer(&self) -> &FeedbackComposer {
        &self.composer
    }

    pub fn estimator_name(&self) -> &'static str {
        self.estimator.name()
    }

    pub fn stats(&self) -> Option<&Arc<StatsTracker>> {
        self.stats.as_ref()
    }

    pub fn record_request(&self) {
        if let Some(stats) = &self.stats {
            stats.record_request();
        }
    }

    /// How long the HTTP layer should wait before answering, if at all.
    pub fn simulated_delay(&self) -> Option<Duration> {
        let range = self.delay?;
        let unit = self.rng.lock().next_f64();
        Some(range.at(unit))
    }

    pub fn analyze(&self, request: AnalyzeRequest) -> Result<Outcome, AnalysisError> {
        match self.prepare(request)? {
            Prepared::NoDrawing { .. } => Ok(Outcome::NoDrawing(self.composer.no_drawing())),
            Prepared::Ready(drawing) => self.evaluate(drawing).map(Outcome::Analysed),
        }
    }

    /// Checks, in order: target letter, payload presence, payload decoding, size.
    pub fn prepare(&self, request: AnalyzeRequest) -> Result<Prepared, AnalysisError> {
        let catalog = &self.alphabet.catalog;
        let target = match request.target.as_deref().and_then(|t| catalog.get(t)) {
            Some(letter) => letter.clone(),
            None => {
                tracing::warn!(target_letter = ?request.target, "rejected unsupported letter");
                return Err(AnalysisError::InvalidLetter {
                    letter: request.target,
                    supported: catalog.symbols(),
                });
            }
        };

        let raw = match request.payload.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                tracing::warn!(target_letter = %target, "rejected request without image data");
                return Err(AnalysisError::MissingPayload);
            }
        };

        let bytes = decode_payload(raw).map_err(|e| {
            tracing::warn!(target_letter = %target, error = %e, "rejected image data");
            e
        })?;

        if bytes.len() < self.min_drawing_bytes {
            tracing::debug!(
                target_letter = %target,
                image_size = bytes.len(),
                min = self.min_drawing_bytes,
                "drawing too small to analyse"
            );
            return Ok(Prepared::NoDrawing {
                image_size: bytes.len(),
            });
        }

        Ok(Prepared::Ready(Drawing {
            target,
            bytes,
            stroke_count: request.stroke_count,
            request_id: request
                .request_id
                .unwrap_or_else(|| UNKNOWN_REQUEST.to_string()),
        }))
    }

    pub fn evaluate(&self, drawing: Drawing) -> Result<Analysis, AnalysisError> {
        let started = Instant::now();
        let image_size = drawing.bytes.len();
        let input = EstimateInput {
            payload: &drawing.bytes,
            quality: classify(image_size),
            complexity: complexity(image_size),
            target: &drawing.target,
            stroke_count: drawing.stroke_count,
        };
        tracing::debug!(
            target_letter = %drawing.target,
            image_size,
            quality = %input.quality,
            complexity = %input.complexity,
            "classified drawing"
        );

        let (mut result, feedback) = {
            let mut rng = self.rng.lock();
            let result = self
                .estimator
                .estimate(&input, &mut **rng)
                .map_err(|e| {
                    tracing::error!(
                        target_letter = %drawing.target,
                        estimator = self.estimator.name(),
                        error = %e,
                        "estimation failed"
                    );
                    e
                })?;
            let feedback = self.composer.compose(&result, &mut **rng);
            (result, feedback)
        };
        result.processing_time = started.elapsed();

        if let Some(stats) = &self.stats {
            stats.record_analysis(&result.target, result.confidence);
        }

        tracing::info!(
            request_id = %drawing.request_id,
            target_letter = %result.target,
            prediction = %result.prediction,
            confidence = round2(result.confidence),
            correct = result.is_correct(),
            method = result.method,
            "analysis complete"
        );

        Ok(Analysis {
            result,
            feedback,
            image_size,
            request_id: drawing.request_id,
        })
    }

    /// Prediction reported when estimation itself failed.
    pub fn fallback(&self, target: Option<&str>) -> Fallback {
        let catalog = &self.alphabet.catalog;
        let target = target.and_then(|t| catalog.get(t));
        let prediction = target
            .or_else(|| catalog.letters().first())
            .cloned()
            .unwrap_or_else(|| Letter::new(""));
        let (low, high) = FALLBACK_CONFIDENCE;
        let confidence = round2(self.rng.lock().range_f64(low, high));

        Fallback {
            is_correct: target == Some(&prediction),
            prediction,
            confidence,
            method: FALLBACK_METHOD,
        }
    }

    pub fn random_letter(&self) -> Option<RandomLetter> {
        let letter = {
            let mut rng = self.rng.lock();
            choose(&mut **rng, self.alphabet.catalog.letters())?.clone()
        };
        let difficulty = Difficulty::for_multiplier(self.alphabet.profile(&letter).multiplier);

        Some(RandomLetter {
            name: format!("Letter {letter}"),
            letter,
            difficulty,
            tips: PRACTICE_TIPS.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{EstimatorKind, HeuristicEstimator};
    use crate::feedback::FeedbackKind;
    use crate::random::{SeededRandom, SequenceRandom};
    use assert_matches::assert_matches;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    struct Broken;

    impl ScoreEstimator for Broken {
        fn estimate(
            &self,
            _input: &EstimateInput<'_>,
            _rng: &mut dyn RandomSource,
        ) -> Result<AnalysisResult, AnalysisError> {
            Err(AnalysisError::Internal("model unavailable".into()))
        }

        fn confidence_bounds(&self) -> (f64, f64) {
            (0.0, 1.0)
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn alphabet() -> Arc<Alphabet> {
        Arc::new(Alphabet::sinhala().unwrap())
    }

    fn analyzer(draws: Vec<f64>) -> Analyzer {
        let alphabet = alphabet();
        Analyzer::new(
            alphabet.clone(),
            Box::new(HeuristicEstimator::new(alphabet)),
            Box::new(SequenceRandom::new(draws)),
        )
    }

    fn data_url(len: usize) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(vec![0u8; len]))
    }

    fn request(target: &str, len: usize) -> AnalyzeRequest {
        AnalyzeRequest {
            payload: Some(data_url(len)),
            target: Some(target.to_string()),
            stroke_count: None,
            request_id: None,
        }
    }

    #[test]
    fn test_unknown_letter_lists_catalog() {
        let err = analyzer(vec![0.0]).analyze(request("Z", 30_000)).unwrap_err();
        assert_matches!(err, AnalysisError::InvalidLetter { letter, supported } => {
            assert_eq!(letter.as_deref(), Some("Z"));
            assert_eq!(supported.len(), 35);
        });
    }

    #[test]
    fn test_letter_is_checked_before_payload() {
        let req = AnalyzeRequest {
            target: Some("Z".into()),
            ..Default::default()
        };
        assert_matches!(
            analyzer(vec![0.0]).analyze(req),
            Err(AnalysisError::InvalidLetter { .. })
        );

        let req = AnalyzeRequest {
            target: Some("ක".into()),
            ..Default::default()
        };
        assert_matches!(
            analyzer(vec![0.0]).analyze(req),
            Err(AnalysisError::MissingPayload)
        );
    }

    #[test]
    fn test_undecodable_payload() {
        let req = AnalyzeRequest {
            payload: Some("data:image/png;base64,@@@".into()),
            target: Some("ක".into()),
            ..Default::default()
        };
        assert_matches!(
            analyzer(vec![0.0]).analyze(req),
            Err(AnalysisError::InvalidPayload(_))
        );
    }

    #[test]
    fn test_small_drawing_skips_estimation() {
        let stats = Arc::new(StatsTracker::new());
        let analyzer = analyzer(vec![0.0]).with_stats(stats.clone());

        let outcome = analyzer.analyze(request("ක", 500)).unwrap();
        assert_matches!(outcome, Outcome::NoDrawing(feedback) => {
            assert_eq!(feedback.kind, FeedbackKind::Error);
            assert!(feedback.overall.contains("draw something"));
        });
        assert_eq!(stats.snapshot().analysis_requests, 0);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let analyzer = analyzer(vec![0.0]).with_min_drawing_bytes(100);
        assert_matches!(
            analyzer.prepare(request("ක", 500)).unwrap(),
            Prepared::Ready(_)
        );
        assert_matches!(
            analyzer.prepare(request("ක", 99)).unwrap(),
            Prepared::NoDrawing { image_size: 99 }
        );
    }

    #[test]
    fn test_correct_draw_records_stats() {
        let stats = Arc::new(StatsTracker::new());
        let analyzer = analyzer(vec![0.0]).with_stats(stats.clone());

        let outcome = analyzer.analyze(request("ර", 30_000)).unwrap();
        let analysis = assert_matches!(outcome, Outcome::Analysed(a) => a);
        assert!(analysis.result.is_correct());
        assert!((analysis.result.confidence - 0.76).abs() < 1e-9);
        assert_eq!(analysis.image_size, 30_000);
        assert_eq!(analysis.request_id, UNKNOWN_REQUEST);
        assert_eq!(analysis.feedback.kind, FeedbackKind::Success);

        let snap = stats.snapshot();
        assert_eq!(snap.analysis_requests, 1);
        assert_eq!(snap.top_letters[0].letter.as_str(), "ර");
    }

    #[test]
    fn test_incorrect_draw_uses_decoy() {
        let analyzer = analyzer(vec![0.99, 0.0]);
        let outcome = analyzer.analyze(request("ර", 30_000)).unwrap();
        let analysis = assert_matches!(outcome, Outcome::Analysed(a) => a);

        assert!(!analysis.result.is_correct());
        assert_ne!(analysis.result.prediction.as_str(), "ර");
        assert_eq!(analysis.feedback.kind, FeedbackKind::Error);
    }

    #[test]
    fn test_request_id_is_echoed() {
        let mut req = request("ක", 20_000);
        req.request_id = Some("abc-123".into());
        let outcome = analyzer(vec![0.0]).analyze(req).unwrap();
        assert_matches!(outcome, Outcome::Analysed(a) if a.request_id == "abc-123");
    }

    #[test]
    fn test_estimator_failure_is_internal() {
        let alphabet = alphabet();
        let stats = Arc::new(StatsTracker::new());
        let analyzer = Analyzer::new(
            alphabet,
            Box::new(Broken),
            Box::new(SeededRandom::new(1)),
        )
        .with_stats(stats.clone());

        assert_matches!(
            analyzer.analyze(request("ක", 20_000)),
            Err(AnalysisError::Internal(_))
        );
        assert_eq!(stats.snapshot().analysis_requests, 0);
    }

    #[test]
    fn test_fallback_prefers_target() {
        let analyzer = analyzer(vec![0.5]);
        let fallback = analyzer.fallback(Some("ම"));
        assert_eq!(fallback.prediction.as_str(), "ම");
        assert!(fallback.is_correct);
        assert_eq!(fallback.confidence, 0.45);
        assert_eq!(fallback.method, FALLBACK_METHOD);

        let fallback = analyzer.fallback(None);
        assert_eq!(fallback.prediction.as_str(), "ක");
        assert!(!fallback.is_correct);
        assert!((0.3..=0.6).contains(&fallback.confidence));
    }

    #[test]
    fn test_random_letter_difficulty() {
        assert_eq!(Difficulty::for_multiplier(0.95), Difficulty::Easy);
        assert_eq!(Difficulty::for_multiplier(0.85), Difficulty::Easy);
        assert_eq!(Difficulty::for_multiplier(0.75), Difficulty::Medium);
        assert_eq!(Difficulty::for_multiplier(0.65), Difficulty::Hard);

        // index 0 is ක (0.85)
        let pick = analyzer(vec![0.0]).random_letter().unwrap();
        assert_eq!(pick.letter.as_str(), "ක");
        assert_eq!(pick.name, "Letter ක");
        assert_eq!(pick.difficulty, Difficulty::Easy);
        assert_eq!(pick.tips.len(), 3);

        // index 1 is ඛ, which falls back to the default profile
        let pick = analyzer(vec![1.5 / 35.0]).random_letter().unwrap();
        assert_eq!(pick.letter.as_str(), "ඛ");
        assert_eq!(pick.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_delay_is_optional() {
        assert_eq!(analyzer(vec![0.5]).simulated_delay(), None);

        let analyzer = analyzer(vec![0.5]).with_delay(Some(DelayRange {
            min_ms: 800,
            max_ms: 1_500,
        }));
        assert_eq!(analyzer.simulated_delay(), Some(Duration::from_millis(1_150)));
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            estimator: EstimatorKind::Enhanced,
            seed: Some(3),
            track_stats: false,
            ..Default::default()
        };
        let analyzer = Analyzer::from_config(&config).unwrap();
        assert_eq!(analyzer.estimator_name(), "enhanced");
        assert!(analyzer.stats().is_none());
        analyzer.record_request();

        let analyzer = Analyzer::from_config(&Config::default()).unwrap();
        assert_eq!(analyzer.estimator_name(), "heuristic");
        assert!(analyzer.stats().is_some());
    }
}

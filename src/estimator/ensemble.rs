use super::{
    pick_decoy, AnalysisResult, Alternative, EnhancedEstimator, EstimateInput, HeuristicEstimator,
    NeuralEstimator, ScoreEstimator, StrokeAnalysis,
};
use crate::error::AnalysisError;
use crate::letters::{Alphabet, Letter};
use crate::random::RandomSource;
use std::sync::Arc;

pub const NEURAL_WEIGHT: f64 = 0.4;
pub const ENHANCED_WEIGHT: f64 = 0.4;
pub const HEURISTIC_WEIGHT: f64 = 0.2;
pub const MAX_ALTERNATIVES: usize = 3;
pub const FALLBACK_METHOD: &str = "ensemble-fallback";
/// Accuracy used when no member produced an estimate.
pub const FALLBACK_ACCURACY: f64 = 0.65;

/// Weighted vote over several estimators.
///
/// Each member scores the target and the letters it proposed. Scores are
/// averaged by weight over the members that answered; the target wins ties.
pub struct EnsembleEstimator {
    alphabet: Arc<Alphabet>,
    members: Vec<(Box<dyn ScoreEstimator>, f64)>,
}

impl EnsembleEstimator {
    pub fn new(alphabet: Arc<Alphabet>, seed: Option<u64>) -> Self {
        let members: Vec<(Box<dyn ScoreEstimator>, f64)> = vec![
            (
                Box::new(NeuralEstimator::new(alphabet.clone(), seed)),
                NEURAL_WEIGHT,
            ),
            (
                Box::new(EnhancedEstimator::new(alphabet.clone())),
                ENHANCED_WEIGHT,
            ),
            (
                Box::new(HeuristicEstimator::new(alphabet.clone())),
                HEURISTIC_WEIGHT,
            ),
        ];
        Self::with_members(alphabet, members)
    }

    pub fn with_members(alphabet: Arc<Alphabet>, members: Vec<(Box<dyn ScoreEstimator>, f64)>) -> Self {
        let members = members
            .into_iter()
            .map(|(est, weight)| (est, weight.max(0.0)))
            .collect();
        Self { alphabet, members }
    }

    pub fn member_names(&self) -> Vec<&'static str> {
        self.members.iter().map(|(est, _)| est.name()).collect()
    }

    fn fallback_estimate(&self, input: &EstimateInput<'_>, rng: &mut dyn RandomSource) -> AnalysisResult {
        let result = if rng.next_f64() < FALLBACK_ACCURACY {
            AnalysisResult::new(input, input.target.clone(), FALLBACK_ACCURACY)
                .with_target_confidence(FALLBACK_ACCURACY)
        } else {
            let decoy = pick_decoy(&self.alphabet, input.target, rng);
            AnalysisResult::new(input, decoy, FALLBACK_ACCURACY)
        };
        result.with_method(FALLBACK_METHOD)
    }
}

/// Score a member gave the target.
fn target_score(result: &AnalysisResult) -> f64 {
    match result.target_confidence {
        Some(p) => p,
        None if result.is_correct() => result.confidence,
        None => result
            .alternatives
            .iter()
            .find(|alt| alt.letter == result.target)
            .map_or(0.0, |alt| alt.confidence),
    }
}

/// Scores a member gave letters other than the target.
fn other_scores(result: &AnalysisResult) -> impl Iterator<Item = (&Letter, f64)> {
    let prediction = (!result.is_correct()).then_some((&result.prediction, result.confidence));
    prediction.into_iter().chain(
        result
            .alternatives
            .iter()
            .filter(move |alt| alt.letter != result.target)
            .map(|alt| (&alt.letter, alt.confidence)),
    )
}

impl ScoreEstimator for EnsembleEstimator {
    fn estimate(
        &self,
        input: &EstimateInput<'_>,
        rng: &mut dyn RandomSource,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mut total_weight = 0.0_f64;
        let mut target_total = 0.0_f64;
        // first-seen order keeps ties stable
        let mut others: Vec<(Letter, f64)> = Vec::new();

        for (member, weight) in &self.members {
            let weight = *weight;
            let result = match member.estimate(input, rng) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(member = member.name(), error = %e, "ensemble member failed");
                    continue;
                }
            };
            total_weight += weight;
            target_total += weight * target_score(&result);
            for (letter, score) in other_scores(&result) {
                match others.iter_mut().find(|(l, _)| l == letter) {
                    Some((_, total)) => *total += weight * score,
                    None => others.push((letter.clone(), weight * score)),
                }
            }
        }

        let strokes = input
            .stroke_count
            .map(|n| StrokeAnalysis::new(n, self.alphabet.profile(input.target).strokes));

        if total_weight <= 0.0 {
            tracing::warn!("no ensemble member answered, using fallback prediction");
            return Ok(self.fallback_estimate(input, rng).with_strokes(strokes));
        }

        let target_conf = target_total / total_weight;
        let mut candidates: Vec<Alternative> = others
            .into_iter()
            .map(|(letter, total)| Alternative {
                letter,
                confidence: total / total_weight,
            })
            .collect();

        let best = candidates
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, alt)| match best {
                Some((_, c)) if c >= alt.confidence => best,
                _ => Some((i, alt.confidence)),
            });

        let result = match best {
            Some((i, conf)) if conf > target_conf => {
                let winner = candidates.remove(i);
                candidates.push(Alternative {
                    letter: input.target.clone(),
                    confidence: target_conf,
                });
                AnalysisResult::new(input, winner.letter, winner.confidence)
            }
            _ => AnalysisResult::new(input, input.target.clone(), target_conf),
        };

        let mut result = result.with_alternatives(candidates);
        result.alternatives.truncate(MAX_ALTERNATIVES);

        Ok(result
            .with_target_confidence(target_conf)
            .with_strokes(strokes)
            .with_method(self.name()))
    }

    fn confidence_bounds(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "ensemble"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{classify, complexity};
    use crate::random::SequenceRandom;

    /// Always predicts the same letter with the same confidence.
    struct Fixed {
        letter: &'static str,
        confidence: f64,
    }

    impl ScoreEstimator for Fixed {
        fn estimate(
            &self,
            input: &EstimateInput<'_>,
            _rng: &mut dyn RandomSource,
        ) -> Result<AnalysisResult, AnalysisError> {
            Ok(AnalysisResult::new(input, Letter::new(self.letter), self.confidence).with_method("fixed"))
        }

        fn confidence_bounds(&self) -> (f64, f64) {
            (0.0, 1.0)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Failing;

    impl ScoreEstimator for Failing {
        fn estimate(
            &self,
            _input: &EstimateInput<'_>,
            _rng: &mut dyn RandomSource,
        ) -> Result<AnalysisResult, AnalysisError> {
            Err(AnalysisError::Internal("offline".into()))
        }

        fn confidence_bounds(&self) -> (f64, f64) {
            (0.0, 1.0)
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn fixed(letter: &'static str, confidence: f64, weight: f64) -> (Box<dyn ScoreEstimator>, f64) {
        (Box::new(Fixed { letter, confidence }), weight)
    }

    fn failing(weight: f64) -> (Box<dyn ScoreEstimator>, f64) {
        (Box::new(Failing), weight)
    }

    fn input<'a>(target: &'a Letter) -> EstimateInput<'a> {
        EstimateInput {
            payload: &[],
            quality: classify(20_000),
            complexity: complexity(20_000),
            target,
            stroke_count: Some(2),
        }
    }

    fn alphabet() -> Arc<Alphabet> {
        Arc::new(Alphabet::sinhala().unwrap())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_members() {
        let est = EnsembleEstimator::new(alphabet(), Some(3));
        assert_eq!(est.member_names(), vec!["neural", "enhanced", "heuristic"]);
    }

    #[test]
    fn test_weighted_vote_picks_heaviest_letter() {
        let est = EnsembleEstimator::with_members(
            alphabet(),
            vec![fixed("ක", 0.8, 0.4), fixed("ග", 0.9, 0.4), fixed("ග", 0.5, 0.2)],
        );
        let target = Letter::new("ක");
        let result = est.estimate(&input(&target), &mut SequenceRandom::new(vec![0.0])).unwrap();

        // ග: 0.4 * 0.9 + 0.2 * 0.5, ක: 0.4 * 0.8
        assert_eq!(result.prediction, Letter::new("ග"));
        assert!(approx(result.confidence, 0.46));
        assert!(approx(result.target_confidence.unwrap(), 0.32));
        assert!(!result.is_correct());
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(result.alternatives[0].letter, target);
        assert_eq!(result.method, "ensemble");
        assert!(result.strokes.is_some());
    }

    #[test]
    fn test_target_wins_when_ahead() {
        let est = EnsembleEstimator::with_members(
            alphabet(),
            vec![fixed("ක", 0.9, 0.5), fixed("ග", 0.6, 0.25), fixed("ජ", 0.4, 0.25)],
        );
        let target = Letter::new("ක");
        let result = est.estimate(&input(&target), &mut SequenceRandom::new(vec![0.0])).unwrap();

        assert!(result.is_correct());
        assert!(approx(result.confidence, 0.45));
        assert_eq!(result.target_confidence, Some(result.confidence));
        let alts: Vec<&str> = result.alternatives.iter().map(|a| a.letter.as_str()).collect();
        assert_eq!(alts, vec!["ග", "ජ"]);
    }

    #[test]
    fn test_failed_members_are_skipped() {
        let est = EnsembleEstimator::with_members(
            alphabet(),
            vec![failing(0.6), fixed("ක", 0.7, 0.4)],
        );
        let target = Letter::new("ක");
        let result = est.estimate(&input(&target), &mut SequenceRandom::new(vec![0.0])).unwrap();

        assert!(result.is_correct());
        assert!(approx(result.confidence, 0.7));
    }

    #[test]
    fn test_all_members_failing_falls_back() {
        let est = EnsembleEstimator::with_members(
            alphabet(),
            vec![failing(0.5), failing(0.5)],
        );
        let target = Letter::new("ක");

        let hit = est.estimate(&input(&target), &mut SequenceRandom::new(vec![0.0])).unwrap();
        assert_eq!(hit.method, FALLBACK_METHOD);
        assert!(hit.is_correct());
        assert!(approx(hit.confidence, FALLBACK_ACCURACY));

        let miss = est.estimate(&input(&target), &mut SequenceRandom::new(vec![0.9, 0.0])).unwrap();
        assert_eq!(miss.method, FALLBACK_METHOD);
        assert!(!miss.is_correct());
        assert_ne!(miss.prediction, target);
    }
}

use akuru::estimator::{EstimateInput, EstimatorKind, HeuristicEstimator, ScoreEstimator};
use akuru::letters::Alphabet;
use akuru::quality::{classify, complexity};
use akuru::random::SeededRandom;
use std::sync::Arc;

const SIZES: [usize; 5] = [0, 9_999, 12_000, 20_000, 30_000];

#[test]
fn heuristic_correct_rate_tracks_accuracy() {
    let alphabet = Arc::new(Alphabet::sinhala().unwrap());
    let estimator = HeuristicEstimator::new(alphabet.clone());
    let target = alphabet.catalog.get("ර").unwrap();
    let payload = vec![0u8; 30_000];
    let input = EstimateInput {
        payload: &payload,
        quality: classify(payload.len()),
        complexity: complexity(payload.len()),
        target,
        stroke_count: None,
    };
    assert!((estimator.accuracy(&input) - 0.76).abs() < 1e-9);

    let mut rng = SeededRandom::new(2024);
    let trials = 4_000;
    let correct = (0..trials)
        .filter(|_| estimator.estimate(&input, &mut rng).unwrap().is_correct())
        .count();

    let rate = correct as f64 / trials as f64;
    assert!((rate - 0.76).abs() < 0.04, "correct rate {rate}");
}

#[test]
fn every_estimator_respects_its_bounds() {
    let alphabet = Arc::new(Alphabet::sinhala().unwrap());
    let mut rng = SeededRandom::new(11);

    for kind in [
        EstimatorKind::Heuristic,
        EstimatorKind::Enhanced,
        EstimatorKind::Neural,
        EstimatorKind::Ensemble,
    ] {
        let estimator = kind.build(alphabet.clone(), Some(5));
        let (low, high) = estimator.confidence_bounds();

        for target in alphabet.catalog.letters() {
            for len in SIZES {
                let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
                let input = EstimateInput {
                    payload: &payload,
                    quality: classify(len),
                    complexity: complexity(len),
                    target,
                    stroke_count: Some(2),
                };

                for _ in 0..5 {
                    let result = estimator.estimate(&input, &mut rng).unwrap();
                    assert!(
                        result.confidence >= low && result.confidence <= high,
                        "{kind}: {} outside [{low}, {high}]",
                        result.confidence
                    );
                    assert_eq!(result.is_correct(), result.prediction == *target);
                    assert!(alphabet.catalog.contains(result.prediction.as_str()));
                    if let Some(target_confidence) = result.target_confidence {
                        assert!((0.0..=1.0).contains(&target_confidence));
                        if result.is_correct() {
                            assert_eq!(target_confidence, result.confidence);
                        }
                    }
                    assert!(result
                        .alternatives
                        .iter()
                        .all(|alt| alt.letter != result.prediction));
                }
            }
        }
    }
}

#[test]
fn decoys_never_match_target() {
    let alphabet = Arc::new(Alphabet::sinhala().unwrap());
    let estimator = HeuristicEstimator::new(alphabet.clone());
    let mut rng = SeededRandom::new(99);

    for target in alphabet.catalog.letters() {
        // incomplete drawings of hard letters miss most of the time
        let input = EstimateInput {
            payload: &[],
            quality: classify(0),
            complexity: complexity(0),
            target,
            stroke_count: None,
        };
        for _ in 0..50 {
            let result = estimator.estimate(&input, &mut rng).unwrap();
            if !result.is_correct() {
                assert_ne!(&result.prediction, target);
            }
        }
    }
}

#[test]
fn seeded_runs_repeat() {
    let alphabet = Arc::new(Alphabet::sinhala().unwrap());
    let payload = vec![3u8; 18_000];
    let target = alphabet.catalog.get("ම").unwrap();
    let input = EstimateInput {
        payload: &payload,
        quality: classify(payload.len()),
        complexity: complexity(payload.len()),
        target,
        stroke_count: Some(3),
    };

    for kind in [
        EstimatorKind::Heuristic,
        EstimatorKind::Enhanced,
        EstimatorKind::Ensemble,
    ] {
        let estimator = kind.build(alphabet.clone(), None);
        let run = |seed| {
            let mut rng = SeededRandom::new(seed);
            (0..20)
                .map(|_| estimator.estimate(&input, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(8), run(8));
    }
}

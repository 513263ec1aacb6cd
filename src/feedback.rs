use crate::estimator::AnalysisResult;
use crate::quality::QualityLabel;
use crate::random::{choose, RandomSource};
use crate::util::percent;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfidenceTier {
    Excellent,
    Good,
    Acceptable,
}

impl ConfidenceTier {
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence > 0.9 {
            ConfidenceTier::Excellent
        } else if confidence > 0.7 {
            ConfidenceTier::Good
        } else {
            ConfidenceTier::Acceptable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackMessage {
    pub kind: FeedbackKind,
    pub overall: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical: Option<String>,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encouragement: Option<String>,
}

// Placeholders: {target}, {prediction}, {confidence} (whole percent), and
// {second}, {second_confidence} for the runner-up.
const EXCELLENT: &[&str] = &[
    "Perfect! I'm {confidence}% confident this is \"{target}\".",
    "Outstanding handwriting! \"{target}\" was recognised with high confidence.",
    "Excellent! Your \"{target}\" was recognised immediately.",
];

const GOOD: &[&str] = &[
    "Correct! Confidence: {confidence}% for \"{target}\".",
    "Well done! That is clearly \"{target}\".",
    "Good job! The analysis confirms this is \"{target}\".",
];

const ACCEPTABLE: &[&str] = &[
    "Correct, but with some uncertainty ({confidence}% confidence).",
    "Right answer! Try writing more clearly for a higher score.",
    "Correct! \"{target}\" was recognised with moderate confidence.",
];

const INCORRECT: &[&str] = &[
    "I see \"{prediction}\" ({confidence}% confident). Expected \"{target}\".",
    "This looks like \"{prediction}\" with {confidence}% confidence. Try refining your \"{target}\".",
    "Top guess is \"{prediction}\" ({confidence}%), but you're writing \"{target}\".",
];

/// Offered alongside the incorrect templates when there is a runner-up.
const CONFUSION: &str =
    "Confusion: {confidence}% \"{prediction}\", {second_confidence}% \"{second}\". Target: \"{target}\".";

const ENCOURAGE_CORRECT: &[&str] = &[
    "Your handwriting is improving beautifully!",
    "Fantastic letter formation! Keep it up!",
    "You're mastering Sinhala script!",
    "Incredible accuracy! You're a natural!",
];

const ENCOURAGE_INCORRECT: &[&str] = &[
    "Don't worry! Every expert was once a beginner.",
    "Practice makes perfect! You're learning!",
    "Keep trying! Each attempt makes you better!",
    "Learning is a journey, not a destination!",
];

const NO_DRAWING: &str = "Please draw something more substantial before checking!";

pub fn quality_hint(quality: QualityLabel, target: &str) -> String {
    match quality {
        QualityLabel::Incomplete => {
            format!("Try to draw the complete shape of \"{target}\". It looks unfinished.")
        }
        QualityLabel::Basic => {
            format!("The basic shape is there, but try to refine the details of \"{target}\".")
        }
        QualityLabel::Good => {
            format!("Very close! Just small adjustments needed for a perfect \"{target}\".")
        }
        QualityLabel::Detailed => {
            format!("Great detail! Pay attention to the specific curves and lines in \"{target}\".")
        }
    }
}

/// Renders feedback text for analysis results.
///
/// Only the template choice is random; suggestions depend on the result alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackComposer;

impl FeedbackComposer {
    pub fn compose(&self, result: &AnalysisResult, rng: &mut dyn RandomSource) -> FeedbackMessage {
        let confidence = percent(result.confidence);
        let runner_up = result.alternatives.first();
        let render = |template: &str| {
            let text = template
                .replace("{target}", result.target.as_str())
                .replace("{prediction}", result.prediction.as_str())
                .replace("{confidence}", &confidence.to_string());
            match runner_up {
                Some(alt) => text
                    .replace("{second}", alt.letter.as_str())
                    .replace("{second_confidence}", &percent(alt.confidence).to_string()),
                None => text,
            }
        };

        if result.is_correct() {
            let templates = match ConfidenceTier::for_confidence(result.confidence) {
                ConfidenceTier::Excellent => EXCELLENT,
                ConfidenceTier::Good => GOOD,
                ConfidenceTier::Acceptable => ACCEPTABLE,
            };
            FeedbackMessage {
                kind: FeedbackKind::Success,
                overall: pick(rng, templates).map(render).unwrap_or_default(),
                technical: Some(format!("Confidence: {confidence}%")),
                suggestions: self.suggestions(result),
                encouragement: pick(rng, ENCOURAGE_CORRECT).map(str::to_string),
            }
        } else {
            let mut templates = INCORRECT.to_vec();
            if runner_up.is_some() {
                templates.push(CONFUSION);
            }
            FeedbackMessage {
                kind: FeedbackKind::Error,
                overall: pick(rng, &templates).map(render).unwrap_or_default(),
                technical: Some(format!(
                    "Confidence: {confidence}% - let's improve this together!"
                )),
                suggestions: self.suggestions(result),
                encouragement: pick(rng, ENCOURAGE_INCORRECT).map(str::to_string),
            }
        }
    }

    /// Deterministic suggestion list for a result.
    pub fn suggestions(&self, result: &AnalysisResult) -> Vec<String> {
        let mut suggestions = Vec::new();

        if result.is_correct() {
            if result.strokes.is_some_and(|s| s.stroke_accuracy > 0.8) {
                suggestions.push("Excellent stroke technique".to_string());
            }
            return suggestions;
        }

        if let Some(hint) = result.strokes.as_ref().and_then(|s| s.suggestion()) {
            suggestions.push(hint.to_string());
        }
        suggestions.push(quality_hint(result.quality, result.target.as_str()));
        suggestions.push("Focus on the basic shape and proportions".to_string());
        suggestions.push("Take your time - quality over speed".to_string());
        suggestions
    }

    pub fn no_drawing(&self) -> FeedbackMessage {
        FeedbackMessage {
            kind: FeedbackKind::Error,
            overall: NO_DRAWING.to_string(),
            technical: None,
            suggestions: Vec::new(),
            encouragement: None,
        }
    }
}

fn pick<'a>(rng: &mut dyn RandomSource, templates: &[&'a str]) -> Option<&'a str> {
    choose(rng, templates).copied()
}

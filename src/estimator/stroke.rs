use crate::letters::StrokeExpectation;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum StrokeVerdict {
    #[strum(to_string = "Perfect stroke count!")]
    Perfect,
    #[strum(to_string = "Good stroke pattern")]
    WithinTolerance,
    #[strum(to_string = "Consider adjusting stroke count")]
    Adjust,
}

/// Observed vs expected stroke count for one drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeAnalysis {
    pub expected_strokes: u32,
    pub actual_strokes: u32,
    pub stroke_accuracy: f64,
    pub verdict: StrokeVerdict,
}

impl StrokeAnalysis {
    pub fn new(actual: u32, expectation: StrokeExpectation) -> Self {
        let difference = actual.abs_diff(expectation.expected);
        let stroke_accuracy = (1.0 - f64::from(difference) * 0.2).max(0.4);
        let verdict = if difference == 0 {
            StrokeVerdict::Perfect
        } else if difference <= expectation.tolerance {
            StrokeVerdict::WithinTolerance
        } else {
            StrokeVerdict::Adjust
        };

        Self {
            expected_strokes: expectation.expected,
            actual_strokes: actual,
            stroke_accuracy,
            verdict,
        }
    }

    /// Structural hint comparing the stroke counts; `None` when they agree.
    pub fn suggestion(&self) -> Option<&'static str> {
        use std::cmp::Ordering::*;
        match self.actual_strokes.cmp(&self.expected_strokes) {
            Greater => Some("Try using fewer strokes for a cleaner letter"),
            Less => Some("This letter might need more strokes for proper formation"),
            Equal => None,
        }
    }
}

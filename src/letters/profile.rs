use super::catalog::{read_data_file, Letter, LetterCatalog};
use crate::error::DataError;
use crate::quality::StrokeComplexity;
use serde::Deserialize;
use std::collections::HashMap;

/// Declared shape class of a letter, compared against the drawing's complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterClass {
    Simple,
    Complex,
}

impl LetterClass {
    pub fn matches(self, complexity: StrokeComplexity) -> bool {
        matches!(
            (self, complexity),
            (LetterClass::Simple, StrokeComplexity::Simple)
                | (LetterClass::Complex, StrokeComplexity::Complex)
        )
    }
}

/// Expected stroke count for a letter and how far off still counts as fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeExpectation {
    pub expected: u32,
    pub tolerance: u32,
}

/// Resolved per-letter metadata, with defaults already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyProfile {
    pub multiplier: f64,
    pub class: Option<LetterClass>,
    pub strokes: StrokeExpectation,
    pub similar: Vec<Letter>,
}

#[derive(Debug, Clone, Deserialize)]
struct DefaultEntry {
    multiplier: f64,
    expected_strokes: u32,
    stroke_tolerance: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProfileEntry {
    multiplier: Option<f64>,
    class: Option<LetterClass>,
    expected_strokes: Option<u32>,
    #[serde(default)]
    similar: Vec<Letter>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileFile {
    default: DefaultEntry,
    letters: HashMap<String, ProfileEntry>,
}

/// Immutable metadata table keyed by letter.
///
/// Letters missing from the table resolve to the default entry: multiplier
/// 0.75, two expected strokes with a tolerance of one, no class and no
/// similarity group.
#[derive(Debug, Clone)]
pub struct LetterProfiles {
    default: DifficultyProfile,
    profiles: HashMap<Letter, DifficultyProfile>,
    /// Group owners in catalog order, so reverse lookups are stable.
    group_owners: Vec<Letter>,
}

impl LetterProfiles {
    pub fn sinhala(catalog: &LetterCatalog) -> Result<Self, DataError> {
        let contents = read_data_file("profiles.json")?;
        Self::from_json("profiles.json", contents, catalog)
    }

    pub fn from_json(
        source: &str,
        json: &str,
        catalog: &LetterCatalog,
    ) -> Result<Self, DataError> {
        let file: ProfileFile =
            serde_json::from_str(json).map_err(|source_err| DataError::Malformed {
                file: source.to_string(),
                source: source_err,
            })?;

        let default = DifficultyProfile {
            multiplier: file.default.multiplier,
            class: None,
            strokes: StrokeExpectation {
                expected: file.default.expected_strokes,
                tolerance: file.default.stroke_tolerance,
            },
            similar: Vec::new(),
        };
        check_multiplier(source, "default", default.multiplier)?;

        let mut profiles = HashMap::with_capacity(file.letters.len());
        for (symbol, entry) in file.letters {
            let letter = catalog.get(&symbol).cloned().ok_or_else(|| {
                DataError::Inconsistent(format!("{source} profiles unknown letter {symbol}"))
            })?;
            for other in &entry.similar {
                if !catalog.contains(other.as_str()) {
                    return Err(DataError::Inconsistent(format!(
                        "{source} groups unknown letter {other} with {symbol}"
                    )));
                }
                if *other == letter {
                    return Err(DataError::Inconsistent(format!(
                        "{source} lists {symbol} as similar to itself"
                    )));
                }
            }

            let profile = DifficultyProfile {
                multiplier: entry.multiplier.unwrap_or(default.multiplier),
                class: entry.class,
                strokes: StrokeExpectation {
                    expected: entry.expected_strokes.unwrap_or(default.strokes.expected),
                    tolerance: default.strokes.tolerance,
                },
                similar: entry.similar,
            };
            check_multiplier(source, &symbol, profile.multiplier)?;
            profiles.insert(letter, profile);
        }

        let group_owners = catalog
            .letters()
            .iter()
            .filter(|l| profiles.get(*l).is_some_and(|p| !p.similar.is_empty()))
            .cloned()
            .collect();

        Ok(Self {
            default,
            profiles,
            group_owners,
        })
    }

    pub fn get(&self, letter: &Letter) -> &DifficultyProfile {
        self.profiles.get(letter).unwrap_or(&self.default)
    }

    pub fn default_profile(&self) -> &DifficultyProfile {
        &self.default
    }

    pub fn is_mapped(&self, letter: &Letter) -> bool {
        self.profiles.contains_key(letter)
    }

    /// The first group (in catalog order of its owner) that lists `letter`
    /// as a member, returned as the owner and the group.
    pub fn group_containing(&self, letter: &Letter) -> Option<(&Letter, &[Letter])> {
        self.group_owners.iter().find_map(|owner| {
            let group = &self.profiles.get(owner)?.similar;
            group.contains(letter).then_some((owner, group.as_slice()))
        })
    }
}

fn check_multiplier(source: &str, key: &str, multiplier: f64) -> Result<(), DataError> {
    if multiplier > 0.0 && multiplier <= 1.0 {
        Ok(())
    } else {
        Err(DataError::Inconsistent(format!(
            "{source}: multiplier for {key} must lie in (0, 1], got {multiplier}"
        )))
    }
}

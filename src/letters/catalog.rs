use crate::error::DataError;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::fmt;

pub(crate) static LETTER_DIR: Dir = include_dir!("src/letters/data");

/// A single supported symbol from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Letter(String);

impl Letter {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Letter {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Ordered, immutable list of the letters a user can practice.
#[derive(Deserialize, Clone, Debug)]
pub struct LetterCatalog {
    pub name: String,
    pub size: usize,
    letters: Vec<Letter>,
}

impl LetterCatalog {
    pub fn sinhala() -> Result<Self, DataError> {
        Self::from_file("sinhala.json")
    }

    pub fn from_file(file_name: &str) -> Result<Self, DataError> {
        let contents = read_data_file(file_name)?;
        Self::from_json(file_name, contents)
    }

    pub fn from_json(source: &str, json: &str) -> Result<Self, DataError> {
        let catalog: LetterCatalog =
            serde_json::from_str(json).map_err(|source_err| DataError::Malformed {
                file: source.to_string(),
                source: source_err,
            })?;

        if catalog.letters.is_empty() {
            return Err(DataError::Inconsistent(format!("{source} lists no letters")));
        }
        if catalog.size != catalog.letters.len() {
            return Err(DataError::Inconsistent(format!(
                "{source} declares {} letters but lists {}",
                catalog.size,
                catalog.letters.len()
            )));
        }
        for (i, letter) in catalog.letters.iter().enumerate() {
            if catalog.letters[..i].contains(letter) {
                return Err(DataError::Inconsistent(format!(
                    "{source} lists {letter} more than once"
                )));
            }
        }

        Ok(catalog)
    }

    /// Look up a symbol, returning the catalog's own `Letter`.
    pub fn get(&self, symbol: &str) -> Option<&Letter> {
        self.letters.iter().find(|l| l.as_str() == symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn position(&self, letter: &Letter) -> Option<usize> {
        self.letters.iter().position(|l| l == letter)
    }

    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.letters.iter().map(|l| l.as_str().to_string()).collect()
    }

    /// Letters within `radius` catalog positions of `letter`, excluding it.
    pub fn neighbours(&self, letter: &Letter, radius: usize) -> Vec<&Letter> {
        let Some(idx) = self.position(letter) else {
            return Vec::new();
        };
        let start = idx.saturating_sub(radius);
        let end = (idx + radius).min(self.letters.len() - 1);
        self.letters[start..=end]
            .iter()
            .filter(|l| *l != letter)
            .collect()
    }
}

pub(crate) fn read_data_file(file_name: &str) -> Result<&'static str, DataError> {
    let file = LETTER_DIR
        .get_file(file_name)
        .ok_or_else(|| DataError::Missing(file_name.to_string()))?;

    file.contents_utf8()
        .ok_or_else(|| DataError::Encoding(file_name.to_string()))
}

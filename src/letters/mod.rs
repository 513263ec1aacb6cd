pub mod catalog;
pub mod profile;

pub use catalog::{Letter, LetterCatalog};
pub use profile::{DifficultyProfile, LetterClass, LetterProfiles, StrokeExpectation};

use crate::error::DataError;

/// The catalog together with its metadata table, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Alphabet {
    pub catalog: LetterCatalog,
    pub profiles: LetterProfiles,
}

impl Alphabet {
    pub fn sinhala() -> Result<Self, DataError> {
        let catalog = LetterCatalog::sinhala()?;
        let profiles = LetterProfiles::sinhala(&catalog)?;
        Ok(Self { catalog, profiles })
    }

    pub fn profile(&self, letter: &Letter) -> &DifficultyProfile {
        self.profiles.get(letter)
    }
}

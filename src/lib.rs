// Library surface for the binary and the integration tests.
pub mod analysis;
pub mod config;
pub mod error;
pub mod estimator;
pub mod feedback;
pub mod letters;
pub mod payload;
pub mod quality;
pub mod random;
pub mod server;
pub mod stats;
pub mod util;

pub use analysis::{AnalyzeRequest, Analyzer, Outcome};
pub use error::AnalysisError;

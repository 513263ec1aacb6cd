use crate::estimator::EstimatorKind;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Inclusive range for the simulated processing delay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    /// Pick a duration given a uniform draw in `[0, 1)`.
    pub fn at(&self, unit: f64) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        let ms = lo + ((hi - lo) as f64 * unit).round() as u64;
        Duration::from_millis(ms.min(hi))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub estimator: EstimatorKind,
    pub min_drawing_bytes: usize,
    pub processing_delay_ms: Option<DelayRange>,
    pub seed: Option<u64>,
    pub track_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            estimator: EstimatorKind::Heuristic,
            min_drawing_bytes: 8_000,
            processing_delay_ms: None,
            seed: None,
            track_stats: true,
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "akuru") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("akuru_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed config");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "port": 8080, "estimator": "enhanced" }"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.estimator, EstimatorKind::Enhanced);
        assert_eq!(cfg.min_drawing_bytes, 8_000);
        assert!(cfg.track_stats);
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            host: "127.0.0.1".into(),
            port: 4000,
            estimator: EstimatorKind::Neural,
            min_drawing_bytes: 5_000,
            processing_delay_ms: Some(DelayRange {
                min_ms: 800,
                max_ms: 1_500,
            }),
            seed: Some(9),
            track_stats: false,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:4000");
    }

    #[test]
    fn test_delay_range_interpolates() {
        let range = DelayRange {
            min_ms: 800,
            max_ms: 1_500,
        };
        assert_eq!(range.at(0.0), Duration::from_millis(800));
        assert_eq!(range.at(0.5), Duration::from_millis(1_150));
        assert_eq!(range.at(0.9999), Duration::from_millis(1_500));
        assert_eq!(DelayRange::fixed(0).at(0.7), Duration::ZERO);
    }
}

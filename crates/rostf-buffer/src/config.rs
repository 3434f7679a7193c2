//! Buffer configuration – reads/writes the `[buffer]` table of
//! `~/.rostf/config.toml`.
//!
//! Every field has a default, so a missing file, a missing table or a
//! partial table are all valid.  `ROSTF_*` environment variables override
//! the file, see [`apply_env_overrides`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Maximum age of a sample, relative to the newest one of its frame pair.
pub const DEFAULT_BUFFER_HORIZON_SECS: f64 = 2.0;

/// Maximum time distance accepted by [`crate::TransformBuffer::lookup_at_time`].
pub const DEFAULT_TF_MATCH_THRESHOLD_SECS: f64 = 0.1;

/// Errors raised while loading, validating or saving the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Retention and matching policy of a [`crate::TransformBuffer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Samples older than the newest one of their pair by more than this
    /// many seconds are evicted.
    #[serde(default = "default_horizon_secs")]
    pub horizon_secs: f64,

    /// A time lookup fails when the closest sample is further away than
    /// this many seconds.
    #[serde(default = "default_match_threshold_secs")]
    pub match_threshold_secs: f64,

    /// Optional cap on the number of samples kept per frame pair.  A cap
    /// of 1 keeps only the most recent sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries_per_pair: Option<usize>,
}

fn default_horizon_secs() -> f64 {
    DEFAULT_BUFFER_HORIZON_SECS
}
fn default_match_threshold_secs() -> f64 {
    DEFAULT_TF_MATCH_THRESHOLD_SECS
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            horizon_secs: default_horizon_secs(),
            match_threshold_secs: default_match_threshold_secs(),
            max_entries_per_pair: None,
        }
    }
}

impl BufferConfig {
    /// Keep only the most recent sample of each frame pair.
    pub fn latest_only() -> Self {
        Self {
            max_entries_per_pair: Some(1),
            ..Self::default()
        }
    }

    /// Reject negative, NaN or infinite durations and a zero entry cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_duration("horizon_secs", self.horizon_secs)?;
        check_duration("match_threshold_secs", self.match_threshold_secs)?;
        if self.max_entries_per_pair == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_entries_per_pair",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn check_duration(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite, non-negative number of seconds, got {value}"),
        });
    }
    Ok(())
}

/// On-disk layout of the config file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    buffer: BufferConfig,
}

/// Return the path to `~/.rostf/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".rostf").join("config.toml")
}

/// Load the effective configuration from `~/.rostf/config.toml`.
pub fn load() -> Result<BufferConfig, ConfigError> {
    load_effective(&config_path())
}

/// The file at `path`, then environment overrides, then validation.
pub fn load_effective(path: &Path) -> Result<BufferConfig, ConfigError> {
    let mut cfg = load_from(path)?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

/// Load and validate the `[buffer]` table of a specific file.  A missing
/// file yields the defaults.
pub fn load_from(path: &Path) -> Result<BufferConfig, ConfigError> {
    if !path.exists() {
        return Ok(BufferConfig::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&raw)?;
    file.buffer.validate()?;
    info!(path = %path.display(), "loaded buffer config");
    Ok(file.buffer)
}

/// Apply `ROSTF_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ROSTF_BUFFER_HORIZON_SECS` | `horizon_secs` |
/// | `ROSTF_TF_MATCH_THRESHOLD_SECS` | `match_threshold_secs` |
/// | `ROSTF_MAX_ENTRIES_PER_PAIR` | `max_entries_per_pair` |
///
/// Unparsable values are logged and ignored.
pub fn apply_env_overrides(cfg: &mut BufferConfig) {
    if let Some(v) = env_parse::<f64>("ROSTF_BUFFER_HORIZON_SECS") {
        cfg.horizon_secs = v;
    }
    if let Some(v) = env_parse::<f64>("ROSTF_TF_MATCH_THRESHOLD_SECS") {
        cfg.match_threshold_secs = v;
    }
    if let Some(v) = env_parse::<usize>("ROSTF_MAX_ENTRIES_PER_PAIR") {
        cfg.max_entries_per_pair = Some(v);
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring unparsable override");
            None
        }
    }
}

/// Write `cfg` as the `[buffer]` table of `path`, creating parent
/// directories as needed.
pub fn save_to(cfg: &BufferConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let raw = toml::to_string_pretty(&ConfigFile {
        buffer: cfg.clone(),
    })?;
    fs::write(path, raw).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = BufferConfig::default();
        assert_eq!(cfg.horizon_secs, DEFAULT_BUFFER_HORIZON_SECS);
        assert_eq!(cfg.match_threshold_secs, DEFAULT_TF_MATCH_THRESHOLD_SECS);
        assert_eq!(cfg.max_entries_per_pair, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn latest_only_caps_at_one() {
        assert_eq!(BufferConfig::latest_only().max_entries_per_pair, Some(1));
    }

    #[test]
    fn config_path_points_to_rostf_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".rostf"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert_eq!(load_from(&path).expect("no error"), BufferConfig::default());
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[buffer]\nhorizon_secs = 5.0\n").unwrap();

        let cfg = load_from(&path).expect("load ok");
        assert_eq!(cfg.horizon_secs, 5.0);
        assert_eq!(cfg.match_threshold_secs, DEFAULT_TF_MATCH_THRESHOLD_SECS);
    }

    #[test]
    fn file_without_buffer_table_gives_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();
        assert_eq!(load_from(&path).unwrap(), BufferConfig::default());
    }

    #[test]
    fn roundtrip_through_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = BufferConfig {
            horizon_secs: 10.0,
            match_threshold_secs: 0.25,
            max_entries_per_pair: Some(50),
        };
        save_to(&cfg, &path).expect("save");

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("[buffer]"));
        assert_eq!(load_from(&path).expect("load"), cfg);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[buffer]\nhorizon_secs = \"soon\"\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[buffer]\nmatch_threshold_secs = -1.0\n").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.to_string().contains("match_threshold_secs"), "{err}");

        let cfg = BufferConfig {
            max_entries_per_pair: Some(0),
            ..BufferConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = BufferConfig {
            horizon_secs: f64::INFINITY,
            ..BufferConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn apply_env_overrides_changes_horizon() {
        // SAFETY: each env test owns a distinct variable.
        unsafe { std::env::set_var("ROSTF_BUFFER_HORIZON_SECS", "4.5") };
        let mut cfg = BufferConfig::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.horizon_secs, 4.5);
        unsafe { std::env::remove_var("ROSTF_BUFFER_HORIZON_SECS") };
    }

    #[test]
    fn apply_env_overrides_changes_entry_cap() {
        // SAFETY: each env test owns a distinct variable.
        unsafe { std::env::set_var("ROSTF_MAX_ENTRIES_PER_PAIR", "3") };
        let mut cfg = BufferConfig::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.max_entries_per_pair, Some(3));
        unsafe { std::env::remove_var("ROSTF_MAX_ENTRIES_PER_PAIR") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_threshold() {
        // SAFETY: each env test owns a distinct variable.
        unsafe { std::env::set_var("ROSTF_TF_MATCH_THRESHOLD_SECS", "fast") };
        let mut cfg = BufferConfig::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.match_threshold_secs, DEFAULT_TF_MATCH_THRESHOLD_SECS);
        unsafe { std::env::remove_var("ROSTF_TF_MATCH_THRESHOLD_SECS") };
    }
}

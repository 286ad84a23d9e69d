use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ProbeError, Result};

pub const DEFAULT_BUFFER_SIZE: usize = 1024;
/// Longest candidate the exhaustive generator will produce.
pub const DEFAULT_MAX_LENGTH: usize = 8;
pub const DEFAULT_CHARSET: &str = "all";

pub const SUCCESS_REPLY: &str = "Connection success!";
pub const WRONG_PASSWORD_REPLY: &str = "Wrong password!";
pub const EXCEPTION_REPLY: &str = "Exception happened during login";

/// Exact reply texts the server uses as control signals.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Sentinels {
    pub success: String,
    pub wrong_password: String,
    pub exception: String,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            success: SUCCESS_REPLY.to_string(),
            wrong_password: WRONG_PASSWORD_REPLY.to_string(),
            exception: EXCEPTION_REPLY.to_string(),
        }
    }
}

/// Timing heuristics, in seconds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// A reply at or above this is not folded into the latency average and
    /// triggers the backoff pause.
    pub slow_reply_secs: f64,
    pub backoff_secs: f64,
    /// An exchange longer than this counts as a partial match.
    pub partial_match_secs: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            slow_reply_secs: 0.1,
            backoff_secs: 1.0,
            partial_match_secs: 0.9,
        }
    }
}

impl Thresholds {
    pub fn slow_reply(&self) -> Duration {
        Duration::from_secs_f64(self.slow_reply_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_secs)
    }

    pub fn partial_match(&self) -> Duration {
        Duration::from_secs_f64(self.partial_match_secs)
    }
}

/// How the first password generator is chosen.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub enum SearchMode {
    /// Brute force starting at a known minimum length.
    FixedLength(usize),
    /// Case permutations of every word in a dictionary file.
    Dictionary(PathBuf),
    /// Brute force from length 1.
    #[default]
    LoginOnly,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub buffer_size: usize,
    pub sentinels: Sentinels,
    pub thresholds: Thresholds,
    pub max_length: usize,
    pub charset: String,
    pub logins_path: PathBuf,
    pub search_mode: SearchMode,
    pub max_attempts: Option<u64>,
    pub output: Option<PathBuf>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            buffer_size: DEFAULT_BUFFER_SIZE,
            sentinels: Sentinels::default(),
            thresholds: Thresholds::default(),
            max_length: DEFAULT_MAX_LENGTH,
            charset: DEFAULT_CHARSET.to_string(),
            logins_path: PathBuf::from("hacking").join("logins.txt"),
            search_mode: SearchMode::default(),
            max_attempts: None,
            output: None,
        }
    }
}

impl ProbeConfig {
    /// `<workdir>/hacking/logins.txt`
    pub fn default_logins_path(workdir: &Path) -> PathBuf {
        workdir.join("hacking").join("logins.txt")
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ProbeError::config("Target host cannot be empty"));
        }
        if self.buffer_size == 0 {
            return Err(ProbeError::config("Buffer size must be greater than zero"));
        }
        if self.max_length == 0 {
            return Err(ProbeError::config("Maximum candidate length must be at least 1"));
        }
        if let SearchMode::FixedLength(length) = self.search_mode {
            if length == 0 || length > self.max_length {
                return Err(ProbeError::config(format!(
                    "Password length must be between 1 and {}",
                    self.max_length
                )));
            }
        }
        let t = &self.thresholds;
        for (name, value) in [
            ("slow_reply_secs", t.slow_reply_secs),
            ("backoff_secs", t.backoff_secs),
            ("partial_match_secs", t.partial_match_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ProbeError::config(format!("{} must be a non-negative number", name)));
            }
        }
        Ok(())
    }

    /// Load a JSON template written by [`ProbeConfig::save_template`].
    pub fn load_template(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ProbeConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_template(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_known_server() {
        let config = ProbeConfig::default();
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.max_length, 8);
        assert_eq!(config.sentinels.success, "Connection success!");
        assert_eq!(config.sentinels.wrong_password, "Wrong password!");
        assert_eq!(config.sentinels.exception, "Exception happened during login");
        assert_eq!(config.thresholds.slow_reply(), Duration::from_millis(100));
        assert_eq!(config.thresholds.partial_match(), Duration::from_millis(900));
        assert_eq!(config.search_mode, SearchMode::LoginOnly);
    }

    #[test]
    fn default_logins_path_is_under_workdir() {
        let path = ProbeConfig::default_logins_path(Path::new("/work"));
        assert_eq!(path, PathBuf::from("/work/hacking/logins.txt"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ProbeConfig {
            host: "127.0.0.1".into(),
            port: 9090,
            ..ProbeConfig::default()
        };
        assert!(config.validate().is_ok());

        config.search_mode = SearchMode::FixedLength(9);
        assert!(matches!(config.validate(), Err(ProbeError::Config(_))));

        config.search_mode = SearchMode::LoginOnly;
        config.thresholds.partial_match_secs = -1.0;
        assert!(config.validate().is_err());

        config.thresholds = Thresholds::default();
        config.host = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn template_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.json");
        let config = ProbeConfig {
            host: "10.0.0.5".into(),
            port: 9090,
            search_mode: SearchMode::Dictionary(PathBuf::from("words.txt")),
            max_attempts: Some(5000),
            ..ProbeConfig::default()
        };
        config.save_template(&path).unwrap();
        assert_eq!(ProbeConfig::load_template(&path).unwrap(), config);
    }

    #[test]
    fn partial_template_uses_defaults() {
        let config: ProbeConfig =
            serde_json::from_str(r#"{"host": "example.org", "port": 80}"#).unwrap();
        assert_eq!(config.host, "example.org");
        assert_eq!(config.sentinels, Sentinels::default());
        assert_eq!(config.charset, "all");
    }
}

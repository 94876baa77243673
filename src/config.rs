//! Plugin configuration: pool settings, pool sources and row formats.
//!
//! Follows 12-factor style: everything can be loaded from environment
//! variables (or a `.env` file via `dotenvy`), or built programmatically
//! through [`OracleConfig`]'s constructors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// Connection and pool parameters handed to the Oracle driver.
///
/// Pooling itself is delegated entirely to the driver; these values are
/// passed through to its pool builder. Defaults mirror the driver's
/// conventional pool defaults (min 0, max 4, increment 1, 60 s queue
/// timeout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Database user. May be empty when the driver uses external
    /// authentication.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Connect string, e.g. `//localhost:1521/XEPDB1`.
    pub connect_string: String,
    /// Minimum number of pooled connections.
    pub min_connections: u32,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Connections added when the pool grows.
    pub connection_increment: u32,
    /// Seconds a checkout waits for a free connection before failing.
    pub queue_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            connect_string: String::new(),
            min_connections: 0,
            max_connections: 4,
            connection_increment: 1,
            queue_timeout_secs: 60,
        }
    }
}

impl PoolSettings {
    /// Creates settings with the given credentials and default pool sizing.
    pub fn new<U, P, C>(username: U, password: P, connect_string: C) -> Self
    where
        U: Into<String>,
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            username: username.into(),
            password: password.into(),
            connect_string: connect_string.into(),
            ..Self::default()
        }
    }

    /// Loads settings from environment variables.
    ///
    /// Reads `ORACLE_USER`, `ORACLE_PASSWORD`, `ORACLE_CONNECT_STRING`,
    /// `ORACLE_POOL_MIN`, `ORACLE_POOL_MAX`, `ORACLE_POOL_INCREMENT` and
    /// `ORACLE_QUEUE_TIMEOUT_SECS`, falling back to defaults when a
    /// variable is not set. Calls `dotenvy::dotenv().ok()` to optionally
    /// load a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            username: std::env::var("ORACLE_USER").unwrap_or_default(),
            password: std::env::var("ORACLE_PASSWORD").unwrap_or_default(),
            connect_string: std::env::var("ORACLE_CONNECT_STRING").unwrap_or_default(),
            min_connections: parse_env("ORACLE_POOL_MIN", defaults.min_connections),
            max_connections: parse_env("ORACLE_POOL_MAX", defaults.max_connections),
            connection_increment: parse_env("ORACLE_POOL_INCREMENT", defaults.connection_increment),
            queue_timeout_secs: parse_env("ORACLE_QUEUE_TIMEOUT_SECS", defaults.queue_timeout_secs),
        }
    }

    /// Validates the settings before any driver call is made.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::InvalidPoolSettings`] when the connect
    /// string is empty, `max_connections` is zero, or the minimum
    /// exceeds the maximum.
    pub fn validate(&self) -> Result<(), OracleError> {
        if self.connect_string.is_empty() {
            return Err(OracleError::InvalidPoolSettings(
                "connect string must not be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(OracleError::InvalidPoolSettings(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(OracleError::InvalidPoolSettings(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

/// How query rows are rendered by the convenience query interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutFormat {
    /// Rows as JSON objects keyed by column name (the default).
    #[default]
    Object,
    /// Rows as positional JSON arrays.
    Array,
}

impl FromStr for OutFormat {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            _ => Err(OracleError::InvalidOutFormat(s.to_string())),
        }
    }
}

/// Column classes coerced to JSON strings during row conversion.
///
/// `Number` is the materially interesting class: JSON numbers are IEEE
/// doubles, so Oracle NUMBER columns wider than 15 significant digits
/// lose precision unless fetched as strings. `Date` and `Clob` are
/// accepted for configuration compatibility; those classes already
/// render as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchAsString {
    /// NUMBER, FLOAT and binary float/double columns.
    Number,
    /// DATE and TIMESTAMP columns.
    Date,
    /// CLOB and NCLOB columns.
    Clob,
}

impl FromStr for FetchAsString {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "clob" => Ok(Self::Clob),
            _ => Err(OracleError::InvalidFetchAsString(s.to_string())),
        }
    }
}

/// Where the registered pool comes from.
///
/// Exactly one source backs each registration. Supplying an existing
/// pool handle is checked by the type system, so the driver-level
/// "client must be a pool" validation of dynamically-typed plugins has
/// no runtime counterpart here.
pub enum PoolSource {
    /// Create a new pool from settings via the driver's pool builder.
    Settings(PoolSettings),
    /// Reuse an existing driver pool handle.
    Client(oracle::pool::Pool),
    /// Share the pool already registered under another name.
    Alias(String),
}

impl fmt::Debug for PoolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings(settings) => f.debug_tuple("Settings").field(settings).finish(),
            Self::Client(_) => f.write_str("Client(..)"),
            Self::Alias(alias) => f.debug_tuple("Alias").field(alias).finish(),
        }
    }
}

/// One pool registration: a source plus naming and row-format options.
#[derive(Debug, Default)]
pub struct OracleConfig {
    /// Pool source. Registration fails when absent.
    pub source: Option<PoolSource>,
    /// Registry name. Defaults to the crate-wide default pool name.
    pub name: Option<String>,
    /// Row rendering format for the convenience query interface.
    pub out_format: OutFormat,
    /// Column classes coerced to strings during row conversion.
    pub fetch_as_string: Vec<FetchAsString>,
}

impl OracleConfig {
    /// Configuration that creates a new pool from [`PoolSettings`].
    #[must_use]
    pub fn from_settings(settings: PoolSettings) -> Self {
        Self {
            source: Some(PoolSource::Settings(settings)),
            ..Self::default()
        }
    }

    /// Configuration that reuses an existing driver pool handle.
    #[must_use]
    pub fn from_client(pool: oracle::pool::Pool) -> Self {
        Self {
            source: Some(PoolSource::Client(pool)),
            ..Self::default()
        }
    }

    /// Configuration that shares a pool registered under another name.
    #[must_use]
    pub fn from_alias<A: Into<String>>(alias: A) -> Self {
        Self {
            source: Some(PoolSource::Alias(alias.into())),
            ..Self::default()
        }
    }

    /// Sets the registry name for this pool.
    #[must_use]
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the row rendering format.
    #[must_use]
    pub fn out_format(mut self, out_format: OutFormat) -> Self {
        self.out_format = out_format;
        self
    }

    /// Sets the column classes coerced to strings.
    #[must_use]
    pub fn fetch_as_string(mut self, classes: Vec<FetchAsString>) -> Self {
        self.fetch_as_string = classes;
        self
    }

    /// Loads a full registration from environment variables.
    ///
    /// Combines [`PoolSettings::from_env`] with `ORACLE_POOL_NAME`,
    /// `ORACLE_OUT_FORMAT` (`object` | `array`) and
    /// `ORACLE_FETCH_AS_STRING` (comma-separated classes).
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::InvalidOutFormat`] or
    /// [`OracleError::InvalidFetchAsString`] when a set variable fails to
    /// parse. Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, OracleError> {
        let settings = PoolSettings::from_env();

        let mut config = Self::from_settings(settings);
        if let Ok(name) = std::env::var("ORACLE_POOL_NAME") {
            config.name = Some(name);
        }
        if let Ok(raw) = std::env::var("ORACLE_OUT_FORMAT") {
            config.out_format = raw.parse()?;
        }
        if let Ok(raw) = std::env::var("ORACLE_FETCH_AS_STRING") {
            config.fetch_as_string = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse)
                .collect::<Result<Vec<_>, _>>()?;
        }
        Ok(config)
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_mirror_driver_defaults() {
        let settings = PoolSettings::default();
        assert_eq!(settings.min_connections, 0);
        assert_eq!(settings.max_connections, 4);
        assert_eq!(settings.connection_increment, 1);
        assert_eq!(settings.queue_timeout_secs, 60);
    }

    #[test]
    fn validate_rejects_empty_connect_string() {
        let settings = PoolSettings::new("scott", "tiger", "");
        assert!(matches!(
            settings.validate(),
            Err(OracleError::InvalidPoolSettings(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_max() {
        let mut settings = PoolSettings::new("scott", "tiger", "//localhost/XEPDB1");
        settings.max_connections = 0;
        assert!(matches!(
            settings.validate(),
            Err(OracleError::InvalidPoolSettings(_))
        ));
    }

    #[test]
    fn validate_rejects_min_above_max() {
        let mut settings = PoolSettings::new("scott", "tiger", "//localhost/XEPDB1");
        settings.min_connections = 10;
        settings.max_connections = 4;
        assert!(matches!(
            settings.validate(),
            Err(OracleError::InvalidPoolSettings(_))
        ));
    }

    #[test]
    fn validate_accepts_reasonable_settings() {
        let settings = PoolSettings::new("scott", "tiger", "//localhost/XEPDB1");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let parsed: Result<PoolSettings, _> = serde_json::from_value(serde_json::json!({
            "username": "scott",
            "password": "tiger",
            "connect_string": "//localhost/XEPDB1",
            "max_connections": 8
        }));
        let Ok(settings) = parsed else {
            panic!("settings should deserialize");
        };
        assert_eq!(settings.max_connections, 8);
        assert_eq!(settings.min_connections, 0);
        assert_eq!(settings.queue_timeout_secs, 60);
    }

    #[test]
    fn object_is_the_default_out_format() {
        assert_eq!(OutFormat::default(), OutFormat::Object);
    }

    #[test]
    fn out_format_parses_case_insensitively() {
        assert_eq!("OBJECT".parse::<OutFormat>().ok(), Some(OutFormat::Object));
        assert_eq!("array".parse::<OutFormat>().ok(), Some(OutFormat::Array));
        assert!(matches!(
            "rows".parse::<OutFormat>(),
            Err(OracleError::InvalidOutFormat(_))
        ));
    }

    #[test]
    fn fetch_as_string_parses_known_classes() {
        assert_eq!(
            "NUMBER".parse::<FetchAsString>().ok(),
            Some(FetchAsString::Number)
        );
        assert_eq!(
            "date".parse::<FetchAsString>().ok(),
            Some(FetchAsString::Date)
        );
        assert!(matches!(
            "buffer".parse::<FetchAsString>(),
            Err(OracleError::InvalidFetchAsString(_))
        ));
    }

    #[test]
    fn builder_composes_options() {
        let config = OracleConfig::from_alias("main")
            .name("reporting")
            .out_format(OutFormat::Array)
            .fetch_as_string(vec![FetchAsString::Number]);
        assert!(matches!(config.source, Some(PoolSource::Alias(_))));
        assert_eq!(config.name.as_deref(), Some("reporting"));
        assert_eq!(config.out_format, OutFormat::Array);
        assert_eq!(config.fetch_as_string, vec![FetchAsString::Number]);
    }

    #[test]
    fn default_config_has_no_source() {
        let config = OracleConfig::default();
        assert!(config.source.is_none());
        assert!(config.name.is_none());
        assert_eq!(config.out_format, OutFormat::Object);
        assert!(config.fetch_as_string.is_empty());
    }
}

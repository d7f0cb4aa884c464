use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_DB_PATH: &str = "scores.duckdb";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("DB_PORT must be a port number, got `{value}`")]
    InvalidPort { value: String },
}

/// Connection settings, read once and passed explicitly to whoever needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub user: String,
    /// Schema the target table lives in. Empty means the store's default.
    pub database: String,
    pub port: u16,
    /// Database file of the embedded store.
    pub path: PathBuf,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            database: String::new(),
            port: DEFAULT_PORT,
            path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

impl ConnectionConfig {
    /// Load `KEY=VALUE` lines from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Blank lines and `#` comments are skipped, unknown keys ignored.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "DB_HOST" => cfg.host = value.to_string(),
                "DB_USER" => cfg.user = value.to_string(),
                "DB_NAME" => cfg.database = value.to_string(),
                "DB_PORT" => {
                    cfg.port = value.parse().map_err(|_| ConfigError::InvalidPort {
                        value: value.to_string(),
                    })?
                }
                "DB_PATH" => cfg.path = PathBuf::from(value),
                other => debug!(key = other, "ignoring unknown config key"),
            }
        }
        Ok(cfg)
    }

    /// Schema to resolve tables in.
    pub fn schema(&self) -> &str {
        if self.database.is_empty() {
            "main"
        } else {
            &self.database
        }
    }
}

/// Credential passed on the command line. Never printed.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_known_keys() {
        let cfg = ConnectionConfig::parse(
            "# connection\nDB_HOST=localhost\n\nDB_USER=root\nDB_NAME=student_records\nDB_PORT=3307\n",
        )
        .unwrap();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.user, "root");
        assert_eq!(cfg.database, "student_records");
        assert_eq!(cfg.port, 3307);
        assert_eq!(cfg.path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(cfg.schema(), "student_records");
    }

    #[test]
    fn test_defaults_and_unknown_keys() {
        let cfg = ConnectionConfig::parse("DB_HOST=db\r\nCOLOR=blue\nnot a pair\n").unwrap();
        assert_eq!(cfg.host, "db");
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.schema(), "main");
    }

    #[test]
    fn test_value_may_contain_equals() {
        let cfg = ConnectionConfig::parse("DB_PATH=/tmp/a=b.duckdb\n").unwrap();
        assert_eq!(cfg.path, PathBuf::from("/tmp/a=b.duckdb"));
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let err = ConnectionConfig::parse("DB_PORT=abc\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "DB_USER=loader").unwrap();
        let cfg = ConnectionConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg.user, "loader");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = ConnectionConfig::load("/no/such/db.ini").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_secret_is_redacted() {
        let s = Secret::new("hunter2");
        assert_eq!(format!("{:?}", s), "Secret(***)");
        assert!(!s.is_empty());
    }
}

//! Configuration loading for the pension ledger.
//!
//! ```toml
//! [rules]
//! minimum_contribution = 25
//! minimum_age = 18
//! retirement_age_years = 60
//!
//! [storage]
//! path = "${HOME}/.pension/ledger.db"
//! ```
//!
//! Every field is optional. The raw structs below never leave this crate:
//! [`PensionConfig::resolve`] turns them into [`ResolvedConfig`], whose
//! [`LedgerRules`] are validated.

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

use pension_types::{Amount, LedgerRules, RulesError};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "PENSION_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid ledger rules in {}: {source}", path.display())]
    Invalid { path: PathBuf, source: RulesError },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PensionConfig {
    pub rules: Option<RulesConfig>,
    pub storage: Option<StorageConfig>,
    /// Where this config was read from; used in error messages.
    #[serde(skip)]
    source: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RulesConfig {
    /// Smallest accepted opening contribution. Default: 25.
    pub minimum_contribution: Option<Amount>,
    /// Youngest accepted declared age. Default: 18.
    pub minimum_age: Option<u32>,
    /// Age at which an account becomes eligible for retirement. Default: 60.
    pub retirement_age_years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path. `${VAR}` references are expanded.
    pub path: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub rules: LedgerRules,
    pub db_path: PathBuf,
}

impl PensionConfig {
    /// Load the config from [`config_path`]. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let raw = self.rules.as_ref();
        let rules = LedgerRules::new(
            raw.and_then(|r| r.minimum_contribution)
                .unwrap_or(LedgerRules::DEFAULT_MINIMUM_CONTRIBUTION),
            raw.and_then(|r| r.minimum_age)
                .unwrap_or(LedgerRules::DEFAULT_MINIMUM_AGE),
            raw.and_then(|r| r.retirement_age_years)
                .unwrap_or(LedgerRules::DEFAULT_RETIREMENT_AGE_YEARS),
        )
        .map_err(|source| ConfigError::Invalid {
            path: self.source.clone().unwrap_or_default(),
            source,
        })?;

        let db_path = self
            .storage
            .as_ref()
            .and_then(|storage| storage.path.as_deref())
            .map(|path| PathBuf::from(expand_env_vars(path)))
            .unwrap_or_else(default_db_path);

        Ok(ResolvedConfig { rules, db_path })
    }
}

/// Expand `${VAR}` references. Unset variables expand to nothing.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

/// `$PENSION_CONFIG`, else `~/.pension/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(path));
    }
    pension_dir().map(|dir| dir.join("config.toml"))
}

/// `~/.pension`, the home of config, database and logs.
#[must_use]
pub fn pension_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pension"))
}

fn default_db_path() -> PathBuf {
    pension_dir()
        .unwrap_or_else(|| PathBuf::from(".pension"))
        .join("ledger.db")
}

use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};
use thiserror::Error;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "ESCROW_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct EscrowConfig {
    pub ledger: Option<LedgerConfig>,
    pub log: Option<LogConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Storage backend behind the registry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    Sqlite,
    /// Process-local; nothing survives the invocation.
    Memory,
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,
    /// Database file for the sqlite backend. `${VAR}` references are expanded.
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: Option<String>,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        let after = &rest[open + 2..];
        let Some(close) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        let var = &after[..close];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

impl EscrowConfig {
    /// Load from [`config_path`]. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn backend(&self) -> LedgerBackend {
        self.ledger
            .as_ref()
            .map(|ledger| ledger.backend)
            .unwrap_or_default()
    }

    /// Configured ledger file with `${VAR}` expanded, else [`default_ledger_path`].
    #[must_use]
    pub fn ledger_path(&self) -> Option<PathBuf> {
        match self.ledger.as_ref().and_then(|ledger| ledger.path.as_deref()) {
            Some(raw) => {
                let expanded = expand_env_vars(raw);
                if expanded.trim().is_empty() {
                    default_ledger_path()
                } else {
                    Some(PathBuf::from(expanded))
                }
            }
            None => default_ledger_path(),
        }
    }

    #[must_use]
    pub fn log_level(&self) -> Option<&str> {
        self.log
            .as_ref()
            .and_then(|log| log.level.as_deref())
            .map(str::trim)
            .filter(|level| !level.is_empty())
    }
}

fn escrow_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".escrow"))
}

/// `$ESCROW_CONFIG` when set and non-empty, else `~/.escrow/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    escrow_home().map(|home| home.join("config.toml"))
}

pub fn default_ledger_path() -> Option<PathBuf> {
    escrow_home().map(|home| home.join("ledger.db"))
}

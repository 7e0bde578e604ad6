//! Configuration for the ledger CLI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured data directory.
pub const DATA_DIR_ENV: &str = "MINTLEDGER_DATA_DIR";

/// Configuration for the ledger CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory holding the ledger database
    pub data_dir: PathBuf,
    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
    /// How many times an operation is attempted when its commit conflicts
    pub attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let mut data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        data_dir.push("mintledger");
        Self {
            data_dir,
            log_filter: "info".to_string(),
            attempts: 3,
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file =
            File::open(path).with_context(|| format!("cannot open config {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config = serde_json::from_str(&contents)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Builds the effective configuration: the file (or defaults), then the
    /// environment, then the command line flag.
    pub fn load(path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }

        Ok(config)
    }
}

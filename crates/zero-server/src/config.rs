use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use zero_core::QueryConfig;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "zero.toml";

#[derive(Parser, Debug, Clone)]
#[command(name = "zero")]
#[command(about = "Universal graph query and discovery server")]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "ZERO_HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: SocketAddr,

    /// Data directory
    #[arg(long, env = "ZERO_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Path to a TOML file with engine tuning
    #[arg(long = "config", env = "ZERO_CONFIG")]
    pub config_file: Option<PathBuf>,
}

impl Config {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("zero.redb")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("creating data dir {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Load the tuning file. An explicit path must exist; the default one
    /// is optional.
    pub fn load_file(&self) -> anyhow::Result<FileConfig> {
        let file = match &self.config_file {
            Some(path) => FileConfig::from_path(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                FileConfig::from_path(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => FileConfig::default(),
        };
        file.query
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid [query] config: {}", e))?;
        Ok(file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: PathBuf::from("./data"),
            config_file: None,
        }
    }
}

/// Contents of `zero.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub query: QueryConfig,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("parsing config file {:?}", path))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

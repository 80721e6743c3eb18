//! Service configuration for bm25d
//!
//! Provides TOML-based configuration with environment variable override
//! support. Priority: CLI args > Environment variables > Config file >
//! Defaults.

use crate::index::Bm25Params;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Directory for persisted indices (default: ./bm25-data)
    #[serde(default = "default_storage_dir")]
    storage_dir: String,

    /// Listen address (default: 0.0.0.0)
    #[serde(default = "default_listen_addr")]
    listen_addr: String,

    /// Listen port (default: 3002)
    #[serde(default = "default_port")]
    port: u16,

    /// Default number of results to return
    #[serde(default = "default_top_k")]
    default_top_k: usize,

    /// BM25 term-frequency saturation parameter
    #[serde(default = "default_k1")]
    bm25_k1: f32,

    /// BM25 length normalization parameter
    #[serde(default = "default_b")]
    bm25_b: f32,
}

fn default_storage_dir() -> String {
    "./bm25-data".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_top_k() -> usize {
    10
}

fn default_k1() -> f32 {
    1.5
}

fn default_b() -> f32 {
    0.75
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            listen_addr: default_listen_addr(),
            port: default_port(),
            default_top_k: default_top_k(),
            bm25_k1: default_k1(),
            bm25_b: default_b(),
        }
    }
}

impl ServiceConfig {
    /// Create config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: ServiceConfig =
            toml::from_str(&content).map_err(|e| anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("BM25D_STORAGE_DIR") {
            config.storage_dir = dir;
        }
        if let Ok(addr) = std::env::var("BM25D_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Ok(port) = std::env::var("BM25D_PORT") {
            if let Ok(n) = port.parse() {
                config.port = n;
            }
        }
        if let Ok(top_k) = std::env::var("BM25D_TOP_K") {
            if let Ok(n) = top_k.parse() {
                config.default_top_k = n;
            }
        }
        if let Ok(k1) = std::env::var("BM25D_K1") {
            if let Ok(v) = k1.parse() {
                config.bm25_k1 = v;
            }
        }
        if let Ok(b) = std::env::var("BM25D_B") {
            if let Ok(v) = b.parse() {
                config.bm25_b = v;
            }
        }

        config
    }

    /// Merge with another config (other takes priority for non-default values)
    pub fn merge_with(&self, other: &Self) -> Self {
        Self {
            storage_dir: if other.storage_dir != default_storage_dir() {
                other.storage_dir.clone()
            } else {
                self.storage_dir.clone()
            },
            listen_addr: if other.listen_addr != default_listen_addr() {
                other.listen_addr.clone()
            } else {
                self.listen_addr.clone()
            },
            port: if other.port != default_port() {
                other.port
            } else {
                self.port
            },
            default_top_k: if other.default_top_k != default_top_k() {
                other.default_top_k
            } else {
                self.default_top_k
            },
            bm25_k1: if other.bm25_k1 != default_k1() {
                other.bm25_k1
            } else {
                self.bm25_k1
            },
            bm25_b: if other.bm25_b != default_b() {
                other.bm25_b
            } else {
                self.bm25_b
            },
        }
    }

    /// Override storage_dir
    pub fn with_storage_dir(mut self, dir: &str) -> Self {
        self.storage_dir = dir.to_string();
        self
    }

    /// Override port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override default_top_k
    pub fn with_default_top_k(mut self, k: usize) -> Self {
        self.default_top_k = k;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_top_k == 0 {
            return Err(anyhow!("default_top_k must be greater than 0"));
        }
        if self.bm25_k1 <= 0.0 {
            return Err(anyhow!("bm25_k1 must be positive, got {}", self.bm25_k1));
        }
        if !(0.0..=1.0).contains(&self.bm25_b) {
            return Err(anyhow!(
                "bm25_b must be within [0.0, 1.0], got {}",
                self.bm25_b
            ));
        }
        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| anyhow!("Failed to serialize config: {}", e))
    }

    // Getters
    pub fn storage_dir(&self) -> &str {
        &self.storage_dir
    }

    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// BM25 parameters as used by the scoring engine
    pub fn bm25_params(&self) -> Bm25Params {
        Bm25Params {
            k1: self.bm25_k1,
            b: self.bm25_b,
        }
    }
}

// Ingestion and storage configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Canonical source for the GO basic ontology
pub const DEFAULT_OBO_URL: &str = "http://purl.obolibrary.org/obo/go/go-basic.obo";

/// Default annotation source (human subset of GOA)
pub const DEFAULT_GAF_URL: &str =
    "http://geneontology.org/gene-associations/goa_human.gaf.gz";

/// Configuration for ingestion, storage and downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GobelConfig {
    /// SQLite database URL (e.g., "sqlite:/path/to/gobel.db")
    pub database_url: String,

    /// URL of the OBO ontology file
    pub obo_url: String,

    /// URL of the GAF annotation file
    pub gaf_url: String,

    /// Directory for cached downloads
    pub cache_dir: PathBuf,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with download requests
    pub user_agent: String,

    /// Parse limit for testing (None = parse all)
    pub parse_limit: Option<usize>,

    /// Local path to an ontology file (skips download when set)
    pub local_obo_path: Option<PathBuf>,
}

impl Default for GobelConfig {
    fn default() -> Self {
        GobelConfig {
            database_url: default_database_url(),
            obo_url: DEFAULT_OBO_URL.to_string(),
            gaf_url: DEFAULT_GAF_URL.to_string(),
            cache_dir: default_cache_dir(),
            timeout_secs: 300,
            user_agent: default_user_agent(),
            parse_limit: None,
            local_obo_path: None,
        }
    }
}

fn default_database_url() -> String {
    let path = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gobel")
        .join("gobel.db");
    format!("sqlite:{}", path.display())
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".gobel-cache"))
        .join("gobel")
}

fn default_user_agent() -> String {
    format!("gobel/{}", env!("CARGO_PKG_VERSION"))
}

impl GobelConfig {
    /// Create new config with builder pattern
    pub fn builder() -> GobelConfigBuilder {
        GobelConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// Recognized variables: GOBEL_DATABASE_URL, GOBEL_OBO_URL,
    /// GOBEL_GAF_URL, GOBEL_CACHE_DIR, GOBEL_HTTP_TIMEOUT_SECS,
    /// GOBEL_USER_AGENT, GOBEL_PARSE_LIMIT, GOBEL_LOCAL_OBO_PATH.
    pub fn from_env() -> Self {
        let default = GobelConfig::default();

        GobelConfig {
            database_url: std::env::var("GOBEL_DATABASE_URL")
                .unwrap_or(default.database_url),
            obo_url: std::env::var("GOBEL_OBO_URL").unwrap_or(default.obo_url),
            gaf_url: std::env::var("GOBEL_GAF_URL").unwrap_or(default.gaf_url),
            cache_dir: std::env::var("GOBEL_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.cache_dir),
            timeout_secs: std::env::var("GOBEL_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            user_agent: std::env::var("GOBEL_USER_AGENT")
                .unwrap_or(default.user_agent),
            parse_limit: std::env::var("GOBEL_PARSE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok()),
            local_obo_path: std::env::var("GOBEL_LOCAL_OBO_PATH").ok().map(PathBuf::from),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.obo_url.is_empty() && self.local_obo_path.is_none() {
            return Err("Ontology URL cannot be empty without a local file".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Configuration for tests: in-memory database, temp cache, capped parse
    pub fn test_config() -> Self {
        GobelConfig {
            database_url: "sqlite::memory:".to_string(),
            cache_dir: std::env::temp_dir().join("gobel-test-cache"),
            parse_limit: Some(1000),
            ..GobelConfig::default()
        }
    }
}

/// Builder for GobelConfig
#[derive(Debug, Default)]
pub struct GobelConfigBuilder {
    database_url: Option<String>,
    obo_url: Option<String>,
    gaf_url: Option<String>,
    cache_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    parse_limit: Option<usize>,
    local_obo_path: Option<PathBuf>,
}

impl GobelConfigBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn obo_url(mut self, url: impl Into<String>) -> Self {
        self.obo_url = Some(url.into());
        self
    }

    pub fn gaf_url(mut self, url: impl Into<String>) -> Self {
        self.gaf_url = Some(url.into());
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn parse_limit(mut self, limit: usize) -> Self {
        self.parse_limit = Some(limit);
        self
    }

    pub fn local_obo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_obo_path = Some(path.into());
        self
    }

    pub fn build(self) -> GobelConfig {
        let default = GobelConfig::default();

        GobelConfig {
            database_url: self.database_url.unwrap_or(default.database_url),
            obo_url: self.obo_url.unwrap_or(default.obo_url),
            gaf_url: self.gaf_url.unwrap_or(default.gaf_url),
            cache_dir: self.cache_dir.unwrap_or(default.cache_dir),
            timeout_secs: self.timeout_secs.unwrap_or(default.timeout_secs),
            user_agent: self.user_agent.unwrap_or(default.user_agent),
            parse_limit: self.parse_limit,
            local_obo_path: self.local_obo_path,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

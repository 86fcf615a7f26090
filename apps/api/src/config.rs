use anyhow::{bail, Context, Result};

pub const DEFAULT_BASE_PATH: &str = "/api/applications";

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Local { upload_dir: String },
    S3(S3Config),
}

#[derive(Debug, Clone, PartialEq)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if a backend is selected without its required variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. The in-memory store is used when unset.
    pub database_url: Option<String>,
    pub storage: StorageBackend,
    pub base_path: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let storage = match lookup("STORAGE_BACKEND").as_deref().unwrap_or("local") {
            "local" => StorageBackend::Local {
                upload_dir: lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            },
            "s3" => StorageBackend::S3(S3Config {
                bucket: require("S3_BUCKET")?,
                endpoint: require("S3_ENDPOINT")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            other => bail!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
        };

        let base_path = lookup("API_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.to_string());
        if !base_path.starts_with('/') || base_path.len() < 2 {
            bail!("API_BASE_PATH must start with '/' and not be the root, got '{base_path}'");
        }

        Ok(Config {
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            storage,
            base_path: base_path.trim_end_matches('/').to_string(),
            port: lookup("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

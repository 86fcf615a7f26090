use std::path::PathBuf;

use anyhow::{bail, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/applications";
pub const DEFAULT_SNAPSHOT_DIR: &str = ".jobapply";

/// Where the wizard talks to and where it keeps its snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardConfig {
    pub api_base_url: String,
    pub snapshot_dir: PathBuf,
}

impl WizardConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base_url = lookup("WIZARD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            bail!("WIZARD_API_URL must be an http(s) URL, got '{api_base_url}'");
        }

        Ok(WizardConfig {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            snapshot_dir: lookup("WIZARD_SNAPSHOT_DIR")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_DIR.to_string())
                .into(),
        })
    }
}

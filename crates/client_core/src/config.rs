use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use url::Url;

pub const SETTINGS_FILE: &str = "qa_client.toml";
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8000";
pub const PRODUCTION_PATH_PREFIX: &str = "/api";
pub const DEFAULT_API_KEY: &str = "dev-secret";
pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost";

/// Deployment flavour baked in at compile time via `QA_DEPLOYMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Production,
    Development,
}

impl Deployment {
    pub fn from_build_env() -> Self {
        Self::from_flag(option_env!("QA_DEPLOYMENT"))
    }

    fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Everything the dispatcher needs to talk to the backend. Resolved once at
/// startup and handed to the dispatcher explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub deployment: Deployment,
    pub api_base: Option<String>,
    pub api_key: String,
    pub public_origin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deployment: Deployment::from_build_env(),
            api_base: None,
            api_key: DEFAULT_API_KEY.into(),
            public_origin: DEFAULT_PUBLIC_ORIGIN.into(),
        }
    }
}

impl Settings {
    pub fn resolved_base_url(&self) -> String {
        if let Some(base) = self.api_base.as_deref().filter(|b| !b.trim().is_empty()) {
            return base.trim().to_string();
        }
        match self.deployment {
            Deployment::Production => format!(
                "{}{PRODUCTION_PATH_PREFIX}",
                self.public_origin.trim_end_matches('/')
            ),
            Deployment::Development => DEVELOPMENT_BASE_URL.to_string(),
        }
    }

    pub fn into_client_config(self) -> Result<ClientConfig> {
        let base_url = self.resolved_base_url();
        ClientConfig::new(base_url, self.api_key)
            .context("failed to resolve backend base address")
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_base") {
                    settings.api_base = Some(v.clone());
                }
                if let Some(v) = file_cfg.get("api_key") {
                    settings.api_key = v.clone();
                }
                if let Some(v) = file_cfg.get("public_origin") {
                    settings.public_origin = v.clone();
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable settings file: {err}");
            }
        }
    }

    for key in ["QA_API_BASE", "APP__API_BASE"] {
        if let Some(v) = env(key) {
            settings.api_base = Some(v);
        }
    }
    for key in ["QA_API_KEY", "APP__API_KEY"] {
        if let Some(v) = env(key) {
            settings.api_key = v;
        }
    }
    for key in ["QA_PUBLIC_ORIGIN", "APP__PUBLIC_ORIGIN"] {
        if let Some(v) = env(key) {
            settings.public_origin = v;
        }
    }

    settings
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("backend base address is empty"));
    }
    let parsed = Url::parse(trimmed).with_context(|| format!("invalid base address '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!(
            "unsupported scheme '{}' in base address '{raw}'",
            parsed.scheme()
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

use std::{fs, io, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "admin.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".into(),
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Resolves settings from `path` (if present) and the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    resolve_settings(raw.as_deref(), |key| std::env::var(key).ok())
        .with_context(|| format!("invalid config file '{}'", path.display()))
}

fn resolve_settings(
    raw_file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = raw_file {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.api_base_url {
            settings.api_base_url = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = v;
        }
    }

    if let Some(v) = env("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
        }
    }

    Ok(settings)
}

/// Parses the users API base URL, dropping trailing slashes.
pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("users API base URL is empty");
    }
    let url = Url::parse(trimmed)
        .with_context(|| format!("users API base URL '{trimmed}' is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("users API base URL '{trimmed}' must use http or https");
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let settings = resolve_settings(None, env_from(&[])).expect("settings");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn env_overrides_file_values() {
        let raw = "api_base_url = \"http://file.local\"\nrequest_timeout_secs = 5\n";
        let settings = resolve_settings(
            Some(raw),
            env_from(&[
                ("API_BASE_URL", "http://plain.local"),
                ("APP__API_BASE_URL", "http://prefixed.local"),
            ]),
        )
        .expect("settings");
        assert_eq!(settings.api_base_url, "http://prefixed.local");
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn invalid_timeout_in_env_is_ignored() {
        let settings = resolve_settings(None, env_from(&[("APP__REQUEST_TIMEOUT_SECS", "soon")]))
            .expect("settings");
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(resolve_settings(Some("api_base_url = ["), env_from(&[])).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("admin_config_test_missing/admin.toml");
        let settings = load_settings(&path).expect("settings");
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn base_url_drops_trailing_slashes() {
        let url = parse_base_url(" https://api.example.com/v2// ").expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/v2");
    }

    #[test]
    fn base_url_requires_http_scheme() {
        assert!(parse_base_url("ftp://api.example.com").is_err());
        assert!(parse_base_url("").is_err());
        assert!(parse_base_url("not a url").is_err());
    }
}

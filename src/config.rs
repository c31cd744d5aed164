use std::{fs, net::SocketAddr, path::PathBuf};

use url::Url;

use crate::error::ConfigError;

const DEFAULT_DATABASE_URL: &str = "sqlite:highscores.db";
const DEFAULT_CATEGORIES_DIR: &str = "categories";
const DEFAULT_TOKEN_FILE: &str = "token.txt";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub database_url: String,
    pub categories_dir: PathBuf,
    pub log_level: String,
    /// Long polling is used when absent.
    pub webhook: Option<WebhookConfig>,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = match lookup("TELOXIDE_TOKEN") {
            Some(token) => token,
            None => {
                let path = PathBuf::from(
                    lookup("TOKEN_FILE").unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_owned()),
                );
                fs::read_to_string(&path)
                    .map_err(|source| ConfigError::TokenFile { path, source })?
            }
        };
        let token = token.trim().to_owned();
        if token.is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        let webhook = match (lookup("WEBHOOK_URL"), lookup("WEBHOOK_ADDR")) {
            (Some(url), Some(addr)) => Some(WebhookConfig {
                url: url.parse().map_err(|err: url::ParseError| ConfigError::Invalid {
                    name: "WEBHOOK_URL",
                    reason: err.to_string(),
                })?,
                addr: addr
                    .parse()
                    .map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
                        name: "WEBHOOK_ADDR",
                        reason: err.to_string(),
                    })?,
            }),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::Invalid {
                    name: "WEBHOOK_URL",
                    reason: "WEBHOOK_URL and WEBHOOK_ADDR must be set together".to_owned(),
                })
            }
        };

        Ok(Self {
            token,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            categories_dir: lookup("CATEGORIES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATEGORIES_DIR)),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned()),
            webhook,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = Config::from_lookup(lookup(&[("TELOXIDE_TOKEN", " 123:abc\n")])).unwrap();

        assert_eq!(config.token, "123:abc");
        assert_eq!(config.database_url, "sqlite:highscores.db");
        assert_eq!(config.categories_dir, PathBuf::from("categories"));
        assert_eq!(config.log_level, "info");
        assert!(config.webhook.is_none());
    }

    #[test]
    fn token_falls_back_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.txt");
        fs::write(&path, "from-file\n").unwrap();

        let config =
            Config::from_lookup(lookup(&[("TOKEN_FILE", path.to_str().unwrap())])).unwrap();
        assert_eq!(config.token, "from-file");

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            Config::from_lookup(lookup(&[("TOKEN_FILE", missing.to_str().unwrap())])),
            Err(ConfigError::TokenFile { .. })
        ));
    }

    #[test]
    fn webhook_needs_both_valid_settings() {
        let config = Config::from_lookup(lookup(&[
            ("TELOXIDE_TOKEN", "t"),
            ("WEBHOOK_URL", "https://example.org/bot"),
            ("WEBHOOK_ADDR", "127.0.0.1:8443"),
        ]))
        .unwrap();
        let webhook = config.webhook.unwrap();
        assert_eq!(webhook.addr.port(), 8443);

        assert!(Config::from_lookup(lookup(&[
            ("TELOXIDE_TOKEN", "t"),
            ("WEBHOOK_URL", "https://example.org/bot"),
        ]))
        .is_err());
        assert!(matches!(
            Config::from_lookup(lookup(&[
                ("TELOXIDE_TOKEN", "t"),
                ("WEBHOOK_URL", "https://example.org/bot"),
                ("WEBHOOK_ADDR", "not an address"),
            ])),
            Err(ConfigError::Invalid { name: "WEBHOOK_ADDR", .. })
        ));
    }

    #[test]
    fn blank_token_is_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("TELOXIDE_TOKEN", "  ")])),
            Err(ConfigError::EmptyToken)
        ));
    }
}

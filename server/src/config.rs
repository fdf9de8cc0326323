use std::path::PathBuf;
use std::time::Duration;

use dioxus::fullstack::Lazy;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

pub static CONFIG: Lazy<Config> = Lazy::new(|| async { Config::load() });

#[derive(Clone, Deserialize)]
pub struct Config {
    /// Base URL of the fleet REST backend.
    pub backend_url: Url,
    /// Key for signing session cookies.
    pub signing_secret: SecretString,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Config {
    /// `cabdesk.toml` in the working directory if present, then `CABDESK_*`
    /// environment variables on top.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("cabdesk").required(false))
            .add_source(config::Environment::with_prefix("CABDESK").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours * 3600)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_session_ttl_hours() -> u64 {
    12
}

fn default_page_size() -> usize {
    types::listing::DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use config::{File, FileFormat};
    use secrecy::ExposeSecret;

    use super::*;

    fn parse(toml: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let config = parse(
            r#"
            backend_url = "https://fleet.example.com/api/"
            signing_secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend_url.as_str(), "https://fleet.example.com/api/");
        assert_eq!(config.signing_secret.expose_secret(), "s3cret");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.session_ttl(), Duration::from_secs(12 * 3600));
        assert_eq!(config.page_size, 10);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn backend_url_is_required() {
        assert!(parse(r#"signing_secret = "s3cret""#).is_err());
    }
}

//! Server configuration: a YAML file merged with `TRELLIS_`-prefixed
//! environment overrides (`TRELLIS_DATABASE__URL`, ...).

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub catalog: CatalogSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://trellis.db?mode=rwc".to_owned(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret for session tokens. The default is for local
    /// development only; deployments must override it.
    pub token_secret: String,
    pub token_ttl_secs: i64,
    pub cookie_name: String,
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: "trellis-dev-secret".to_owned(),
            token_ttl_secs: 86_400,
            cookie_name: "trellis_session".to_owned(),
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub admin_group: String,
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            admin_group: "admins".to_owned(),
            default_limit: 50,
            max_limit: 200,
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("TRELLIS_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = AppConfig::load(None).unwrap();
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:8087");
        assert_eq!(cfg.catalog.admin_group, "admins");
        assert_eq!(cfg.auth.cookie_name, "trellis_session");
    }
}

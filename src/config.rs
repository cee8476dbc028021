use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration.
///
/// Sources, lowest priority first: built-in defaults, `config.toml`, then
/// `GATEWAY_`-prefixed environment variables (`__` separates nested keys,
/// e.g. `GATEWAY_BASIC__LISTEN_ADDR`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub basic: BasicConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite://gateway.db".to_string(),
            loglevel: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Require caller credentials on every data method.
    pub require_auth: bool,
    /// Tables only an administrator may read.
    pub protected_tables: Vec<String>,
    pub credentials_table: String,
    pub profiles_table: String,
    /// Per-statement deadline in seconds; 0 disables it.
    pub query_timeout_secs: u64,
    pub max_connections: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            require_auth: false,
            protected_tables: vec!["auths".to_string()],
            credentials_table: "auths".to_string(),
            profiles_table: "users".to_string(),
            query_timeout_secs: 10,
            max_connections: 5,
        }
    }
}

impl GatewayConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_secs > 0).then(|| Duration::from_secs(self.query_timeout_secs))
    }

    pub fn is_protected(&self, table: &str) -> bool {
        self.protected_tables
            .iter()
            .any(|t| t.eq_ignore_ascii_case(table))
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("GATEWAY_").split("__"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_protect_the_credentials_table() {
        let cfg = Config::default();
        assert!(cfg.gateway.is_protected("auths"));
        assert!(cfg.gateway.is_protected("AUTHS"));
        assert!(!cfg.gateway.is_protected("users"));
        assert_eq!(cfg.gateway.query_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn zero_timeout_disables_the_deadline() {
        let cfg = GatewayConfig {
            query_timeout_secs: 0,
            ..GatewayConfig::default()
        };
        assert_eq!(cfg.query_timeout(), None);
    }

    #[test]
    fn figment_layers_env_over_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GATEWAY_BASIC__LISTEN_ADDR", "127.0.0.1:9000");
            jail.set_env("GATEWAY_GATEWAY__REQUIRE_AUTH", "true");
            let cfg = Config::load()?;
            assert_eq!(cfg.basic.listen_addr, "127.0.0.1:9000");
            assert!(cfg.gateway.require_auth);
            assert_eq!(cfg.gateway.profiles_table, "users");
            Ok(())
        });
    }
}

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub links: LinkConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Public API root of the unique link, `{base_url}/links/{token}/`
    pub base_url: String,
    /// Public API root of the referral link, `{referral_base_url}/refer/{code}/`
    pub referral_base_url: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            referral_base_url: "http://localhost:8080/api/v1".to_string(),
        }
    }
}

impl LinkConfig {
    pub fn unique_link(&self, token: &str) -> String {
        format!("{}/links/{}/", self.base_url.trim_end_matches('/'), token)
    }

    pub fn referral_link(&self, referral_code: &str) -> String {
        format!(
            "{}/refer/{}/",
            self.referral_base_url.trim_end_matches('/'),
            referral_code
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub root_dir: String,
    /// Public path the stored artifacts are served under
    pub public_path: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            root_dir: "media".to_string(),
            public_path: "/api/v1/identities".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegistrationConfig {
    pub max_allocation_attempts: u32,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_allocation_attempts: 5,
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Without a config file everything comes from the environment
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("Failed to parse config file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and config.toml was not found")?;

                let links = LinkConfig::default();
                let artifacts = ArtifactConfig::default();
                let pagination = PaginationConfig::default();
                let registration = RegistrationConfig::default();

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    links: LinkConfig {
                        base_url: get_env("LINK_BASE_URL").unwrap_or(links.base_url),
                        referral_base_url: get_env("REFERRAL_BASE_URL")
                            .unwrap_or(links.referral_base_url),
                    },
                    artifacts: ArtifactConfig {
                        root_dir: get_env("ARTIFACT_ROOT_DIR").unwrap_or(artifacts.root_dir),
                        public_path: get_env("ARTIFACT_PUBLIC_PATH")
                            .unwrap_or(artifacts.public_path),
                    },
                    pagination: PaginationConfig {
                        default_limit: get_env_parse(
                            "PAGINATION_DEFAULT_LIMIT",
                            pagination.default_limit,
                        ),
                        max_limit: get_env_parse("PAGINATION_MAX_LIMIT", pagination.max_limit),
                    },
                    registration: RegistrationConfig {
                        max_allocation_attempts: get_env_parse(
                            "MAX_ALLOCATION_ATTEMPTS",
                            registration.max_allocation_attempts,
                        ),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // Environment always wins over the file
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("LINK_BASE_URL") {
            config.links.base_url = v;
        }
        if let Ok(v) = env::var("REFERRAL_BASE_URL") {
            config.links.referral_base_url = v;
        }
        if let Ok(v) = env::var("ARTIFACT_ROOT_DIR") {
            config.artifacts.root_dir = v;
        }
        if let Ok(v) = env::var("ARTIFACT_PUBLIC_PATH") {
            config.artifacts.public_path = v;
        }
        if let Ok(v) = env::var("PAGINATION_DEFAULT_LIMIT")
            && let Ok(n) = v.parse()
        {
            config.pagination.default_limit = n;
        }
        if let Ok(v) = env::var("PAGINATION_MAX_LIMIT")
            && let Ok(n) = v.parse()
        {
            config.pagination.max_limit = n;
        }
        if let Ok(v) = env::var("MAX_ALLOCATION_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            config.registration.max_allocation_attempts = n;
        }

        Ok(config)
    }
}

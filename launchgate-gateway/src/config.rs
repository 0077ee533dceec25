use std::path::Path;

use launchgate_core::config::{parse_env, read_list, read_string, CoreConfig};
use launchgate_core::errors::ConfigError;
use tracing::warn;

const DEVELOPMENT_JWT_SECRET: &str = "launchgate-development-secret";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Gateway configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub core: CoreConfig,
    pub security: SecurityConfig,
    /// Whether client addresses may be taken from proxy headers.
    pub trust_proxy_headers: bool,
    pub tls: Option<TlsConfig>,
}

impl GatewayConfig {
    pub fn new(core: CoreConfig, security: SecurityConfig) -> Self {
        Self {
            core,
            security,
            trust_proxy_headers: true,
            tls: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let core = CoreConfig::from_env()?;
        let security = SecurityConfig::from_env(core.is_production())?;
        let trust_proxy_headers = parse_env::<u64>("LAUNCHGATE_TRUST_PROXY_HEADERS", 1)? != 0;
        let tls = TlsConfig::maybe_from_env()?;

        Ok(Self {
            core,
            security,
            trust_proxy_headers,
            tls,
        })
    }

    pub fn bind_address(&self) -> &str {
        &self.core.http_bind
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    pub fn tls(&self) -> Option<&TlsConfig> {
        self.tls.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl_hours: u64,
    pub admin_username: String,
    pub admin_password: String,
    pub cors_allowed_origins: Vec<String>,
}

impl SecurityConfig {
    /// Settings with the given secret and development defaults for everything else.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_issuer: "launchgate".to_string(),
            jwt_audience: "launchgate-admin".to_string(),
            token_ttl_hours: 24,
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }

    pub fn from_env(production: bool) -> Result<Self, ConfigError> {
        let jwt_secret = match read_string("LAUNCHGATE_JWT_SECRET")? {
            Some(secret) => secret,
            None if production => {
                return Err(ConfigError::MissingEnvVar("LAUNCHGATE_JWT_SECRET".to_string()))
            }
            None => {
                warn!("LAUNCHGATE_JWT_SECRET not set, using the development secret");
                DEVELOPMENT_JWT_SECRET.to_string()
            }
        };

        let mut config = Self::with_secret(jwt_secret);

        if let Some(issuer) = read_string("LAUNCHGATE_JWT_ISSUER")? {
            config.jwt_issuer = issuer;
        }
        if let Some(audience) = read_string("LAUNCHGATE_JWT_AUDIENCE")? {
            config.jwt_audience = audience;
        }
        config.token_ttl_hours =
            token_ttl_hours(parse_env::<u64>("LAUNCHGATE_JWT_EXPIRATION_HOURS", 24)?)?;

        if let Some(username) = read_string("LAUNCHGATE_ADMIN_USERNAME")? {
            config.admin_username = username;
        }
        if let Some(password) = read_string("LAUNCHGATE_ADMIN_PASSWORD")? {
            config.admin_password = password;
        }
        if config.admin_password == DEFAULT_ADMIN_PASSWORD {
            if production {
                return Err(ConfigError::Internal(
                    "LAUNCHGATE_ADMIN_PASSWORD must be changed in production".to_string(),
                ));
            }
            warn!("administrative console is using the default password");
        }

        if let Some(origins) = read_list("LAUNCHGATE_ALLOWED_ORIGINS")? {
            config.cors_allowed_origins = origins;
        }

        Ok(config)
    }
}

/// Ten years.
const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365 * 10;

fn token_ttl_hours(hours: u64) -> Result<u64, ConfigError> {
    if hours > MAX_TOKEN_TTL_HOURS {
        return Err(ConfigError::Internal(format!(
            "LAUNCHGATE_JWT_EXPIRATION_HOURS must be at most {MAX_TOKEN_TTL_HOURS}, got {hours}"
        )));
    }
    Ok(hours.max(1))
}

#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub certificate_path: String,
    pub private_key_path: String,
}

impl TlsConfig {
    fn maybe_from_env() -> Result<Option<Self>, ConfigError> {
        let cert_path = read_string("LAUNCHGATE_TLS_CERT")?;
        let key_path = read_string("LAUNCHGATE_TLS_KEY")?;

        match (cert_path, key_path) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                certificate_path: cert,
                private_key_path: key,
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::Internal(
                "both LAUNCHGATE_TLS_CERT and LAUNCHGATE_TLS_KEY are required".into(),
            )),
        }
    }

    pub async fn load(&self) -> Result<axum_server::tls_rustls::RustlsConfig, ConfigError> {
        let cert = Path::new(&self.certificate_path);
        let key = Path::new(&self.private_key_path);

        axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
            .await
            .map_err(|err| ConfigError::Internal(format!("failed to load TLS certificates: {err}")))
    }
}

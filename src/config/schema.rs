//! Typed configuration groups and the rules each variable must satisfy.

use secrecy::SecretString;
use std::{fmt, str::FromStr};
use url::Url;

use super::loader::GroupReader;
use crate::shared::validation::valid_email_format;

pub const DEFAULT_JWT_EXPIRES_IN: &str = "7d";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;
pub const DEFAULT_STORAGE_LOCAL_PATH: &str = "./uploads";

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl NodeEnv {
    pub const VARIANTS: &'static [&'static str] = &["development", "production", "test"];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl FromStr for NodeEnv {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(()),
        }
    }
}

impl fmt::Display for NodeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageType {
    #[default]
    Local,
    S3,
}

impl StorageType {
    pub const VARIANTS: &'static [&'static str] = &["local", "s3"];
}

impl FromStr for StorageType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string; may embed credentials.
    pub uri: SecretString,
    pub db_name: String,
}

impl DatabaseConfig {
    pub(crate) fn read(group: &mut GroupReader<'_>) -> Option<Self> {
        let uri = group.url("MONGODB_URI", None, "Invalid MongoDB connection string");
        let db_name = group.non_empty("MONGODB_DB_NAME", "Database name is required");
        Some(Self {
            uri: SecretString::from(uri?.to_string()),
            db_name: db_name?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub jwt_expires_in: String,
    pub cookie_secret: SecretString,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<SecretString>,
    pub apple_client_id: Option<String>,
    pub apple_client_secret: Option<SecretString>,
}

impl AuthConfig {
    pub(crate) fn read(group: &mut GroupReader<'_>) -> Option<Self> {
        let jwt_secret = group.min_len(
            "JWT_SECRET",
            MIN_SECRET_LEN,
            "JWT secret must be at least 32 characters",
        );
        let cookie_secret = group.min_len(
            "COOKIE_SECRET",
            MIN_SECRET_LEN,
            "Cookie secret must be at least 32 characters",
        );
        Some(Self {
            jwt_secret: SecretString::from(jwt_secret?),
            jwt_expires_in: group.string_or("JWT_EXPIRES_IN", DEFAULT_JWT_EXPIRES_IN),
            cookie_secret: SecretString::from(cookie_secret?),
            google_client_id: group.optional("GOOGLE_CLIENT_ID"),
            google_client_secret: group.optional("GOOGLE_CLIENT_SECRET").map(SecretString::from),
            apple_client_id: group.optional("APPLE_CLIENT_ID"),
            apple_client_secret: group.optional("APPLE_CLIENT_SECRET").map(SecretString::from),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub node_env: NodeEnv,
    pub port: u16,
    pub api_url: Url,
    pub cors_origin: Url,
    pub rate_limit_window_ms: u64,
    pub rate_limit_max_requests: u32,
}

impl ServerConfig {
    pub(crate) fn read(group: &mut GroupReader<'_>) -> Option<Self> {
        let node_env = group.choice("NODE_ENV", NodeEnv::VARIANTS, NodeEnv::default());
        let port = group.number("PORT", Some(DEFAULT_PORT));
        let api_url = group.url("API_URL", Some(DEFAULT_API_URL), "Invalid API URL");
        let cors_origin = group.url(
            "CORS_ORIGIN",
            Some(DEFAULT_CORS_ORIGIN),
            "Invalid CORS origin",
        );
        let rate_limit_window_ms =
            group.number("RATE_LIMIT_WINDOW_MS", Some(DEFAULT_RATE_LIMIT_WINDOW_MS));
        let rate_limit_max_requests =
            group.number("RATE_LIMIT_MAX_REQUESTS", Some(DEFAULT_RATE_LIMIT_MAX_REQUESTS));
        Some(Self {
            node_env: node_env?,
            port: port?,
            api_url: api_url?,
            cors_origin: cors_origin?,
            rate_limit_window_ms: rate_limit_window_ms?,
            rate_limit_max_requests: rate_limit_max_requests?,
        })
    }
}

/// Outgoing mail settings. Every field is optional, but a field that is set
/// must be valid.
#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<SecretString>,
    pub email_from: Option<String>,
}

impl EmailConfig {
    pub(crate) fn read(group: &mut GroupReader<'_>) -> Option<Self> {
        let smtp_host = group.optional_non_empty("SMTP_HOST", "SMTP host is required");
        let smtp_port = group.optional_number("SMTP_PORT");
        let smtp_user = group.optional_non_empty("SMTP_USER", "SMTP user is required");
        let smtp_pass = group.optional_non_empty("SMTP_PASS", "SMTP password is required");
        let email_from = group.optional_checked(
            "EMAIL_FROM",
            valid_email_format,
            "Invalid sender email address",
        );
        Some(Self {
            smtp_host: smtp_host?,
            smtp_port: smtp_port?,
            smtp_user: smtp_user?,
            smtp_pass: smtp_pass?.map(SecretString::from),
            email_from: email_from?,
        })
    }

    /// True when enough is set to attempt delivery.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.smtp_port.is_some() && self.email_from.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub storage_type: StorageType,
    pub local_path: String,
    pub aws_region: Option<String>,
    pub aws_bucket_name: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<SecretString>,
}

impl StorageConfig {
    pub(crate) fn read(group: &mut GroupReader<'_>) -> Option<Self> {
        let storage_type = group.choice("STORAGE_TYPE", StorageType::VARIANTS, StorageType::default());
        Some(Self {
            storage_type: storage_type?,
            local_path: group.string_or("STORAGE_LOCAL_PATH", DEFAULT_STORAGE_LOCAL_PATH),
            aws_region: group.optional("AWS_REGION"),
            aws_bucket_name: group.optional("AWS_BUCKET_NAME"),
            aws_access_key_id: group.optional("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: group.optional("AWS_SECRET_ACCESS_KEY").map(SecretString::from),
        })
    }
}

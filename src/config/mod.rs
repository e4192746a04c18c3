//! Application configuration, read once at startup from the environment.
//!
//! Variables are grouped by name:
//!
//! - `database`: `MONGODB_*`
//! - `auth`: `JWT_*`, `COOKIE_*`, `GOOGLE_*`, `APPLE_*`
//! - `server`: `NODE_ENV`, `PORT`, `API_URL`, `CORS_ORIGIN`, `RATE_LIMIT_*`
//! - `email`: `SMTP_*`, `EMAIL_FROM`
//! - `storage`: `STORAGE_*`, `AWS_*`
//!
//! The resulting [`Config`] is immutable and shared as `Arc<Config>`.

mod loader;
pub mod schema;

pub use loader::{load, load_from, INVALID_CONFIGURATION};
pub use schema::{
    AuthConfig, DatabaseConfig, EmailConfig, NodeEnv, ServerConfig, StorageConfig, StorageType,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub email: EmailConfig,
    pub storage: StorageConfig,
}

impl Config {
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.server.node_env == NodeEnv::Production
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.server.node_env == NodeEnv::Development
    }

    #[must_use]
    pub fn is_test(&self) -> bool {
        self.server.node_env == NodeEnv::Test
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn minimal() -> Vec<(String, String)> {
        [
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("MONGODB_DB_NAME", "tourmate"),
            ("JWT_SECRET", SECRET),
            ("COOKIE_SECRET", SECRET),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
    }

    fn with(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut vars = minimal();
        vars.extend(extra.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
        vars
    }

    #[test]
    fn minimal_env_applies_defaults() {
        let config = load_from(minimal()).unwrap();
        assert!(config.is_development());
        assert!(!config.is_production());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.api_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.server.cors_origin.as_str(), "http://localhost:3000/");
        assert_eq!(config.server.rate_limit_window_ms, 60_000);
        assert_eq!(config.server.rate_limit_max_requests, 100);
        assert_eq!(config.auth.jwt_expires_in, "7d");
        assert_eq!(config.storage.storage_type, StorageType::Local);
        assert_eq!(config.storage.local_path, "./uploads");
        assert!(!config.email.is_configured());
        assert_eq!(config.auth.jwt_secret.expose_secret(), SECRET);
    }

    #[test]
    fn node_env_drives_predicates() {
        let config = load_from(with(&[("NODE_ENV", "production")])).unwrap();
        assert!(config.is_production());
        assert!(!config.is_development());
        assert!(!config.is_test());

        let config = load_from(with(&[("NODE_ENV", "test")])).unwrap();
        assert!(config.is_test());
    }

    #[test]
    fn short_jwt_secret_is_reported_by_path() {
        let mut vars = minimal();
        vars.retain(|(k, _)| k != "JWT_SECRET");
        vars.push(("JWT_SECRET".to_string(), "short12345".to_string()));

        let err = load_from(vars).unwrap_err();
        assert_eq!(err.to_string(), INVALID_CONFIGURATION);
        let errors = err.field_errors().unwrap();
        assert_eq!(
            errors.get("auth.JWT_SECRET").unwrap(),
            &vec!["JWT secret must be at least 32 characters".to_string()]
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn every_problem_is_collected() {
        let err = load_from(vec![
            ("NODE_ENV".to_string(), "staging".to_string()),
            ("PORT".to_string(), "http".to_string()),
            ("EMAIL_FROM".to_string(), "nobody".to_string()),
            ("STORAGE_TYPE".to_string(), "ftp".to_string()),
        ])
        .unwrap_err();
        let errors = err.field_errors().unwrap();
        for key in [
            "database.MONGODB_URI",
            "database.MONGODB_DB_NAME",
            "auth.JWT_SECRET",
            "auth.COOKIE_SECRET",
            "server.NODE_ENV",
            "server.PORT",
            "email.EMAIL_FROM",
            "storage.STORAGE_TYPE",
        ] {
            assert!(errors.contains_key(key), "missing {key}");
        }
        assert_eq!(errors["auth.JWT_SECRET"], vec!["Required".to_string()]);
    }

    #[test]
    fn email_group_validates_present_fields_only() {
        let config = load_from(with(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "587"),
            ("EMAIL_FROM", "tours@example.com"),
        ]))
        .unwrap();
        assert!(config.email.is_configured());
        assert_eq!(config.email.smtp_port, Some(587));
        assert!(config.email.smtp_user.is_none());

        let err = load_from(with(&[("SMTP_HOST", ""), ("SMTP_PORT", "x")])).unwrap_err();
        let errors = err.field_errors().unwrap();
        assert!(errors.contains_key("email.SMTP_HOST"));
        assert!(errors.contains_key("email.SMTP_PORT"));
    }

    #[test]
    fn invalid_urls_are_rejected() {
        let err = load_from(with(&[
            ("MONGODB_URI", "not a url"),
            ("CORS_ORIGIN", "also not"),
        ]))
        .unwrap_err();
        let errors = err.field_errors().unwrap();
        assert!(errors.contains_key("database.MONGODB_URI"));
        assert!(errors.contains_key("server.CORS_ORIGIN"));
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let config = load_from(minimal()).unwrap();
        assert!(!format!("{config:?}").contains(SECRET));
    }
}

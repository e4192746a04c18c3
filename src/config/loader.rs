//! Environment grouping and the per-group field reader.
//!
//! Every variable is routed to exactly one group by name. Unrecognized
//! variables are ignored. Field problems are recorded under `group.KEY` and
//! reported together once all groups have been read.

use std::{collections::BTreeMap, str::FromStr};
use tracing::debug;
use url::Url;

use super::{
    schema::{AuthConfig, DatabaseConfig, EmailConfig, ServerConfig, StorageConfig},
    Config,
};
use crate::{errors::AppError, shared::validation::FieldErrors};

pub const INVALID_CONFIGURATION: &str = "Invalid configuration";

const REQUIRED: &str = "Required";

type Vars = BTreeMap<String, String>;

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct GroupedEnv {
    pub database: Vars,
    pub auth: Vars,
    pub server: Vars,
    pub email: Vars,
    pub storage: Vars,
}

impl GroupedEnv {
    fn slot(&mut self, key: &str) -> Option<&mut Vars> {
        let starts = |prefixes: &[&str]| prefixes.iter().any(|prefix| key.starts_with(prefix));
        if starts(&["MONGODB_"]) {
            Some(&mut self.database)
        } else if starts(&["JWT_", "COOKIE_", "GOOGLE_", "APPLE_"]) {
            Some(&mut self.auth)
        } else if matches!(key, "NODE_ENV" | "PORT" | "API_URL" | "CORS_ORIGIN")
            || starts(&["RATE_LIMIT_"])
        {
            Some(&mut self.server)
        } else if key == "EMAIL_FROM" || starts(&["SMTP_"]) {
            Some(&mut self.email)
        } else if starts(&["STORAGE_", "AWS_"]) {
            Some(&mut self.storage)
        } else {
            None
        }
    }
}

pub(crate) fn group_by_prefix<I>(vars: I) -> GroupedEnv
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut grouped = GroupedEnv::default();
    for (key, value) in vars {
        if let Some(slot) = grouped.slot(&key) {
            slot.insert(key, value);
        }
    }
    grouped
}

/// Reads typed fields out of one group, recording failures as it goes.
///
/// Every accessor returns `None` when the field is invalid, so a group is
/// built with `?` only after all of its fields have been read.
pub(crate) struct GroupReader<'a> {
    group: &'static str,
    vars: &'a Vars,
    errors: &'a mut FieldErrors,
}

impl<'a> GroupReader<'a> {
    fn new(group: &'static str, vars: &'a Vars, errors: &'a mut FieldErrors) -> Self {
        Self {
            group,
            vars,
            errors,
        }
    }

    fn fail(&mut self, key: &str, message: impl Into<String>) {
        self.errors.add(&format!("{}.{key}", self.group), message);
    }

    pub fn optional(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&mut self, key: &str) -> Option<String> {
        let value = self.optional(key);
        if value.is_none() {
            self.fail(key, REQUIRED);
        }
        value
    }

    pub fn non_empty(&mut self, key: &str, message: &str) -> Option<String> {
        self.min_len(key, 1, message)
    }

    pub fn min_len(&mut self, key: &str, min: usize, message: &str) -> Option<String> {
        let value = self.required(key)?;
        if value.chars().count() < min {
            self.fail(key, message);
            return None;
        }
        Some(value)
    }

    pub fn url(&mut self, key: &str, default: Option<&str>, message: &str) -> Option<Url> {
        let value = match (self.optional(key), default) {
            (Some(value), _) => value,
            (None, Some(default)) => default.to_string(),
            (None, None) => self.required(key)?,
        };
        match Url::parse(&value) {
            Ok(url) => Some(url),
            Err(_) => {
                self.fail(key, message);
                None
            }
        }
    }

    pub fn number<T: FromStr>(&mut self, key: &str, default: Option<T>) -> Option<T> {
        match (self.optional(key), default) {
            (Some(value), _) => self.parse_number(key, &value),
            (None, Some(default)) => Some(default),
            (None, None) => {
                self.fail(key, REQUIRED);
                None
            }
        }
    }

    fn parse_number<T: FromStr>(&mut self, key: &str, value: &str) -> Option<T> {
        if let Ok(number) = value.trim().parse() {
            Some(number)
        } else {
            self.fail(key, format!("Expected a number, received '{value}'"));
            None
        }
    }

    /// `Some(None)` when absent, `None` when present but invalid.
    pub fn optional_number<T: FromStr>(&mut self, key: &str) -> Option<Option<T>> {
        match self.optional(key) {
            Some(value) => self.parse_number(key, &value).map(Some),
            None => Some(None),
        }
    }

    pub fn optional_non_empty(&mut self, key: &str, message: &str) -> Option<Option<String>> {
        self.optional_checked(key, |value| !value.is_empty(), message)
    }

    pub fn optional_checked(
        &mut self,
        key: &str,
        check: impl Fn(&str) -> bool,
        message: &str,
    ) -> Option<Option<String>> {
        match self.optional(key) {
            Some(value) if check(&value) => Some(Some(value)),
            Some(_) => {
                self.fail(key, message);
                None
            }
            None => Some(None),
        }
    }

    pub fn choice<T: FromStr>(&mut self, key: &str, variants: &[&str], default: T) -> Option<T> {
        let Some(value) = self.optional(key) else {
            return Some(default);
        };
        if let Ok(parsed) = value.parse() {
            Some(parsed)
        } else {
            let expected = variants
                .iter()
                .map(|variant| format!("'{variant}'"))
                .collect::<Vec<_>>()
                .join(" | ");
            self.fail(
                key,
                format!("Invalid enum value. Expected {expected}, received '{value}'"),
            );
            None
        }
    }
}

/// Build a `Config` from an explicit set of variables.
///
/// # Errors
/// `AppError::Validation` with message `Invalid configuration` and one entry
/// per failing `group.KEY`.
pub fn load_from<I>(vars: I) -> Result<Config, AppError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let grouped = group_by_prefix(vars);
    let mut errors = FieldErrors::new();

    let database = DatabaseConfig::read(&mut GroupReader::new(
        "database",
        &grouped.database,
        &mut errors,
    ));
    let auth = AuthConfig::read(&mut GroupReader::new("auth", &grouped.auth, &mut errors));
    let server = ServerConfig::read(&mut GroupReader::new("server", &grouped.server, &mut errors));
    let email = EmailConfig::read(&mut GroupReader::new("email", &grouped.email, &mut errors));
    let storage = StorageConfig::read(&mut GroupReader::new(
        "storage",
        &grouped.storage,
        &mut errors,
    ));

    errors.into_result(INVALID_CONFIGURATION)?;

    match (database, auth, server, email, storage) {
        (Some(database), Some(auth), Some(server), Some(email), Some(storage)) => {
            debug!(node_env = %server.node_env, port = server.port, "Configuration loaded");
            Ok(Config {
                database,
                auth,
                server,
                email,
                storage,
            })
        }
        _ => Err(AppError::internal("configuration group rejected without a field error")),
    }
}

/// Build a `Config` from the process environment.
///
/// # Errors
/// See [`load_from`].
pub fn load() -> Result<Config, AppError> {
    load_from(std::env::vars())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn grouping_routes_by_name() {
        let grouped = group_by_prefix(vars(&[
            ("MONGODB_URI", "mongodb://localhost"),
            ("JWT_SECRET", "x"),
            ("COOKIE_SECRET", "y"),
            ("GOOGLE_CLIENT_ID", "g"),
            ("PORT", "8080"),
            ("RATE_LIMIT_WINDOW_MS", "10"),
            ("SMTP_HOST", "smtp"),
            ("EMAIL_FROM", "a@b.io"),
            ("AWS_REGION", "eu-west-1"),
            ("STORAGE_TYPE", "s3"),
            ("HOME", "/root"),
            ("PORTS", "ignored"),
        ]));
        assert_eq!(grouped.database.len(), 1);
        assert_eq!(grouped.auth.len(), 3);
        assert_eq!(grouped.server.len(), 2);
        assert_eq!(grouped.email.len(), 2);
        assert_eq!(grouped.storage.len(), 2);
        assert!(!grouped.server.contains_key("PORTS"));
    }

    #[test]
    fn reader_records_paths() {
        let vars: Vars = [("PORT".to_string(), "eighty".to_string())].into();
        let mut errors = FieldErrors::new();
        let mut reader = GroupReader::new("server", &vars, &mut errors);
        assert_eq!(reader.number::<u16>("PORT", Some(3000)), None);
        assert_eq!(reader.number::<u32>("RATE_LIMIT_MAX_REQUESTS", Some(7)), Some(7));
        assert_eq!(reader.optional_number::<u16>("SMTP_PORT"), Some(None));

        let err = errors.into_result(INVALID_CONFIGURATION).unwrap_err();
        let map = err.field_errors().cloned().unwrap_or_default();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["server.PORT"]);
    }
}

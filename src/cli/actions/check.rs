use crate::config::{self, Config};
use anyhow::{anyhow, Result};

/// Validate the environment and print a short summary.
/// # Errors
/// Returns every configuration problem, one `group.KEY` per line.
pub fn execute() -> Result<()> {
    let config = config::load().map_err(|err| anyhow!(err.detailed()))?;
    println!("{}", summary(&config));
    Ok(())
}

fn summary(config: &Config) -> String {
    format!(
        "configuration OK: NODE_ENV={} PORT={} database={} storage={:?} email={}",
        config.server.node_env,
        config.server.port,
        config.database.db_name,
        config.storage.storage_type,
        if config.email.is_configured() {
            "configured"
        } else {
            "disabled"
        }
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_environment() {
        let secret = "0123456789abcdef0123456789abcdef";
        let config = config::load_from(
            [
                ("MONGODB_URI", "mongodb://localhost:27017"),
                ("MONGODB_DB_NAME", "tourmate"),
                ("JWT_SECRET", secret),
                ("COOKIE_SECRET", secret),
                ("PORT", "4000"),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap();
        let text = summary(&config);
        assert!(text.contains("NODE_ENV=development"));
        assert!(text.contains("PORT=4000"));
        assert!(text.contains("email=disabled"));
        assert!(!text.contains(secret));
    }
}

use crate::cli::actions::{server::Args, Action};
use anyhow::Result;

/// Map parsed arguments to the action to run.
///
/// # Errors
/// Returns an error if the arguments do not resolve to an action.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if matches.get_flag("check-config") {
        return Ok(Action::CheckConfig);
    }

    Ok(Action::Server(Args {
        memory_store: matches.get_flag("memory-store"),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn check_config_wins() {
        temp_env::with_vars([("TOURMATE_MEMORY_STORE", None::<&str>)], || {
            let matches = commands::new().get_matches_from(["tourmate", "--check-config"]);
            assert!(matches!(handler(&matches).unwrap(), Action::CheckConfig));

            let matches = commands::new().get_matches_from(["tourmate", "--memory-store"]);
            assert!(matches!(
                handler(&matches).unwrap(),
                Action::Server(Args { memory_store: true })
            ));
        });
    }
}

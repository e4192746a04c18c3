use clap::{builder::ValueParser, Arg, Command};

pub const LOG_LEVEL_ENV: &str = "TOURMATE_LOG_LEVEL";

/// Accepts `0..=5` or a level name and maps it to a verbosity count.
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new("verbosity")
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env(LOG_LEVEL_ENV)
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

/// Map the verbosity count to a tracing level.
#[must_use]
pub const fn level(verbosity: u8) -> tracing::Level {
    match verbosity {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_mapping() {
        assert_eq!(level(0), tracing::Level::ERROR);
        assert_eq!(level(2), tracing::Level::INFO);
        assert_eq!(level(9), tracing::Level::TRACE);
    }

    #[test]
    fn validator_rejects_unknown_names() {
        temp_env::with_vars([(LOG_LEVEL_ENV, Some("loud"))], || {
            let command = with_args(Command::new("t"));
            assert!(command.try_get_matches_from(["t"]).is_err());
        });
    }

    #[test]
    fn validator_accepts_numbers_up_to_five() {
        temp_env::with_vars([(LOG_LEVEL_ENV, Some("5"))], || {
            let matches = with_args(Command::new("t")).get_matches_from(["t"]);
            assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(5));
        });
    }
}

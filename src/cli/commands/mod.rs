mod logging;

pub use logging::{level, LOG_LEVEL_ENV};

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("tourmate")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .after_help(
            "Application settings (MONGODB_*, JWT_*, COOKIE_*, PORT, ...) are read from the environment.",
        )
        .arg(
            Arg::new("check-config")
                .long("check-config")
                .help("Validate the environment configuration and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("memory-store")
                .long("memory-store")
                .help("Keep users in memory instead of MongoDB (data is lost on exit)")
                .env("TOURMATE_MEMORY_STORE")
                .action(ArgAction::SetTrue),
        );

    logging::with_args(command)
}

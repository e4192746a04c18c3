//! TourMate authentication and session core.
//!
//! Accounts live behind the [`auth::UserStore`] port, sessions are HS256 tokens
//! carried in an HTTP-only cookie, and all settings come from one validated
//! [`config::Config`] read at startup.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod shared;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

//! Identity: users, password hashing, signed tokens and the session cookie.

pub mod cookie;
pub mod models;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub use models::{PublicUser, Role, UserRecord};
pub use service::{AuthService, ProfileUpdate};
pub use store::{InMemoryUserStore, UserStore};
pub use token::{TokenClaims, TokenCodec};

//! Helpers shared by the API and the auth core: input validation, pricing and
//! date formatting.

pub mod dates;
pub mod pricing;
pub mod validation;

//! Access-token records and secret wrappers.

pub mod record;
pub mod secret;

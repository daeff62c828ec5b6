//! Identifiers, credentials, token records, and the per-audience token manager.

pub mod assertion;
pub mod credentials;
pub mod id;
pub mod manager;
pub mod token;

pub use assertion::ClientCertificate;
pub use credentials::*;
pub use id::*;
pub use manager::TokenManager;
pub use token::{record::*, secret::*};

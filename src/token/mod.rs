//! Token authentication.
//!
//! An image request is authorized by a JWT signed with the service's shared
//! secret. Handling a token is a two-step process:
//!
//! 1. [`TokenAuth::verify`] checks the signature and registered time claims
//!    and returns the raw JSON payload (failures map to `401`)
//! 2. [`Claims::from_payload`] turns that payload into typed claims
//!    (failures map to `400`)

mod claims;
mod jwt;

pub use claims::Claims;
pub use jwt::{Algorithm, TokenAuth};

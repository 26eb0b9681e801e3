//! Session token decoding and the route access gate.

pub mod claims;
pub mod gate;
pub mod middleware;

pub use claims::{Role, SessionClaims, TokenVerifier, Viewer, decode_claims};
pub use gate::{AccessGate, Decision};

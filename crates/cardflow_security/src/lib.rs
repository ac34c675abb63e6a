//! Authentication and abuse-control primitives: JWT issuance/verification
//! for both the admin API and the public upload portal, and a process-local
//! rate limiter guarding portal access verification.

pub mod error;
pub mod rate_limit;
pub mod tokens;

pub use error::AuthError;
pub use rate_limit::TokenBucketLimiter;
pub use tokens::{AdminClaims, AuthToken, PortalClaims, PortalToken};

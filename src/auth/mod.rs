//! Identity and access control
//!
//! - `password`: salted Argon2id credential hashing and verification
//! - `token`: HS512 JWT issuing and verification for the `{ user: ... }` claim set
//! - `principal`: the resolved identity of a request and the role gates layered on it
//!
//! Both customers and staff go through the same services; nothing here knows about
//! a specific account table.

pub mod password;
pub mod principal;
pub mod token;

pub use password::{hash_password, verify_password, AuthError};
pub use principal::{Principal, PrincipalKind, Role, RoleGate};
pub use token::{ClaimSet, TokenError, TokenService, UserClaims, TOKEN_LIFETIME_DAYS};

//! `nova-auth`: authentication/authorization boundary for the console.
//!
//! Users, roles and ACL entries plus the pure policy around them. This crate is
//! decoupled from HTTP and storage.

pub mod acl;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod role;
pub mod user;

pub use acl::{AclEntry, AclFields, NewAcl, check_no_cycle};
pub use authorize::{AuthzError, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use jwt::{Hs256Jwt, IssuedToken, JwtValidator};
pub use password::PasswordHasher;
pub use permissions::{Permission, codes};
pub use principal::{Principal, resolve_permissions};
pub use role::{NewRole, Role, RoleFields};
pub use user::{
    NewUser, UserAccount, UserChanges, UserProfile, UserQuery, validate_status_change,
};

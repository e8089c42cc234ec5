/// Authentication module
///
/// Token codec, CSRF binder, credential issuer and password hashing.

mod claims;
mod csrf;
mod issuer;
mod jwt;
mod password;

pub use claims::{AccessClaims, RefreshClaims};
pub use csrf::CsrfBinder;
pub use issuer::{generate_session_id, CredentialIssuer, IssuedCredentials};
pub use jwt::{TokenCodec, TOKEN_ALGORITHM};
pub use password::{hash_password, verify_password, DEFAULT_COST};

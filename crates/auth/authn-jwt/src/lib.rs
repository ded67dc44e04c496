mod auth;
pub mod jwt;

pub use auth::{authenticate, session_or_anonymous};
pub use jwt::{Error, JwtConfig, SessionClaims, DEFAULT_SESSION_COOKIE_NAMES};

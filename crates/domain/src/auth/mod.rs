//! Authentication domain types

mod claims;
mod session;
mod types;

pub use claims::{UserInfo, decode_access_token};
pub use session::SessionState;
pub use types::{
    AuthError, Credentials, REFRESH_LEAD_SECS, TokenGrant, TokenSet, bearer, is_expiring,
};

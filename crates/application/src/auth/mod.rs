//! Session lifecycle: token storage, observable session state, the auth
//! client and the bearer credential interceptor.

mod client;
mod interceptor;
mod session_holder;
mod token_store;

pub use client::AuthClient;
pub use interceptor::{AuthInterceptor, is_identity_provider_url};
pub use session_holder::{SessionStateHolder, SubscriptionId};
pub use token_store::{
    ACCESS_TOKEN_KEY, PersistedTokens, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY, TokenStatus, TokenStore,
};

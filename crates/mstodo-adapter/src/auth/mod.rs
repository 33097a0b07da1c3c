/*
[INPUT]:  Authentication configuration and cached credentials
[OUTPUT]: Bearer access tokens and auth errors
[POS]:    Auth layer - handles Microsoft identity platform authentication
[UPDATE]: When auth flow or token caching changes
*/

pub mod device;
pub mod token_cache;

pub use device::{DeviceAuthManager, DeviceCodeResponse, TokenGrant, DEFAULT_TENANT, SCOPE};
pub use token_cache::{CachedToken, TokenCache};

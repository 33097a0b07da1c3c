/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Microsoft To Do adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    CachedToken,
    DeviceAuthManager,
    DeviceCodeResponse,
    TokenCache,
    TokenGrant,
    DEFAULT_TENANT,
    SCOPE,
};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    GraphClient,
    GraphError,
    Result,
};

// Re-export all types
pub use types::*;

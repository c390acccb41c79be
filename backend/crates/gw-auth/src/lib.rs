pub mod authorizer;
pub mod bucket_store;
pub mod claim_resolver;
pub mod claims;
pub mod client_address;
pub mod error;
pub mod gateway_request;
pub mod jwt_algorithm;
pub mod key_entry;
pub mod key_location;
pub mod key_parser;
pub mod key_store;
pub mod key_store_watcher;
pub mod parsed_token;
pub mod principal;
pub mod rate_limit_config;
pub mod rate_limit_key;
pub mod rate_limiter;
pub mod rate_limiter_factory;
pub mod route_auth_config;
pub mod token_verifier;
pub mod verification_key;

pub use authorizer::{AuthDecision, Authorizer, DenyReason};
pub use bucket_store::{BucketStore, RedisBucketStore};
pub use claims::Claims;
pub use error::{AuthError, Result};
pub use gateway_request::GatewayRequest;
pub use jwt_algorithm::JwtAlgorithm;
pub use key_entry::KeyEntry;
pub use key_location::KeyLocation;
pub use key_store::{KeyMap, KeyStore};
pub use key_store_watcher::KeyStoreWatcher;
pub use parsed_token::ParsedToken;
pub use principal::AuthenticatedPrincipal;
pub use rate_limit_config::RateLimitConfig;
pub use rate_limit_key::{MISSING_RATE_LIMIT_KEY, RateLimitKey, RateLimitKeySource};
pub use rate_limiter::{RateLimitOutcome, RouteRateLimiter};
pub use rate_limiter_factory::RateLimiterFactory;
pub use route_auth_config::RouteAuthConfig;
pub use token_verifier::{TokenVerifier, VerificationOutcome};
pub use verification_key::VerificationKey;

#[cfg(test)]
mod tests;

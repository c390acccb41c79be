use crate::{AuthError, Claims, Result as AuthErrorResult, VerificationKey};

use std::panic::Location;

use error_location::ErrorLocation;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Validation, decode, decode_header};
use log::debug;

/// Why a token did or did not verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid,
    /// Signature checks out but `exp` is missing or not in the future
    Expired,
    BadSignature,
    /// Token header names an algorithm the key cannot check
    AlgorithmMismatch,
    Malformed,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Expired => "expired",
            Self::BadSignature => "bad_signature",
            Self::AlgorithmMismatch => "algorithm_mismatch",
            Self::Malformed => "malformed",
        }
    }
}

/// Signature and expiry check for compact JWTs
#[derive(Debug, Clone, Default)]
pub struct TokenVerifier;

impl TokenVerifier {
    pub fn new() -> Self {
        Self
    }

    /// `true` only if the signature is valid and the token is not expired.
    ///
    /// Every verification failure is `Ok(false)`. The only error is a blank
    /// HMAC secret, which is a configuration defect.
    #[track_caller]
    pub fn verify(&self, token: &str, key: &VerificationKey) -> AuthErrorResult<bool> {
        Ok(self.verify_detailed(token, key)?.is_valid())
    }

    #[track_caller]
    pub fn verify_detailed(
        &self,
        token: &str,
        key: &VerificationKey,
    ) -> AuthErrorResult<VerificationOutcome> {
        self.verify_at(token, key, chrono::Utc::now().timestamp())
    }

    /// Verify against an explicit current time (Unix seconds)
    #[track_caller]
    pub fn verify_at(
        &self,
        token: &str,
        key: &VerificationKey,
        now: i64,
    ) -> AuthErrorResult<VerificationOutcome> {
        if let VerificationKey::Hmac { secret } = key
            && secret.trim().is_empty()
        {
            return Err(AuthError::BlankHmacSecret {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let header = match decode_header(token) {
            Ok(header) => header,
            Err(e) => {
                debug!("Token header could not be decoded: {}", e);
                return Ok(VerificationOutcome::Malformed);
            }
        };

        if !key.family().accepts(header.alg) {
            debug!(
                "Token algorithm {:?} cannot be checked with a {} key",
                header.alg,
                key.family().as_str()
            );
            return Ok(VerificationOutcome::AlgorithmMismatch);
        }

        // Expiry is checked below so that `now >= exp` is expired with no leeway
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims = match decode::<Claims>(token, &key.decoding_key(), &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Token failed verification: {}", e);
                return Ok(match e.kind() {
                    ErrorKind::InvalidSignature => VerificationOutcome::BadSignature,
                    _ => VerificationOutcome::Malformed,
                });
            }
        };

        let not_expired = claims.expires_at().is_some_and(|exp| now < exp);
        if not_expired {
            Ok(VerificationOutcome::Valid)
        } else {
            Ok(VerificationOutcome::Expired)
        }
    }
}

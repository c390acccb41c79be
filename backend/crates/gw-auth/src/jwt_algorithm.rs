use crate::{AuthError, Result as AuthErrorResult};

use std::panic::Location;

use error_location::ErrorLocation;
use jsonwebtoken::Algorithm;

/// Signature algorithm family of a signing key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// RSASSA (RS256/RS384/RS512, PS256/PS384/PS512)
    Rsa,
    /// HMAC with SHA-2 (HS256/HS384/HS512)
    Hmac,
}

impl JwtAlgorithm {
    /// Classify the algorithm name of a key file entry.
    ///
    /// `RSA`, `RS256`, `RS384`, `RS512` are RSA; anything shaped `HS` + three
    /// digits is HMAC. Matching is case-insensitive.
    #[track_caller]
    pub fn from_key_algorithm(name: &str) -> AuthErrorResult<Self> {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "RSA" | "RS256" | "RS384" | "RS512" => Ok(Self::Rsa),
            _ if is_hmac_name(&upper) => Ok(Self::Hmac),
            _ => Err(AuthError::UnsupportedAlgorithm {
                algorithm: name.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Whether a token signed with `alg` can be checked by a key of this family
    pub fn accepts(&self, alg: Algorithm) -> bool {
        match self {
            Self::Rsa => matches!(
                alg,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ),
            Self::Hmac => matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Hmac => "HMAC",
        }
    }
}

fn is_hmac_name(upper: &str) -> bool {
    upper.len() == 5 && upper.starts_with("HS") && upper[2..].chars().all(|c| c.is_ascii_digit())
}

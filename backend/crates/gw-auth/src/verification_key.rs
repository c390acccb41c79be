use crate::JwtAlgorithm;

use std::fmt;

use jsonwebtoken::DecodingKey;

/// Typed key a token signature is checked against
#[derive(Clone, PartialEq, Eq)]
pub enum VerificationKey {
    /// RSA public key as big-endian modulus and exponent
    Rsa { modulus: Vec<u8>, exponent: Vec<u8> },
    /// Raw HMAC secret
    Hmac { secret: String },
}

impl VerificationKey {
    pub fn family(&self) -> JwtAlgorithm {
        match self {
            Self::Rsa { .. } => JwtAlgorithm::Rsa,
            Self::Hmac { .. } => JwtAlgorithm::Hmac,
        }
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        match self {
            Self::Rsa { modulus, exponent } => {
                DecodingKey::from_rsa_raw_components(modulus, exponent)
            }
            Self::Hmac { secret } => DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

// Never print key material
impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa { modulus, .. } => f
                .debug_struct("Rsa")
                .field("modulus_bits", &(modulus.len() * 8))
                .finish_non_exhaustive(),
            Self::Hmac { .. } => f.debug_struct("Hmac").finish_non_exhaustive(),
        }
    }
}

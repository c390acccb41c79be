use crate::{AuthError, JwtAlgorithm, KeyEntry, Result as AuthErrorResult, VerificationKey};

use std::panic::Location;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use error_location::ErrorLocation;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::{FromDer, SubjectPublicKeyInfo};
use x509_parser::public_key::PublicKey;

const CERTIFICATE_MARKER: &str = "-----BEGIN CERTIFICATE-----";
const PUBLIC_KEY_BEGIN: &str = "-----BEGIN PUBLIC KEY-----";
const PUBLIC_KEY_END: &str = "-----END PUBLIC KEY-----";

/// Build the typed verification key for a key file entry
#[track_caller]
pub fn parse_key_entry(entry: &KeyEntry) -> AuthErrorResult<VerificationKey> {
    parse_verification_key(&entry.algorithm, &entry.material)
}

/// Convert an algorithm name and raw key material into a [`VerificationKey`].
///
/// RSA material is either a PEM certificate or a PEM SubjectPublicKeyInfo
/// block; HMAC material is used as-is.
#[track_caller]
pub fn parse_verification_key(
    algorithm: &str,
    material: &str,
) -> AuthErrorResult<VerificationKey> {
    let caller = Location::caller();

    match JwtAlgorithm::from_key_algorithm(algorithm)? {
        JwtAlgorithm::Hmac => Ok(VerificationKey::Hmac {
            secret: material.to_string(),
        }),
        JwtAlgorithm::Rsa if material.contains(CERTIFICATE_MARKER) => {
            rsa_key_from_certificate(material).map_err(|message| AuthError::InvalidKey {
                message,
                location: ErrorLocation::from(caller),
            })
        }
        JwtAlgorithm::Rsa => {
            rsa_key_from_public_key(material).map_err(|message| AuthError::InvalidKey {
                message,
                location: ErrorLocation::from(caller),
            })
        }
    }
}

fn rsa_key_from_certificate(material: &str) -> Result<VerificationKey, String> {
    let (_, pem) = parse_x509_pem(material.trim().as_bytes())
        .map_err(|e| format!("certificate PEM: {e}"))?;
    let certificate = pem
        .parse_x509()
        .map_err(|e| format!("certificate: {e}"))?;

    rsa_components(certificate.public_key())
}

fn rsa_key_from_public_key(material: &str) -> Result<VerificationKey, String> {
    let body: String = material
        .replace(PUBLIC_KEY_BEGIN, "")
        .replace(PUBLIC_KEY_END, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let der = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| format!("public key base64: {e}"))?;
    let (_, spki) =
        SubjectPublicKeyInfo::from_der(&der).map_err(|e| format!("public key: {e}"))?;

    rsa_components(&spki)
}

fn rsa_components(spki: &SubjectPublicKeyInfo<'_>) -> Result<VerificationKey, String> {
    match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => Ok(VerificationKey::Rsa {
            modulus: strip_leading_zeros(rsa.modulus),
            exponent: strip_leading_zeros(rsa.exponent),
        }),
        Ok(_) => Err("public key is not an RSA key".to_string()),
        Err(e) => Err(format!("public key: {e}")),
    }
}

// DER integers carry a sign byte
fn strip_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len().saturating_sub(1));
    bytes[start..].to_vec()
}

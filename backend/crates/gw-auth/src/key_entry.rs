/// One signing key loaded from the key file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub key_id: String,
    /// Algorithm name as written in the file (`HS256`, `RS256`, `RSA`, ...)
    pub algorithm: String,
    /// HMAC secret, PEM public key or PEM certificate
    pub material: String,
}

impl KeyEntry {
    pub fn new(
        key_id: impl Into<String>,
        algorithm: impl Into<String>,
        material: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            algorithm: algorithm.into(),
            material: material.into(),
        }
    }
}

use ssi_jwk::{Algorithm, JWK};

use crate::Error;

/// Freshly generated signing key.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub private: JWK,
    pub public: JWK,
}

/// Generates a key pair for `algorithm`, tagging both keys with it.
///
/// Supports `ES256` (P-256) and `EdDSA` (Ed25519).
pub fn generate_key_pair(algorithm: Algorithm) -> Result<KeyPair, Error> {
    let mut private = match algorithm {
        Algorithm::ES256 => JWK::generate_p256()?,
        Algorithm::EdDSA => JWK::generate_ed25519()?,
        other => return Err(Error::UnsupportedKeyAlgorithm(other)),
    };
    private.algorithm = Some(algorithm);

    Ok(KeyPair {
        public: private.to_public(),
        private,
    })
}

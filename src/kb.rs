//! Holder binding: a short JWT signed by the holder, proving possession of the
//! key confirmed by the issuer in `cnf.jwk`.
use serde::{Deserialize, Serialize};
use ssi_jwk::JWK;
use ssi_jws::Header;
use ssi_jwt::NumericDate;

use crate::{Error, KB_JWT_TYPE};

/// Claims of a holder-binding JWT.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyBindingClaims {
    pub nonce: String,
    pub aud: String,
    pub iat: NumericDate,
}

/// Signs a holder-binding JWT for the given verifier `audience` and `nonce`.
pub fn create_key_binding(nonce: &str, audience: &str, key: &JWK) -> Result<String, Error> {
    let claims = KeyBindingClaims {
        nonce: nonce.to_owned(),
        aud: audience.to_owned(),
        iat: NumericDate::try_from(chrono::Utc::now())?,
    };

    let header = Header {
        algorithm: key.get_algorithm().ok_or(Error::MissingAlgorithm)?,
        key_id: key.key_id.clone(),
        type_: Some(KB_JWT_TYPE.to_owned()),
        ..Default::default()
    };

    Ok(ssi_jws::encode_sign_custom_header(
        &serde_json::to_string(&claims)?,
        key,
        &header,
    )?)
}

/// Verifies a holder-binding JWT against the holder public key, then checks
/// its audience and nonce.
pub fn verify_key_binding(
    jwt: &str,
    audience: &str,
    nonce: &str,
    key: &JWK,
) -> Result<KeyBindingClaims, Error> {
    let (header, payload) = ssi_jws::decode_verify(jwt, key)?;

    if header.type_.as_deref() != Some(KB_JWT_TYPE) {
        return Err(Error::KeyBindingType);
    }

    let claims: KeyBindingClaims = serde_json::from_slice(&payload)?;

    if claims.aud != audience {
        log::warn!("holder binding presented for another audience");
        return Err(Error::AudienceMismatch);
    }

    if claims.nonce != nonce {
        log::warn!("holder binding nonce mismatch");
        return Err(Error::NonceMismatch);
    }

    Ok(claims)
}

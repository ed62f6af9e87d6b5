use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use ssi_jwk::JWK;
use ssi_jws::Header;
use ssi_jwt::NumericDate;
use std::collections::BTreeSet;

use crate::disclose::holder_key;
use crate::kb::verify_key_binding;
use crate::serialized::deserialize_string_format;
use crate::walk::{walk, ClaimPolicy};
use crate::*;

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct ValidityClaims {
    pub nbf: Option<NumericDate>,
    pub iat: Option<NumericDate>,
    pub exp: Option<NumericDate>,
}

impl ValidityClaims {
    /// Checks `exp` and `nbf` against the current time.
    ///
    /// Dates are compared as seconds, so values beyond the range of a
    /// calendar date are still ordered.
    pub fn check(&self) -> Result<(), Error> {
        let now = NumericDate::try_from(chrono::Utc::now())?;

        if let Some(exp) = self.exp {
            if exp < now {
                return Err(Error::Expired);
            }
        }

        if let Some(nbf) = self.nbf {
            if nbf > now {
                return Err(Error::NotYetValid);
            }
        }

        Ok(())
    }
}

/// Verification options.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyOptions {
    /// Expected audience of the holder-binding JWT.
    pub audience: Option<String>,

    /// Expected nonce of the holder-binding JWT.
    pub nonce: Option<String>,
}

impl VerifyOptions {
    /// Expected audience and nonce, both or neither. Empty strings count as
    /// absent.
    fn audience_nonce(&self) -> Result<Option<(&str, &str)>, Error> {
        let audience = self.audience.as_deref().filter(|a| !a.is_empty());
        let nonce = self.nonce.as_deref().filter(|n| !n.is_empty());

        match (audience, nonce) {
            (Some(audience), Some(nonce)) => Ok(Some((audience, nonce))),
            (None, None) => Ok(None),
            _ => Err(Error::AmbiguousAudienceNonce),
        }
    }
}

/// Outcome of a successful verification.
#[derive(Debug)]
pub struct Verified<Claims> {
    /// Protected header of the issuer-signed JWT.
    pub header: Header,

    /// Digest algorithm declared by the issuer.
    pub sd_alg: SdAlg,

    pub validity: ValidityClaims,

    /// Disclosed claims, without `_sd` and `_sd_alg`.
    pub claims: Claims,
}

/// Reads the `_sd_alg` claim of a payload.
pub(crate) fn sd_alg(claims: &Map<String, Value>) -> Result<SdAlg, Error> {
    let alg_name = claims
        .get(SD_ALG_CLAIM_NAME)
        .and_then(Value::as_str)
        .ok_or(Error::MissingSdAlg)?;

    SdAlg::try_from(alg_name)
}

struct Revealer<'r, 'e> {
    disclosures: &'r DisclosureMap<'e>,
    seen: BTreeSet<String>,
}

impl ClaimPolicy for Revealer<'_, '_> {
    type Request = ();
    type Output = Value;

    fn scalar(&mut self, value: &Value) -> Result<Value, Error> {
        Ok(value.clone())
    }

    fn array_request(&self, _request: ()) {}

    fn array(&mut self, items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    fn object(&mut self, object: &Map<String, Value>, _request: ()) -> Result<Value, Error> {
        let mut revealed = Map::new();

        for (key, value) in object {
            if key != SD_CLAIM_NAME {
                revealed.insert(key.clone(), walk(self, value, ())?);
            }
        }

        let digests = match object.get(SD_CLAIM_NAME) {
            Some(Value::Array(digests)) => digests,
            Some(_) => return Err(Error::SdClaimNotArray),
            None => return Ok(Value::Object(revealed)),
        };

        let disclosures = self.disclosures;
        for digest in digests {
            let digest = digest.as_str().ok_or(Error::SdDigestNotString)?;

            if !self.seen.insert(digest.to_owned()) {
                log::warn!("digest {} is referenced more than once", digest);
                return Err(Error::DuplicateDigest(digest.to_owned()));
            }

            // Not disclosed, or a decoy.
            let Some(disclosure) = disclosures.get(digest) else {
                continue;
            };

            let name = &disclosure.decoded.name;
            if revealed.contains_key(name) {
                log::warn!("disclosure {} collides with an existing claim", digest);
                return Err(Error::DuplicateKey(name.clone()));
            }

            let value = walk(self, &disclosure.decoded.value, ())?;
            revealed.insert(name.clone(), value);
        }

        Ok(Value::Object(revealed))
    }
}

/// Reconstructs the disclosed claims from a committed claim tree.
///
/// Every disclosure of `disclosures` must be referenced by exactly one digest
/// of the tree. Digests without a matching disclosure are dropped.
pub fn reveal_claims(claims: &Value, disclosures: &DisclosureMap) -> Result<Value, Error> {
    let mut revealer = Revealer {
        disclosures,
        seen: BTreeSet::new(),
    };
    let revealed = walk(&mut revealer, claims, ())?;

    if let Some(unused) = disclosures
        .digests()
        .find(|digest| !revealer.seen.contains(*digest))
    {
        log::warn!("disclosure {} is not referenced by any digest", unused);
        return Err(Error::UnusedDisclosure(unused.to_owned()));
    }

    Ok(revealed)
}

/// High level API to verify a presented SD-JWT and reconstruct its disclosed
/// claims.
///
/// The issuer signature is checked against `key`. If the payload confirms a
/// holder key, the presentation must end with a holder-binding JWT for the
/// audience and nonce of `options`.
pub fn decode_verify<Claims: DeserializeOwned>(
    serialized: &str,
    key: &JWK,
    options: &VerifyOptions,
) -> Result<Verified<Claims>, Error> {
    let audience_nonce = options.audience_nonce()?;

    let deserialized =
        deserialize_string_format(serialized).ok_or(Error::InvalidCombinedFormat)?;

    let (header, payload) = ssi_jws::decode_verify(deserialized.jwt, key)?;
    let payload: Value = serde_json::from_slice(&payload)?;
    let payload_claims = payload.as_object().ok_or(Error::ClaimsNotObject)?;

    let validity = ValidityClaims::deserialize(&payload)?;
    validity.check()?;

    let sd_alg = sd_alg(payload_claims)?;

    if let Some(jwk) = holder_key(payload_claims) {
        let holder_key: JWK =
            serde_json::from_value(jwk.clone()).map_err(|_| Error::InvalidConfirmationKey)?;
        let kb_jwt = deserialized
            .key_binding_jwt
            .ok_or(Error::MissingHolderBinding)?;
        let (audience, nonce) = audience_nonce.ok_or(Error::MissingHolderBinding)?;

        verify_key_binding(kb_jwt, audience, nonce, &holder_key)?;
    }

    let disclosures = DisclosureMap::new(sd_alg, &deserialized.disclosures)?;
    let mut claims = reveal_claims(&payload, &disclosures)?;
    if let Value::Object(claims) = &mut claims {
        claims.remove(SD_ALG_CLAIM_NAME);
    }

    log::debug!(
        "verified SD-JWT with {} disclosures ({})",
        disclosures.len(),
        sd_alg
    );

    Ok(Verified {
        header,
        sd_alg,
        validity,
        claims: serde_json::from_value(claims)?,
    })
}

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ssi_jwk::JWK;
use ssi_jws::Header;
use ssi_jwt::NumericDate;

use crate::walk::{walk, ClaimPolicy, ReservedClaims};
use crate::*;

/// Claims where every object property has been replaced by a digest, along
/// with the disclosures opening those digests.
#[derive(Clone, Debug, PartialEq)]
pub struct CommittedClaims {
    /// Committed claim tree.
    pub claims: Value,

    /// Disclosures in the order they were created (children before their
    /// parent).
    pub disclosures: Vec<Disclosure>,

    /// Algorithm used for the digests.
    pub sd_alg: SdAlg,
}

/// Issuance options.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IssueOptions {
    /// Value of the `iss` claim.
    pub issuer: Option<String>,

    /// Value of the `iat` claim.
    pub issued_at: Option<NumericDate>,

    /// Value of the `nbf` claim.
    pub not_before: Option<NumericDate>,

    /// Value of the `exp` claim.
    pub expires_at: Option<NumericDate>,

    /// Holder public key, bound with the `cnf` claim.
    pub holder_key: Option<JWK>,

    /// Digest algorithm.
    pub sd_alg: SdAlg,
}

impl IssueOptions {
    /// Claims added in plain text next to the committed claims.
    fn registered_claims(&self) -> Result<Vec<(&'static str, Value)>, Error> {
        let mut claims = vec![(SD_ALG_CLAIM_NAME, serde_json::to_value(self.sd_alg)?)];

        if let Some(issuer) = &self.issuer {
            claims.push(("iss", Value::String(issuer.clone())));
        }
        if let Some(iat) = self.issued_at {
            claims.push(("iat", serde_json::to_value(iat)?));
        }
        if let Some(nbf) = self.not_before {
            claims.push(("nbf", serde_json::to_value(nbf)?));
        }
        if let Some(exp) = self.expires_at {
            claims.push(("exp", serde_json::to_value(exp)?));
        }
        if let Some(holder_key) = &self.holder_key {
            claims.push((
                CNF_CLAIM_NAME,
                serde_json::json!({ CNF_JWK_PROPERTY_NAME: holder_key.to_public() }),
            ));
        }

        Ok(claims)
    }
}

struct Concealer<'r, R: ?Sized> {
    rng: &'r mut R,
    sd_alg: SdAlg,
    disclosures: Vec<Disclosure>,
}

impl<R: RngCore + CryptoRng + ?Sized> ClaimPolicy for Concealer<'_, R> {
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
        let mut digests = Vec::with_capacity(object.len());

        for (key, value) in object {
            let subtree = walk(self, value, ())?;
            let disclosure = Disclosure::with_rng(&mut *self.rng, self.sd_alg, key, &subtree)?;
            digests.push(disclosure.hash.clone());
            self.disclosures.push(disclosure);
        }

        // TODO: add decoy digests once a policy for their count is settled.
        digests.sort_unstable();

        let mut concealed = Map::new();
        if !digests.is_empty() {
            concealed.insert(
                SD_CLAIM_NAME.to_owned(),
                Value::Array(digests.into_iter().map(Value::String).collect()),
            );
        }

        Ok(Value::Object(concealed))
    }
}

/// Replaces every object property of `claims`, at any depth, by the digest of
/// a fresh disclosure.
///
/// Fails with [`Error::ReservedClaim`] before drawing any salt if `claims`
/// contains an `_sd` property.
pub fn encode_claims<R: RngCore + CryptoRng + ?Sized>(
    claims: &Value,
    sd_alg: SdAlg,
    rng: &mut R,
) -> Result<CommittedClaims, Error> {
    ReservedClaims::check(claims)?;

    let mut concealer = Concealer {
        rng,
        sd_alg,
        disclosures: Vec::new(),
    };
    let claims = walk(&mut concealer, claims, ())?;

    Ok(CommittedClaims {
        claims,
        disclosures: concealer.disclosures,
        sd_alg,
    })
}

/// High level API to issue an SD-JWT in combined format, with salts from the
/// operating system.
pub fn encode_sign<Claims: Serialize>(
    claims: &Claims,
    key: &JWK,
    options: &IssueOptions,
) -> Result<String, Error> {
    encode_sign_with(claims, key, options, &mut rand::rngs::OsRng)
}

/// Issues an SD-JWT in combined format, drawing salts from `rng`.
///
/// The result carries every disclosure.
pub fn encode_sign_with<Claims: Serialize, R: RngCore + CryptoRng + ?Sized>(
    claims: &Claims,
    key: &JWK,
    options: &IssueOptions,
    rng: &mut R,
) -> Result<String, Error> {
    let claims = serde_json::to_value(claims)?;
    let base_claims = claims.as_object().ok_or(Error::ClaimsNotObject)?;

    let committed = encode_claims(&claims, options.sd_alg, rng)?;
    let mut payload = match committed.claims {
        Value::Object(payload) => payload,
        _ => return Err(Error::ClaimsNotObject),
    };

    for (name, value) in options.registered_claims()? {
        if base_claims.contains_key(name) {
            return Err(Error::ClaimCollision(name.to_owned()));
        }
        payload.insert(name.to_owned(), value);
    }

    let algorithm = key.get_algorithm().ok_or(Error::MissingAlgorithm)?;
    let header = Header {
        algorithm,
        key_id: key.key_id.clone(),
        type_: Some(SD_JWT_TYPE.to_owned()),
        ..Default::default()
    };
    let jwt = ssi_jws::encode_sign_custom_header(&serde_json::to_string(&payload)?, key, &header)?;

    log::debug!(
        "issued SD-JWT with {} disclosures ({}, holder binding: {})",
        committed.disclosures.len(),
        options.sd_alg,
        options.holder_key.is_some()
    );

    Ok(serialize_string_format(
        &jwt,
        committed.disclosures.iter().map(|d| d.encoded.as_str()),
        None,
    ))
}

use serde::Deserialize;
use serde_json::{Map, Value};
use ssi_jwk::JWK;

use crate::decode::sd_alg;
use crate::kb::create_key_binding;
use crate::serialized::{deserialize_string_format, serialize_string_format};
use crate::walk::{walk, ClaimPolicy};
use crate::*;

/// Holder-binding inputs of [`derive`].
#[derive(Clone, Debug, Deserialize)]
pub struct HolderBinding {
    /// Verifier the presentation is intended for.
    pub audience: String,

    /// Verifier challenge.
    pub nonce: String,

    /// Holder private key matching the `cnf.jwk` claim.
    pub key: JWK,
}

/// Truthiness of a request tree node: `null`, `false`, `0` and `""` are
/// falsy, everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Request node used below a claim. Scalar leaves stop the descent.
fn descend(request: Option<&Value>) -> Option<&Value> {
    request.filter(|r| r.is_object() || r.is_array())
}

fn entry<'r>(request: Option<&'r Value>, key: &str) -> Result<Option<&'r Value>, Error> {
    match request {
        None => Ok(None),
        Some(Value::Object(request)) => Ok(request.get(key)),
        Some(_) => Err(Error::RequestShape(key.to_owned())),
    }
}

struct Selector<'r, 'e> {
    disclosures: &'r DisclosureMap<'e>,
    selected: Vec<&'e str>,
}

impl<'r, 'e> ClaimPolicy for Selector<'r, 'e> {
    type Request = Option<&'r Value>;
    type Output = ();

    fn scalar(&mut self, _value: &Value) -> Result<(), Error> {
        Ok(())
    }

    // Every item is walked with the first item of the request. Individual
    // array items cannot be selected.
    fn array_request(&self, request: Option<&'r Value>) -> Option<&'r Value> {
        match request {
            Some(Value::Array(items)) => descend(items.first()),
            _ => None,
        }
    }

    fn array(&mut self, _items: Vec<()>) {}

    fn object(
        &mut self,
        object: &Map<String, Value>,
        request: Option<&'r Value>,
    ) -> Result<(), Error> {
        for (key, value) in object {
            if key != SD_CLAIM_NAME {
                walk(self, value, descend(entry(request, key)?))?;
            }
        }

        let digests = match object.get(SD_CLAIM_NAME) {
            Some(Value::Array(digests)) => digests,
            Some(_) => return Err(Error::SdClaimNotArray),
            None => return Ok(()),
        };

        let disclosures = self.disclosures;
        for digest in digests {
            let digest = digest.as_str().ok_or(Error::SdDigestNotString)?;

            // Decoys and claims the holder never received.
            let Some(disclosure) = disclosures.get(digest) else {
                continue;
            };

            let requested = entry(request, &disclosure.decoded.name)?;
            if requested.map_or(false, is_truthy) {
                self.selected.push(disclosure.encoded);
            }

            walk(self, &disclosure.decoded.value, descend(requested))?;
        }

        Ok(())
    }
}

/// Selects the disclosures to present for `request`, in the order they are
/// encountered in `claims`.
///
/// A nested request also discloses every concealed parent on its path, since
/// object and array request nodes are truthy.
pub fn select_disclosures<'e>(
    claims: &Value,
    request: &Value,
    disclosures: &DisclosureMap<'e>,
) -> Result<Vec<&'e str>, Error> {
    let mut selector = Selector {
        disclosures,
        selected: Vec::new(),
    };
    walk(&mut selector, claims, Some(request))?;
    Ok(selector.selected)
}

/// Derives a presentation from an issued SD-JWT, keeping only the
/// disclosures marked in `request`.
///
/// The issuer signature is not checked here. When the token binds a holder
/// key, `binding` is required and its holder-binding JWT is appended.
pub fn derive(
    combined: &str,
    request: &Value,
    binding: Option<&HolderBinding>,
) -> Result<String, Error> {
    let deserialized =
        deserialize_string_format(combined).ok_or(Error::InvalidCombinedFormat)?;

    let (_header, payload) = ssi_jws::decode_unverified(deserialized.jwt)?;
    let payload: Value = serde_json::from_slice(&payload)?;
    let claims = payload.as_object().ok_or(Error::ClaimsNotObject)?;

    let sd_alg = sd_alg(claims)?;
    let disclosures = DisclosureMap::new(sd_alg, &deserialized.disclosures)?;
    let selected = select_disclosures(&payload, request, &disclosures)?;

    let bound = holder_key(claims).is_some();
    let key_binding_jwt = match binding {
        Some(binding) => Some(create_key_binding(
            &binding.nonce,
            &binding.audience,
            &binding.key,
        )?),
        None if bound => return Err(Error::MissingHolderBinding),
        None => None,
    };

    log::debug!(
        "derived presentation with {} of {} disclosures (holder binding: {})",
        selected.len(),
        disclosures.len(),
        key_binding_jwt.is_some()
    );

    Ok(serialize_string_format(
        deserialized.jwt,
        selected,
        key_binding_jwt.as_deref(),
    ))
}

/// Confirmation key of a payload, if any.
pub(crate) fn holder_key(claims: &Map<String, Value>) -> Option<&Value> {
    claims.get(CNF_CLAIM_NAME)?.get(CNF_JWK_PROPERTY_NAME)
}

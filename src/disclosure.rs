use base64::URL_SAFE_NO_PAD;
use rand::{CryptoRng, RngCore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::{hash_encoded_disclosure, Error, SdAlg};

/// Disclosure as encoded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disclosure {
    /// Base 64 of disclosure array
    pub encoded: String,

    /// Base 64 of hash of disclosure array
    pub hash: String,
}

impl Disclosure {
    /// Encodes the `[salt, name, value]` triple and computes its digest.
    pub fn new(sd_alg: SdAlg, salt: &str, name: &str, value: &Value) -> Result<Self, Error> {
        let encoded = encode_disclosure_with_salt(salt, name, value)?;
        let hash = hash_encoded_disclosure(sd_alg, &encoded);
        Ok(Self { encoded, hash })
    }

    /// Creates a disclosure with a fresh salt drawn from `rng`.
    pub fn with_rng<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        sd_alg: SdAlg,
        name: &str,
        value: &Value,
    ) -> Result<Self, Error> {
        Self::new(sd_alg, &generate_salt(rng), name, value)
    }

    /// Decode this disclosure.
    pub fn decode(&self) -> Result<DecodedDisclosure, Error> {
        DecodedDisclosure::new(&self.encoded)
    }
}

/// Encodes a disclosure from its salt, claim name and claim value.
///
/// The triple is a fixed-position JSON array, serialized compactly and then
/// base64url encoded without padding.
pub fn encode_disclosure_with_salt(
    salt: &str,
    claim_name: &str,
    claim_value: &Value,
) -> Result<String, serde_json::Error> {
    let disclosure = serde_json::json!([salt, claim_name, claim_value]);
    let json_string = serde_json::to_string(&disclosure)?;
    Ok(base64::encode_config(json_string, URL_SAFE_NO_PAD))
}

/// Generates a 128-bit salt, base64url encoded.
pub fn generate_salt<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> String {
    const DEFAULT_SALT_SIZE: usize = 128 / 8;

    let mut salt_bytes = [0u8; DEFAULT_SALT_SIZE];
    rng.fill_bytes(&mut salt_bytes);

    base64::encode_config(salt_bytes, URL_SAFE_NO_PAD)
}

/// Decoded disclosure.
#[derive(Clone, PartialEq)]
pub struct DecodedDisclosure {
    pub salt: String,
    pub name: String,
    pub value: Value,
}

impl DecodedDisclosure {
    pub fn new(encoded: &str) -> Result<Self, Error> {
        let bytes = base64::decode_config(encoded, URL_SAFE_NO_PAD)
            .map_err(|_| Error::DisclosureMalformed)?;
        let json: Value =
            serde_json::from_slice(&bytes).map_err(|_| Error::DisclosureMalformed)?;

        match json {
            Value::Array(values) => match <[Value; 3]>::try_from(values) {
                Ok([Value::String(salt), Value::String(name), value]) => {
                    Ok(DecodedDisclosure { salt, name, value })
                }
                _ => Err(Error::DisclosureMalformed),
            },
            _ => Err(Error::DisclosureMalformed),
        }
    }
}

// Salts are secret until disclosed, keep them out of logs.
impl fmt::Debug for DecodedDisclosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedDisclosure")
            .field("salt", &"<redacted>")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

/// Disclosures of a combined token indexed by digest.
#[derive(Debug)]
pub struct DisclosureMap<'a> {
    sd_alg: SdAlg,
    entries: BTreeMap<String, MappedDisclosure<'a>>,
}

/// Entry of a [`DisclosureMap`].
#[derive(Debug)]
pub struct MappedDisclosure<'a> {
    pub encoded: &'a str,
    pub decoded: DecodedDisclosure,
}

impl<'a> DisclosureMap<'a> {
    /// Decodes and hashes every disclosure.
    ///
    /// Empty segments are skipped. Fails if a disclosure is malformed or if
    /// two disclosures share the same digest.
    pub fn new(sd_alg: SdAlg, disclosures: &[&'a str]) -> Result<Self, Error> {
        let mut entries = BTreeMap::new();

        for encoded in disclosures.iter().copied().filter(|d| !d.is_empty()) {
            let hash = hash_encoded_disclosure(sd_alg, encoded);
            let decoded = DecodedDisclosure::new(encoded)?;

            if entries.contains_key(&hash) {
                log::warn!("duplicate disclosure for digest {}", hash);
                return Err(Error::DuplicateDisclosure(hash));
            }

            entries.insert(hash, MappedDisclosure { encoded, decoded });
        }

        Ok(Self { sd_alg, entries })
    }

    pub fn sd_alg(&self) -> SdAlg {
        self.sd_alg
    }

    pub fn get(&self, digest: &str) -> Option<&MappedDisclosure<'a>> {
        self.entries.get(digest)
    }

    pub fn contains(&self, digest: &str) -> bool {
        self.entries.contains_key(digest)
    }

    /// Digests of all mapped disclosures, in lexicographic order.
    pub fn digests(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

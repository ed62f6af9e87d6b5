//! Selective Disclosure JWTs.
//!
//! An issuer replaces every property of a claim set by the digest of a salted
//! disclosure and signs the result ([`encode_sign`]). The holder presents the
//! signed JWT with a chosen subset of the disclosures ([`derive`]), optionally
//! proving possession of a key bound by the issuer. A verifier checks the
//! signature and rebuilds the disclosed claims ([`decode_verify`]).
//!
//! Tokens travel in the combined format:
//! `<issuer JWT>~<disclosure>~...~<disclosure>[~<holder-binding JWT>]`.
pub(crate) mod decode;
pub(crate) mod digest;
pub(crate) mod disclose;
pub(crate) mod disclosure;
pub(crate) mod encode;
mod error;
pub(crate) mod kb;
mod keys;
pub mod serialized;
mod walk;

pub use decode::{decode_verify, reveal_claims, ValidityClaims, Verified, VerifyOptions};
pub use digest::{hash_encoded_disclosure, SdAlg};
pub use disclose::{derive, is_truthy, select_disclosures, HolderBinding};
pub use disclosure::{
    encode_disclosure_with_salt, generate_salt, DecodedDisclosure, Disclosure, DisclosureMap,
    MappedDisclosure,
};
pub use encode::{encode_claims, encode_sign, encode_sign_with, CommittedClaims, IssueOptions};
pub use error::{Error, ErrorKind};
pub use kb::{create_key_binding, verify_key_binding, KeyBindingClaims};
pub use keys::{generate_key_pair, KeyPair};
pub use serialized::{deserialize_string_format, serialize_string_format, Deserialized};

/// Property holding the digests of the concealed properties of an object.
pub const SD_CLAIM_NAME: &str = "_sd";

/// Top-level claim naming the digest algorithm.
pub const SD_ALG_CLAIM_NAME: &str = "_sd_alg";

/// Top-level claim confirming the holder key.
pub const CNF_CLAIM_NAME: &str = "cnf";

/// Property of the `cnf` claim holding the holder public JWK.
pub const CNF_JWK_PROPERTY_NAME: &str = "jwk";

/// `typ` header of issuer-signed JWTs.
pub const SD_JWT_TYPE: &str = "sd+jwt";

/// `typ` header of holder-binding JWTs.
pub const KB_JWT_TYPE: &str = "kb+jwt";

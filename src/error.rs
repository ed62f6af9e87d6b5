//! Error type for `ssi-selective-disclosure`.

/// Broad classification of an [`Error`].
///
/// Lets a verifier tell client mistakes apart from tokens that were tampered
/// with or assembled incorrectly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied malformed input (claims, request tree, options).
    Input,
    /// The token itself is malformed or has been tampered with.
    Integrity,
    /// Holder-binding requirements are not met.
    Binding,
    /// Failure reported by the signed-envelope (JWS/JWK) layer.
    Envelope,
}

/// Errors of the issuance, presentation and verification pathways.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The claims to issue contain the reserved `_sd` property
    #[error("Claims contain the reserved `_sd` property at `{0}`")]
    ReservedClaim(String),

    /// A claim set at issuance collides with a claim of the input
    #[error("Claim `{0}` is set by the issuer and must not appear in the input claims")]
    ClaimCollision(String),

    /// Claims were not a JSON object
    #[error("Claims were not a JSON object")]
    ClaimsNotObject,

    /// A disclosure is malformed
    #[error("A disclosure is malformed")]
    DisclosureMalformed,

    /// Multiple disclosures given with the same hash
    #[error("Multiple disclosures given with the same hash `{0}`")]
    DuplicateDisclosure(String),

    /// The disclosure request does not match the shape of the claims
    #[error("Disclosure request is not an object where `{0}` is looked up")]
    RequestShape(String),

    /// A digest appears more than once in the committed claims
    #[error("Digest `{0}` is referenced more than once")]
    DuplicateDigest(String),

    /// A disclosed claim collides with an existing claim
    #[error("Disclosed claim `{0}` collides with an existing claim")]
    DuplicateKey(String),

    /// A presented disclosure is not referenced by the claims
    #[error("Disclosure `{0}` is not referenced by any digest")]
    UnusedDisclosure(String),

    /// An `_sd` property is not an array
    #[error("An `_sd` property is not an array")]
    SdClaimNotArray,

    /// An `_sd` entry is not a string
    #[error("An `_sd` entry is not a string")]
    SdDigestNotString,

    /// The payload is missing the `_sd_alg` property
    #[error("Payload is missing the `_sd_alg` property")]
    MissingSdAlg,

    /// Unknown value of `_sd_alg`
    #[error("Unsupported digest algorithm `{0}`")]
    UnsupportedAlgorithm(String),

    /// The combined format could not be split into its parts
    #[error("Invalid combined format")]
    InvalidCombinedFormat,

    /// No signing algorithm can be derived from the key
    #[error("Unable to determine the signing algorithm of the key")]
    MissingAlgorithm,

    /// Key generation was requested for an unsupported algorithm
    #[error("Key generation not supported for algorithm {0:?}")]
    UnsupportedKeyAlgorithm(ssi_jwk::Algorithm),

    /// Holder binding is required but was not provided
    #[error("Holder binding is required but missing")]
    MissingHolderBinding,

    /// Only one of audience and nonce was provided
    #[error("Audience and nonce must be provided together")]
    AmbiguousAudienceNonce,

    /// The holder-binding nonce does not match
    #[error("Holder binding nonce mismatch")]
    NonceMismatch,

    /// The holder-binding audience does not match
    #[error("Holder binding audience mismatch")]
    AudienceMismatch,

    /// The holder-binding JWT does not carry the `kb+jwt` type
    #[error("Holder-binding JWT has an unexpected `typ`")]
    KeyBindingType,

    /// The `cnf.jwk` claim is not a valid JWK
    #[error("Invalid confirmation key")]
    InvalidConfirmationKey,

    /// The token is expired
    #[error("Token is expired")]
    Expired,

    /// The token is not valid yet
    #[error("Token is not valid yet")]
    NotYetValid,

    /// Bubbled up error from ssi_jws
    #[error(transparent)]
    JWS(#[from] ssi_jws::Error),

    /// Bubbled up error from ssi_jwt
    #[error(transparent)]
    NumericDate(#[from] ssi_jwt::NumericDateConversionError),

    /// Bubbled up error from ssi_jwk
    #[error(transparent)]
    JWK(#[from] ssi_jwk::Error),

    /// Bubbled up error from serde_json
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReservedClaim(_)
            | Self::ClaimCollision(_)
            | Self::RequestShape(_)
            | Self::MissingAlgorithm
            | Self::UnsupportedKeyAlgorithm(_)
            | Self::AmbiguousAudienceNonce
            | Self::NumericDate(_) => ErrorKind::Input,
            Self::ClaimsNotObject
            | Self::DisclosureMalformed
            | Self::DuplicateDisclosure(_)
            | Self::DuplicateDigest(_)
            | Self::DuplicateKey(_)
            | Self::UnusedDisclosure(_)
            | Self::SdClaimNotArray
            | Self::SdDigestNotString
            | Self::MissingSdAlg
            | Self::UnsupportedAlgorithm(_)
            | Self::InvalidCombinedFormat
            | Self::Expired
            | Self::NotYetValid
            | Self::Json(_) => ErrorKind::Integrity,
            Self::MissingHolderBinding
            | Self::NonceMismatch
            | Self::AudienceMismatch
            | Self::KeyBindingType
            | Self::InvalidConfirmationKey => ErrorKind::Binding,
            Self::JWS(_) | Self::JWK(_) => ErrorKind::Envelope,
        }
    }

    /// Whether this error indicates a malformed or tampered token.
    pub fn is_integrity_failure(&self) -> bool {
        self.kind() == ErrorKind::Integrity
    }
}

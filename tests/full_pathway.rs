use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use ssi_jwk::{Algorithm, JWK};
use ssi_jwt::NumericDate;
use ssi_selective_disclosure::*;

fn test_key() -> JWK {
    serde_json::from_value(serde_json::json!({
        "kty": "EC",
        "d": "oYVImrMZjUclmWuhqa6bjzqGx5HFkbx76_00oWUHiLw",
        "use": "sig",
        "crv": "P-256",
        "kid": "rpaXW8yADRnS2150CdsMtftwxtzSiVTV9bgHHG86v-E",
        "x": "UX7TC8uQ9sn06c3DxXy1Ua5V9BK-cb9fQfukVrCLD8s",
        "y": "yNXRKOnwBMTx536uajfNHklxpG9bAbdLlmVn6-XuK0Q",
        "alg": "ES256"
    }))
    .unwrap()
}

fn issue(claims: &Value) -> String {
    encode_sign(claims, &test_key(), &IssueOptions::default()).unwrap()
}

fn verify(presentation: &str) -> Value {
    decode_verify::<Value>(presentation, &test_key().to_public(), &VerifyOptions::default())
        .unwrap()
        .claims
}

/// Decoded disclosures of a combined token.
fn presented(combined: &str) -> Vec<DecodedDisclosure> {
    deserialize_string_format(combined)
        .unwrap()
        .disclosures
        .into_iter()
        .map(|d| DecodedDisclosure::new(d).unwrap())
        .collect()
}

/// Request disclosing every claim of `claims`.
fn request_all(claims: &Value) -> Value {
    match claims {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, value)| {
                    let request = match value {
                        Value::Object(_) | Value::Array(_) => request_all(value),
                        _ => Value::Bool(true),
                    };
                    (key.clone(), request)
                })
                .collect(),
        ),
        Value::Array(items) => match items.iter().find(|item| item.is_object()) {
            Some(item) => json!([request_all(item)]),
            None => json!([]),
        },
        _ => Value::Bool(true),
    }
}

fn credential() -> Value {
    json!({
        "name": "Alice",
        "credentialSubject": {"batchNumber": "1626382736"}
    })
}

#[test]
fn disclose_nested_claim_only() {
    let issued = issue(&credential());
    assert_eq!(presented(&issued).len(), 3);

    let presentation = derive(
        &issued,
        &json!({"credentialSubject": {"batchNumber": true}}),
        None,
    )
    .unwrap();

    let claims = verify(&presentation);
    assert_eq!(claims["credentialSubject"]["batchNumber"], "1626382736");
    assert!(claims.get("name").is_none());
}

#[test]
fn disclose_everything() {
    let claims = json!({
        "sub": "user_42",
        "given_name": "John",
        "address": {
            "street_address": "123 Main St",
            "locality": "Anytown",
            "country": "US"
        },
        "nationalities": ["US", "DE"],
        "phone_number_verified": true,
        "updated_at": 1570000000,
        "credentials": [
            {"type": "degree", "level": {"name": "master", "year": 2010}},
            {"type": "license", "level": {"name": "class B", "year": 2015}}
        ],
        "nothing": null,
        "empty": {}
    });

    let issued = issue(&claims);
    let presentation = derive(&issued, &request_all(&claims), None).unwrap();

    assert_eq!(presented(&presentation).len(), presented(&issued).len());
    assert_eq!(verify(&presentation), claims);
}

#[test]
fn disclose_only_requested_path() {
    let claims = json!({
        "name": "Alice",
        "address": {
            "street": "Main St",
            "city": {"name": "Anytown", "zip": "12345"}
        },
        "age": 30
    });

    let issued = issue(&claims);
    let presentation = derive(
        &issued,
        &json!({"address": {"city": {"zip": true}}}),
        None,
    )
    .unwrap();

    let mut names: Vec<String> = presented(&presentation)
        .into_iter()
        .map(|d| d.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["address", "city", "zip"]);

    assert_eq!(
        verify(&presentation),
        json!({"address": {"city": {"zip": "12345"}}})
    );
}

#[test]
fn undisclosed_claims_stay_hidden() {
    let claims = json!({
        "name": "Alice",
        "ssn": "123-45-6789",
        "address": {"street": "Secret Lane", "country": "US"}
    });

    let issued = issue(&claims);
    let presentation = derive(
        &issued,
        &json!({"name": true, "address": {"country": true}}),
        None,
    )
    .unwrap();

    for disclosure in presented(&presentation) {
        let text = serde_json::to_string(&disclosure.value).unwrap();
        assert_ne!(disclosure.name, "ssn");
        assert_ne!(disclosure.name, "street");
        assert!(!text.contains("123-45-6789"));
        assert!(!text.contains("Secret Lane"));
    }

    assert_eq!(
        verify(&presentation),
        json!({"name": "Alice", "address": {"country": "US"}})
    );
}

#[test]
fn empty_request_discloses_nothing() {
    let issued = issue(&credential());
    let presentation = derive(&issued, &json!({}), None).unwrap();

    assert!(presented(&presentation).is_empty());
    assert_eq!(verify(&presentation), json!({}));
}

#[test]
fn typed_claims() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct BaseClaims {
        sub: String,
        disclosure0: Option<String>,
        disclosure1: Option<String>,
    }

    let base_claims = BaseClaims {
        sub: "user".to_owned(),
        disclosure0: Some("value0".to_owned()),
        disclosure1: Some("value1".to_owned()),
    };

    let options = IssueOptions {
        issuer: Some("https://example.com/issuer".to_owned()),
        issued_at: Some(NumericDate::try_from_seconds(1683000000.0).unwrap()),
        ..Default::default()
    };
    let issued = encode_sign(&base_claims, &test_key(), &options).unwrap();

    let (header, _) = ssi_jws::decode_unverified(
        deserialize_string_format(&issued).unwrap().jwt,
    )
    .unwrap();
    assert_eq!(header.type_.as_deref(), Some("sd+jwt"));
    assert_eq!(header.algorithm, Algorithm::ES256);
    assert_eq!(
        header.key_id.as_deref(),
        Some("rpaXW8yADRnS2150CdsMtftwxtzSiVTV9bgHHG86v-E")
    );

    let presentation = derive(&issued, &json!({"sub": true, "disclosure1": true}), None).unwrap();
    let verified =
        decode_verify::<BaseClaims>(&presentation, &test_key(), &VerifyOptions::default())
            .unwrap();

    assert_eq!(verified.sd_alg, SdAlg::Sha256);
    assert_eq!(
        verified.validity.iat,
        Some(NumericDate::try_from_seconds(1683000000.0).unwrap())
    );
    assert_eq!(
        verified.claims,
        BaseClaims {
            sub: "user".to_owned(),
            disclosure0: None,
            disclosure1: Some("value1".to_owned()),
        }
    );

    let claims = decode_verify::<Value>(&presentation, &test_key(), &VerifyOptions::default())
        .unwrap()
        .claims;
    assert_eq!(claims["iss"], "https://example.com/issuer");
    assert!(claims.get("_sd_alg").is_none());
}

#[test]
fn reject_reserved_claim_before_signing() {
    // the key has no usable algorithm, so reaching the signer would fail
    // with another error
    let mut key = test_key();
    key.algorithm = Some(Algorithm::None);

    let claims = json!({"name": "Alice", "nested": {"_sd": ["abc"]}});
    assert!(matches!(
        encode_sign(&claims, &key, &IssueOptions::default()),
        Err(Error::ReservedClaim(path)) if path == "/nested/_sd"
    ));
}

#[test]
fn reject_registered_claim_collision() {
    let options = IssueOptions {
        issuer: Some("https://example.com/issuer".to_owned()),
        ..Default::default()
    };
    assert!(matches!(
        encode_sign(&json!({"iss": "someone else"}), &test_key(), &options),
        Err(Error::ClaimCollision(claim)) if claim == "iss"
    ));
    assert!(matches!(
        encode_sign(&json!(["not", "an", "object"]), &test_key(), &options),
        Err(Error::ClaimsNotObject)
    ));
}

#[test]
fn reject_other_issuer() {
    let issued = issue(&credential());
    let other = generate_key_pair(Algorithm::ES256).unwrap();

    let err = decode_verify::<Value>(&issued, &other.public, &VerifyOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::JWS(_)));
    assert_eq!(err.kind(), ErrorKind::Envelope);
}

#[test]
fn eddsa_issuer() {
    let issuer = generate_key_pair(Algorithm::EdDSA).unwrap();
    let issued = encode_sign(&credential(), &issuer.private, &IssueOptions::default()).unwrap();
    let presentation = derive(&issued, &json!({"name": true}), None).unwrap();

    let verified =
        decode_verify::<Value>(&presentation, &issuer.public, &VerifyOptions::default()).unwrap();
    assert_eq!(verified.header.algorithm, Algorithm::EdDSA);
    assert_eq!(verified.claims, json!({"name": "Alice"}));
}

mod holder_binding {
    use super::*;

    const AUDIENCE: &str = "https://example.com/verifier";
    const NONCE: &str = "XZOUco1u_gEPknxS78sWWg";

    fn issue_bound(holder: &KeyPair) -> String {
        let options = IssueOptions {
            holder_key: Some(holder.private.clone()),
            ..Default::default()
        };
        encode_sign(&credential(), &test_key(), &options).unwrap()
    }

    fn binding(holder: &KeyPair) -> HolderBinding {
        HolderBinding {
            audience: AUDIENCE.to_owned(),
            nonce: NONCE.to_owned(),
            key: holder.private.clone(),
        }
    }

    fn expected() -> VerifyOptions {
        VerifyOptions {
            audience: Some(AUDIENCE.to_owned()),
            nonce: Some(NONCE.to_owned()),
        }
    }

    #[test]
    fn bound_presentation_verifies() {
        let holder = generate_key_pair(Algorithm::ES256).unwrap();
        let issued = issue_bound(&holder);

        let presentation = derive(&issued, &json!({"name": true}), Some(&binding(&holder))).unwrap();
        assert!(deserialize_string_format(&presentation)
            .unwrap()
            .key_binding_jwt
            .is_some());

        let verified = decode_verify::<Value>(&presentation, &test_key(), &expected()).unwrap();
        assert_eq!(verified.claims["name"], "Alice");
        assert_eq!(
            verified.claims["cnf"]["jwk"],
            serde_json::to_value(&holder.public).unwrap()
        );
    }

    #[test]
    fn derive_requires_binding() {
        let holder = generate_key_pair(Algorithm::ES256).unwrap();
        let issued = issue_bound(&holder);

        assert!(matches!(
            derive(&issued, &json!({"name": true}), None),
            Err(Error::MissingHolderBinding)
        ));
    }

    #[test]
    fn verify_requires_binding() {
        let holder = generate_key_pair(Algorithm::ES256).unwrap();
        let issued = issue_bound(&holder);

        // the issued token carries no holder-binding JWT
        assert!(matches!(
            decode_verify::<Value>(&issued, &test_key(), &expected()),
            Err(Error::MissingHolderBinding)
        ));

        let presentation = derive(&issued, &json!({"name": true}), Some(&binding(&holder))).unwrap();
        assert!(matches!(
            decode_verify::<Value>(&presentation, &test_key(), &VerifyOptions::default()),
            Err(Error::MissingHolderBinding)
        ));
    }

    #[test]
    fn reject_wrong_nonce_and_audience() {
        let holder = generate_key_pair(Algorithm::ES256).unwrap();
        let issued = issue_bound(&holder);
        let presentation = derive(&issued, &json!({"name": true}), Some(&binding(&holder))).unwrap();

        let options = VerifyOptions {
            nonce: Some("another nonce".to_owned()),
            ..expected()
        };
        assert!(matches!(
            decode_verify::<Value>(&presentation, &test_key(), &options),
            Err(Error::NonceMismatch)
        ));

        let options = VerifyOptions {
            audience: Some("https://example.com/other".to_owned()),
            ..expected()
        };
        assert!(matches!(
            decode_verify::<Value>(&presentation, &test_key(), &options),
            Err(Error::AudienceMismatch)
        ));
    }

    #[test]
    fn reject_binding_by_another_key() {
        let holder = generate_key_pair(Algorithm::ES256).unwrap();
        let thief = generate_key_pair(Algorithm::ES256).unwrap();
        let issued = issue_bound(&holder);

        let presentation = derive(&issued, &json!({"name": true}), Some(&binding(&thief))).unwrap();
        assert!(matches!(
            decode_verify::<Value>(&presentation, &test_key(), &expected()),
            Err(Error::JWS(_))
        ));
    }

    #[test]
    fn reject_audience_without_nonce() {
        let issued = issue(&credential());
        let options = VerifyOptions {
            audience: Some(AUDIENCE.to_owned()),
            nonce: None,
        };
        let err = decode_verify::<Value>(&issued, &test_key(), &options).unwrap_err();
        assert!(matches!(err, Error::AmbiguousAudienceNonce));
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn unbound_token_ignores_binding() {
        let holder = generate_key_pair(Algorithm::EdDSA).unwrap();
        let issued = issue(&credential());
        let presentation = derive(&issued, &json!({"name": true}), Some(&binding(&holder))).unwrap();

        let verified =
            decode_verify::<Value>(&presentation, &test_key(), &VerifyOptions::default()).unwrap();
        assert_eq!(verified.claims, json!({"name": "Alice"}));
    }
}

#[test]
fn reject_expired_and_premature_tokens() {
    let expired = IssueOptions {
        expires_at: Some(NumericDate::try_from_seconds(1_000_000_000.0).unwrap()),
        ..Default::default()
    };
    let issued = encode_sign(&credential(), &test_key(), &expired).unwrap();
    assert!(matches!(
        decode_verify::<Value>(&issued, &test_key(), &VerifyOptions::default()),
        Err(Error::Expired)
    ));

    let premature = IssueOptions {
        not_before: Some(NumericDate::try_from_seconds(4_000_000_000.0).unwrap()),
        ..Default::default()
    };
    let issued = encode_sign(&credential(), &test_key(), &premature).unwrap();
    assert!(matches!(
        decode_verify::<Value>(&issued, &test_key(), &VerifyOptions::default()),
        Err(Error::NotYetValid)
    ));
}

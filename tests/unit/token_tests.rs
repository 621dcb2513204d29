// ==========================
// tests/unit/token_tests.rs
// ==========================
//! Tokens checked the way a downstream service would, with jsonwebtoken
//! directly and only the shared secret.
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use warden_lib::auth::{Claims, SigningKey, TokenIssuer, TOKEN_ISSUER, TOKEN_TTL_SECS};
use crate::test_utils::TEST_SECRET;

fn issuer() -> TokenIssuer {
    TokenIssuer::new(&SigningKey::new(TEST_SECRET).unwrap())
}

fn downstream_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation
}

#[test]
fn test_downstream_can_verify_with_shared_secret() {
    let token = issuer().issue("alice").unwrap();

    let data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(TEST_SECRET.as_bytes()),
        &downstream_validation(),
    )
    .unwrap();

    assert_eq!(data.header.alg, Algorithm::HS256);
    assert_eq!(data.claims.sub, "alice");
    assert_eq!(data.claims.iss, "wid-auth-service");
    assert_eq!(data.claims.exp - data.claims.iat, TOKEN_TTL_SECS);
}

#[test]
fn test_other_secret_is_rejected() {
    let token = issuer().issue("alice").unwrap();
    let result = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(b"some-other-secret-of-sufficient-len"),
        &downstream_validation(),
    );
    assert!(result.is_err());
}

#[test]
fn test_foreign_issuer_is_rejected() {
    let now = Utc::now().timestamp();
    let claims = Claims {
        iss: "someone-else".to_string(),
        sub: "alice".to_string(),
        exp: now + 60,
        iat: now,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    assert!(issuer().verify(&token).is_err());
}

#[test]
fn test_tampered_payload_is_rejected() {
    let token = issuer().issue("alice").unwrap();
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let forged = issuer().issue("mallory").unwrap();
    parts[1] = forged.split('.').nth(1).unwrap().to_string();

    assert!(issuer().verify(&parts.join(".")).is_err());
}

//! End to end tests: issue tokens with each algorithm and verify them.
//!
//! Key fixtures were generated with
//! `openssl genpkey -algorithm EC -pkeyopt ec_paramgen_curve:P-256 -out p256.pem`
//! and `openssl pkey -in p256.pem -pubout -out p256.pub.pem` (and likewise for
//! P-384, P-521 and `-algorithm ED25519`). The `.jwk` files hold the same
//! keys as JSON Web Keys.

use serde::{Deserialize, Serialize};
use simple_authn::{issue, now, Algorithm, Claims, Error, Host, Key};

const ED25519_PRIVATE: &str = include_str!("keys/ed25519.pem");
const ED25519_PUBLIC: &str = include_str!("keys/ed25519.pub.pem");
const P256_PRIVATE: &str = include_str!("keys/p256.pem");
const P256_PUBLIC: &str = include_str!("keys/p256.pub.pem");
const P384_PRIVATE: &str = include_str!("keys/p384.pem");
const P384_PUBLIC: &str = include_str!("keys/p384.pub.pem");
const P521_PRIVATE: &str = include_str!("keys/p521.pem");
const P521_PUBLIC: &str = include_str!("keys/p521.pub.pem");

const JWK: [(Algorithm, &str, &str); 4] = [
    (
        Algorithm::Ed25519,
        include_str!("keys/ed25519.jwk"),
        include_str!("keys/ed25519.pub.jwk"),
    ),
    (
        Algorithm::Es256,
        include_str!("keys/p256.jwk"),
        include_str!("keys/p256.pub.jwk"),
    ),
    (
        Algorithm::Es384,
        include_str!("keys/p384.jwk"),
        include_str!("keys/p384.pub.jwk"),
    ),
    (
        Algorithm::Es512,
        include_str!("keys/p521.jwk"),
        include_str!("keys/p521.pub.jwk"),
    ),
];

const ASYMMETRIC: [(Algorithm, &str, &str); 4] = [
    (Algorithm::Ed25519, ED25519_PRIVATE, ED25519_PUBLIC),
    (Algorithm::Es256, P256_PRIVATE, P256_PUBLIC),
    (Algorithm::Es384, P384_PRIVATE, P384_PUBLIC),
    (Algorithm::Es512, P521_PRIVATE, P521_PUBLIC),
];

const SYMMETRIC: [Algorithm; 3] = [Algorithm::Hs256, Algorithm::Hs384, Algorithm::Hs512];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RoleClaims {
    #[serde(flatten)]
    claims: Claims,
    role: String,
}

fn role_claims(role: &str) -> RoleClaims {
    RoleClaims {
        claims: Claims::new(std::time::Duration::from_secs(120)).with_issuer("tests"),
        role: role.to_owned(),
    }
}

/// Build (signing key, verifying key) for every algorithm.
fn key_pairs() -> Vec<(Key, Key)> {
    let mut pairs = Vec::new();
    for (alg, private, public) in ASYMMETRIC {
        let signer = Key::new(alg, private).unwrap();
        let verifier = Key::new(alg, public).unwrap();
        pairs.push((signer, verifier));
    }
    for alg in SYMMETRIC {
        let key = Key::new(alg, "super-secret-key").unwrap();
        pairs.push((key.clone(), key));
    }
    pairs
}

#[test]
fn round_trip() {
    for (signer, verifier) in key_pairs() {
        let alg = signer.algorithm();
        let host = Host::new(&verifier, 30).unwrap();

        let payload = role_claims(&format!("superduperman-{alg}"));
        let token = issue(&signer, &payload).unwrap();
        assert_eq!(token.split('.').count(), 3, "{alg}");

        let decoded: RoleClaims = host.verify(&token).unwrap();
        assert_eq!(decoded, payload, "{alg}");

        let claims = host.verify_claims(&token).unwrap();
        assert_eq!(claims, payload.claims, "{alg}");
    }
}

#[test]
fn scenario() {
    let key = Key::new(Algorithm::Hs256, "super-secret-key").unwrap();
    let host = Host::new(&key, 30).unwrap();

    let iat = now();
    let token = issue(&key, &Claims::issued_at(iat)).unwrap();
    let claims = host.verify_at::<Claims>(&token, iat).unwrap();
    assert_eq!(claims.iat, iat);
    assert_eq!(claims.nbf, None);
    assert_eq!(claims.exp, None);
}

#[test]
fn any_payload_type() {
    let key = Key::new(Algorithm::Hs384, "hunter2").unwrap();
    let host = Host::new(&key, 30).unwrap();

    let iat = now();
    let token = issue(&key, &serde_json::json!({"iat": iat, "sub": "1234"})).unwrap();
    let value: serde_json::Value = host.verify_at(&token, iat).unwrap();
    assert_eq!(value["sub"], "1234");
    assert_eq!(value["iat"], iat);
}

#[test]
fn tamper_detection() {
    for (signer, verifier) in key_pairs() {
        let alg = signer.algorithm();
        let host = Host::new(&verifier, 30).unwrap();
        let token = issue(&signer, &Claims::new(std::time::Duration::from_secs(60))).unwrap();

        let (message, signature) = token.rsplit_once('.').unwrap();
        let mut signature = signature.as_bytes().to_vec();
        signature[0] = if signature[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{message}.{}", String::from_utf8(signature).unwrap());

        let result = host.verify::<Claims>(&tampered);
        assert!(matches!(result, Err(Error::SignatureInvalid)), "{alg}");
    }
}

#[test]
fn tampered_payload() {
    let key = Key::new(Algorithm::Hs256, "super-secret-key").unwrap();
    let host = Host::new(&key, 30).unwrap();
    let token = issue(&key, &role_claims("client")).unwrap();
    let forged = issue(
        &Key::new(Algorithm::Hs256, "other-key").unwrap(),
        &role_claims("host"),
    )
    .unwrap();

    // Splice the forged payload into the genuine token.
    let parts: Vec<&str> = token.split('.').collect();
    let forged_payload = forged.split('.').nth(1).unwrap();
    let spliced = format!("{}.{forged_payload}.{}", parts[0], parts[2]);

    let result = host.verify::<RoleClaims>(&spliced);
    assert!(matches!(result, Err(Error::SignatureInvalid)));
}

#[test]
fn wrong_key() {
    let key = Key::new(Algorithm::Es256, P256_PRIVATE).unwrap();
    let token = issue(&key, &Claims::new(std::time::Duration::from_secs(60))).unwrap();

    // A different algorithm entirely.
    let hmac = Key::new(Algorithm::Hs256, "super-secret-key").unwrap();
    let result = Host::new(&hmac, 30).unwrap().verify::<Claims>(&token);
    assert!(matches!(result, Err(Error::SignatureInvalid)));

    // Same family, different key.
    let other = Key::new(Algorithm::Ed25519, ED25519_PUBLIC).unwrap();
    let result = Host::new(&other, 30).unwrap().verify::<Claims>(&token);
    assert!(matches!(result, Err(Error::SignatureInvalid)));
}

#[test]
fn temporal_boundary() {
    let key = Key::new(Algorithm::Hs512, "super-secret-key").unwrap();
    let host = Host::new(&key, 30).unwrap();
    let now = now();

    let token = issue(&key, &Claims::issued_at(now - 30)).unwrap();
    host.verify_at::<Claims>(&token, now).unwrap();

    let token = issue(&key, &Claims::issued_at(now - 31)).unwrap();
    let result = host.verify_at::<Claims>(&token, now);
    assert!(matches!(result, Err(Error::ValidityWindowExceeded)));

    // Issued in the future.
    let token = issue(&key, &Claims::issued_at(now + 5)).unwrap();
    let result = host.verify_at::<Claims>(&token, now);
    assert!(matches!(result, Err(Error::ValidityWindowExceeded)));
}

#[test]
fn not_before() {
    let key = Key::new(Algorithm::Ed25519, ED25519_PRIVATE).unwrap();
    let host = Host::new(&Key::new(Algorithm::Ed25519, ED25519_PUBLIC).unwrap(), 30).unwrap();
    let now = now();

    let token = issue(&key, &Claims::issued_at(now).with_not_before(now + 100)).unwrap();
    let result = host.verify_at::<Claims>(&token, now);
    assert!(matches!(result, Err(Error::NotYetValid)));

    let token = issue(&key, &Claims::issued_at(now).with_not_before(now)).unwrap();
    host.verify_at::<Claims>(&token, now).unwrap();
}

#[test]
fn expired_token_is_returned() {
    let key = Key::new(Algorithm::Hs256, "super-secret-key").unwrap();
    let host = Host::new(&key, 30).unwrap();
    let now = now();

    let token = issue(&key, &Claims::issued_at(now).with_expiry(now - 10)).unwrap();
    let claims = host.verify_at::<Claims>(&token, now).unwrap();
    assert_eq!(claims.exp, Some(now - 10));
    assert!(claims.is_expired_at(now));
}

#[test]
fn missing_issued_at() {
    #[derive(Serialize)]
    struct NoIat {
        sub: &'static str,
    }

    let key = Key::new(Algorithm::Hs256, "super-secret-key").unwrap();
    let host = Host::new(&key, 30).unwrap();
    let token = issue(&key, &NoIat { sub: "1234" }).unwrap();

    let result = host.verify::<serde_json::Value>(&token);
    assert!(matches!(result, Err(Error::MissingIssuedAt)));

    let token = issue(&key, &serde_json::json!({"iat": null, "sub": "1234"})).unwrap();
    let result = host.verify::<serde_json::Value>(&token);
    assert!(matches!(result, Err(Error::MissingIssuedAt)));

    let token = issue(&key, &serde_json::json!({"iat": 0, "sub": "1234"})).unwrap();
    let result = host.verify::<Claims>(&token);
    assert!(matches!(result, Err(Error::MissingIssuedAt)));
}

#[test]
fn malformed_payload() {
    let key = Key::new(Algorithm::Hs256, "super-secret-key").unwrap();
    let host = Host::new(&key, 30).unwrap();

    let token = issue(&key, "not a claims object").unwrap();
    let result = host.verify::<Claims>(&token);
    assert!(matches!(result, Err(Error::MalformedPayload(_))));

    // A valid envelope that does not match the caller's type.
    let token = issue(&key, &Claims::issued_at(now())).unwrap();
    let result = host.verify::<RoleClaims>(&token);
    assert!(matches!(result, Err(Error::MalformedPayload(_))));
}

#[test]
fn capability_enforcement() {
    for (alg, private, public) in ASYMMETRIC {
        let public = Key::new(alg, public).unwrap();
        assert!(!public.can_sign());
        assert!(public.can_verify());
        let result = issue(&public, &Claims::issued_at(now()));
        assert!(matches!(result, Err(Error::SigningCapabilityRequired)), "{alg}");

        let private = Key::new(alg, private).unwrap();
        assert!(private.can_sign());
        assert!(!private.can_verify());
        let result = Host::new(&private, 30);
        assert!(matches!(result, Err(Error::VerificationCapabilityRequired)), "{alg}");
    }
}

#[test]
fn algorithm_mismatch() {
    let result = Key::new(Algorithm::Es256, P384_PRIVATE);
    assert!(matches!(
        result,
        Err(Error::AlgorithmMismatch {
            expected: Algorithm::Es256,
            found: Algorithm::Es384,
        })
    ));

    let result = Key::new(Algorithm::Ed25519, P521_PUBLIC);
    assert!(matches!(result, Err(Error::AlgorithmMismatch { .. })));
}

#[test]
fn algorithm_inference() {
    assert_eq!(Algorithm::infer(ED25519_PRIVATE), Algorithm::Ed25519);
    assert_eq!(Algorithm::infer(ED25519_PUBLIC), Algorithm::Ed25519);
    assert_eq!(Algorithm::infer(P256_PRIVATE), Algorithm::Es256);
    assert_eq!(Algorithm::infer(P384_PUBLIC), Algorithm::Es384);
    assert_eq!(Algorithm::infer(P521_PRIVATE), Algorithm::Es512);
    assert_eq!(Algorithm::infer("super-secret-key"), Algorithm::Hs256);

    let key = Key::infer(P521_PRIVATE).unwrap();
    assert_eq!(key.algorithm(), Algorithm::Es512);
    let key = Key::infer("super-secret-key").unwrap();
    assert_eq!(key.algorithm(), Algorithm::Hs256);
}

#[test]
fn jwk_keys() {
    for ((alg, private_jwk, public_jwk), (_, private_pem, public_pem)) in
        JWK.into_iter().zip(ASYMMETRIC)
    {
        assert_eq!(Algorithm::infer(private_jwk), alg);
        assert_eq!(Algorithm::infer(public_jwk), alg);

        // JWK and PEM encodings of a key are interchangeable.
        let payload = role_claims("jwk");
        let token = issue(&Key::new(alg, private_jwk).unwrap(), &payload).unwrap();
        let host = Host::new(&Key::new(alg, public_pem).unwrap(), 30).unwrap();
        assert_eq!(host.verify::<RoleClaims>(&token).unwrap(), payload, "{alg}");

        let token = issue(&Key::new(alg, private_pem).unwrap(), &payload).unwrap();
        let public = Key::new(alg, public_jwk).unwrap();
        assert!(!public.can_sign());
        let host = Host::new(&public, 30).unwrap();
        assert_eq!(host.verify::<RoleClaims>(&token).unwrap(), payload, "{alg}");
    }
}

#[test]
fn symmetric_key_equivalence() {
    for alg in SYMMETRIC {
        let a = Key::new(alg, "correct horse battery staple").unwrap();
        let b = Key::new(alg, "correct horse battery staple").unwrap();
        let token = issue(&a, &Claims::issued_at(now())).unwrap();
        Host::new(&b, 30).unwrap().verify::<Claims>(&token).unwrap();

        let c = Key::new(alg, "correct horse battery stapler").unwrap();
        let result = Host::new(&c, 30).unwrap().verify::<Claims>(&token);
        assert!(matches!(result, Err(Error::SignatureInvalid)), "{alg}");
    }
}

#[test]
fn concurrent_verification() {
    let key = Key::new(Algorithm::Es384, P384_PRIVATE).unwrap();
    let host = Host::new(&Key::new(Algorithm::Es384, P384_PUBLIC).unwrap(), 30).unwrap();

    std::thread::scope(|scope| {
        for n in 0..4 {
            let key = &key;
            let host = &host;
            scope.spawn(move || {
                let payload = role_claims(&format!("worker-{n}"));
                let token = issue(key, &payload).unwrap();
                let decoded: RoleClaims = host.verify(&token).unwrap();
                assert_eq!(decoded.role, payload.role);
            });
        }
    });
}

//! Tests for HMAC-SHA256 signature authentication.

use super::*;

const BODY: &[u8] = br#"{"event":"payment.completed","id":"abc"}"#;

fn authenticator(secret: &str) -> SignatureAuthenticator {
    SignatureAuthenticator::new(&SecretValue::from_string(secret.to_string())).unwrap()
}

/// Flip the lowest bit of the last hex digit.
fn flip_last_hex_char(signature: &str) -> String {
    let mut chars: Vec<char> = signature.chars().collect();
    let last = chars.pop().unwrap();
    let flipped = std::char::from_digit(last.to_digit(16).unwrap() ^ 1, 16).unwrap();
    chars.push(flipped);
    chars.into_iter().collect()
}

#[test]
fn test_sign_matches_rfc4231_vector() {
    let auth = authenticator("Jefe");
    assert_eq!(
        auth.sign(b"what do ya want for nothing?"),
        "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
    );
}

#[test]
fn test_correct_signature_verifies() {
    let auth = authenticator("whsec_test");
    let signature = auth.sign(BODY);
    assert_eq!(signature.len(), SIGNATURE_LENGTH * 2);
    assert_eq!(auth.verify(BODY, Some(&signature)), Ok(()));
}

#[test]
fn test_uppercase_hex_verifies() {
    let auth = authenticator("whsec_test");
    let signature = auth.sign(BODY).to_uppercase();
    assert_eq!(auth.verify(BODY, Some(&signature)), Ok(()));
}

#[test]
fn test_missing_header() {
    let auth = authenticator("whsec_test");
    assert_eq!(
        auth.verify(BODY, None),
        Err(RejectionReason::MissingSignature)
    );
}

#[test]
fn test_flipped_signature_rejected() {
    let auth = authenticator("whsec_test");
    let tampered = flip_last_hex_char(&auth.sign(BODY));
    assert_eq!(
        auth.verify(BODY, Some(&tampered)),
        Err(RejectionReason::InvalidSignature)
    );
}

#[test]
fn test_single_bit_flip_in_body_rejected() {
    let auth = authenticator("whsec_test");
    let signature = auth.sign(BODY);

    for index in 0..BODY.len() {
        let mut tampered = BODY.to_vec();
        tampered[index] ^= 0x01;
        assert_eq!(
            auth.verify(&tampered, Some(&signature)),
            Err(RejectionReason::InvalidSignature),
            "bit flip at byte {} was accepted",
            index
        );
    }
}

#[test]
fn test_single_bit_flip_in_secret_rejected() {
    let signature = authenticator("whsec_test").sign(BODY);

    let mut secret = b"whsec_test".to_vec();
    secret[0] ^= 0x01;
    let other = SignatureAuthenticator::new(&SecretValue::from_bytes(secret)).unwrap();

    assert_eq!(
        other.verify(BODY, Some(&signature)),
        Err(RejectionReason::InvalidSignature)
    );
}

#[test]
fn test_non_hex_header_is_format_error() {
    let auth = authenticator("whsec_test");
    let result = auth.verify(BODY, Some("not-a-hex-signature"));
    assert_eq!(result, Err(RejectionReason::InvalidSignatureFormat));
    assert_eq!(result.unwrap_err().reason(), "Invalid signature");
}

#[test]
fn test_wrong_length_header_is_format_error() {
    let auth = authenticator("whsec_test");
    let signature = auth.sign(BODY);

    // Valid hex, but truncated to 31 bytes.
    assert_eq!(
        auth.verify(BODY, Some(&signature[..62])),
        Err(RejectionReason::InvalidSignatureFormat)
    );

    // Odd number of hex digits cannot decode.
    assert_eq!(
        auth.verify(BODY, Some(&signature[..63])),
        Err(RejectionReason::InvalidSignatureFormat)
    );
}

#[test]
fn test_blank_header_counts_as_missing() {
    let auth = authenticator("whsec_test");
    for header in ["", "   ", "\t"] {
        assert_eq!(
            auth.verify(BODY, Some(header)),
            Err(RejectionReason::MissingSignature),
            "header {:?}",
            header
        );
    }
}

#[test]
fn test_debug_redacts_secret() {
    let auth = authenticator("whsec_super_secret");
    let debug = format!("{:?}", auth);
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("whsec_super_secret"));
}

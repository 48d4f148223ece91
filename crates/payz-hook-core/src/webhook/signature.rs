//! HMAC-SHA256 authentication of webhook bodies.

use super::RejectionReason;
use crate::credentials::{CredentialError, SecretValue};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of a decoded HMAC-SHA256 signature
pub const SIGNATURE_LENGTH: usize = 32;

/// Checks a hex signature header against HMAC-SHA256(secret, body)
///
/// Built per request from a freshly fetched secret and dropped with it.
#[derive(Clone)]
pub struct SignatureAuthenticator {
    mac: HmacSha256,
}

impl SignatureAuthenticator {
    /// Key an authenticator with the webhook secret
    pub fn new(secret: &SecretValue) -> Result<Self, CredentialError> {
        let mac = HmacSha256::new_from_slice(secret.expose_bytes()).map_err(|_| {
            CredentialError::Unavailable {
                message: "webhook secret cannot be used as an HMAC key".to_string(),
            }
        })?;
        Ok(Self { mac })
    }

    /// Hex-encoded signature for `body`, as the provider would send it
    pub fn sign(&self, body: &[u8]) -> String {
        hex::encode(self.digest(body))
    }

    /// Verify `signature_header` against the body bytes
    ///
    /// The header must decode to exactly [`SIGNATURE_LENGTH`] bytes. The
    /// comparison itself runs over every byte regardless of where the first
    /// difference is.
    pub fn verify(&self, body: &[u8], signature_header: Option<&str>) -> Result<(), RejectionReason> {
        let header = signature_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(RejectionReason::MissingSignature)?;

        let provided = hex::decode(header).map_err(|_| RejectionReason::InvalidSignatureFormat)?;
        if provided.len() != SIGNATURE_LENGTH {
            return Err(RejectionReason::InvalidSignatureFormat);
        }

        let expected = self.digest(body);
        if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            Ok(())
        } else {
            Err(RejectionReason::InvalidSignature)
        }
    }

    fn digest(&self, body: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}

// Security: keyed state must not show up in logs
impl std::fmt::Debug for SignatureAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureAuthenticator")
            .field("algorithm", &"HMAC-SHA256")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

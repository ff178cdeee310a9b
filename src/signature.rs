//! Signature verification and recipient commitments

use ripemd::Ripemd160;
use secp256k1::{ecdsa, Message, PublicKey, Secp256k1, VerifyOnly};
use sha2::{Digest, Sha256};

use crate::types::ByteString;

/// Signature verifier contract consumed by the transaction rules.
///
/// A malformed key, signature or message is an ordinary negative answer, so
/// that it surfaces as a rule failure rather than an abort.
pub trait SignatureVerifier {
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// ECDSA verification over secp256k1. Messages are 32-byte digests,
/// signatures are in 64-byte compact form, keys in SEC encoding.
pub struct Secp256k1Verifier {
    secp: Secp256k1<VerifyOnly>,
}

impl Secp256k1Verifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for Secp256k1Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier for Secp256k1Verifier {
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        let Ok(message) = Message::from_digest_slice(message) else {
            return false;
        };
        let Ok(public_key) = PublicKey::from_slice(public_key) else {
            return false;
        };
        let Ok(signature) = ecdsa::Signature::from_compact(signature) else {
            return false;
        };
        self.secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
    }
}

/// Verifier that accepts everything. Test harnesses only; lets fixtures
/// exercise rule ordering without producing real signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVerifier;

impl SignatureVerifier for NullVerifier {
    fn verify(&self, _message: &[u8], _signature: &[u8], _public_key: &[u8]) -> bool {
        true
    }
}

/// Commitment an output locks funds to: RIPEMD-160 of the SHA-256 of the
/// owning public key.
pub fn recipient_commitment(public_key: &[u8]) -> ByteString {
    let sha = Sha256::digest(public_key);
    Ripemd160::digest(sha).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::SecretKey;

    fn keypair() -> (SecretKey, PublicKey) {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let public = PublicKey::from_secret_key(&secp, &secret);
        (secret, public)
    }

    #[test]
    fn test_commitment_is_twenty_bytes() {
        let (_, public) = keypair();
        let commitment = recipient_commitment(&public.serialize());
        assert_eq!(commitment.len(), 20);
        // deterministic
        assert_eq!(commitment, recipient_commitment(&public.serialize()));
    }

    #[test]
    fn test_verify_roundtrip() {
        let secp = Secp256k1::new();
        let (secret, public) = keypair();
        let digest = Sha256::digest(b"payload");
        let message = Message::from_digest_slice(&digest).unwrap();
        let signature = secp.sign_ecdsa(&message, &secret).serialize_compact();

        let verifier = Secp256k1Verifier::new();
        assert!(verifier.verify(&digest, &signature, &public.serialize()));

        let other_digest = Sha256::digest(b"other payload");
        assert!(!verifier.verify(&other_digest, &signature, &public.serialize()));
    }

    #[test]
    fn test_malformed_material_is_rejected_not_fatal() {
        let verifier = Secp256k1Verifier::new();
        assert!(!verifier.verify(&[0u8; 31], &[0u8; 64], &[0u8; 33]));
        assert!(!verifier.verify(&[0u8; 32], &[0u8; 10], &[0u8; 33]));
        assert!(!verifier.verify(&[0u8; 32], &[0u8; 64], &[0u8; 2]));
    }
}

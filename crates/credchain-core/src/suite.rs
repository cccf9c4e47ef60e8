//! Signature suites over the recognized algorithm set.
use ed25519_dalek::{Signer, Verifier};
use thiserror::Error;

use crate::key::{Algorithm, KeyDescriptor};
use crate::resolver::VerificationMethod;

/// Domain separation context for sr25519 signatures.
const SR25519_SIGNING_CONTEXT: &[u8] = b"credchain";

/// An error relating to signature suites.
#[derive(Error, Debug)]
pub enum SuiteError {
    /// Key or proof type tag outside the recognized set.
    #[error("Unsupported key type: {0}.")]
    UnsupportedKeyType(String),
    /// Key bytes that do not decode for the declared algorithm.
    #[error("Invalid key material: {0}.")]
    InvalidKeyMaterial(String),
    /// Signing requested without secret key material.
    #[error("No secret key available for verification method {0}.")]
    MissingSecretKey(String),
    /// Signature bytes with the wrong shape for the algorithm.
    #[error("Invalid signature encoding.")]
    InvalidSignatureEncoding,
    /// The signature did not verify.
    #[error("Signature verification failed.")]
    SignatureFailure,
}

/// Algorithm-specific proof logic bound to one verification method.
///
/// Construction is pure: the suite borrows nothing and holds the descriptor's
/// key material, parsing it lazily when signing or verifying.
#[derive(Debug, Clone)]
pub struct SignatureSuite {
    algorithm: Algorithm,
    verification_method: String,
    public_key: Vec<u8>,
    secret_key: Option<Vec<u8>>,
}

impl SignatureSuite {
    /// Binds the descriptor's key material and identifier as the suite's
    /// verification method.
    pub fn for_key(key: &KeyDescriptor) -> Self {
        Self {
            algorithm: key.algorithm,
            verification_method: key.id.clone(),
            public_key: key.public_key.clone(),
            secret_key: key.secret_key.clone(),
        }
    }

    /// Builds a verification-only suite from a resolved verification method,
    /// parsing its declared type tag. Unknown tags are rejected.
    pub fn for_verification_method(method: &VerificationMethod) -> Result<Self, SuiteError> {
        let algorithm = Algorithm::from_verification_method_type(&method.type_)?;
        let public_key = hex::decode(&method.public_key_hex).map_err(|_| {
            SuiteError::InvalidKeyMaterial("publicKeyHex is not hex".to_string())
        })?;
        Ok(Self {
            algorithm,
            verification_method: method.id.clone(),
            public_key,
            secret_key: None,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn verification_method(&self) -> &str {
        &self.verification_method
    }

    pub fn proof_type(&self) -> &'static str {
        self.algorithm.proof_type()
    }

    /// Signs a message with the suite's secret key.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SuiteError> {
        let secret = self
            .secret_key
            .as_deref()
            .ok_or_else(|| SuiteError::MissingSecretKey(self.verification_method.clone()))?;
        match self.algorithm {
            Algorithm::Ed25519 => {
                let bytes: [u8; 32] = secret.try_into().map_err(|_| {
                    SuiteError::InvalidKeyMaterial("ed25519 secret key must be 32 bytes".to_string())
                })?;
                let signing_key = ed25519_dalek::SigningKey::from_bytes(&bytes);
                Ok(signing_key.sign(message).to_bytes().to_vec())
            }
            Algorithm::Sr25519 => {
                let keypair = sr25519_keypair(secret)?;
                Ok(keypair
                    .sign_simple(SR25519_SIGNING_CONTEXT, message)
                    .to_bytes()
                    .to_vec())
            }
            Algorithm::EcdsaSecp256k1 => {
                let signing_key = k256::ecdsa::SigningKey::from_slice(secret).map_err(|_| {
                    SuiteError::InvalidKeyMaterial("secp256k1 secret key is invalid".to_string())
                })?;
                let signature: k256::ecdsa::Signature = signing_key.sign(message);
                Ok(signature.to_bytes().to_vec())
            }
        }
    }

    /// Verifies a signature with the suite's public key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), SuiteError> {
        match self.algorithm {
            Algorithm::Ed25519 => {
                let bytes: [u8; 32] = self.public_key.as_slice().try_into().map_err(|_| {
                    SuiteError::InvalidKeyMaterial("ed25519 public key must be 32 bytes".to_string())
                })?;
                let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(|_| {
                    SuiteError::InvalidKeyMaterial("ed25519 public key is invalid".to_string())
                })?;
                let sig_bytes: [u8; 64] = signature
                    .try_into()
                    .map_err(|_| SuiteError::InvalidSignatureEncoding)?;
                let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);
                verifying_key
                    .verify(message, &signature)
                    .map_err(|_| SuiteError::SignatureFailure)
            }
            Algorithm::Sr25519 => {
                let public_key = schnorrkel::PublicKey::from_bytes(&self.public_key).map_err(|_| {
                    SuiteError::InvalidKeyMaterial("sr25519 public key is invalid".to_string())
                })?;
                let signature = schnorrkel::Signature::from_bytes(signature)
                    .map_err(|_| SuiteError::InvalidSignatureEncoding)?;
                public_key
                    .verify_simple(SR25519_SIGNING_CONTEXT, message, &signature)
                    .map_err(|_| SuiteError::SignatureFailure)
            }
            Algorithm::EcdsaSecp256k1 => {
                let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&self.public_key)
                    .map_err(|_| {
                        SuiteError::InvalidKeyMaterial("secp256k1 public key is invalid".to_string())
                    })?;
                let signature = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| SuiteError::InvalidSignatureEncoding)?;
                verifying_key
                    .verify(message, &signature)
                    .map_err(|_| SuiteError::SignatureFailure)
            }
        }
    }
}

/// Derives the public key for secret key bytes under the given algorithm.
pub fn derive_public_key(algorithm: Algorithm, secret: &[u8]) -> Result<Vec<u8>, SuiteError> {
    match algorithm {
        Algorithm::Ed25519 => {
            let bytes: [u8; 32] = secret.try_into().map_err(|_| {
                SuiteError::InvalidKeyMaterial("ed25519 secret key must be 32 bytes".to_string())
            })?;
            let signing_key = ed25519_dalek::SigningKey::from_bytes(&bytes);
            Ok(signing_key.verifying_key().to_bytes().to_vec())
        }
        Algorithm::Sr25519 => Ok(sr25519_keypair(secret)?.public.to_bytes().to_vec()),
        Algorithm::EcdsaSecp256k1 => {
            let signing_key = k256::ecdsa::SigningKey::from_slice(secret).map_err(|_| {
                SuiteError::InvalidKeyMaterial("secp256k1 secret key is invalid".to_string())
            })?;
            Ok(signing_key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec())
        }
    }
}

// Sr25519 secrets are carried as 32-byte mini secret keys, expanded the same
// way on every use so signatures stay consistent with the derived public key.
fn sr25519_keypair(secret: &[u8]) -> Result<schnorrkel::Keypair, SuiteError> {
    let mini = schnorrkel::MiniSecretKey::from_bytes(secret).map_err(|_| {
        SuiteError::InvalidKeyMaterial("sr25519 secret key must be a 32-byte mini secret".to_string())
    })?;
    Ok(mini.expand_to_keypair(schnorrkel::ExpansionMode::Ed25519))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_for(algorithm: Algorithm, seed: u8) -> KeyDescriptor {
        KeyDescriptor::from_secret(
            "did:credchain:issuer#keys-1",
            "did:credchain:issuer",
            algorithm,
            &[seed; 32],
        )
        .unwrap()
    }

    #[test]
    fn suite_binds_verification_method() {
        let key = key_for(Algorithm::Ed25519, 1);
        let suite = SignatureSuite::for_key(&key);
        assert_eq!(suite.verification_method(), "did:credchain:issuer#keys-1");
        assert_eq!(suite.proof_type(), "Ed25519Signature2018");
    }

    #[test]
    fn suite_from_verification_method() {
        let key = key_for(Algorithm::Sr25519, 2);
        let document = crate::resolver::DidDocument::for_key(&key);
        let suite = SignatureSuite::for_verification_method(&document.public_key[0]).unwrap();
        assert_eq!(suite.algorithm(), Algorithm::Sr25519);
        assert_eq!(suite.verification_method(), key.id);

        let mut unknown = document.public_key[0].clone();
        unknown.type_ = "JsonWebKey2020".to_string();
        assert!(matches!(
            SignatureSuite::for_verification_method(&unknown),
            Err(SuiteError::UnsupportedKeyType(_))
        ));
    }

    #[test]
    fn sign_verify_roundtrip_all_algorithms() {
        for algorithm in [
            Algorithm::Ed25519,
            Algorithm::Sr25519,
            Algorithm::EcdsaSecp256k1,
        ] {
            let key = key_for(algorithm, 7);
            let suite = SignatureSuite::for_key(&key);
            let signature = suite.sign(b"credential bytes").unwrap();
            assert!(suite.verify(b"credential bytes", &signature).is_ok());
        }
    }

    #[test]
    fn tampered_message_fails() {
        for algorithm in [
            Algorithm::Ed25519,
            Algorithm::Sr25519,
            Algorithm::EcdsaSecp256k1,
        ] {
            let suite = SignatureSuite::for_key(&key_for(algorithm, 9));
            let signature = suite.sign(b"original").unwrap();
            assert!(matches!(
                suite.verify(b"tampered", &signature),
                Err(SuiteError::SignatureFailure)
            ));
        }
    }

    #[test]
    fn wrong_key_fails() {
        let signer = SignatureSuite::for_key(&key_for(Algorithm::Ed25519, 3));
        let other = SignatureSuite::for_key(&key_for(Algorithm::Ed25519, 4));
        let signature = signer.sign(b"message").unwrap();
        assert!(other.verify(b"message", &signature).is_err());
    }

    #[test]
    fn signing_without_secret_fails() {
        let key = key_for(Algorithm::Sr25519, 5);
        let public_only = KeyDescriptor::new(
            key.id.clone(),
            key.controller.clone(),
            key.algorithm,
            key.public_key.clone(),
        );
        let suite = SignatureSuite::for_key(&public_only);
        assert!(matches!(
            suite.sign(b"message"),
            Err(SuiteError::MissingSecretKey(_))
        ));
    }

    #[test]
    fn garbage_signature_encoding_rejected() {
        let suite = SignatureSuite::for_key(&key_for(Algorithm::Ed25519, 6));
        assert!(matches!(
            suite.verify(b"message", &[0u8; 3]),
            Err(SuiteError::InvalidSignatureEncoding)
        ));
    }

    #[test]
    fn public_key_derivation_is_deterministic() {
        for algorithm in [
            Algorithm::Ed25519,
            Algorithm::Sr25519,
            Algorithm::EcdsaSecp256k1,
        ] {
            let a = derive_public_key(algorithm, &[11; 32]).unwrap();
            let b = derive_public_key(algorithm, &[11; 32]).unwrap();
            assert_eq!(a, b);
        }
    }
}

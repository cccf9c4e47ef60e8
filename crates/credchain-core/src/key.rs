//! Key descriptors and the signature algorithm tag.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::suite::{self, SuiteError};

/// Signature algorithms recognized by the suite set.
///
/// Wire data (verification method and proof type tags) parses into this enum
/// at the boundary; anything else is rejected as an unsupported key type
/// rather than falling through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    Ed25519,
    Sr25519,
    EcdsaSecp256k1,
}

impl Algorithm {
    /// The proof type tag written into proofs produced with this algorithm.
    pub fn proof_type(&self) -> &'static str {
        match self {
            Algorithm::Ed25519 => "Ed25519Signature2018",
            Algorithm::Sr25519 => "Sr25519Signature2020",
            Algorithm::EcdsaSecp256k1 => "EcdsaSecp256k1Signature2019",
        }
    }

    /// The verification method type tag published in DID documents.
    pub fn verification_method_type(&self) -> &'static str {
        match self {
            Algorithm::Ed25519 => "Ed25519VerificationKey2018",
            Algorithm::Sr25519 => "Sr25519VerificationKey2020",
            Algorithm::EcdsaSecp256k1 => "EcdsaSecp256k1VerificationKey2019",
        }
    }

    pub fn from_verification_method_type(tag: &str) -> Result<Self, SuiteError> {
        match tag {
            "Ed25519VerificationKey2018" => Ok(Algorithm::Ed25519),
            "Sr25519VerificationKey2020" => Ok(Algorithm::Sr25519),
            "EcdsaSecp256k1VerificationKey2019" => Ok(Algorithm::EcdsaSecp256k1),
            other => Err(SuiteError::UnsupportedKeyType(other.to_string())),
        }
    }

    pub fn from_proof_type(tag: &str) -> Result<Self, SuiteError> {
        match tag {
            "Ed25519Signature2018" => Ok(Algorithm::Ed25519),
            "Sr25519Signature2020" => Ok(Algorithm::Sr25519),
            "EcdsaSecp256k1Signature2019" => Ok(Algorithm::EcdsaSecp256k1),
            other => Err(SuiteError::UnsupportedKeyType(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Ed25519 => write!(f, "Ed25519"),
            Algorithm::Sr25519 => write!(f, "Sr25519"),
            Algorithm::EcdsaSecp256k1 => write!(f, "EcdsaSecp256k1"),
        }
    }
}

/// A signing or verification key together with its DID context.
///
/// `id` is the verification method identifier (e.g. `did:credchain:abc#keys-1`)
/// and `controller` the DID that publishes it. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub id: String,
    pub controller: String,
    pub algorithm: Algorithm,
    pub public_key: Vec<u8>,
    pub secret_key: Option<Vec<u8>>,
}

impl KeyDescriptor {
    /// A verification-only descriptor.
    pub fn new(
        id: impl Into<String>,
        controller: impl Into<String>,
        algorithm: Algorithm,
        public_key: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            controller: controller.into(),
            algorithm,
            public_key,
            secret_key: None,
        }
    }

    pub fn with_secret(mut self, secret_key: Vec<u8>) -> Self {
        self.secret_key = Some(secret_key);
        self
    }

    /// Builds a signing descriptor from secret key bytes, deriving the public
    /// half with the matching suite.
    pub fn from_secret(
        id: impl Into<String>,
        controller: impl Into<String>,
        algorithm: Algorithm,
        secret_key: &[u8],
    ) -> Result<Self, SuiteError> {
        let public_key = suite::derive_public_key(algorithm, secret_key)?;
        Ok(Self {
            id: id.into(),
            controller: controller.into(),
            algorithm,
            public_key,
            secret_key: Some(secret_key.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_tags_parse() {
        assert_eq!(
            Algorithm::from_verification_method_type("Ed25519VerificationKey2018").unwrap(),
            Algorithm::Ed25519
        );
        assert_eq!(
            Algorithm::from_verification_method_type("Sr25519VerificationKey2020").unwrap(),
            Algorithm::Sr25519
        );
        assert_eq!(
            Algorithm::from_verification_method_type("EcdsaSecp256k1VerificationKey2019").unwrap(),
            Algorithm::EcdsaSecp256k1
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = Algorithm::from_verification_method_type("RsaVerificationKey2018").unwrap_err();
        assert!(matches!(err, SuiteError::UnsupportedKeyType(tag) if tag == "RsaVerificationKey2018"));
        let err = Algorithm::from_proof_type("JsonWebSignature2020").unwrap_err();
        assert!(matches!(err, SuiteError::UnsupportedKeyType(tag) if tag == "JsonWebSignature2020"));
    }

    #[test]
    fn proof_and_method_tags_roundtrip() {
        for algorithm in [
            Algorithm::Ed25519,
            Algorithm::Sr25519,
            Algorithm::EcdsaSecp256k1,
        ] {
            assert_eq!(
                Algorithm::from_proof_type(algorithm.proof_type()).unwrap(),
                algorithm
            );
            assert_eq!(
                Algorithm::from_verification_method_type(algorithm.verification_method_type())
                    .unwrap(),
                algorithm
            );
        }
    }
}

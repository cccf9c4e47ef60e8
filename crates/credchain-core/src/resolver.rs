//! DID resolution collaborator interface.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::key::KeyDescriptor;

/// An error relating to DID resolution.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolverError {
    /// DID is not found.
    #[error("DID: {0} is not found.")]
    DIDNotFound(String),
    /// Verification method is not present in the resolved document.
    #[error("Verification method {0} not found in document for DID {1}.")]
    VerificationMethodNotFound(String, String),
}

/// A public key entry in a DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    #[serde(rename = "publicKeyHex")]
    pub public_key_hex: String,
}

/// The portion of a DID document consumed during proof checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidDocument {
    pub id: String,
    #[serde(rename = "publicKey", default)]
    pub public_key: Vec<VerificationMethod>,
    #[serde(default)]
    pub authentication: Vec<String>,
}

impl DidDocument {
    /// Publishes a key descriptor as a resolvable single-key document.
    pub fn for_key(key: &KeyDescriptor) -> Self {
        Self {
            id: key.controller.clone(),
            public_key: vec![VerificationMethod {
                id: key.id.clone(),
                type_: key.algorithm.verification_method_type().to_string(),
                controller: key.controller.clone(),
                public_key_hex: hex::encode(&key.public_key),
            }],
            authentication: vec![key.id.clone()],
        }
    }

    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.public_key.iter().find(|method| method.id == id)
    }
}

/// Resolves DIDs to their documents. All network and ledger concerns live
/// behind this boundary.
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<DidDocument, ResolverError>;
}

/// In-memory resolver over a fixed set of documents.
#[derive(Debug, Default)]
pub struct DocumentStoreResolver {
    documents: HashMap<String, DidDocument>,
}

impl DocumentStoreResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, keyed by its DID.
    pub fn insert(&mut self, document: DidDocument) {
        self.documents.insert(document.id.clone(), document);
    }

    pub fn with_document(mut self, document: DidDocument) -> Self {
        self.insert(document);
        self
    }

    /// Adds the single-key document for a key descriptor.
    pub fn with_key(self, key: &KeyDescriptor) -> Self {
        self.with_document(DidDocument::for_key(key))
    }
}

#[async_trait]
impl DidResolver for DocumentStoreResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, ResolverError> {
        match self.documents.get(did) {
            Some(document) => Ok(document.clone()),
            None => {
                log::debug!("no document held for {did}");
                Err(ResolverError::DIDNotFound(did.to_string()))
            }
        }
    }
}

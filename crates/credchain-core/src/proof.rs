//! Linked-data style proof objects and their signing input.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::canonicalize;

/// Proof purpose for credential attestation.
pub const PROOF_PURPOSE_ASSERTION: &str = "assertionMethod";
/// Proof purpose for presentation holder authentication.
pub const PROOF_PURPOSE_AUTHENTICATION: &str = "authentication";

/// A detached signature over a credential or presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    #[serde(rename = "type")]
    pub type_: String,
    pub created: DateTime<Utc>,
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,
    #[serde(rename = "proofPurpose")]
    pub proof_purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "proofValue", skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
}

impl Proof {
    /// An unsigned proof configuration; `proof_value` is attached after
    /// signing.
    pub fn new(
        proof_type: impl Into<String>,
        verification_method: impl Into<String>,
        proof_purpose: &str,
    ) -> Self {
        Self {
            type_: proof_type.into(),
            created: Utc::now(),
            verification_method: verification_method.into(),
            proof_purpose: proof_purpose.to_string(),
            challenge: None,
            domain: None,
            proof_value: None,
        }
    }
}

/// Bytes covered by a proof signature: the canonical form of the document
/// without its `proof`, followed by the canonical form of the proof without
/// its `proofValue`. Challenge and domain therefore sit under the signature.
pub fn signing_input<T: Serialize>(
    document: &T,
    proof: &Proof,
) -> Result<Vec<u8>, serde_json::Error> {
    let mut document = serde_json::to_value(document)?;
    if let Value::Object(map) = &mut document {
        map.remove("proof");
    }
    let mut proof_config = serde_json::to_value(proof)?;
    if let Value::Object(map) = &mut proof_config {
        map.remove("proofValue");
    }
    let mut input = canonicalize(&document)?.into_bytes();
    input.extend(canonicalize(&proof_config)?.into_bytes());
    Ok(input)
}

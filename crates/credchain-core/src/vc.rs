//! Verifiable credential functionality: model, issuance and verification.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::core_config;
use crate::key::KeyDescriptor;
use crate::one_or_many::OneOrMany;
use crate::proof::{signing_input, Proof, PROOF_PURPOSE_ASSERTION};
use crate::resolver::DidResolver;
use crate::revocation::{
    check_revocation_status, revocation_check_required, RevocationError, RevocationStatusService,
};
use crate::schema::{validate_credential_schema, SchemaError, SchemaService};
use crate::suite::{SignatureSuite, SuiteError};

/// Base JSON-LD context for credentials and presentations.
pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const DEFAULT_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// An error relating to verifiable credentials.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Wrapped variant for a suite error.
    #[error("A wrapped suite error: {0}")]
    Suite(SuiteError),
    /// Wrapped variant for a revocation error.
    #[error("A wrapped revocation error: {0}")]
    Revocation(RevocationError),
    /// Wrapped variant for a schema error.
    #[error("A wrapped schema error: {0}")]
    Schema(SchemaError),
    /// Credential could not be serialized for signing.
    #[error("Failed to serialize credential: {0}")]
    Serialization(serde_json::Error),
}

impl From<SuiteError> for CredentialError {
    fn from(err: SuiteError) -> Self {
        CredentialError::Suite(err)
    }
}

impl From<RevocationError> for CredentialError {
    fn from(err: RevocationError) -> Self {
        CredentialError::Revocation(err)
    }
}

impl From<SchemaError> for CredentialError {
    fn from(err: SchemaError) -> Self {
        CredentialError::Schema(err)
    }
}

/// Revocation-checkable status reference attached to a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// Declared data schema reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// Terminal result of a verification call. Never mutated once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationVerdict {
    pub fn ok() -> Self {
        Self {
            verified: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            verified: false,
            error: Some(error.into()),
        }
    }
}

/// A JSON-LD shaped credential. Issuance sets `issuer` and attaches the
/// proof; verification never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "@context", default = "default_credential_context")]
    pub context: OneOrMany<Value>,
    pub id: String,
    #[serde(rename = "type")]
    pub type_: OneOrMany<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(rename = "issuanceDate", skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<DateTime<Utc>>,
    #[serde(rename = "expirationDate", skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(rename = "credentialSubject", deserialize_with = "deserialize_subjects")]
    pub credential_subject: OneOrMany<Value>,
    #[serde(rename = "credentialStatus", skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,
    #[serde(rename = "credentialSchema", skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<CredentialSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

fn default_credential_context() -> OneOrMany<Value> {
    OneOrMany::Many(vec![Value::String(CREDENTIALS_V1_CONTEXT.to_string())])
}

// An untagged `OneOrMany<Value>` would swallow sequences into its One
// variant, since any JSON is a Value. Subject sequences must stay sequences
// so that each element is validated on its own.
fn deserialize_subjects<'de, D>(deserializer: D) -> Result<OneOrMany<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize as _;
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(subjects) => OneOrMany::Many(subjects),
        subject => OneOrMany::One(subject),
    })
}

impl Credential {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Options for [`verify_credential`]. The revocation policy defaults to
/// fail closed: a status-carrying credential cannot verify without a
/// revocation service unless checking is explicitly turned off.
pub struct VerifyOptions<'a> {
    pub resolver: &'a dyn DidResolver,
    pub force_revocation_check: bool,
    pub revocation_service: Option<&'a dyn RevocationStatusService>,
    pub schema_service: Option<&'a dyn SchemaService>,
}

impl<'a> VerifyOptions<'a> {
    pub fn new(resolver: &'a dyn DidResolver) -> Self {
        Self {
            resolver,
            force_revocation_check: core_config().force_revocation_check,
            revocation_service: None,
            schema_service: None,
        }
    }

    pub fn with_force_revocation_check(mut self, force: bool) -> Self {
        self.force_revocation_check = force;
        self
    }

    pub fn with_revocation_service(mut self, service: &'a dyn RevocationStatusService) -> Self {
        self.revocation_service = Some(service);
        self
    }

    pub fn with_schema_service(mut self, service: &'a dyn SchemaService) -> Self {
        self.schema_service = Some(service);
        self
    }
}

/// Signs a credential draft with the given key.
///
/// The draft is cloned, `issuer` is set to the key's controller and an
/// assertion proof is attached. The caller's draft is never touched.
pub fn issue_credential(
    key: &KeyDescriptor,
    draft: &Credential,
) -> Result<Credential, CredentialError> {
    let mut credential = draft.clone();
    credential.issuer = Some(key.controller.clone());
    if credential.issuance_date.is_none() {
        credential.issuance_date = Some(Utc::now());
    }
    let suite = SignatureSuite::for_key(key);
    let mut proof = Proof::new(suite.proof_type(), key.id.clone(), PROOF_PURPOSE_ASSERTION);
    let message = signing_input(&credential, &proof).map_err(CredentialError::Serialization)?;
    let signature = suite.sign(&message)?;
    proof.proof_value = Some(hex::encode(signature));
    credential.proof = Some(proof);
    Ok(credential)
}

/// Verifies a credential: declared schema first, then structure and
/// signature, then revocation. Short-circuits on the first failure, and a
/// failing revocation check always overrides an earlier signature success.
///
/// Configuration mistakes (missing required service, unsupported key type)
/// surface as errors; verification outcomes surface in the verdict.
pub async fn verify_credential(
    credential: &Credential,
    options: &VerifyOptions<'_>,
) -> Result<VerificationVerdict, CredentialError> {
    if credential.credential_schema.is_some() && !credential.credential_subject.is_empty() {
        if options.schema_service.is_none() {
            return Err(CredentialError::Schema(SchemaError::ServiceRequired));
        }
        match validate_credential_schema(credential, options.schema_service).await {
            Ok(()) => {}
            Err(err @ SchemaError::ServiceRequired) => return Err(err.into()),
            Err(err) => return Ok(VerificationVerdict::fail(err.to_string())),
        }
    }

    let verdict = verify_signature(credential, options.resolver).await?;
    if !verdict.verified {
        return Ok(verdict);
    }

    if revocation_check_required(
        credential,
        options.force_revocation_check,
        options.revocation_service,
    ) {
        let revocation = check_revocation_status(credential, options.revocation_service).await?;
        if !revocation.verified {
            return Ok(revocation);
        }
    }
    Ok(verdict)
}

/// Boolean projection of [`verify_credential`]. Configuration errors still
/// propagate.
pub async fn is_verified_credential(
    credential: &Credential,
    options: &VerifyOptions<'_>,
) -> Result<bool, CredentialError> {
    Ok(verify_credential(credential, options).await?.verified)
}

// Structural checks plus proof verification against the issuer's document.
async fn verify_signature(
    credential: &Credential,
    resolver: &dyn DidResolver,
) -> Result<VerificationVerdict, CredentialError> {
    let proof = match &credential.proof {
        Some(proof) => proof,
        None => return Ok(VerificationVerdict::fail("No proof.")),
    };
    let issuer = match &credential.issuer {
        Some(issuer) => issuer,
        None => return Ok(VerificationVerdict::fail("No issuer.")),
    };
    if let Some(expiry) = credential.expiration_date {
        if expiry < Utc::now() {
            return Ok(VerificationVerdict::fail("Credential has expired."));
        }
    }
    verify_proof_against_did(credential, proof, issuer, resolver).await
}

/// Verifies a document proof against a verification method published by
/// `did`. The only error path is configuration-class (an unrecognized key
/// type tag); everything else lands in the verdict.
pub(crate) async fn verify_proof_against_did<T: Serialize>(
    document: &T,
    proof: &Proof,
    did: &str,
    resolver: &dyn DidResolver,
) -> Result<VerificationVerdict, CredentialError> {
    let did_document = match resolver.resolve(did).await {
        Ok(document) => document,
        Err(err) => {
            return Ok(VerificationVerdict::fail(format!(
                "DID resolution failed: {err}"
            )))
        }
    };
    let method = match did_document.verification_method(&proof.verification_method) {
        Some(method) => method,
        None => {
            return Ok(VerificationVerdict::fail(format!(
                "Verification method {} not found in document for {did}.",
                proof.verification_method
            )))
        }
    };
    let suite = match SignatureSuite::for_verification_method(method) {
        Ok(suite) => suite,
        Err(err @ SuiteError::UnsupportedKeyType(_)) => return Err(err.into()),
        Err(_) => {
            return Ok(VerificationVerdict::fail(
                "Invalid public key encoding in verification method.",
            ))
        }
    };
    if proof.type_ != suite.proof_type() {
        return Ok(VerificationVerdict::fail(
            "Proof type does not match the verification method key type.",
        ));
    }
    let signature = match proof.proof_value.as_deref().map(hex::decode) {
        Some(Ok(bytes)) => bytes,
        Some(Err(_)) => return Ok(VerificationVerdict::fail("Invalid proof value encoding.")),
        None => return Ok(VerificationVerdict::fail("No proof value.")),
    };
    let message = signing_input(document, proof).map_err(CredentialError::Serialization)?;
    match suite.verify(&message, &signature) {
        Ok(()) => {
            log::debug!("verified {} proof from {did}", suite.proof_type());
            Ok(VerificationVerdict::ok())
        }
        Err(_) => Ok(VerificationVerdict::fail("Signature verification failed.")),
    }
}

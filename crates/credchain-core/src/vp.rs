//! Verifiable presentation functionality.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::key::KeyDescriptor;
use crate::one_or_many::OneOrMany;
use crate::proof::{signing_input, Proof, PROOF_PURPOSE_AUTHENTICATION};
use crate::revocation::{check_revocation_status, revocation_check_required};
use crate::schema::{validate_credential_schema, SchemaError};
use crate::suite::SignatureSuite;
use crate::vc::{
    verify_proof_against_did, Credential, CredentialError, VerificationVerdict, VerifyOptions,
    CREDENTIALS_V1_CONTEXT,
};

pub const DEFAULT_PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// An error relating to verifiable presentations.
#[derive(Error, Debug)]
pub enum PresentationError {
    /// No credentials present in presentation.
    #[error("No credentials.")]
    NoCredentialsPresent,
    /// Wrapped variant for a credential error.
    #[error("A wrapped credential error: {0}")]
    CredentialError(CredentialError),
}

impl From<CredentialError> for PresentationError {
    fn from(err: CredentialError) -> Self {
        PresentationError::CredentialError(err)
    }
}

/// A signed wrapper bundling credentials for one verification context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    #[serde(rename = "@context", default = "default_presentation_context")]
    pub context: OneOrMany<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: OneOrMany<String>,
    #[serde(rename = "verifiableCredential")]
    pub verifiable_credential: Vec<Credential>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

fn default_presentation_context() -> OneOrMany<Value> {
    OneOrMany::Many(vec![Value::String(CREDENTIALS_V1_CONTEXT.to_string())])
}

/// Builds the unsigned wrapper around a set of credentials.
pub fn create_presentation(
    credentials: Vec<Credential>,
    id: Option<String>,
    holder: Option<String>,
) -> Presentation {
    Presentation {
        context: default_presentation_context(),
        id,
        type_: OneOrMany::One(DEFAULT_PRESENTATION_TYPE.to_string()),
        verifiable_credential: credentials,
        holder,
        proof: None,
        property_set: None,
    }
}

/// Attaches an authentication proof carrying the given challenge and domain.
/// The caller supplies and varies these per session; they sit under the
/// signature.
pub fn sign_presentation(
    presentation: &Presentation,
    key: &KeyDescriptor,
    challenge: &str,
    domain: Option<&str>,
) -> Result<Presentation, PresentationError> {
    let mut presentation = presentation.clone();
    let suite = SignatureSuite::for_key(key);
    let mut proof = Proof::new(
        suite.proof_type(),
        key.id.clone(),
        PROOF_PURPOSE_AUTHENTICATION,
    );
    proof.challenge = Some(challenge.to_string());
    proof.domain = domain.map(str::to_string);
    let message = signing_input(&presentation, &proof).map_err(CredentialError::Serialization)?;
    let signature = suite.sign(&message).map_err(CredentialError::from)?;
    proof.proof_value = Some(hex::encode(signature));
    presentation.proof = Some(proof);
    Ok(presentation)
}

/// Options for [`verify_presentation`]: the credential options plus the
/// expected challenge and domain for the envelope proof.
pub struct VerifyPresentationOptions<'a> {
    pub credential_options: VerifyOptions<'a>,
    pub challenge: Option<&'a str>,
    pub domain: Option<&'a str>,
}

impl<'a> VerifyPresentationOptions<'a> {
    pub fn new(credential_options: VerifyOptions<'a>) -> Self {
        Self {
            credential_options,
            challenge: None,
            domain: None,
        }
    }

    pub fn with_challenge(mut self, challenge: &'a str) -> Self {
        self.challenge = Some(challenge);
        self
    }

    pub fn with_domain(mut self, domain: &'a str) -> Self {
        self.domain = Some(domain);
        self
    }
}

/// Verifies a presentation.
///
/// The envelope proof is checked first (constrained to the expected
/// challenge and domain), each contained credential's signature with it.
/// The credentials are then walked strictly in order, applying the
/// revocation check and the declared-schema check per credential, returning
/// the first failing verdict without touching the remaining credentials.
pub async fn verify_presentation(
    presentation: &Presentation,
    options: &VerifyPresentationOptions<'_>,
) -> Result<VerificationVerdict, PresentationError> {
    if presentation.verifiable_credential.is_empty() {
        return Err(PresentationError::NoCredentialsPresent);
    }
    let credential_options = &options.credential_options;

    let envelope = verify_envelope(presentation, options).await?;
    if !envelope.verified {
        return Ok(envelope);
    }
    for credential in &presentation.verifiable_credential {
        let verdict = credential_signature_verdict(credential, credential_options).await?;
        if !verdict.verified {
            return Ok(verdict);
        }
    }

    for credential in &presentation.verifiable_credential {
        if revocation_check_required(
            credential,
            credential_options.force_revocation_check,
            credential_options.revocation_service,
        ) {
            let verdict =
                check_revocation_status(credential, credential_options.revocation_service)
                    .await
                    .map_err(CredentialError::from)?;
            if !verdict.verified {
                return Ok(verdict);
            }
        }
        if credential.credential_schema.is_some() && !credential.credential_subject.is_empty() {
            if credential_options.schema_service.is_none() {
                return Err(CredentialError::Schema(SchemaError::ServiceRequired).into());
            }
            match validate_credential_schema(credential, credential_options.schema_service).await {
                Ok(()) => {}
                Err(err @ SchemaError::ServiceRequired) => {
                    return Err(CredentialError::from(err).into())
                }
                Err(err) => return Ok(VerificationVerdict::fail(err.to_string())),
            }
        }
    }
    Ok(envelope)
}

async fn verify_envelope(
    presentation: &Presentation,
    options: &VerifyPresentationOptions<'_>,
) -> Result<VerificationVerdict, PresentationError> {
    let proof = match &presentation.proof {
        Some(proof) => proof,
        None => return Ok(VerificationVerdict::fail("No proof.")),
    };
    if proof.proof_purpose != PROOF_PURPOSE_AUTHENTICATION {
        return Ok(VerificationVerdict::fail(
            "Presentation proof purpose must be authentication.",
        ));
    }
    if let Some(expected) = options.challenge {
        if proof.challenge.as_deref() != Some(expected) {
            return Ok(VerificationVerdict::fail("Challenge mismatch."));
        }
    }
    if let Some(expected) = options.domain {
        if proof.domain.as_deref() != Some(expected) {
            return Ok(VerificationVerdict::fail("Domain mismatch."));
        }
    }
    let holder_did = proof
        .verification_method
        .split('#')
        .next()
        .unwrap_or(proof.verification_method.as_str());
    verify_proof_against_did(
        presentation,
        proof,
        holder_did,
        options.credential_options.resolver,
    )
    .await
    .map_err(PresentationError::from)
}

// The wrapper step: each bundled credential's own signature must hold.
async fn credential_signature_verdict(
    credential: &Credential,
    options: &VerifyOptions<'_>,
) -> Result<VerificationVerdict, PresentationError> {
    let proof = match &credential.proof {
        Some(proof) => proof,
        None => {
            return Ok(VerificationVerdict::fail(
                "Presentation contains an unsigned credential.",
            ))
        }
    };
    let issuer = match &credential.issuer {
        Some(issuer) => issuer,
        None => {
            return Ok(VerificationVerdict::fail(
                "Presentation contains a credential without an issuer.",
            ))
        }
    };
    verify_proof_against_did(credential, proof, issuer, options.resolver)
        .await
        .map_err(PresentationError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{test_holder_key, test_issuer_key, TEST_UNSIGNED_CREDENTIAL};
    use crate::resolver::DocumentStoreResolver;
    use crate::revocation::{
        build_credential_status, compute_revocation_id, InMemoryRevocationRegistry,
        MockRevocationStatusService,
    };
    use crate::vc::issue_credential;
    use crate::LEDGER_PROVIDER;
    use serde_json::json;

    fn draft(id: &str) -> Credential {
        let mut credential = Credential::from_json(TEST_UNSIGNED_CREDENTIAL).unwrap();
        credential.id = id.to_string();
        credential
    }

    fn signed_presentation(credentials: Vec<Credential>) -> (Presentation, DocumentStoreResolver) {
        let issuer = test_issuer_key();
        let holder = test_holder_key();
        let resolver = DocumentStoreResolver::new()
            .with_key(&issuer)
            .with_key(&holder);
        let presentation = create_presentation(
            credentials,
            Some("urn:uuid:presentation-1".to_string()),
            Some(holder.controller.clone()),
        );
        let presentation =
            sign_presentation(&presentation, &holder, "challenge-1", Some("example.com")).unwrap();
        (presentation, resolver)
    }

    fn issued(id: &str) -> Credential {
        issue_credential(&test_issuer_key(), &draft(id)).unwrap()
    }

    #[test]
    fn create_presentation_builds_an_unsigned_wrapper() {
        let presentation = create_presentation(
            vec![issued("urn:cred:1")],
            None,
            Some("did:credchain:holder".to_string()),
        );
        assert!(presentation.proof.is_none());
        assert!(presentation
            .type_
            .contains(&DEFAULT_PRESENTATION_TYPE.to_string()));
        assert_eq!(presentation.verifiable_credential.len(), 1);
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let (presentation, resolver) = signed_presentation(vec![issued("urn:cred:1")]);
        let options = VerifyPresentationOptions::new(VerifyOptions::new(&resolver))
            .with_challenge("challenge-1")
            .with_domain("example.com");
        let verdict = verify_presentation(&presentation, &options).await.unwrap();
        assert!(verdict.verified, "{:?}", verdict.error);
    }

    #[tokio::test]
    async fn wrong_challenge_fails_the_envelope() {
        let (presentation, resolver) = signed_presentation(vec![issued("urn:cred:1")]);
        let options = VerifyPresentationOptions::new(VerifyOptions::new(&resolver))
            .with_challenge("challenge-2");
        let verdict = verify_presentation(&presentation, &options).await.unwrap();
        assert!(!verdict.verified);
        assert_eq!(verdict.error.as_deref(), Some("Challenge mismatch."));
    }

    #[tokio::test]
    async fn wrong_domain_fails_the_envelope() {
        let (presentation, resolver) = signed_presentation(vec![issued("urn:cred:1")]);
        let options = VerifyPresentationOptions::new(VerifyOptions::new(&resolver))
            .with_challenge("challenge-1")
            .with_domain("other.example.com");
        let verdict = verify_presentation(&presentation, &options).await.unwrap();
        assert!(!verdict.verified);
        assert_eq!(verdict.error.as_deref(), Some("Domain mismatch."));
    }

    #[tokio::test]
    async fn unsigned_presentation_fails() {
        let issuer = test_issuer_key();
        let resolver = DocumentStoreResolver::new().with_key(&issuer);
        let presentation = create_presentation(vec![issued("urn:cred:1")], None, None);
        let options = VerifyPresentationOptions::new(VerifyOptions::new(&resolver));
        let verdict = verify_presentation(&presentation, &options).await.unwrap();
        assert!(!verdict.verified);
        assert_eq!(verdict.error.as_deref(), Some("No proof."));
    }

    #[tokio::test]
    async fn empty_presentation_is_an_error() {
        let issuer = test_issuer_key();
        let resolver = DocumentStoreResolver::new().with_key(&issuer);
        let presentation = create_presentation(vec![], None, None);
        let options = VerifyPresentationOptions::new(VerifyOptions::new(&resolver));
        let result = verify_presentation(&presentation, &options).await;
        assert!(matches!(result, Err(PresentationError::NoCredentialsPresent)));
    }

    #[tokio::test]
    async fn tampered_bundled_credential_fails() {
        let mut credential = issued("urn:cred:1");
        credential.credential_subject = OneOrMany::One(json!({"emailAddress": "m@example.com"}));
        let (presentation, resolver) = signed_presentation(vec![credential]);
        let options = VerifyPresentationOptions::new(VerifyOptions::new(&resolver))
            .with_challenge("challenge-1")
            .with_domain("example.com");
        let verdict = verify_presentation(&presentation, &options).await.unwrap();
        assert!(!verdict.verified);
        assert_eq!(verdict.error.as_deref(), Some("Signature verification failed."));
    }

    #[tokio::test]
    async fn first_revoked_credential_short_circuits() {
        let registry_id = [8u8; 32];
        let mut first_draft = draft("urn:cred:first");
        first_draft.credential_status = Some(build_credential_status(&registry_id));
        let mut second_draft = draft("urn:cred:second");
        second_draft.credential_status = Some(build_credential_status(&registry_id));

        let issuer = test_issuer_key();
        let first = issue_credential(&issuer, &first_draft).unwrap();
        let second = issue_credential(&issuer, &second_draft).unwrap();
        let first_revocation_id = compute_revocation_id(&first.id);

        // Exactly one query: the second credential is never evaluated.
        let mut service = MockRevocationStatusService::new();
        service
            .expect_provider()
            .return_const(LEDGER_PROVIDER.to_string());
        service
            .expect_get_is_revoked()
            .times(1)
            .withf(move |_, revocation_id| *revocation_id == first_revocation_id)
            .returning(|_, _| Ok(true));

        let (presentation, resolver) = signed_presentation(vec![first, second]);
        let options = VerifyPresentationOptions::new(
            VerifyOptions::new(&resolver).with_revocation_service(&service),
        )
        .with_challenge("challenge-1")
        .with_domain("example.com");

        let verdict = verify_presentation(&presentation, &options).await.unwrap();
        assert!(!verdict.verified);
        assert_eq!(verdict.error.as_deref(), Some("Revocation check failed"));
    }

    #[tokio::test]
    async fn revocation_applies_per_credential_inside_presentations() {
        let registry_id = [4u8; 32];
        let mut status_draft = draft("urn:cred:status");
        status_draft.credential_status = Some(build_credential_status(&registry_id));
        let issuer = test_issuer_key();
        let plain = issue_credential(&issuer, &draft("urn:cred:plain")).unwrap();
        let with_status = issue_credential(&issuer, &status_draft).unwrap();

        let registry = InMemoryRevocationRegistry::new();
        registry.create_registry(registry_id);

        let (presentation, resolver) = signed_presentation(vec![plain, with_status]);
        let options = VerifyPresentationOptions::new(
            VerifyOptions::new(&resolver).with_revocation_service(&registry),
        )
        .with_challenge("challenge-1")
        .with_domain("example.com");
        let verdict = verify_presentation(&presentation, &options).await.unwrap();
        assert!(verdict.verified, "{:?}", verdict.error);
    }

    #[tokio::test]
    async fn declared_schema_without_service_errors_inside_presentations() {
        let mut schema_draft = draft("urn:cred:schema");
        schema_draft.credential_schema = Some(crate::vc::CredentialSchema {
            id: "schema:credchain:Gx8k72qM".to_string(),
            type_: "JsonSchemaValidator2018".to_string(),
        });
        let issuer = test_issuer_key();
        let credential = issue_credential(&issuer, &schema_draft).unwrap();

        let (presentation, resolver) = signed_presentation(vec![credential]);
        let options = VerifyPresentationOptions::new(VerifyOptions::new(&resolver))
            .with_challenge("challenge-1")
            .with_domain("example.com");
        let result = verify_presentation(&presentation, &options).await;
        assert!(matches!(
            result,
            Err(PresentationError::CredentialError(CredentialError::Schema(
                SchemaError::ServiceRequired
            )))
        ));
    }
}

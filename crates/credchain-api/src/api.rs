use async_trait::async_trait;
use credchain_core::key::KeyDescriptor;
use credchain_core::vc::{
    self, Credential, CredentialError, VerificationVerdict, VerifyOptions,
};
use credchain_core::vp::{
    self, Presentation, PresentationError, VerifyPresentationOptions,
};

/// API for Credchain VC functionality.
#[async_trait]
pub trait CredchainVCAPI {
    /// Signs a credential. The issuer is taken from the signing key's
    /// controller.
    fn sign(credential: &Credential, key: &KeyDescriptor) -> Result<Credential, CredentialError> {
        vc::issue_credential(key, credential)
    }

    /// Verifies a credential.
    async fn verify_credential(
        credential: &Credential,
        options: &VerifyOptions<'_>,
    ) -> Result<VerificationVerdict, CredentialError> {
        vc::verify_credential(credential, options).await
    }

    /// Verifies a credential, reduced to a boolean.
    async fn is_verified_credential(
        credential: &Credential,
        options: &VerifyOptions<'_>,
    ) -> Result<bool, CredentialError> {
        vc::is_verified_credential(credential, options).await
    }
}

/// API for Credchain VP functionality.
#[async_trait]
pub trait CredchainVPAPI {
    /// Builds an unsigned presentation around a set of credentials.
    fn create_presentation(
        credentials: Vec<Credential>,
        id: Option<String>,
        holder: Option<String>,
    ) -> Presentation {
        vp::create_presentation(credentials, id, holder)
    }

    /// Signs a presentation, binding it to a challenge and optional domain.
    fn sign_presentation(
        presentation: &Presentation,
        key: &KeyDescriptor,
        challenge: &str,
        domain: Option<&str>,
    ) -> Result<Presentation, PresentationError> {
        vp::sign_presentation(presentation, key, challenge, domain)
    }

    /// Verifies a verifiable presentation.
    async fn verify_presentation(
        presentation: &Presentation,
        options: &VerifyPresentationOptions<'_>,
    ) -> Result<VerificationVerdict, PresentationError> {
        vp::verify_presentation(presentation, options).await
    }
}

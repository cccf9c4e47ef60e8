//! Revocation status evaluation against a registry collaborator.
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use thiserror::Error;

use crate::utils::sha256;
use crate::vc::{Credential, CredentialStatus, VerificationVerdict};
use crate::LEDGER_PROVIDER;

/// Prefix qualifying a status id as a ledger revocation registry reference.
pub const REVOCATION_REGISTRY_QUALIFIER: &str = "rev-reg:credchain:";
/// Status type tag recognized for registry-backed revocation.
pub const STATUS_LIST_TYPE: &str = "CredentialStatusList2017";
/// Byte width of registry identifiers and registry entries.
pub const REGISTRY_ID_BYTES: usize = 32;

pub type RegistryId = [u8; REGISTRY_ID_BYTES];
pub type RevocationId = [u8; REGISTRY_ID_BYTES];

/// An error relating to revocation checking.
#[derive(Error, Debug)]
pub enum RevocationError {
    /// A check was required but no revocation status service was supplied.
    #[error("A revocation status service is required to check credential status.")]
    ServiceRequired,
    /// The supplied service serves a different provider.
    #[error("Incompatible revocation status service provider: {0}.")]
    IncompatibleService(String),
    /// Status present but not in registry revocation format.
    #[error("credentialStatus is not a valid registry revocation format: {0}.")]
    Format(String),
    /// The referenced registry does not exist.
    #[error("Revocation registry {0} not found.")]
    RegistryNotFound(String),
    /// The service failed to answer.
    #[error("Revocation status query failed: {0}.")]
    ServiceFailure(String),
}

/// Answers whether a registry entry is revoked. Ledger access lives behind
/// this boundary; a missing registry must surface as `RegistryNotFound`
/// rather than a negative answer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RevocationStatusService: Send + Sync {
    /// Name of the ledger provider this service answers for.
    fn provider(&self) -> &str;

    async fn get_is_revoked(
        &self,
        registry_id: &RegistryId,
        revocation_id: &RevocationId,
    ) -> Result<bool, RevocationError>;
}

/// Registry entry for a credential id. Deterministic: the same credential id
/// always hashes to the same entry.
pub fn compute_revocation_id(credential_id: &str) -> RevocationId {
    sha256(credential_id.as_bytes())
}

/// Parses the registry id out of a status object, checking type tag,
/// qualifier and fixed-width hex.
pub fn registry_id_from_status(status: &CredentialStatus) -> Result<RegistryId, RevocationError> {
    if status.type_ != STATUS_LIST_TYPE {
        return Err(RevocationError::Format(format!(
            "unexpected status type {}",
            status.type_
        )));
    }
    let hex_part = status
        .id
        .strip_prefix(REVOCATION_REGISTRY_QUALIFIER)
        .ok_or_else(|| RevocationError::Format("missing registry qualifier".to_string()))?;
    let bytes = hex::decode(hex_part)
        .map_err(|_| RevocationError::Format("registry id is not hex".to_string()))?;
    bytes.as_slice().try_into().map_err(|_| {
        RevocationError::Format(format!("registry id must be {REGISTRY_ID_BYTES} bytes"))
    })
}

/// True when the credential carries a well-formed registry status object.
pub fn is_registry_revocation_status(credential: &Credential) -> bool {
    credential
        .credential_status
        .as_ref()
        .map(|status| registry_id_from_status(status).is_ok())
        .unwrap_or(false)
}

/// The transient (registry, entry) pair a revocation query is made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationStatusClaim {
    pub registry_id: RegistryId,
    pub revocation_id: RevocationId,
}

impl RevocationStatusClaim {
    pub fn from_credential(credential: &Credential) -> Result<Self, RevocationError> {
        let status = credential
            .credential_status
            .as_ref()
            .ok_or_else(|| RevocationError::Format("no credentialStatus present".to_string()))?;
        Ok(Self {
            registry_id: registry_id_from_status(status)?,
            revocation_id: compute_revocation_id(&credential.id),
        })
    }
}

/// A check applies when a status field exists and either the caller forces
/// checking or a service was supplied at all. Presence of the service, not
/// its contents, is what gates the check.
pub fn revocation_check_required(
    credential: &Credential,
    force_check: bool,
    service: Option<&dyn RevocationStatusService>,
) -> bool {
    credential.credential_status.is_some() && (force_check || service.is_some())
}

/// Queries the revocation status of a credential.
///
/// Service absence or incompatibility is a configuration error. A malformed
/// status and a revoked entry are verification outcomes, reported through the
/// verdict.
pub async fn check_revocation_status(
    credential: &Credential,
    service: Option<&dyn RevocationStatusService>,
) -> Result<VerificationVerdict, RevocationError> {
    let service = match service {
        Some(service) if service.provider() == LEDGER_PROVIDER => service,
        Some(service) => {
            return Err(RevocationError::IncompatibleService(
                service.provider().to_string(),
            ))
        }
        None => return Err(RevocationError::ServiceRequired),
    };
    let claim = match RevocationStatusClaim::from_credential(credential) {
        Ok(claim) => claim,
        Err(err @ RevocationError::Format(_)) => {
            return Ok(VerificationVerdict::fail(err.to_string()))
        }
        Err(err) => return Err(err),
    };
    log::debug!(
        "querying revocation status in registry {}",
        hex::encode(claim.registry_id)
    );
    if service
        .get_is_revoked(&claim.registry_id, &claim.revocation_id)
        .await?
    {
        Ok(VerificationVerdict::fail("Revocation check failed"))
    } else {
        Ok(VerificationVerdict::ok())
    }
}

/// Status object issuers attach before signing to make a credential
/// revocation-checkable against the given registry.
pub fn build_credential_status(registry_id: &RegistryId) -> CredentialStatus {
    CredentialStatus {
        id: format!("{REVOCATION_REGISTRY_QUALIFIER}{}", hex::encode(registry_id)),
        type_: STATUS_LIST_TYPE.to_string(),
    }
}

/// Map-backed revocation registry, the in-process analog of the ledger
/// registry pallet. Registries must be created before they answer queries.
#[derive(Debug, Default)]
pub struct InMemoryRevocationRegistry {
    registries: Mutex<HashMap<RegistryId, HashSet<RevocationId>>>,
}

impl InMemoryRevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_registry(&self, registry_id: RegistryId) {
        if let Ok(mut registries) = self.registries.lock() {
            registries.entry(registry_id).or_default();
        }
    }

    pub fn revoke(&self, registry_id: RegistryId, revocation_id: RevocationId) {
        if let Ok(mut registries) = self.registries.lock() {
            registries.entry(registry_id).or_default().insert(revocation_id);
        }
    }

    pub fn unrevoke(&self, registry_id: RegistryId, revocation_id: &RevocationId) {
        if let Ok(mut registries) = self.registries.lock() {
            if let Some(entries) = registries.get_mut(&registry_id) {
                entries.remove(revocation_id);
            }
        }
    }
}

#[async_trait]
impl RevocationStatusService for InMemoryRevocationRegistry {
    fn provider(&self) -> &str {
        LEDGER_PROVIDER
    }

    async fn get_is_revoked(
        &self,
        registry_id: &RegistryId,
        revocation_id: &RevocationId,
    ) -> Result<bool, RevocationError> {
        let registries = self
            .registries
            .lock()
            .map_err(|_| RevocationError::ServiceFailure("registry lock poisoned".to_string()))?;
        registries
            .get(registry_id)
            .map(|entries| entries.contains(revocation_id))
            .ok_or_else(|| RevocationError::RegistryNotFound(hex::encode(registry_id)))
    }
}

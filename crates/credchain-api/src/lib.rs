//! API for VC and VP functionality.
pub mod api;
use crate::api::{CredchainVCAPI, CredchainVPAPI};

/// A type for implementing the API traits on.
pub struct CredchainAPI;

impl CredchainVCAPI for CredchainAPI {}
impl CredchainVPAPI for CredchainAPI {}

//! Issuance and verification of signed credentials and presentations.
//!
//! The heavy lifting lives in [`credchain_core`]; [`credchain_api`] exposes a
//! thin trait-based API surface over it.
pub use credchain_api::{api, CredchainAPI};
pub use credchain_core::{key, one_or_many, proof, resolver, revocation, schema, suite, vc, vp};

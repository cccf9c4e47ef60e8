//! Core credential and presentation logic (ledger independent).
pub mod config;
pub mod data;
pub mod key;
pub mod one_or_many;
pub mod proof;
pub mod resolver;
pub mod revocation;
pub mod schema;
pub mod suite;
pub mod utils;
pub mod vc;
pub mod vp;

/// Environment variable name for the Credchain config file.
pub const CREDCHAIN_CONFIG: &str = "CREDCHAIN_CONFIG";

/// Provider name of the native ledger behind the collaborator services.
pub const LEDGER_PROVIDER: &str = "credchain";

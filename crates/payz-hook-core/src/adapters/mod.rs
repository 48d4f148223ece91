//! # Infrastructure Adapters
//!
//! Infrastructure implementations of the credential store interface.

pub mod environment_credential_store;
pub mod memory_credential_store;

pub use environment_credential_store::EnvironmentCredentialStore;
pub use memory_credential_store::InMemoryCredentialStore;

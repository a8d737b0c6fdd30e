//! External collaborator abstractions
//!
//! Trait-based seams for the services the workflow talks to, so the state
//! machine can be exercised with mock implementations.

pub mod provisioning;

pub use provisioning::{ApiError, ProvisioningApi, ProvisioningResponse, SetPasswordRequest};

#[cfg(test)]
pub use provisioning::MockProvisioningApi;

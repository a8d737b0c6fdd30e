// Device Provisioning Library - sets a hardware device's PIN over its provisioning API
// This exposes the core components for testing and integration

pub mod config;
pub mod external;
pub mod http;
pub mod messages;
pub mod telemetry;
pub mod validation;
pub mod workflows;

// Re-export key types for easy access
pub use crate::config::{config, ProvisioningConfig};
pub use external::{ApiError, ProvisioningApi, ProvisioningResponse};
pub use http::HttpProvisioningApi;
pub use messages::{
    describe_status, resolve, resolve_error, MessageCatalog, MessageTable, NoTranslations,
};
pub use telemetry::{create_provisioning_span, generate_attempt_id, init_telemetry};
pub use validation::{
    CredentialEntry, PasswordConfirmationValidator, PatternError, ValidatedPassword,
    ValidationPattern,
};
pub use workflows::{
    DeviceIdentifier, ProvisioningCall, ProvisioningError, ProvisioningSession,
    ProvisioningWorkflow, Submission, SubmissionStatus, WorkflowError,
};

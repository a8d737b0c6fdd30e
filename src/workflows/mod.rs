// Provisioning workflow: submission lifecycle, device session and shared types

pub mod lifecycle;
pub mod provisioning;
pub mod session;
pub mod types;

pub use lifecycle::{SubmissionEvent, SubmissionLifecycle};
pub use provisioning::{ProvisioningCall, ProvisioningWorkflow, Submission, WorkflowError};
pub use session::ProvisioningSession;
pub use types::{
    DeviceIdentifier, ProvisioningError, SubmissionStatus, TRANSPORT_FAILURE_MESSAGE,
    UNSPECIFIED_REJECTION_MESSAGE,
};

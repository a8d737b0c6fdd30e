// One device session: the PIN entry plus the workflow that submits it

use std::sync::Arc;

use super::provisioning::{ProvisioningWorkflow, Submission, WorkflowError};
use super::types::{DeviceIdentifier, ProvisioningError, SubmissionStatus};
use crate::external::{ApiError, ProvisioningApi, ProvisioningResponse};
use crate::messages::{describe_status, resolve_error, MessageCatalog};
use crate::validation::{PasswordConfirmationValidator, ValidatedPassword, ValidationPattern};

/// Owns the validator and workflow of a single device exclusively.
pub struct ProvisioningSession<A: ?Sized> {
    validator: PasswordConfirmationValidator,
    workflow: ProvisioningWorkflow<A>,
}

impl<A> ProvisioningSession<A>
where
    A: ProvisioningApi + ?Sized + 'static,
{
    pub fn new(device_id: DeviceIdentifier, api: Arc<A>, pattern: ValidationPattern) -> Self {
        Self {
            validator: PasswordConfirmationValidator::new(pattern),
            workflow: ProvisioningWorkflow::new(device_id, api),
        }
    }

    pub fn set_primary(&mut self, value: impl Into<String>) {
        self.validator.set_primary(value);
    }

    pub fn set_confirmation(&mut self, value: impl Into<String>) {
        self.validator.set_confirmation(value);
    }

    pub fn clear_input(&mut self) {
        self.validator.clear();
    }

    pub fn validated_password(&self) -> Option<ValidatedPassword> {
        self.validator.validated_password()
    }

    /// Whether the submit action should be offered
    pub fn can_submit(&self) -> bool {
        self.validator.has_validated_password() && !self.workflow.is_pending()
    }

    /// Whether PIN fields should accept input
    pub fn input_enabled(&self) -> bool {
        !self.workflow.is_pending()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.workflow.status()
    }

    pub fn error(&self) -> Option<&ProvisioningError> {
        self.workflow.error()
    }

    pub fn resolved_error<C>(&self, catalog: &C) -> Option<String>
    where
        C: MessageCatalog + ?Sized,
    {
        self.workflow.error().map(|error| resolve_error(error, catalog))
    }

    pub fn describe<C>(&self, catalog: &C) -> String
    where
        C: MessageCatalog + ?Sized,
    {
        describe_status(self.status(), self.error(), catalog)
    }

    pub fn submit(&mut self) -> Result<Submission, WorkflowError> {
        self.workflow.submit(self.validator.validated_password())
    }

    pub fn complete(&mut self, result: Result<ProvisioningResponse, ApiError>) -> SubmissionStatus {
        self.workflow.complete(result, &mut self.validator)
    }

    /// Give up on an attempt whose call was dropped without completing.
    pub fn abandon(&mut self) -> SubmissionStatus {
        self.workflow.abandon(&mut self.validator)
    }

    pub async fn submit_and_wait(&mut self) -> Result<SubmissionStatus, WorkflowError> {
        let password = self.validator.validated_password();
        self.workflow
            .submit_and_wait(password, &mut self.validator)
            .await
    }

    pub fn validator(&self) -> &PasswordConfirmationValidator {
        &self.validator
    }

    pub fn workflow(&self) -> &ProvisioningWorkflow<A> {
        &self.workflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::MockProvisioningApi;
    use std::collections::HashMap;

    fn session(api: MockProvisioningApi) -> ProvisioningSession<MockProvisioningApi> {
        ProvisioningSession::new(
            DeviceIdentifier::from("device-7"),
            Arc::new(api),
            ValidationPattern::digits_only(),
        )
    }

    #[tokio::test]
    async fn test_submit_enablement_follows_input_and_status() {
        let mut api = MockProvisioningApi::new();
        api.expect_set_password()
            .times(1)
            .returning(|_, _| Ok(ProvisioningResponse::succeeded()));
        let mut session = session(api);

        assert!(!session.can_submit());
        assert!(session.input_enabled());

        session.set_primary("2468");
        assert!(!session.can_submit());
        session.set_confirmation("2468");
        assert!(session.can_submit());

        let call = match session.submit().unwrap() {
            Submission::Started(call) => call,
            Submission::AlreadyPending => panic!("expected a new call"),
        };
        assert!(!session.can_submit());
        assert!(!session.input_enabled());

        let result = call.await;
        assert_eq!(session.complete(result), SubmissionStatus::Idle);
        assert!(session.input_enabled());
        assert!(!session.can_submit());
        assert!(session.validated_password().is_none());
    }

    #[tokio::test]
    async fn test_failure_message_resolves_through_catalog() {
        let mut api = MockProvisioningApi::new();
        api.expect_set_password()
            .times(2)
            .returning(|_, _| Ok(ProvisioningResponse::rejected(Some("e_device_locked"), "locked")));
        let mut session = session(api);
        let catalog = HashMap::from([("e_device_locked".to_string(), "Device is locked".to_string())]);

        session.set_primary("1234");
        session.set_confirmation("1234");
        session.submit_and_wait().await.unwrap();

        assert_eq!(session.status(), SubmissionStatus::Failed);
        assert_eq!(session.resolved_error(&catalog).as_deref(), Some("Device is locked"));
        assert_eq!(session.describe(&catalog), "Device is locked");

        session.set_primary("1234");
        session.set_confirmation("1234");
        session.submit_and_wait().await.unwrap();
        assert_eq!(
            session.resolved_error(&crate::messages::NoTranslations).as_deref(),
            Some("locked")
        );
    }

    #[tokio::test]
    async fn test_submit_without_confirmed_pin_is_rejected() {
        let mut api = MockProvisioningApi::new();
        api.expect_set_password().times(0);
        let mut session = session(api);

        session.set_primary("1234");
        session.set_confirmation("4321");
        assert_eq!(session.submit().unwrap_err(), WorkflowError::InvalidInput);
        assert_eq!(session.status(), SubmissionStatus::Idle);

        session.clear_input();
        session.clear_input();
        assert!(session.validated_password().is_none());
    }
}

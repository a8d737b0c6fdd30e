// Provisioning workflow - at most one set-password request in flight per device

use statig::blocking::StateMachine;
use statig::prelude::*;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tracing::{debug, info, warn, Instrument};

use super::lifecycle::{SubmissionEvent, SubmissionLifecycle};
use super::types::{DeviceIdentifier, ProvisioningError, SubmissionStatus};
use crate::external::{ApiError, ProvisioningApi, ProvisioningResponse};
use crate::telemetry::{create_provisioning_span, generate_attempt_id};
use crate::validation::{CredentialEntry, ValidatedPassword};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("No validated password to submit")]
    InvalidInput,
}

type CallFuture = Pin<Box<dyn Future<Output = Result<ProvisioningResponse, ApiError>> + Send>>;

/// The outstanding provisioning call of one submit attempt.
///
/// Owns everything it needs, so the workflow stays observable (and rejects
/// further submits) while the call is awaited or spawned elsewhere. A call that
/// is dropped unfinished must be reported through `abandon`.
#[must_use = "the workflow stays pending until the call's result is passed to `complete`"]
pub struct ProvisioningCall {
    attempt_id: String,
    future: CallFuture,
}

impl ProvisioningCall {
    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }
}

impl Future for ProvisioningCall {
    type Output = Result<ProvisioningResponse, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for ProvisioningCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningCall")
            .field("attempt_id", &self.attempt_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
#[must_use = "a started call must be awaited and completed, or abandoned"]
pub enum Submission {
    /// A new call was issued; feed its result back through `complete`.
    Started(ProvisioningCall),
    /// A call is already in flight; nothing was issued.
    AlreadyPending,
}

pub struct ProvisioningWorkflow<A: ?Sized> {
    device_id: DeviceIdentifier,
    api: Arc<A>,
    lifecycle: StateMachine<SubmissionLifecycle>,
    attempt_id: Option<String>,
}

impl<A> ProvisioningWorkflow<A>
where
    A: ProvisioningApi + ?Sized + 'static,
{
    pub fn new(device_id: DeviceIdentifier, api: Arc<A>) -> Self {
        Self {
            device_id,
            api,
            lifecycle: SubmissionLifecycle::default().state_machine(),
            attempt_id: None,
        }
    }

    pub fn device_id(&self) -> &DeviceIdentifier {
        &self.device_id
    }

    pub fn status(&self) -> SubmissionStatus {
        self.lifecycle.inner().status()
    }

    pub fn error(&self) -> Option<&ProvisioningError> {
        self.lifecycle.inner().error()
    }

    pub fn is_pending(&self) -> bool {
        self.status() == SubmissionStatus::Pending
    }

    /// Correlation id of the attempt currently in flight
    pub fn attempt_id(&self) -> Option<&str> {
        self.attempt_id.as_deref()
    }

    /// Start a provisioning attempt with `password`.
    ///
    /// Returns `InvalidInput` without touching state when no password is given,
    /// and `AlreadyPending` when an attempt is still in flight.
    pub fn submit(&mut self, password: Option<ValidatedPassword>) -> Result<Submission, WorkflowError> {
        let password = password.ok_or(WorkflowError::InvalidInput)?;

        if self.is_pending() {
            debug!(
                device_id = %self.device_id,
                attempt_id = ?self.attempt_id,
                "Submit ignored, provisioning already in flight"
            );
            return Ok(Submission::AlreadyPending);
        }

        self.lifecycle.handle(&SubmissionEvent::Submit);

        let attempt_id = generate_attempt_id();
        let span = create_provisioning_span("set_password", self.device_id.as_str(), Some(&attempt_id));
        span.in_scope(|| info!(device_id = %self.device_id, "Submitting new PIN to device"));
        self.attempt_id = Some(attempt_id.clone());

        let api = Arc::clone(&self.api);
        let device = self.device_id.clone();
        let future = async move { api.set_password(&device, &password).await }.instrument(span);

        Ok(Submission::Started(ProvisioningCall {
            attempt_id,
            future: Box::pin(future),
        }))
    }

    /// Apply the result of the outstanding call and wipe `entry`.
    pub fn complete(
        &mut self,
        result: Result<ProvisioningResponse, ApiError>,
        entry: &mut impl CredentialEntry,
    ) -> SubmissionStatus {
        let event = match result {
            Ok(response) if response.success => SubmissionEvent::Succeeded,
            Ok(response) => SubmissionEvent::Failed(ProvisioningError::rejected(
                response.code,
                response.error_message,
            )),
            Err(err) => {
                warn!(
                    device_id = %self.device_id,
                    attempt_id = ?self.attempt_id,
                    error = %err,
                    "Provisioning call did not complete"
                );
                SubmissionEvent::Failed(ProvisioningError::transport())
            }
        };

        self.lifecycle.handle(&event);
        self.attempt_id = None;
        entry.clear();

        info!(device_id = %self.device_id, status = %self.status(), "Provisioning attempt finished");
        self.status()
    }

    /// Give up on the attempt in flight, e.g. after its call was dropped.
    ///
    /// Records a transport failure and wipes `entry`; does nothing unless pending.
    pub fn abandon(&mut self, entry: &mut impl CredentialEntry) -> SubmissionStatus {
        if !self.is_pending() {
            return self.status();
        }
        self.complete(
            Err(ApiError::Transport {
                message: "attempt abandoned before the device answered".to_string(),
            }),
            entry,
        )
    }

    /// Submit, await the call and apply its result in one go.
    ///
    /// If the returned future is dropped mid-call the attempt is abandoned, so
    /// the workflow never stays pending.
    pub async fn submit_and_wait<E: CredentialEntry>(
        &mut self,
        password: Option<ValidatedPassword>,
        entry: &mut E,
    ) -> Result<SubmissionStatus, WorkflowError> {
        match self.submit(password)? {
            Submission::Started(call) => {
                let mut attempt = AttemptGuard {
                    workflow: self,
                    entry,
                    settled: false,
                };
                let result = call.await;
                attempt.settled = true;
                Ok(attempt.workflow.complete(result, &mut *attempt.entry))
            }
            Submission::AlreadyPending => Ok(SubmissionStatus::Pending),
        }
    }
}

/// Abandons the attempt on drop unless its result was applied.
struct AttemptGuard<'a, A, E>
where
    A: ProvisioningApi + ?Sized + 'static,
    E: CredentialEntry,
{
    workflow: &'a mut ProvisioningWorkflow<A>,
    entry: &'a mut E,
    settled: bool,
}

impl<A, E> Drop for AttemptGuard<'_, A, E>
where
    A: ProvisioningApi + ?Sized + 'static,
    E: CredentialEntry,
{
    fn drop(&mut self) {
        if !self.settled {
            warn!(
                device_id = %self.workflow.device_id,
                attempt_id = ?self.workflow.attempt_id,
                "Provisioning wait cancelled, abandoning attempt"
            );
            self.workflow.abandon(&mut *self.entry);
        }
    }
}

// Submission lifecycle state machine: Idle -> Pending -> Idle | Failed

use statig::prelude::*;

use super::types::{ProvisioningError, SubmissionStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    Submit,
    Succeeded,
    Failed(ProvisioningError),
}

/// Context of the lifecycle machine.
///
/// `status` mirrors the active state so observers never have to inspect the
/// generated state enum; `error` is only ever set while `status` is `Failed`.
#[derive(Debug, Default)]
pub struct SubmissionLifecycle {
    status: SubmissionStatus,
    error: Option<ProvisioningError>,
}

#[state_machine(initial = "State::idle()")]
impl SubmissionLifecycle {
    #[state]
    fn idle(&mut self, event: &SubmissionEvent) -> Outcome<State> {
        match event {
            SubmissionEvent::Submit => {
                self.begin_attempt();
                Transition(State::pending())
            }
            _ => {
                tracing::warn!(?event, "Completion received while idle, ignoring");
                Handled
            }
        }
    }

    #[state]
    fn pending(&mut self, event: &SubmissionEvent) -> Outcome<State> {
        match event {
            SubmissionEvent::Submit => {
                tracing::debug!("Submission already in flight, ignoring submit");
                Handled
            }
            SubmissionEvent::Succeeded => {
                self.status = SubmissionStatus::Idle;
                self.error = None;
                tracing::info!("Provisioning succeeded");
                Transition(State::idle())
            }
            SubmissionEvent::Failed(error) => {
                self.status = SubmissionStatus::Failed;
                self.error = Some(error.clone());
                tracing::info!(
                    code = ?error.code,
                    message = %error.message,
                    "Provisioning failed"
                );
                Transition(State::failed())
            }
        }
    }

    #[state]
    fn failed(&mut self, event: &SubmissionEvent) -> Outcome<State> {
        match event {
            SubmissionEvent::Submit => {
                self.begin_attempt();
                Transition(State::pending())
            }
            _ => {
                tracing::warn!(?event, "Completion received after failure, ignoring");
                Handled
            }
        }
    }
}

impl SubmissionLifecycle {
    fn begin_attempt(&mut self) {
        self.status = SubmissionStatus::Pending;
        self.error = None;
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ProvisioningError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked() -> ProvisioningError {
        ProvisioningError::rejected(Some("e_device_locked".to_string()), Some("locked".to_string()))
    }

    #[test]
    fn test_submit_moves_idle_to_pending() {
        let mut sm = SubmissionLifecycle::default().state_machine();
        assert_eq!(sm.inner().status(), SubmissionStatus::Idle);

        sm.handle(&SubmissionEvent::Submit);
        assert_eq!(sm.inner().status(), SubmissionStatus::Pending);
        assert!(sm.inner().error().is_none());
    }

    #[test]
    fn test_repeated_submit_stays_pending() {
        let mut sm = SubmissionLifecycle::default().state_machine();
        sm.handle(&SubmissionEvent::Submit);
        sm.handle(&SubmissionEvent::Submit);
        sm.handle(&SubmissionEvent::Submit);

        assert_eq!(sm.inner().status(), SubmissionStatus::Pending);

        // A single completion ends the one attempt in flight
        sm.handle(&SubmissionEvent::Succeeded);
        assert_eq!(sm.inner().status(), SubmissionStatus::Idle);
    }

    #[test]
    fn test_failure_records_error_and_retry_clears_it() {
        let mut sm = SubmissionLifecycle::default().state_machine();
        sm.handle(&SubmissionEvent::Submit);
        sm.handle(&SubmissionEvent::Failed(locked()));

        assert_eq!(sm.inner().status(), SubmissionStatus::Failed);
        assert_eq!(sm.inner().error(), Some(&locked()));

        sm.handle(&SubmissionEvent::Submit);
        assert_eq!(sm.inner().status(), SubmissionStatus::Pending);
        assert!(sm.inner().error().is_none());
    }

    #[test]
    fn test_completion_without_attempt_is_ignored() {
        let mut sm = SubmissionLifecycle::default().state_machine();
        sm.handle(&SubmissionEvent::Failed(locked()));
        assert_eq!(sm.inner().status(), SubmissionStatus::Idle);
        assert!(sm.inner().error().is_none());

        sm.handle(&SubmissionEvent::Submit);
        sm.handle(&SubmissionEvent::Failed(locked()));
        sm.handle(&SubmissionEvent::Succeeded);
        assert_eq!(sm.inner().status(), SubmissionStatus::Failed);
    }
}

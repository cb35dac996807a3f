//! Wizard shell. Drives one session through Previous / Proceed.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{DatabaseError, WizardError};
use crate::gateway::{Gateway, SubmitResult};
use crate::persistence::{OrganizationSummary, PersistenceBridge, SetupProgress};

use super::fields::FieldBag;
use super::session::OnboardingSession;
use super::step::{Step, Transition, WizardEvent};

/// What a Proceed press led to.
#[derive(Debug, Clone, PartialEq)]
pub enum ProceedOutcome {
    /// The step was accepted and the wizard moved on.
    Advanced { message: String, next: Step },
    /// The final step was accepted; the wizard is done.
    Completed {
        message: String,
        summary: OrganizationSummary,
    },
    /// Validation or the backend refused. The step did not change.
    Rejected { message: String },
}

/// Orchestrates a session, the gateway, and the persistence bridge.
pub struct WizardShell {
    session: OnboardingSession,
    gateway: Gateway,
    bridge: PersistenceBridge,
    pacing: Duration,
    last_error: Option<String>,
    last_message: Option<String>,
}

impl WizardShell {
    pub fn new(
        session: OnboardingSession,
        gateway: Gateway,
        bridge: PersistenceBridge,
        pacing: Duration,
    ) -> Self {
        Self {
            session,
            gateway,
            bridge,
            pacing,
            last_error: None,
            last_message: None,
        }
    }

    /// Start a flow. In edit mode the stored snapshot pre-fills the fields;
    /// without one the session starts empty under a fresh id.
    ///
    /// Recorded setup progress for the same mode (and, in edit mode, the same
    /// organization) resumes after the last accepted step under the recorded
    /// id, so an interrupted run never posts basic info twice.
    pub async fn start(
        gateway: Gateway,
        bridge: PersistenceBridge,
        is_edit_mode: bool,
        pacing: Duration,
    ) -> Result<Self, DatabaseError> {
        let progress = bridge
            .load_setup_progress()
            .await?
            .filter(|p| p.is_edit_mode == is_edit_mode);

        let session = if is_edit_mode {
            let snapshot = match bridge.load_edit_snapshot().await? {
                Some(snapshot) => snapshot,
                None => {
                    warn!("Edit mode requested but no snapshot stored; starting empty");
                    Default::default()
                }
            };
            let same_org = |p: &SetupProgress| {
                snapshot.organization_id.as_deref() == Some(p.organization_id.as_str())
            };
            match progress {
                Some(p) if same_org(&p) => OnboardingSession::resume(
                    p.organization_id,
                    true,
                    p.completed_step,
                    snapshot.into_fields(),
                ),
                _ => OnboardingSession::from_snapshot(snapshot),
            }
        } else {
            match progress {
                Some(p) => OnboardingSession::resume(
                    p.organization_id,
                    false,
                    p.completed_step,
                    FieldBag::default(),
                ),
                None => OnboardingSession::new(),
            }
        };
        Ok(Self::new(session, gateway, bridge, pacing))
    }

    pub fn session(&self) -> &OnboardingSession {
        &self.session
    }

    pub fn fields(&self) -> &FieldBag {
        &self.session.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldBag {
        &mut self.session.fields
    }

    pub fn current_step(&self) -> Step {
        self.session.current_step()
    }

    /// Error from the last attempt, cleared on success or navigation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Go back one step. No validation, no network. Does nothing once the
    /// flow has finished.
    pub fn previous(&mut self) -> Step {
        if self.session.is_finished() {
            return self.session.current_step();
        }
        self.last_error = None;
        self.session.apply(WizardEvent::Previous);
        self.session.current_step()
    }

    /// Submit the current step and advance on success.
    ///
    /// On success the message is recorded, the shell waits for the pacing
    /// delay, then moves on. On the final step the summary is written to the
    /// fallback list before exiting. Persistence failures are logged and do
    /// not undo an accepted submission. `&mut self` keeps a second submission
    /// from starting while one is in flight.
    pub async fn proceed(&mut self) -> Result<ProceedOutcome, WizardError> {
        if self.session.is_finished() {
            return Err(WizardError::Finished);
        }
        let step = self.session.current_step();
        let result = self
            .gateway
            .submit(
                step,
                self.session.organization_id().as_str(),
                &self.session.fields,
            )
            .await;

        if !result.success {
            let message = result.error.unwrap_or(result.message);
            self.last_error = Some(message.clone());
            return Ok(ProceedOutcome::Rejected { message });
        }

        self.last_error = None;
        self.last_message = Some(result.message.clone());

        let summary = if step.is_last() {
            Some(self.finish_flow().await)
        } else {
            self.record_progress(step, &result).await;
            None
        };

        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }

        match (self.session.apply(WizardEvent::SubmitSucceeded), summary) {
            (Transition::Goto(next) | Transition::Stay(next), _) => {
                info!(from = %step, to = %next, "Advanced wizard");
                Ok(ProceedOutcome::Advanced {
                    message: result.message,
                    next,
                })
            }
            (Transition::Exit, Some(summary)) => {
                info!(organization_id = %self.session.organization_id(), "Onboarding complete");
                Ok(ProceedOutcome::Completed {
                    message: result.message,
                    summary,
                })
            }
            (Transition::Exit, None) => Err(WizardError::Finished),
        }
    }

    async fn record_progress(&self, step: Step, result: &SubmitResult) {
        let progress = SetupProgress {
            organization_id: self.session.organization_id().clone(),
            completed_step: step,
            is_edit_mode: self.session.is_edit_mode(),
            response_data: result.data.clone(),
        };
        if let Err(e) = self.bridge.record_setup_progress(&progress).await {
            warn!(error = %e, %step, "Failed to record setup progress");
        }
    }

    async fn finish_flow(&self) -> OrganizationSummary {
        let summary =
            OrganizationSummary::from_session(self.session.organization_id(), &self.session.fields);
        if let Err(e) = self
            .bridge
            .save_summary(summary.clone(), self.session.is_edit_mode())
            .await
        {
            warn!(error = %e, "Failed to save organization summary");
        }
        if let Err(e) = self.bridge.clear_setup_progress().await {
            warn!(error = %e, "Failed to clear setup progress");
        }
        if self.session.is_edit_mode() {
            if let Err(e) = self.bridge.clear_edit_snapshot().await {
                warn!(error = %e, "Failed to clear edit snapshot");
            }
        }
        summary
    }
}

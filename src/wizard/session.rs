//! Onboarding session: the state one wizard run owns.

use tracing::{info, warn};

use crate::persistence::EditSnapshot;

use super::fields::FieldBag;
use super::org_id::OrganizationId;
use super::step::{Step, Transition, WizardEvent};

/// Route prefix the step slug is appended to.
pub const WIZARD_BASE_PATH: &str = "/organization/add";

/// State held for the duration of one onboarding flow.
///
/// `organization_id` and `is_edit_mode` are fixed at construction.
#[derive(Debug, Clone)]
pub struct OnboardingSession {
    organization_id: OrganizationId,
    is_edit_mode: bool,
    /// Every field across all five steps.
    pub fields: FieldBag,
    step: Step,
    finished: bool,
}

impl OnboardingSession {
    /// Start a fresh onboarding with a newly generated organization id.
    pub fn new() -> Self {
        let organization_id = OrganizationId::generate();
        info!(%organization_id, "Starting new onboarding session");
        Self::with_parts(organization_id, false, FieldBag::default())
    }

    /// Start an edit-mode session pre-filled from a snapshot.
    ///
    /// The snapshot's organization id is kept when well-formed; otherwise a
    /// fresh id is generated.
    pub fn from_snapshot(snapshot: EditSnapshot) -> Self {
        let organization_id = match snapshot
            .organization_id
            .as_deref()
            .map(OrganizationId::parse)
        {
            Some(Ok(id)) => id,
            Some(Err(e)) => {
                warn!(error = %e, "Edit snapshot carries a bad organization id; generating one");
                OrganizationId::generate()
            }
            None => {
                warn!("Edit snapshot has no organization id; generating one");
                OrganizationId::generate()
            }
        };
        info!(%organization_id, "Starting edit-mode onboarding session");
        Self::with_parts(organization_id, true, snapshot.into_fields())
    }

    /// Resume a flow that stopped after `completed` was accepted, keeping
    /// its organization id.
    pub fn resume(
        organization_id: OrganizationId,
        is_edit_mode: bool,
        completed: Step,
        fields: FieldBag,
    ) -> Self {
        info!(%organization_id, %completed, "Resuming onboarding session");
        let mut session = Self::with_parts(organization_id, is_edit_mode, fields);
        match completed.transition(WizardEvent::SubmitSucceeded) {
            Transition::Goto(next) | Transition::Stay(next) => session.step = next,
            Transition::Exit => session.finished = true,
        }
        session
    }

    pub fn with_parts(organization_id: OrganizationId, is_edit_mode: bool, fields: FieldBag) -> Self {
        Self {
            organization_id,
            is_edit_mode,
            fields,
            step: Step::default(),
            finished: false,
        }
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn is_edit_mode(&self) -> bool {
        self.is_edit_mode
    }

    pub fn current_step(&self) -> Step {
        self.step
    }

    /// Whether the flow has exited after the final step.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Route for the current step, e.g. `/organization/add/technical?edit=true`.
    pub fn current_path(&self) -> String {
        let mut path = format!("{WIZARD_BASE_PATH}/{}", self.step.slug());
        if self.is_edit_mode {
            path.push_str("?edit=true");
        }
        path
    }

    /// Apply an event through the transition table.
    pub fn apply(&mut self, event: WizardEvent) -> Transition {
        let transition = self.step.transition(event);
        match transition {
            Transition::Goto(step) | Transition::Stay(step) => self.step = step,
            Transition::Exit => self.finished = true,
        }
        transition
    }
}

impl Default for OnboardingSession {
    fn default() -> Self {
        Self::new()
    }
}

//! Organization onboarding wizard.
//!
//! Five linear steps collect an organization's details. Each step is
//! validated and submitted on Proceed; only a successful submission moves the
//! wizard forward. Previous always steps back without touching the network.

pub mod answers;
pub mod fields;
pub mod org_id;
pub mod session;
pub mod shell;
pub mod step;

pub use answers::Answers;
pub use fields::{Attachment, FieldBag};
pub use org_id::OrganizationId;
pub use session::OnboardingSession;
pub use shell::{ProceedOutcome, WizardShell};
pub use step::{Step, Transition, WizardEvent};

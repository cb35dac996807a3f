//! Wizard step state machine.

use serde::{Deserialize, Serialize};

/// The five ordered steps of the onboarding wizard.
///
/// Progresses linearly: BasicInfo → Compliance → Technical → UseCase →
/// Authorization, after which the flow exits back to the organization list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    BasicInfo,
    Compliance,
    Technical,
    #[serde(rename = "usecase")]
    UseCase,
    Authorization,
}

/// Something that happened on the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    /// The step's submission came back successful.
    SubmitSucceeded,
    /// The user pressed Previous. No validation, no network.
    Previous,
}

/// Where the wizard goes after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Remain on the given step.
    Stay(Step),
    /// Move to another step.
    Goto(Step),
    /// Leave the wizard (back to the organization list).
    Exit,
}

impl Step {
    /// All steps in order.
    pub const ALL: [Step; 5] = [
        Step::BasicInfo,
        Step::Compliance,
        Step::Technical,
        Step::UseCase,
        Step::Authorization,
    ];

    /// 1-based step number.
    pub fn number(&self) -> u8 {
        match self {
            Self::BasicInfo => 1,
            Self::Compliance => 2,
            Self::Technical => 3,
            Self::UseCase => 4,
            Self::Authorization => 5,
        }
    }

    /// URL path segment for this step.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::BasicInfo => "basic-info",
            Self::Compliance => "compliance",
            Self::Technical => "technical",
            Self::UseCase => "usecase",
            Self::Authorization => "authorization",
        }
    }

    /// Backend endpoint the step submits to.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::BasicInfo => "/basic-info",
            Self::Compliance => "/compliance",
            Self::Technical => "/technical",
            Self::UseCase => "/usecase",
            Self::Authorization => "/authorization",
        }
    }

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Info",
            Self::Compliance => "Compliance",
            Self::Technical => "Technical",
            Self::UseCase => "Use Case",
            Self::Authorization => "Authorization",
        }
    }

    /// Map a path segment to a step. Unrecognized segments fall back to step 1.
    pub fn from_segment(segment: &str) -> Step {
        Self::ALL
            .into_iter()
            .find(|s| s.slug() == segment.trim())
            .unwrap_or(Step::BasicInfo)
    }

    /// Map a full path (e.g. `/organization/add/technical`) to a step using
    /// its last non-empty segment.
    pub fn from_path(path: &str) -> Step {
        let last = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .next_back()
            .unwrap_or_default();
        Self::from_segment(last)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<Step> {
        match self {
            Self::BasicInfo => Some(Self::Compliance),
            Self::Compliance => Some(Self::Technical),
            Self::Technical => Some(Self::UseCase),
            Self::UseCase => Some(Self::Authorization),
            Self::Authorization => None,
        }
    }

    /// Get the previous step, if any.
    pub fn previous(&self) -> Option<Step> {
        match self {
            Self::BasicInfo => None,
            Self::Compliance => Some(Self::BasicInfo),
            Self::Technical => Some(Self::Compliance),
            Self::UseCase => Some(Self::Technical),
            Self::Authorization => Some(Self::UseCase),
        }
    }

    /// Whether this is the final step.
    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    /// The transition table `{step, event} -> step'`.
    pub fn transition(self, event: WizardEvent) -> Transition {
        match event {
            WizardEvent::SubmitSucceeded => match self.next() {
                Some(next) => Transition::Goto(next),
                None => Transition::Exit,
            },
            WizardEvent::Previous => match self.previous() {
                Some(prev) => Transition::Goto(prev),
                None => Transition::Stay(self),
            },
        }
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::BasicInfo
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

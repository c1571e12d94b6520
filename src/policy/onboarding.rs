//! Onboarding completion and the access gate
//!
//! Onboarding is two steps: confirm a batch, then select a mentor. Sessions and
//! assignments stay behind the gate until both are done.

use serde::Serialize;
use std::fmt::Display;

use crate::models::Enrollment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingStep {
    ConfirmBatch,
    SelectMentor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "access", rename_all = "camelCase")]
pub enum Access {
    /// `fail_open` is set when the enrollment could not be read
    #[serde(rename_all = "camelCase")]
    Granted { fail_open: bool },
    #[serde(rename_all = "camelCase")]
    Blocked { pending_steps: Vec<OnboardingStep> },
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted { .. })
    }
}

impl Enrollment {
    /// Derived from its inputs on every read; the stored flag is never trusted.
    pub fn is_onboarding_complete(&self) -> bool {
        self.batch_confirmed && self.mentor_id.is_some()
    }

    /// Steps still open, in wizard order
    pub fn pending_steps(&self) -> Vec<OnboardingStep> {
        let mut steps = Vec::new();
        if !self.batch_confirmed {
            steps.push(OnboardingStep::ConfirmBatch);
        }
        if self.mentor_id.is_none() {
            steps.push(OnboardingStep::SelectMentor);
        }
        steps
    }

    /// The step the wizard should show, `None` once onboarding is done
    pub fn current_step(&self) -> Option<OnboardingStep> {
        self.pending_steps().into_iter().next()
    }
}

/// Decide access from the outcome of the enrollment fetch.
///
/// A failed fetch grants access so that backend hiccups never lock students out.
pub fn gate<E: Display>(enrollment: Result<&Enrollment, E>) -> Access {
    match enrollment {
        Ok(enrollment) => {
            if enrollment.stored_onboarding_complete != enrollment.is_onboarding_complete() {
                tracing::warn!(
                    "Enrollment {} reports isOnboardingComplete={} but batch/mentor state says {}",
                    enrollment.id,
                    enrollment.stored_onboarding_complete,
                    enrollment.is_onboarding_complete()
                );
            }
            if enrollment.is_onboarding_complete() {
                Access::Granted { fail_open: false }
            } else {
                Access::Blocked {
                    pending_steps: enrollment.pending_steps(),
                }
            }
        }
        Err(e) => {
            tracing::warn!("Enrollment check failed, granting access: {}", e);
            Access::Granted { fail_open: true }
        }
    }
}

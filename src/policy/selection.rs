//! Mentor selection policy
//!
//! Per-mentor engagement as the student sees it:
//!
//! ```text
//! NoCall --request--> Pending --> Scheduled --> Completed --select--> Selected
//!                        \------------------------> Cancelled
//! ```
//!
//! Pending to Scheduled to Completed (and cancellation) happen upstream. Only one mentor
//! is selected per enrollment; revoking clears the selection and leaves the call history.
//! These guards decide what the portal offers and forwards. The upstream service stays
//! the final authority on every transition.

use serde::Serialize;
use thiserror::Error;

use super::calls::{call_info, has_booked_call, has_completed_call};
use crate::models::{CallStatus, Enrollment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MentorEngagement {
    NoCall,
    Pending,
    Scheduled,
    Completed,
    Cancelled,
    Selected,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("A call with this mentor has already been requested")]
    CallAlreadyBooked,

    #[error("A mentor can only be selected after a completed call")]
    NoCompletedCall,

    #[error("Another mentor is already selected; revoke the current mentor first")]
    AnotherMentorSelected,

    #[error("This mentor is already your mentor")]
    AlreadySelected,

    #[error("No mentor is currently selected")]
    NoMentorSelected,

    #[error("Revoking your mentor must be confirmed")]
    ConfirmationRequired,
}

/// What the student can do next with one mentor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedActions {
    pub request_call: bool,
    pub select: bool,
    pub revoke: bool,
}

/// Current engagement with `mentor_id`
pub fn engagement(enrollment: &Enrollment, mentor_id: &str) -> MentorEngagement {
    if enrollment.mentor_id.as_deref() == Some(mentor_id) {
        return MentorEngagement::Selected;
    }
    let calls = &enrollment.booked_calls;
    if has_completed_call(calls, mentor_id) {
        return MentorEngagement::Completed;
    }
    // An active call outranks older cancelled ones
    let active = calls
        .iter()
        .filter(|c| c.mentor_id == mentor_id)
        .map(|c| c.status)
        .fold(None, |best, status| match (best, status) {
            (_, CallStatus::Scheduled) => Some(CallStatus::Scheduled),
            (Some(CallStatus::Scheduled), _) => best,
            (_, CallStatus::Pending) => Some(CallStatus::Pending),
            _ => best,
        });
    match active {
        Some(CallStatus::Scheduled) => MentorEngagement::Scheduled,
        Some(CallStatus::Pending) => MentorEngagement::Pending,
        _ => match call_info(calls, mentor_id) {
            Some(_) => MentorEngagement::Cancelled,
            None => MentorEngagement::NoCall,
        },
    }
}

pub fn check_request_call(enrollment: &Enrollment, mentor_id: &str) -> Result<(), SelectionError> {
    if has_booked_call(&enrollment.booked_calls, mentor_id) {
        return Err(SelectionError::CallAlreadyBooked);
    }
    Ok(())
}

pub fn check_select_mentor(enrollment: &Enrollment, mentor_id: &str) -> Result<(), SelectionError> {
    match enrollment.mentor_id.as_deref() {
        Some(current) if current == mentor_id => return Err(SelectionError::AlreadySelected),
        Some(_) => return Err(SelectionError::AnotherMentorSelected),
        None => {}
    }
    if !has_completed_call(&enrollment.booked_calls, mentor_id) {
        return Err(SelectionError::NoCompletedCall);
    }
    Ok(())
}

pub fn check_revoke_mentor(enrollment: &Enrollment, confirmed: bool) -> Result<(), SelectionError> {
    if enrollment.mentor_id.is_none() {
        return Err(SelectionError::NoMentorSelected);
    }
    if !confirmed {
        return Err(SelectionError::ConfirmationRequired);
    }
    Ok(())
}

pub fn allowed_actions(enrollment: &Enrollment, mentor_id: &str) -> AllowedActions {
    AllowedActions {
        request_call: check_request_call(enrollment, mentor_id).is_ok(),
        select: check_select_mentor(enrollment, mentor_id).is_ok(),
        revoke: enrollment.mentor_id.as_deref() == Some(mentor_id),
    }
}

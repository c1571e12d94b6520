//! Student-side business rules
//!
//! Every view derives call status, mentor eligibility, onboarding completeness,
//! session buckets and module locks from here. Nothing in this module performs I/O;
//! callers pass in fetched records and the reference time.

pub mod calls;
pub mod modules;
pub mod onboarding;
pub mod selection;
pub mod sessions;

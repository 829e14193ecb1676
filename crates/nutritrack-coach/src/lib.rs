//! NutriCoach prompt construction and response parsing.
//!
//! This crate builds the prompts sent to a text-generation model for patient
//! coaching tips and clinician cohort analysis, and turns the model's replies
//! into stored tips or insight lines. It performs no network I/O; hosts own
//! the model client.

pub mod prompts;
pub mod responses;

pub use prompts::*;
pub use responses::*;

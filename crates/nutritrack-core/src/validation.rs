//! Pre-write validation gates.
//!
//! The routine checks compare self-reported wake, biggest-meal and sleep times.
//! A day may wrap past midnight: a meal earlier on the clock than waking is
//! taken to be on the next day, and likewise a sleep time earlier than the
//! (adjusted) meal.

use chrono::{NaiveTime, Timelike};
use thiserror::Error;

use crate::models::FoodSelection;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Validation failures surfaced to the caller before any write.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Meal, sleep, and wake times must all be different")]
    DuplicateTimes,

    #[error("Invalid time order: wake < meal < sleep")]
    InvalidTimeOrder,

    #[error("Invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("Please select at least one food category")]
    NoFoodSelected,

    #[error("Name must be 1-8 letters (A-Z, a-z)")]
    InvalidName,

    #[error("Password must be 4-8 characters long with only letters and digits")]
    InvalidPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("ID or phone number is incorrect")]
    IdentityMismatch,

    #[error("Score {0} is not a number")]
    InvalidScore(f64),
}

/// Minutes since midnight of an `HH:MM` 24-hour clock time.
pub fn minutes_since_midnight(time: &str) -> Option<u32> {
    let parsed = NaiveTime::parse_from_str(time.trim(), "%H:%M").ok()?;
    Some(parsed.hour() * 60 + parsed.minute())
}

/// Circadian order over minute values, with next-day wraparound.
pub fn is_circadian_order(wake: u32, meal: u32, sleep: u32) -> bool {
    let meal = if meal < wake { meal + MINUTES_PER_DAY } else { meal };
    let sleep = if sleep < meal { sleep + MINUTES_PER_DAY } else { sleep };
    wake < meal && meal < sleep
}

/// Whether wake, biggest meal and sleep occur in that order.
///
/// Unparsable times are never in order.
pub fn is_valid_order(wake: &str, meal: &str, sleep: &str) -> bool {
    match (
        minutes_since_midnight(wake),
        minutes_since_midnight(meal),
        minutes_since_midnight(sleep),
    ) {
        (Some(w), Some(m), Some(s)) => is_circadian_order(w, m, s),
        _ => false,
    }
}

/// Whether any two of the given times are textually identical.
pub fn has_duplicates(times: &[&str]) -> bool {
    times
        .iter()
        .enumerate()
        .any(|(i, a)| times[i + 1..].iter().any(|b| a == b))
}

/// Full routine gate: duplicates, then format, then order.
pub fn validate_routine(wake: &str, meal: &str, sleep: &str) -> Result<(), ValidationError> {
    if has_duplicates(&[meal, sleep, wake]) {
        return Err(ValidationError::DuplicateTimes);
    }
    for time in [wake, meal, sleep] {
        if minutes_since_midnight(time).is_none() {
            return Err(ValidationError::InvalidTime(time.to_string()));
        }
    }
    if !is_valid_order(wake, meal, sleep) {
        return Err(ValidationError::InvalidTimeOrder);
    }
    Ok(())
}

/// At least one food category must be chosen.
pub fn validate_food_selection(foods: &FoodSelection) -> Result<(), ValidationError> {
    if foods.any_selected() {
        Ok(())
    } else {
        Err(ValidationError::NoFoodSelected)
    }
}

/// Registration name: 1 to 8 ASCII letters.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if (1..=8).contains(&len) && name.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName)
    }
}

/// Registration password: 4 to 8 ASCII letters or digits, confirmed.
pub fn validate_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(4..=8).contains(&len) || !password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidPassword);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

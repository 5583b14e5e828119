//! Input rules shared by every backend

use super::entity::{DomainError, DomainResult};

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_OBSERVATIONS_LEN: usize = 500;
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;
pub const DEFAULT_DIFFICULTY: u8 = 3;

/// Trim a name and check it is non-blank and short enough.
///
/// `kind` names the entity in the error message ("Obstacle", "Trick").
pub fn clean_name(kind: &str, raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::Validation(format!("{} name must not be blank", kind)));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "{} name exceeds {} characters",
            kind, MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

pub fn check_observations(text: &str) -> DomainResult<()> {
    if text.chars().count() > MAX_OBSERVATIONS_LEN {
        return Err(DomainError::Validation(format!(
            "Observations exceed {} characters",
            MAX_OBSERVATIONS_LEN
        )));
    }
    Ok(())
}

pub fn check_difficulty(difficulty: Option<u8>) -> DomainResult<()> {
    match difficulty {
        Some(d) if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d) => Err(DomainError::Validation(
            format!("Difficulty {} outside {}..={}", d, MIN_DIFFICULTY, MAX_DIFFICULTY),
        )),
        _ => Ok(()),
    }
}

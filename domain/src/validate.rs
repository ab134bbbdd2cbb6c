//! Form input validation. Pure functions, called before any store access.

use crate::{CoreError, NewFriend};

/// Parse an age typed into a form field.
///
/// Accepts an optionally signed base-10 integer surrounded by whitespace.
/// Fractions, trailing garbage, empty text, and values outside `i64` are
/// rejected rather than coerced.
pub fn parse_age(s: &str) -> Result<i64, CoreError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("age is required".into()));
    }
    trimmed.parse::<i64>().map_err(|_| {
        CoreError::InvalidInput(format!("age must be a whole number, got `{trimmed}`"))
    })
}

/// Validate a name typed into a form field. Returns the trimmed name.
pub fn validate_name(s: &str) -> Result<String, CoreError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("name is required".into()));
    }
    Ok(trimmed.to_string())
}

/// Validate both form fields into the values handed to the store.
pub fn validate_friend(name: &str, age: &str) -> Result<NewFriend, CoreError> {
    let name = validate_name(name)?;
    let age = parse_age(age)?;
    Ok(NewFriend { name, age })
}

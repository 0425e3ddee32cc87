//! Boundary checks run before any store access.

use crate::error::StoreError;

/// Trim `value`, rejecting it if nothing is left.
pub fn required(field: &str, value: &str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

/// Line-stop direction, 0 or 1.
pub fn direction(value: i32) -> Result<i32, StoreError> {
    match value {
        0 | 1 => Ok(value),
        _ => Err(StoreError::Validation(format!(
            "direction must be 0 or 1, got {value}"
        ))),
    }
}

/// Reject an empty batch.
pub fn non_empty<T>(what: &str, items: &[T]) -> Result<(), StoreError> {
    if items.is_empty() {
        return Err(StoreError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Longest departure board look-ahead, one minute short of a full day.
pub const MAX_WINDOW_MINUTES: u32 = 24 * 60 - 1;

/// Departure board look-ahead, at most [`MAX_WINDOW_MINUTES`].
pub fn window_minutes(value: u32) -> Result<u32, StoreError> {
    if value > MAX_WINDOW_MINUTES {
        return Err(StoreError::Validation(format!(
            "window must be at most {MAX_WINDOW_MINUTES} minutes, got {value}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims() {
        assert_eq!(required("name", "  Rondo  ").unwrap(), "Rondo");
    }

    #[test]
    fn required_rejects_blank() {
        for value in ["", "   ", "\t\n"] {
            let err = required("name", value).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)));
            assert_eq!(err.to_string(), "validation failed: name must not be blank");
        }
    }

    #[test]
    fn direction_bounds() {
        assert_eq!(direction(0).unwrap(), 0);
        assert_eq!(direction(1).unwrap(), 1);
        assert!(direction(2).is_err());
        assert!(direction(-1).is_err());
    }

    #[test]
    fn non_empty_batches() {
        assert!(non_empty::<i32>("brigades", &[]).is_err());
        assert!(non_empty("brigades", &[1]).is_ok());
    }

    #[test]
    fn window_stays_within_a_day() {
        assert_eq!(window_minutes(0).unwrap(), 0);
        assert_eq!(window_minutes(1439).unwrap(), 1439);
        assert!(window_minutes(1440).is_err());
        assert!(window_minutes(1500).is_err());
    }
}

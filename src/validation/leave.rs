use chrono::NaiveDate;

use crate::error::{AppError, Result};

/// The bounds on a leave request's reason, in characters.
const REASON_MIN: usize = 5;
const REASON_MAX: usize = 200;

/// Validates a leave date range: both dates present and `end >= start`.
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<()> {
    if end_date < start_date {
        return Err(AppError::Validation(
            "End date must not be before start date".to_string(),
        ));
    }
    Ok(())
}

/// Validates a leave request reason.
pub fn validate_reason(reason: &str) -> Result<()> {
    let len = reason.trim().chars().count();
    if len < REASON_MIN || len > REASON_MAX {
        return Err(AppError::Validation(format!(
            "Reason must be between {} and {} characters",
            REASON_MIN, REASON_MAX
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn equal_dates_are_a_valid_range() {
        assert!(validate_date_range(date(2025, 3, 10), date(2025, 3, 10)).is_ok());
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(validate_date_range(date(2025, 3, 11), date(2025, 3, 10)).is_err());
    }

    #[test]
    fn reason_bounds() {
        assert!(validate_reason("Rest").is_err());
        assert!(validate_reason("Family vacation").is_ok());
        assert!(validate_reason(&"x".repeat(201)).is_err());
        // Surrounding whitespace does not count toward the minimum.
        assert!(validate_reason("  hi  ").is_err());
    }
}

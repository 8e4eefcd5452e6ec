use crate::error::{AppError, Result};

/// Validates a tenant subdomain label.
///
/// Labels are lowercase DNS labels: `[a-z0-9-]`, 3 to 63 characters, no
/// leading or trailing hyphen.
pub fn validate_subdomain(subdomain: &str) -> Result<()> {
    if subdomain.len() < 3 || subdomain.len() > 63 {
        return Err(AppError::Validation(
            "Subdomain must be between 3 and 63 characters".to_string(),
        ));
    }

    if !subdomain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::Validation(
            "Subdomain can only contain lowercase letters, numbers, and hyphens".to_string(),
        ));
    }

    if subdomain.starts_with('-') || subdomain.ends_with('-') {
        return Err(AppError::Validation(
            "Subdomain cannot start or end with a hyphen".to_string(),
        ));
    }

    Ok(())
}

/// Validates an email address. Intentionally shallow: one `@`, non-empty
/// local part, a dot in the domain.
pub fn validate_email(email: &str) -> Result<()> {
    if email.len() > 255 {
        return Err(AppError::Validation(
            "Email must be at most 255 characters".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::Validation("Invalid email address".to_string()));
    };

    if local.is_empty() || domain.len() < 3 || !domain.contains('.') || domain.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    Ok(())
}

/// Validates a password.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a display name (company or person).
pub fn validate_name(name: &str, field: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field)));
    }
    if trimmed.len() > 255 {
        return Err(AppError::Validation(format!(
            "{} must be at most 255 characters",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_accepts_valid_labels() {
        for label in ["acme", "acme-corp", "a1b2c3"] {
            assert!(validate_subdomain(label).is_ok(), "{label} should be valid");
        }
    }

    #[test]
    fn subdomain_rejects_bad_labels() {
        for label in ["ab", "Acme", "acme.corp", "-acme", "acme-", "a b"] {
            assert!(
                validate_subdomain(label).is_err(),
                "{label} should be rejected"
            );
        }
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("jo@acme.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@acme.com").is_err());
        assert!(validate_email("jo@acme").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }
}

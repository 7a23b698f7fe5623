//! # Validation Module
//!
//! Input shape validation, applied at the API boundary before business logic
//! runs. Database constraints (NOT NULL, UNIQUE, CHECK) back these up as the
//! last line of defense.

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a business code (product or sale).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required { field: "code" });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code",
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code",
            reason: "must contain only letters, numbers, hyphens, and underscores",
        });
    }

    Ok(())
}

/// Validates a product title (1..=200 characters).
pub fn validate_title(title: &str) -> ValidationResult<()> {
    non_empty_with_max(title, "title", 200)
}

/// Validates a customer name (1..=200 characters).
pub fn validate_customer(customer: &str) -> ValidationResult<()> {
    non_empty_with_max(customer, "customer", 200)
}

/// Validates a category name (1..=100 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    non_empty_with_max(name, "name", 100)
}

/// Validates a person name (1..=100 characters).
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    non_empty_with_max(name, "name", 100)
}

/// Validates an optional description against a maximum length.
pub fn validate_description(description: Option<&str>, max: usize) -> ValidationResult<()> {
    if let Some(d) = description {
        if d.len() > max {
            return Err(ValidationError::TooLong {
                field: "description",
                max,
            });
        }
    }
    Ok(())
}

/// Validates an email address.
///
/// Intentionally shallow: non-empty, contains `@` with something on both
/// sides. Real deliverability is the mail server's problem.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required { field: "email" });
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "expected a name@domain.tld address",
        });
    }

    Ok(())
}

/// Validates a password (at least 6 characters).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.len() < 6 {
        return Err(ValidationError::TooShort {
            field: "password",
            min: 6,
        });
    }
    Ok(())
}

fn non_empty_with_max(value: &str, field: &'static str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line or adjustment quantity: strictly positive, bounded.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive { field: "quantity" });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity",
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a value that must be zero or greater (stock levels, prices,
/// discounts).
pub fn validate_non_negative(field: &'static str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustBeNonNegative { field });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("RING001").is_ok());
        assert!(validate_code("SALE-2026_01").is_ok());
        assert!(validate_code("").is_err());
        assert!(validate_code(&"X".repeat(51)).is_err());
        assert!(validate_code("BAD CODE").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@nodot").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("discount", 0).is_ok());
        assert!(validate_non_negative("discount", -1).is_err());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description(None, 300).is_ok());
        assert!(validate_description(Some("ok"), 300).is_ok());
        assert!(validate_description(Some(&"x".repeat(301)), 300).is_err());
    }
}

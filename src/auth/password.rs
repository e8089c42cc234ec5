/// Password Hashing and Verification
///
/// Used by the identity adapters only; the session layer never sees passwords.

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

pub use bcrypt::DEFAULT_COST;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt ignores input past 72 bytes

/// Hash a password using bcrypt at the given cost
///
/// # Errors
/// Returns error if the password fails strength validation or bcrypt fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    validate_password_strength(password)?;

    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Minimum 8, maximum 72 bytes; at least one digit, one lowercase and one
/// uppercase letter.
fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::InvalidFormat(
            "password must contain a digit, a lowercase and an uppercase letter".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lowest cost bcrypt accepts; keeps the suite fast
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("ValidPassword123", TEST_COST).expect("Failed to hash password");

        assert!(hash.starts_with("$2"));
        assert!(verify_password("ValidPassword123", &hash).unwrap());
        assert!(!verify_password("WrongPassword123", &hash).unwrap());
    }

    #[test]
    fn test_weak_passwords_rejected() {
        let too_long = "Aa1".repeat(25);
        for password in ["Short1", "NoDigitsPassword", "NOLOWERCASE1", "nouppercase1", too_long.as_str()] {
            assert!(
                matches!(hash_password(password, TEST_COST), Err(AppError::Validation(_))),
                "should reject {}",
                password
            );
        }
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("ValidPassword123", "not-a-bcrypt-hash").is_err());
    }
}

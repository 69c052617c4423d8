//! Password verification and password policy.

use argon2::{Argon2, PasswordVerifier};
use studyhub_core::error::StudyError;

use crate::error::AuthError;

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// `pepper` must match the one used when the hash was produced.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Check a new password against the length policy and its confirmation.
pub fn check_new_password(
    password: &str,
    confirm: &str,
    min_length: usize,
) -> Result<(), StudyError> {
    if password.chars().count() < min_length {
        return Err(StudyError::validation(format!(
            "password must be at least {min_length} characters"
        )));
    }
    if password != confirm {
        return Err(StudyError::validation(
            "password and confirm password do not match",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::PasswordHasher;
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;

    fn hash_password(password: &str, pepper: Option<&str>) -> String {
        let input = format!("{}{password}", pepper.unwrap_or_default());
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(input.as_bytes(), &salt)
            .expect("hashing failed")
            .to_string()
    }

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("open-sesame", None);
        assert!(verify_password("open-sesame", &hash, None).unwrap());
        assert!(!verify_password("open-sesame!", &hash, None).unwrap());
    }

    #[test]
    fn pepper_is_applied() {
        let hash = hash_password("open-sesame", Some("salt-mine"));
        assert!(verify_password("open-sesame", &hash, Some("salt-mine")).unwrap());
        assert!(!verify_password("open-sesame", &hash, None).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(verify_password("pw", "not-a-hash", None).is_err());
    }

    #[test]
    fn policy_rejects_short_or_mismatched_passwords() {
        assert!(check_new_password("short", "short", 8).is_err());
        assert!(check_new_password("long enough", "long enougH", 8).is_err());
        assert!(check_new_password("long enough", "long enough", 8).is_ok());
    }
}

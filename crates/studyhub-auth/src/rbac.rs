//! Role gate for authenticated requests.

use studyhub_core::models::user::AccountType;
use tracing::warn;

use crate::error::AuthError;
use crate::token::ValidatedClaims;

/// Allow the request only when the token's role is one of `allowed`.
pub fn authorize(claims: &ValidatedClaims, allowed: &[AccountType]) -> Result<(), AuthError> {
    if allowed.contains(&claims.role()) {
        return Ok(());
    }

    warn!(
        sub = %claims.0.sub,
        role = %claims.role(),
        "Role not permitted for this route"
    );
    let required = allowed
        .iter()
        .map(AccountType::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Err(AuthError::InsufficientRole { required })
}

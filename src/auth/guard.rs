use crate::auth::repo::User;
use crate::error::AppError;

/// Ownership check: admins act on any per-user resource, everyone else only
/// on their own.
pub fn can_access(user: &User, owner_id: i64) -> bool {
    user.is_admin || user.id == owner_id
}

/// Reject non-admin callers with `Forbidden`.
pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".into()))
    }
}

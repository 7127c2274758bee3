//! Caller identity.
//!
//! Authentication is done by an external provider; by the time a request reaches
//! this crate it has been reduced to a user id and an admin flag.

use crate::errors::{Error, Result};

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// Owning-user id used to scope every read and write
    pub user_id: String,
    /// Grants the admin-wide read operations
    pub is_admin: bool,
}

impl CallerContext {
    /// A regular user.
    #[must_use]
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    /// A user with admin rights.
    #[must_use]
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: true,
        }
    }

    /// Fails with [`Error::Forbidden`] unless the caller is an admin.
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        assert!(CallerContext::admin("ops").require_admin().is_ok());
        assert!(matches!(
            CallerContext::user("alice").require_admin(),
            Err(Error::Forbidden)
        ));
    }
}

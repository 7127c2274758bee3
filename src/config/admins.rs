//! Admin configuration loaded from environment variables.
//!
//! Authentication happens outside this crate; it hands over a user id. Whether that
//! user may run the admin-wide reads is decided here from `BILLING_ADMIN_USER_IDS`,
//! a comma-separated list of user ids.

use crate::core::caller::CallerContext;
use std::collections::HashSet;

/// Environment variable holding the admin user ids.
pub const ADMIN_USER_IDS_VAR: &str = "BILLING_ADMIN_USER_IDS";

/// Parses a comma-separated id list, ignoring blanks and surrounding whitespace.
#[must_use]
pub fn parse_admin_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Gets the configured admin ids, empty when the variable is unset.
#[must_use]
pub fn get_admin_ids() -> HashSet<String> {
    std::env::var(ADMIN_USER_IDS_VAR)
        .map(|raw| parse_admin_ids(&raw))
        .unwrap_or_default()
}

/// Builds the caller context for an authenticated user id.
#[must_use]
pub fn resolve_caller(user_id: &str, admin_ids: &HashSet<String>) -> CallerContext {
    if admin_ids.contains(user_id) {
        CallerContext::admin(user_id)
    } else {
        CallerContext::user(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        let ids = parse_admin_ids(" alice, bob ,,carol ");
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("alice"));
        assert!(ids.contains("bob"));
        assert!(ids.contains("carol"));
        assert!(parse_admin_ids("").is_empty());
    }

    #[test]
    fn test_resolve_caller() {
        let ids = parse_admin_ids("ops-1");
        assert!(resolve_caller("ops-1", &ids).is_admin);
        let regular = resolve_caller("user-9", &ids);
        assert!(!regular.is_admin);
        assert_eq!(regular.user_id, "user-9");
    }
}

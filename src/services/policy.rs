//! Role resolution and change-authorization policy.
//!
//! Every path that creates or updates an account goes through these checks,
//! so privilege rules cannot drift between endpoints.

use crate::error::AppError;
use crate::models::account::{AccountType, RoleFlags};

pub struct RolePolicy;

impl RolePolicy {
    pub fn count_set(flags: &RoleFlags) -> usize {
        [
            flags.is_super_admin,
            flags.is_admin,
            flags.is_supervisor,
            flags.is_manager,
            flags.is_security,
            flags.is_resident,
        ]
        .iter()
        .filter(|f| **f)
        .count()
    }

    /// Exactly one role flag must be set. Zero and multiple are both
    /// rejected, before any other processing of the request.
    pub fn validate(flags: &RoleFlags) -> Result<(), AppError> {
        if Self::count_set(flags) == 1 {
            Ok(())
        } else {
            Err(AppError::RoleConflict(
                "Exactly one role must be set".to_string(),
            ))
        }
    }

    /// Derive the privilege tier from a validated flag set:
    /// superadmin over admin over the four user-tier roles.
    pub fn derive_account_type(flags: &RoleFlags) -> AccountType {
        if flags.is_super_admin {
            AccountType::Superadmin
        } else if flags.is_admin {
            AccountType::Admin
        } else {
            AccountType::User
        }
    }

    /// May `actor` create an account carrying `target` flags?
    /// Admin and superadmin targets are reserved to superadmin actors.
    pub fn can_assign(actor: AccountType, target: &RoleFlags) -> bool {
        if target.is_admin || target.is_super_admin {
            actor == AccountType::Superadmin
        } else {
            true
        }
    }

    /// May `actor` rewrite an account currently at `current` tier into
    /// `proposed` flags? Touching an admin-tier account, or moving one into
    /// the admin tier, is reserved to superadmin actors.
    pub fn can_modify(actor: AccountType, current: AccountType, proposed: &RoleFlags) -> bool {
        if current.is_admin_tier() && actor != AccountType::Superadmin {
            return false;
        }
        Self::can_assign(actor, proposed)
    }
}

//! Authorization rules for acting on user records.

use crate::auth::CurrentUser;

/// A mutating action on a target user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Update the target; `changes_role` is set when the payload carries a role.
    Update { changes_role: bool },
    Delete,
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Non-admin acting on someone else's record.
    NotOwner(UserAction),
    /// Non-admin trying to set a role.
    RoleChange,
    /// Admin trying to delete their own account.
    AdminSelfDelete,
}

impl Denial {
    pub fn message(&self) -> &'static str {
        match self {
            Denial::NotOwner(UserAction::Update { .. }) => {
                "You can only update your own information unless you are an admin."
            }
            Denial::NotOwner(UserAction::Delete) => {
                "You can only delete your own account unless you are an admin."
            }
            Denial::RoleChange => "Only admin users can change user roles.",
            Denial::AdminSelfDelete => "Admin users cannot delete their own account.",
        }
    }

    /// Refusals that are a rule about the request itself rather than a
    /// missing permission. These map to 400 instead of 403.
    pub fn is_safety_rule(&self) -> bool {
        matches!(self, Denial::AdminSelfDelete)
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Decide whether `caller` may perform `action` on user `target_id`.
///
/// Checks run in a fixed order: ownership, then role change (update), then
/// admin self-deletion (delete).
pub fn authorize(caller: &CurrentUser, target_id: i64, action: UserAction) -> Result<(), Denial> {
    let is_admin = caller.is_admin();
    let is_self = caller.id == target_id;

    if !is_admin && !is_self {
        return Err(Denial::NotOwner(action));
    }

    match action {
        UserAction::Update { changes_role } if changes_role && !is_admin => Err(Denial::RoleChange),
        UserAction::Delete if is_admin && is_self => Err(Denial::AdminSelfDelete),
        _ => Ok(()),
    }
}

//! Authorization rules for virtual machine records.

use serde::Serialize;

use crate::models::{Role, User};

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: i32,
    pub role: Role,
    pub is_superuser: bool,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            is_superuser: user.is_superuser,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    List,
}

/// Decides whether `caller` may perform `action` on a record owned by
/// `resource_owner_id`.
///
/// Superusers may do anything. ADMIN-role users may create records they
/// own; CLIENT users may not create. Read, update and delete require
/// ownership. For `List`, `None` means "every record" and is superuser-only.
#[must_use]
pub fn allow(caller: &Caller, action: Action, resource_owner_id: Option<i32>) -> bool {
    if caller.is_superuser {
        return true;
    }

    let owns = resource_owner_id == Some(caller.id);
    match action {
        Action::Create => caller.role == Role::Admin && owns,
        Action::Read | Action::Update | Action::Delete | Action::List => owns,
    }
}

/// Owner filter applied to listings: `None` for superusers (all records),
/// otherwise the caller's own id.
#[must_use]
pub const fn list_scope(caller: &Caller) -> Option<i32> {
    if caller.is_superuser {
        None
    } else {
        Some(caller.id)
    }
}

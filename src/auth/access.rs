//! Pure access-control predicates, no I/O.
//!
//! Endpoint-level policy built on these two checks: task creation and
//! deletion require `is_admin`; task read and the comment endpoints require
//! `is_owner` OR `is_admin`; task update grants admins the full field set
//! (status, priority, executor, comments) and owners only status and
//! comments.

use crate::auth::principal::AuthenticatedPrincipal;
use crate::models::{Role, Task};

/// True iff the principal holds the `ADMIN` role.
pub fn is_admin(principal: &AuthenticatedPrincipal) -> bool {
    principal.roles.contains(&Role::Admin)
}

/// True iff the principal is the author of the task. Usernames are compared
/// case-sensitively.
pub fn is_owner(principal: &AuthenticatedPrincipal, task: &Task) -> bool {
    principal.username == task.author
}

//! Request-scoped authorization context.
//!
//! Every store and engine operation takes a [`RequestContext`] as an explicit
//! parameter. The API layer builds it from verified bearer-token claims;
//! tests build it directly, which keeps authorization testable without a
//! live token.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// A family member's role, carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Full control, including category management
    Admin,
    /// May create and modify financial records
    Editor,
    /// Read-only access
    Viewer,
}

/// Verified identity and scope of the current request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Family whose data this request may touch
    pub family_id: i64,
    /// Acting user (token subject)
    pub user_id: String,
    /// The user's role within the family
    pub role: MemberRole,
}

impl RequestContext {
    /// Rejects viewers. Editors and admins pass.
    ///
    /// # Errors
    /// Returns `Error::Forbidden` for the viewer role.
    pub const fn require_editor(&self) -> Result<()> {
        match self.role {
            MemberRole::Admin | MemberRole::Editor => Ok(()),
            MemberRole::Viewer => Err(Error::Forbidden { required: "editor" }),
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::Permissions;
use crate::form::{self, FieldErrors};
use crate::listing::Searchable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubAdminStatus {
    Active,
    Inactive,
}

impl SubAdminStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubAdminStatus::Active => "Active",
            SubAdminStatus::Inactive => "Inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [SubAdminStatus::Active, SubAdminStatus::Inactive]
            .into_iter()
            .find(|s| s.as_str() == value)
    }

    pub fn flipped(self) -> Self {
        match self {
            SubAdminStatus::Active => SubAdminStatus::Inactive,
            SubAdminStatus::Inactive => SubAdminStatus::Active,
        }
    }
}

impl fmt::Display for SubAdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the e-mail invitation reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InviteStatus {
    Pending,
    Success,
}

impl InviteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InviteStatus::Pending => "Pending",
            InviteStatus::Success => "Success",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [InviteStatus::Pending, InviteStatus::Success]
            .into_iter()
            .find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAdmin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: SubAdminStatus,
    pub permissions: Permissions,
    pub invite: InviteStatus,
}

impl Searchable for SubAdmin {
    fn matches(&self, needle: &str) -> bool {
        [self.name.as_str(), self.email.as_str(), self.role.as_str()]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SubAdminDraft {
    #[validate(custom(function = "crate::form::required"))]
    pub name: String,
    #[validate(custom(function = "crate::form::email"))]
    pub email: String,
    #[validate(custom(function = "crate::form::required"))]
    pub role: String,
    pub status: SubAdminStatus,
}

impl Default for SubAdminDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            role: String::new(),
            status: SubAdminStatus::Active,
        }
    }
}

impl From<&SubAdmin> for SubAdminDraft {
    fn from(sub: &SubAdmin) -> Self {
        Self {
            name: sub.name.clone(),
            email: sub.email.clone(),
            role: sub.role.clone(),
            status: sub.status,
        }
    }
}

impl SubAdminDraft {
    /// Builds a new sub-admin with default permissions and a pending invite.
    pub fn build(&self, id: Uuid) -> Result<SubAdmin, FieldErrors> {
        form::check(self)?;

        Ok(SubAdmin {
            id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            role: self.role.trim().to_string(),
            status: self.status,
            permissions: Permissions::default(),
            invite: InviteStatus::Pending,
        })
    }

    /// Applies the editable fields to an existing record.
    pub fn apply(&self, existing: &SubAdmin) -> Result<SubAdmin, FieldErrors> {
        let built = self.build(existing.id)?;
        let email_changed = built.email != existing.email;

        Ok(SubAdmin {
            permissions: existing.permissions,
            invite: if email_changed {
                InviteStatus::Pending
            } else {
                existing.invite
            },
            ..built
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Feature;

    fn draft() -> SubAdminDraft {
        SubAdminDraft {
            name: "Asha".into(),
            email: "Asha@Example.com ".into(),
            role: "Night Dispatcher".into(),
            status: SubAdminStatus::Active,
        }
    }

    #[test]
    fn new_sub_admins_start_pending_with_default_permissions() {
        let sub = draft().build(Uuid::nil()).unwrap();
        assert_eq!(sub.email, "asha@example.com");
        assert_eq!(sub.invite, InviteStatus::Pending);
        assert_eq!(sub.permissions, Permissions::default());
    }

    #[test]
    fn apply_keeps_permissions_and_resets_invite_on_new_email() {
        let mut existing = draft().build(Uuid::nil()).unwrap();
        existing.permissions = existing.permissions.toggled(Feature::Cabs);
        existing.invite = InviteStatus::Success;

        let same_email = SubAdminDraft {
            role: "Day Dispatcher".into(),
            ..draft()
        };
        let updated = same_email.apply(&existing).unwrap();
        assert_eq!(updated.role, "Day Dispatcher");
        assert!(updated.permissions.cabs);
        assert_eq!(updated.invite, InviteStatus::Success);

        let new_email = SubAdminDraft {
            email: "asha.k@example.com".into(),
            ..draft()
        };
        assert_eq!(new_email.apply(&existing).unwrap().invite, InviteStatus::Pending);
    }

    #[test]
    fn invalid_email_is_reported() {
        let errors = SubAdminDraft {
            email: "asha".into(),
            ..draft()
        }
        .build(Uuid::nil())
        .unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Staff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CreateJob,
    EditJob,
    DeleteJob,
    ReviewJob,
    CancelJob,
    WorkJob,
    ManageProfiles,
    ViewAllJobs,
}

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::CreateJob,
    Capability::EditJob,
    Capability::DeleteJob,
    Capability::ReviewJob,
    Capability::CancelJob,
    Capability::ManageProfiles,
    Capability::ViewAllJobs,
];

const STAFF_CAPABILITIES: &[Capability] = &[Capability::WorkJob];

impl Capability {
    pub fn describe(self) -> &'static str {
        match self {
            Capability::CreateJob => "create jobs",
            Capability::EditJob => "edit jobs",
            Capability::DeleteJob => "delete jobs",
            Capability::ReviewJob => "review jobs",
            Capability::CancelJob => "cancel jobs",
            Capability::WorkJob => "work on jobs",
            Capability::ManageProfiles => "manage profiles",
            Capability::ViewAllJobs => "view all jobs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{role} accounts cannot {}", .capability.describe())]
pub struct Forbidden {
    pub role: Role,
    pub capability: Capability,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Admin => ADMIN_CAPABILITIES,
            Role::Staff => STAFF_CAPABILITIES,
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "STAFF" => Ok(Role::Staff),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ApprovalStatus::Pending),
            "APPROVED" => Ok(ApprovalStatus::Approved),
            other => Err(format!("unknown approval status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub department_id: Option<i32>,
    pub display_name: String,
}

impl Actor {
    /// `None` unless the profile is approved and carries a known role.
    pub fn from_profile(profile: &Profile) -> Option<Self> {
        if !profile.is_approved() {
            return None;
        }
        Some(Self {
            id: profile.id,
            role: profile.role()?,
            department_id: profile.department_id,
            display_name: if profile.full_name.trim().is_empty() {
                profile.username.clone()
            } else {
                profile.full_name.clone()
            },
        })
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), Forbidden> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(Forbidden {
                role: self.role,
                capability,
            })
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

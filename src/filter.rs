use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::lifecycle::{JobStatus, TransitionError};
use crate::models::Job;
use crate::roles::{Actor, Capability};

/// Department id meaning "every department".
pub const ALL_DEPARTMENTS: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(JobStatus),
}

impl FromStr for StatusFilter {
    type Err = TransitionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("ALL") {
            return Ok(StatusFilter::All);
        }
        trimmed.parse().map(StatusFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepartmentFilter {
    #[default]
    All,
    Only(i32),
}

impl From<i32> for DepartmentFilter {
    fn from(value: i32) -> Self {
        if value == ALL_DEPARTMENTS {
            DepartmentFilter::All
        } else {
            DepartmentFilter::Only(value)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    pub assignees: Vec<Uuid>,
}

impl JobListing {
    /// True when `actor_id` is on the team, either through an assignment row
    /// or the legacy single-assignee column.
    pub fn is_assigned_to(&self, actor_id: Uuid) -> bool {
        self.assignees.contains(&actor_id) || self.job.assigned_to == Some(actor_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub text: String,
    pub status: StatusFilter,
    pub department: DepartmentFilter,
    pub mine_only: bool,
}

impl JobQuery {
    pub fn matches(&self, listing: &JobListing, actor: &Actor) -> bool {
        self.matches_text(&listing.job)
            && self.matches_status(&listing.job)
            && self.matches_department(&listing.job, actor)
            && self.matches_mine(listing, actor)
    }

    pub fn apply(&self, listings: Vec<JobListing>, actor: &Actor) -> Vec<JobListing> {
        listings
            .into_iter()
            .filter(|listing| self.matches(listing, actor))
            .collect()
    }

    fn matches_text(&self, job: &Job) -> bool {
        // Blank means no filter; otherwise the text is matched as typed.
        if self.text.trim().is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        [
            job.title.as_str(),
            job.location.as_str(),
            job.customer_name.as_str(),
            job.customer_phone.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_status(&self, job: &Job) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => job
                .lifecycle_status()
                .is_some_and(|status| status.same_as(wanted)),
        }
    }

    // Only the administrator view offers a department filter.
    fn matches_department(&self, job: &Job, actor: &Actor) -> bool {
        if !actor.can(Capability::ViewAllJobs) {
            return true;
        }
        match self.department {
            DepartmentFilter::All => true,
            DepartmentFilter::Only(id) => job.department_ids.contains(&id),
        }
    }

    fn matches_mine(&self, listing: &JobListing, actor: &Actor) -> bool {
        if !self.mine_only || actor.can(Capability::ViewAllJobs) {
            return true;
        }
        listing.is_assigned_to(actor.id)
    }
}

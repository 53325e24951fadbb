use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    WaitingReview,
    Approved,
    /// Legacy spelling of `Approved`, still present in older rows.
    Done,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::WaitingReview => "WAITING_REVIEW",
            JobStatus::Approved => "APPROVED",
            JobStatus::Done => "DONE",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn normalized(self) -> Self {
        match self {
            JobStatus::Done => JobStatus::Approved,
            other => other,
        }
    }

    pub fn label(self) -> &'static str {
        match self.normalized() {
            JobStatus::Pending => "Pending",
            JobStatus::InProgress => "In progress",
            JobStatus::WaitingReview => "Waiting for review",
            JobStatus::Approved | JobStatus::Done => "Approved",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self.normalized(),
            JobStatus::Approved | JobStatus::Cancelled
        )
    }

    /// Edit lock for both staff and administrators.
    pub fn is_edit_locked(self) -> bool {
        self.is_terminal()
    }

    pub fn same_as(self, other: JobStatus) -> bool {
        self.normalized() == other.normalized()
    }

    pub fn apply(self, action: JobAction) -> Result<JobStatus, TransitionError> {
        let from = self.normalized();
        let to = match (from, action) {
            (JobStatus::Pending, JobAction::Start) => JobStatus::InProgress,
            (JobStatus::InProgress, JobAction::Submit) => JobStatus::WaitingReview,
            (JobStatus::WaitingReview, JobAction::CancelSubmission) => JobStatus::InProgress,
            (JobStatus::WaitingReview, JobAction::Reject) => JobStatus::InProgress,
            (JobStatus::WaitingReview, JobAction::Approve) => JobStatus::Approved,
            (from, JobAction::Cancel) if !from.is_terminal() => JobStatus::Cancelled,
            _ => {
                return Err(TransitionError::NotAllowed {
                    from: self,
                    action,
                })
            }
        };
        Ok(to)
    }

    pub fn can(self, action: JobAction) -> bool {
        self.apply(action).is_ok()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = TransitionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "IN_PROGRESS" => Ok(JobStatus::InProgress),
            "WAITING_REVIEW" => Ok(JobStatus::WaitingReview),
            "APPROVED" => Ok(JobStatus::Approved),
            "DONE" => Ok(JobStatus::Done),
            "CANCELLED" => Ok(JobStatus::Cancelled),
            _ => Err(TransitionError::UnknownStatus(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    Start,
    Submit,
    CancelSubmission,
    Reject,
    Approve,
    Cancel,
}

impl JobAction {
    pub fn as_str(self) -> &'static str {
        match self {
            JobAction::Start => "start",
            JobAction::Submit => "submit",
            JobAction::CancelSubmission => "cancel_submission",
            JobAction::Reject => "reject",
            JobAction::Approve => "approve",
            JobAction::Cancel => "cancel",
        }
    }

    /// Actions performed by the assigned worker rather than by a reviewer.
    pub fn is_field_action(self) -> bool {
        matches!(
            self,
            JobAction::Start | JobAction::Submit | JobAction::CancelSubmission
        )
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} a job that is {from}")]
    NotAllowed { from: JobStatus, action: JobAction },
    #[error("unknown job status '{0}'")]
    UnknownStatus(String),
}

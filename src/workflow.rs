use std::fmt;
use std::future::Future;

use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    CreateJob,
    EditJob,
    SubmitEvidence,
    PublicFeedback,
    DeleteJob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    InsertJob,
    UpdateJob,
    DeleteAssignments,
    InsertAssignments,
    UploadEvidence,
    UploadSignature,
    InsertFeedback,
    RemoveEvidence,
    DeleteJob,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::InsertJob => "insert job",
            Step::UpdateJob => "update job",
            Step::DeleteAssignments => "delete assignments",
            Step::InsertAssignments => "insert assignments",
            Step::UploadEvidence => "upload evidence",
            Step::UploadSignature => "upload signature",
            Step::InsertFeedback => "insert feedback",
            Step::RemoveEvidence => "remove evidence",
            Step::DeleteJob => "delete job",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    Failed { error: String },
    Tolerated { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct Workflow {
    kind: WorkflowKind,
    job_id: Option<i64>,
    steps: Vec<StepRecord>,
}

impl Workflow {
    pub fn new(kind: WorkflowKind, job_id: Option<i64>) -> Self {
        Self {
            kind,
            job_id,
            steps: Vec::new(),
        }
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub fn job_id(&self) -> Option<i64> {
        self.job_id
    }

    pub fn set_job_id(&mut self, job_id: i64) {
        self.job_id = Some(job_id);
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub async fn run<T, E, F>(&mut self, step: Step, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        match fut.await {
            Ok(value) => {
                debug!(workflow = ?self.kind, job_id = ?self.job_id, %step, "step completed");
                self.steps.push(StepRecord {
                    step,
                    outcome: StepOutcome::Completed,
                });
                Ok(value)
            }
            Err(err) => {
                warn!(workflow = ?self.kind, job_id = ?self.job_id, %step, error = %err, "step failed");
                self.steps.push(StepRecord {
                    step,
                    outcome: StepOutcome::Failed {
                        error: err.to_string(),
                    },
                });
                Err(err)
            }
        }
    }

    /// Like [`Workflow::run`], but a failure is recorded and swallowed.
    pub async fn run_tolerant<T, E, F>(&mut self, step: Step, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        match fut.await {
            Ok(value) => {
                self.steps.push(StepRecord {
                    step,
                    outcome: StepOutcome::Completed,
                });
                Some(value)
            }
            Err(err) => {
                warn!(workflow = ?self.kind, job_id = ?self.job_id, %step, error = %err, "step failed, continuing");
                self.steps.push(StepRecord {
                    step,
                    outcome: StepOutcome::Tolerated {
                        error: err.to_string(),
                    },
                });
                None
            }
        }
    }

    pub fn completed(&self) -> impl Iterator<Item = Step> + '_ {
        self.steps
            .iter()
            .filter(|record| record.outcome == StepOutcome::Completed)
            .map(|record| record.step)
    }

    pub fn failed_step(&self) -> Option<Step> {
        self.steps
            .iter()
            .find(|record| matches!(record.outcome, StepOutcome::Failed { .. }))
            .map(|record| record.step)
    }

    pub fn is_partial(&self) -> bool {
        self.failed_step().is_some() && self.completed().next().is_some()
    }
}

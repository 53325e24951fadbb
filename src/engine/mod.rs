mod feedback;

pub use feedback::{decode_signature, FeedbackForm, Ratings};

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::evidence::EvidenceRefs;
use crate::filter::{JobListing, JobQuery, ALL_DEPARTMENTS};
use crate::lifecycle::{JobAction, JobStatus, TransitionError};
use crate::models::{Department, Feedback, Job, JobChanges, NewAssignment, NewJob, Profile};
use crate::notify::{ConfirmColor, Confirmation, Notice, Notifier, Prompt};
use crate::roles::{Actor, ApprovalStatus, Capability, Forbidden, Role};
use crate::schedule::{Schedule, ScheduleError, Window};
use crate::storage::{evidence_extension, evidence_key, signature_key, ObjectStorage};
use crate::store::{JobStore, StoreError};
use crate::workflow::{Step, Workflow, WorkflowKind};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("action was not confirmed")]
    Declined,
    #[error(transparent)]
    Forbidden(#[from] Forbidden),
    #[error("you are not assigned to job {0}")]
    NotAssigned(i64),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("job {id} is {status} and can no longer be changed")]
    Locked { id: i64, status: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{step} failed after earlier steps took effect: {message}")]
    Partial {
        step: Step,
        message: String,
        workflow: Workflow,
    },
}

impl From<ScheduleError> for EngineError {
    fn from(err: ScheduleError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl EngineError {
    fn storage(err: anyhow::Error) -> Self {
        EngineError::Storage(format!("{err:#}"))
    }

    fn within(self, flow: &Workflow) -> Self {
        match flow.failed_step() {
            Some(step) if flow.is_partial() => EngineError::Partial {
                step,
                message: self.to_string(),
                workflow: flow.clone(),
            },
            _ => self,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub map_link: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub schedule: Schedule,
    pub department_ids: Vec<i32>,
    pub team: Vec<Uuid>,
    pub is_feedback_required: bool,
}

impl JobDraft {
    fn validate(mut self) -> Result<(Self, Window), EngineError> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(EngineError::Validation("job title is required".into()));
        }
        if self.department_ids.iter().any(|id| *id <= ALL_DEPARTMENTS) {
            return Err(EngineError::Validation("invalid department id".into()));
        }
        self.department_ids = dedup(self.department_ids);
        if self.department_ids.is_empty() {
            return Err(EngineError::Validation(
                "select at least one department".into(),
            ));
        }
        self.team = dedup(self.team);

        let window = self.schedule.resolve()?;

        self.description = self.description.trim().to_string();
        self.location = self.location.trim().to_string();
        self.customer_name = self.customer_name.trim().to_string();
        self.customer_phone = self.customer_phone.trim().to_string();
        self.map_link = self
            .map_link
            .map(|link| link.trim().to_string())
            .filter(|link| !link.is_empty());
        Ok((self, window))
    }

    fn new_job(&self, window: Window) -> NewJob {
        NewJob {
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            map_link: self.map_link.clone(),
            customer_name: self.customer_name.clone(),
            customer_phone: self.customer_phone.clone(),
            start_time: window.start,
            end_time: window.end,
            status: JobStatus::Pending.as_str().to_string(),
            department_ids: self.department_ids.clone(),
            is_feedback_required: self.is_feedback_required,
        }
    }

    fn changes(&self, window: Window) -> JobChanges {
        JobChanges {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            location: Some(self.location.clone()),
            map_link: Some(self.map_link.clone()),
            customer_name: Some(self.customer_name.clone()),
            customer_phone: Some(self.customer_phone.clone()),
            start_time: Some(window.start),
            end_time: Some(window.end),
            department_ids: Some(self.department_ids.clone()),
            is_feedback_required: Some(self.is_feedback_required),
            ..JobChanges::default()
        }
    }
}

fn dedup<T: Eq + Hash + Copy>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(*item)).collect()
}

fn assignment_rows(job_id: i64, team: &[Uuid]) -> Vec<NewAssignment> {
    team.iter()
        .map(|profile_id| NewAssignment {
            job_id,
            profile_id: *profile_id,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct EvidenceSubmission {
    pub evidence: Vec<Upload>,
    /// Required when the job asks for customer feedback and none exists yet.
    pub feedback: Option<FeedbackForm>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub listing: JobListing,
    pub status_label: &'static str,
    pub schedule: Schedule,
    pub slot_label: Option<&'static str>,
    pub is_multi_day: bool,
    pub is_locked: bool,
    pub evidence: EvidenceRefs,
    pub team: Vec<TeamMember>,
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicJobSummary {
    pub id: i64,
    pub title: String,
    pub customer_name: String,
    pub location: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status_label: &'static str,
    pub feedback_submitted: bool,
}

fn status_of(job: &Job) -> Result<JobStatus, EngineError> {
    job.lifecycle_status()
        .ok_or_else(|| TransitionError::UnknownStatus(job.status.clone()).into())
}

fn ensure_unlocked(job: &Job) -> Result<JobStatus, EngineError> {
    let status = status_of(job)?;
    if status.is_edit_locked() {
        return Err(EngineError::Locked {
            id: job.id,
            status: job.status.clone(),
        });
    }
    Ok(status)
}

async fn ask(confirm: &dyn Confirmation, prompt: Prompt) -> Result<(), EngineError> {
    if confirm.confirm(&prompt).await {
        Ok(())
    } else {
        info!(title = %prompt.title, "action declined");
        Err(EngineError::Declined)
    }
}

fn transition_prompt(action: JobAction, job: &Job) -> Prompt {
    let title = &job.title;
    let heading = transition_title(action);
    match action {
        JobAction::Start => Prompt::new(
            heading,
            format!("Start working on \"{title}\"?"),
            "Start",
            ConfirmColor::Primary,
        ),
        JobAction::Submit => Prompt::new(
            heading,
            format!("Submit \"{title}\" for review?"),
            "Submit",
            ConfirmColor::Success,
        ),
        JobAction::CancelSubmission => Prompt::new(
            heading,
            format!("Withdraw the submission for \"{title}\"?"),
            "Withdraw",
            ConfirmColor::Warning,
        ),
        JobAction::Reject => Prompt::new(
            heading,
            format!("Send \"{title}\" back to the assigned staff?"),
            "Reject",
            ConfirmColor::Danger,
        ),
        JobAction::Approve => Prompt::new(
            heading,
            format!("Approve the work on \"{title}\"?"),
            "Approve",
            ConfirmColor::Success,
        ),
        JobAction::Cancel => Prompt::new(
            heading,
            format!("Cancel \"{title}\"? This cannot be undone."),
            "Cancel job",
            ConfirmColor::Danger,
        ),
    }
}

fn capability_for(action: JobAction) -> Capability {
    match action {
        JobAction::Start | JobAction::Submit | JobAction::CancelSubmission => Capability::WorkJob,
        JobAction::Reject | JobAction::Approve => Capability::ReviewJob,
        JobAction::Cancel => Capability::CancelJob,
    }
}

pub struct JobEngine {
    store: Arc<dyn JobStore>,
    storage: Arc<dyn ObjectStorage>,
    notifier: Arc<dyn Notifier>,
}

impl JobEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        storage: Arc<dyn ObjectStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            storage,
            notifier,
        }
    }

    fn report<T>(
        &self,
        title: &str,
        result: Result<T, EngineError>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T, EngineError> {
        match &result {
            Ok(value) => self.notifier.notify(Notice::success(title, success(value))),
            Err(EngineError::Declined) => {}
            Err(err) => self.notifier.notify(Notice::error(title, err.to_string())),
        }
        result
    }

    async fn load_job(&self, id: i64) -> Result<Job, EngineError> {
        self.store
            .get_job(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("job {id}")))
    }

    async fn ensure_assigned(&self, actor: &Actor, job: &Job) -> Result<(), EngineError> {
        if job.assigned_to == Some(actor.id) {
            return Ok(());
        }
        let assignments = self.store.list_assignments(Some(job.id)).await?;
        if assignments.iter().any(|row| row.profile_id == actor.id) {
            Ok(())
        } else {
            Err(EngineError::NotAssigned(job.id))
        }
    }

    async fn check_team(&self, draft: &JobDraft) -> Result<(), EngineError> {
        if draft.team.is_empty() {
            return Ok(());
        }
        let profiles = self.store.list_profiles().await?;
        for member in &draft.team {
            let profile = profiles
                .iter()
                .find(|profile| profile.id == *member)
                .ok_or_else(|| EngineError::Validation(format!("team member {member} does not exist")))?;
            if !profile.is_approved() || profile.role() != Some(Role::Staff) {
                return Err(EngineError::Validation(format!(
                    "{} is not an approved staff member",
                    profile.full_name
                )));
            }
            let in_department = profile
                .department_id
                .is_some_and(|id| draft.department_ids.contains(&id));
            if !in_department {
                return Err(EngineError::Validation(format!(
                    "{} does not belong to any of the job's departments",
                    profile.full_name
                )));
            }
        }
        Ok(())
    }

    pub async fn create_job(
        &self,
        actor: &Actor,
        draft: JobDraft,
        confirm: &dyn Confirmation,
    ) -> Result<JobListing, EngineError> {
        let result = self.create_job_steps(actor, draft, confirm).await;
        self.report("Create job", result, |listing| {
            format!("Job #{} \"{}\" created", listing.job.id, listing.job.title)
        })
    }

    async fn create_job_steps(
        &self,
        actor: &Actor,
        draft: JobDraft,
        confirm: &dyn Confirmation,
    ) -> Result<JobListing, EngineError> {
        actor.require(Capability::CreateJob)?;
        let (draft, window) = draft.validate()?;
        self.check_team(&draft).await?;
        ask(
            confirm,
            Prompt::new(
                "Create job",
                format!("Create job \"{}\"?", draft.title),
                "Create",
                ConfirmColor::Primary,
            ),
        )
        .await?;

        let mut flow = Workflow::new(WorkflowKind::CreateJob, None);
        let job = flow
            .run(Step::InsertJob, self.store.insert_job(draft.new_job(window)))
            .await?;
        flow.set_job_id(job.id);
        if !draft.team.is_empty() {
            flow.run(
                Step::InsertAssignments,
                self.store.insert_assignments(assignment_rows(job.id, &draft.team)),
            )
            .await
            .map_err(|err| EngineError::from(err).within(&flow))?;
        }

        info!(job_id = job.id, actor = %actor.id, team = draft.team.len(), "job created");
        Ok(JobListing {
            job,
            assignees: draft.team,
        })
    }

    pub async fn update_job(
        &self,
        actor: &Actor,
        id: i64,
        draft: JobDraft,
        confirm: &dyn Confirmation,
    ) -> Result<JobListing, EngineError> {
        let result = self.update_job_steps(actor, id, draft, confirm).await;
        self.report("Save job", result, |listing| {
            format!("Job #{} updated", listing.job.id)
        })
    }

    async fn update_job_steps(
        &self,
        actor: &Actor,
        id: i64,
        draft: JobDraft,
        confirm: &dyn Confirmation,
    ) -> Result<JobListing, EngineError> {
        actor.require(Capability::EditJob)?;
        let (draft, window) = draft.validate()?;
        let job = self.load_job(id).await?;
        ensure_unlocked(&job)?;
        self.check_team(&draft).await?;
        ask(
            confirm,
            Prompt::new(
                "Save changes",
                format!("Save changes to job \"{}\"?", job.title),
                "Save",
                ConfirmColor::Primary,
            ),
        )
        .await?;

        let mut flow = Workflow::new(WorkflowKind::EditJob, Some(id));
        let job = flow
            .run(Step::UpdateJob, self.store.update_job(id, draft.changes(window)))
            .await?;
        flow.run(Step::DeleteAssignments, self.store.delete_assignments(id))
            .await
            .map_err(|err| EngineError::from(err).within(&flow))?;
        if !draft.team.is_empty() {
            flow.run(
                Step::InsertAssignments,
                self.store.insert_assignments(assignment_rows(id, &draft.team)),
            )
            .await
            .map_err(|err| EngineError::from(err).within(&flow))?;
        }

        info!(job_id = id, actor = %actor.id, "job updated");
        Ok(JobListing {
            job,
            assignees: draft.team,
        })
    }

    /// Every status change except submission, which needs evidence and goes
    /// through [`JobEngine::submit_evidence`].
    pub async fn transition(
        &self,
        actor: &Actor,
        id: i64,
        action: JobAction,
        confirm: &dyn Confirmation,
    ) -> Result<Job, EngineError> {
        let result = self.transition_steps(actor, id, action, confirm).await;
        self.report(transition_title(action), result, |job| {
            let label = job.lifecycle_status().map(JobStatus::label).unwrap_or("updated");
            format!("Job #{} is now {}", job.id, label.to_lowercase())
        })
    }

    async fn transition_steps(
        &self,
        actor: &Actor,
        id: i64,
        action: JobAction,
        confirm: &dyn Confirmation,
    ) -> Result<Job, EngineError> {
        if action == JobAction::Submit {
            return Err(EngineError::Validation(
                "attach at least one evidence photo to submit a job".into(),
            ));
        }
        actor.require(capability_for(action))?;
        let job = self.load_job(id).await?;
        let from = status_of(&job)?;
        let to = from.apply(action)?;
        if action.is_field_action() {
            self.ensure_assigned(actor, &job).await?;
        }
        ask(confirm, transition_prompt(action, &job)).await?;

        let job = self.store.update_job(id, JobChanges::status(to)).await?;
        info!(job_id = id, %from, %to, %action, actor = %actor.id, "job status changed");
        Ok(job)
    }

    /// Uploads the evidence, records customer feedback when the job asks
    /// for it, then moves the job to review. Steps are not rolled back.
    pub async fn submit_evidence(
        &self,
        actor: &Actor,
        id: i64,
        submission: EvidenceSubmission,
        confirm: &dyn Confirmation,
    ) -> Result<Job, EngineError> {
        let result = self.submit_steps(actor, id, submission, confirm).await;
        self.report("Submit for review", result, |job| {
            format!("Job #{} submitted for review", job.id)
        })
    }

    async fn submit_steps(
        &self,
        actor: &Actor,
        id: i64,
        submission: EvidenceSubmission,
        confirm: &dyn Confirmation,
    ) -> Result<Job, EngineError> {
        if submission.evidence.is_empty() {
            return Err(EngineError::Validation(
                "attach at least one evidence photo".into(),
            ));
        }
        if submission.evidence.iter().any(|upload| upload.bytes.is_empty()) {
            return Err(EngineError::Validation(
                "evidence files must not be empty".into(),
            ));
        }
        if let Some(form) = &submission.feedback {
            form.validate()?;
        }
        actor.require(Capability::WorkJob)?;

        let job = self.load_job(id).await?;
        status_of(&job)?.apply(JobAction::Submit)?;
        self.ensure_assigned(actor, &job).await?;

        let feedback = if job.is_feedback_required
            && self.store.feedback_for_job(id).await?.is_none()
        {
            Some(submission.feedback.ok_or_else(|| {
                EngineError::Validation("customer feedback is required for this job".into())
            })?)
        } else {
            None
        };

        ask(confirm, transition_prompt(JobAction::Submit, &job)).await?;

        let mut flow = Workflow::new(WorkflowKind::SubmitEvidence, Some(id));
        let stamp = Utc::now().timestamp_millis();
        let mut urls = Vec::with_capacity(submission.evidence.len());
        for (offset, upload) in submission.evidence.into_iter().enumerate() {
            let extension =
                evidence_extension(upload.file_name.as_deref(), upload.content_type.as_deref());
            let key = evidence_key(id, stamp + offset as i64, &extension);
            let content_type = upload.content_type.or_else(|| {
                mime_guess::from_ext(&extension)
                    .first_raw()
                    .map(str::to_string)
            });
            flow.run(
                Step::UploadEvidence,
                self.storage.upload(&key, upload.bytes, content_type),
            )
            .await
            .map_err(|err| EngineError::storage(err).within(&flow))?;
            urls.push(self.storage.public_url(&key));
        }

        if let Some(form) = feedback {
            let key = signature_key(id, stamp, false);
            flow.run(
                Step::UploadSignature,
                self.storage
                    .upload(&key, form.signature_png.clone(), Some("image/png".into())),
            )
            .await
            .map_err(|err| EngineError::storage(err).within(&flow))?;
            let record = form.to_record(id, self.storage.public_url(&key));
            flow.run(Step::InsertFeedback, self.store.insert_feedback(record))
                .await
                .map_err(|err| EngineError::from(err).within(&flow))?;
        }

        let changes = JobChanges {
            status: Some(JobStatus::WaitingReview.as_str().to_string()),
            image_url: Some(EvidenceRefs::new(urls).to_stored()),
            ..JobChanges::default()
        };
        let job = flow
            .run(Step::UpdateJob, self.store.update_job(id, changes))
            .await
            .map_err(|err| EngineError::from(err).within(&flow))?;

        info!(job_id = id, actor = %actor.id, steps = flow.steps().len(), "evidence submitted");
        Ok(job)
    }

    pub async fn delete_job(
        &self,
        actor: &Actor,
        id: i64,
        confirm: &dyn Confirmation,
    ) -> Result<Job, EngineError> {
        let result = self.delete_steps(actor, id, confirm).await;
        self.report("Delete job", result, |job| {
            format!("Job #{} \"{}\" deleted", job.id, job.title)
        })
    }

    async fn delete_steps(
        &self,
        actor: &Actor,
        id: i64,
        confirm: &dyn Confirmation,
    ) -> Result<Job, EngineError> {
        actor.require(Capability::DeleteJob)?;
        let job = self.load_job(id).await?;
        ensure_unlocked(&job)?;
        ask(
            confirm,
            Prompt::new(
                "Delete job",
                format!("Delete \"{}\"? This cannot be undone.", job.title),
                "Delete",
                ConfirmColor::Danger,
            ),
        )
        .await?;

        let mut flow = Workflow::new(WorkflowKind::DeleteJob, Some(id));
        let keys: Vec<String> = EvidenceRefs::parse(job.image_url.as_deref())
            .urls()
            .iter()
            .filter_map(|url| self.storage.key_from_public_url(url))
            .collect();
        if !keys.is_empty()
            && flow
                .run_tolerant(Step::RemoveEvidence, self.storage.remove(&keys))
                .await
                .is_none()
        {
            warn!(job_id = id, blobs = keys.len(), "evidence left in storage");
        }
        flow.run(Step::DeleteJob, self.store.delete_job(id))
            .await
            .map_err(|err| EngineError::from(err).within(&flow))?;

        info!(job_id = id, actor = %actor.id, "job deleted");
        Ok(job)
    }

    pub async fn submit_public_feedback(
        &self,
        job_id: i64,
        form: FeedbackForm,
        confirm: &dyn Confirmation,
    ) -> Result<Feedback, EngineError> {
        let result = self.public_feedback_steps(job_id, form, confirm).await;
        self.report("Send feedback", result, |_| {
            "Thank you for your feedback".to_string()
        })
    }

    async fn public_feedback_steps(
        &self,
        job_id: i64,
        form: FeedbackForm,
        confirm: &dyn Confirmation,
    ) -> Result<Feedback, EngineError> {
        form.validate()?;
        let job = self.load_job(job_id).await?;
        if status_of(&job)? == JobStatus::Cancelled {
            return Err(EngineError::Locked {
                id: job.id,
                status: job.status,
            });
        }
        if self.store.feedback_for_job(job_id).await?.is_some() {
            return Err(EngineError::Validation(
                "feedback has already been submitted for this job".into(),
            ));
        }
        ask(
            confirm,
            Prompt::new(
                "Send feedback",
                format!("Send your feedback for \"{}\"?", job.title),
                "Send",
                ConfirmColor::Primary,
            ),
        )
        .await?;

        let mut flow = Workflow::new(WorkflowKind::PublicFeedback, Some(job_id));
        let key = signature_key(job_id, Utc::now().timestamp_millis(), true);
        flow.run(
            Step::UploadSignature,
            self.storage
                .upload(&key, form.signature_png.clone(), Some("image/png".into())),
        )
        .await
        .map_err(EngineError::storage)?;
        let record = form.to_record(job_id, self.storage.public_url(&key));
        let feedback = flow
            .run(Step::InsertFeedback, self.store.insert_feedback(record))
            .await
            .map_err(|err| EngineError::from(err).within(&flow))?;

        info!(job_id, overall = feedback.rating_overall, "public feedback recorded");
        Ok(feedback)
    }

    /// Jobs visible to `actor` under `query`, latest start first.
    pub async fn list_jobs(
        &self,
        actor: &Actor,
        query: &JobQuery,
    ) -> Result<Vec<JobListing>, EngineError> {
        let jobs = self.store.list_jobs().await?;
        let mut teams: HashMap<i64, Vec<Uuid>> = HashMap::new();
        for row in self.store.list_assignments(None).await? {
            teams.entry(row.job_id).or_default().push(row.profile_id);
        }

        let mut listings: Vec<JobListing> = jobs
            .into_iter()
            .map(|job| {
                let assignees = teams.remove(&job.id).unwrap_or_default();
                JobListing { job, assignees }
            })
            .collect();
        listings.sort_by(|a, b| {
            b.job
                .start_time
                .cmp(&a.job.start_time)
                .then(b.job.id.cmp(&a.job.id))
        });
        Ok(query.apply(listings, actor))
    }

    /// Customer feedback is only included for administrators and the job's team.
    pub async fn job_detail(&self, actor: &Actor, id: i64) -> Result<JobDetail, EngineError> {
        let job = self.load_job(id).await?;
        let assignees: Vec<Uuid> = self
            .store
            .list_assignments(Some(id))
            .await?
            .into_iter()
            .map(|row| row.profile_id)
            .collect();

        let mut member_ids = assignees.clone();
        if let Some(legacy) = job.assigned_to.filter(|legacy| !assignees.contains(legacy)) {
            member_ids.push(legacy);
        }
        let team = if member_ids.is_empty() {
            Vec::new()
        } else {
            self.store
                .list_profiles()
                .await?
                .into_iter()
                .filter(|profile| member_ids.contains(&profile.id))
                .map(|profile| TeamMember {
                    id: profile.id,
                    full_name: profile.full_name,
                    phone: profile.phone,
                })
                .collect()
        };
        let on_team = member_ids.contains(&actor.id);
        let feedback = if actor.can(Capability::ViewAllJobs) || on_team {
            self.store.feedback_for_job(id).await?
        } else {
            None
        };

        let window = Window::new(job.start_time, job.end_time);
        let schedule = Schedule::from_window(&window);
        let status = job.lifecycle_status();
        Ok(JobDetail {
            status_label: status.map(JobStatus::label).unwrap_or("Unknown"),
            slot_label: match schedule {
                Schedule::SingleDay { slot, .. } => Some(slot.label()),
                Schedule::MultiDay { .. } => None,
            },
            schedule,
            is_multi_day: window.is_multi_day(),
            is_locked: status.map_or(true, JobStatus::is_edit_locked),
            evidence: EvidenceRefs::parse(job.image_url.as_deref()),
            team,
            feedback,
            listing: JobListing { job, assignees },
        })
    }

    pub async fn public_job_summary(&self, id: i64) -> Result<PublicJobSummary, EngineError> {
        let job = self.load_job(id).await?;
        let feedback_submitted = self.store.feedback_for_job(id).await?.is_some();
        Ok(PublicJobSummary {
            id: job.id,
            status_label: job
                .lifecycle_status()
                .map(JobStatus::label)
                .unwrap_or("Unknown"),
            title: job.title,
            customer_name: job.customer_name,
            location: job.location,
            start_time: job.start_time,
            end_time: job.end_time,
            feedback_submitted,
        })
    }

    pub async fn approve_profile(
        &self,
        actor: &Actor,
        profile_id: Uuid,
        confirm: &dyn Confirmation,
    ) -> Result<Profile, EngineError> {
        let result = self.approve_steps(actor, profile_id, confirm).await;
        self.report("Approve account", result, |profile| {
            format!("{} can now sign in", profile.full_name)
        })
    }

    async fn approve_steps(
        &self,
        actor: &Actor,
        profile_id: Uuid,
        confirm: &dyn Confirmation,
    ) -> Result<Profile, EngineError> {
        actor.require(Capability::ManageProfiles)?;
        let profile = self
            .store
            .get_profile(profile_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("profile {profile_id}")))?;
        if profile.is_approved() {
            return Err(EngineError::Validation(format!(
                "{} is already approved",
                profile.username
            )));
        }
        ask(
            confirm,
            Prompt::new(
                "Approve account",
                format!("Approve {} ({})?", profile.full_name, profile.username),
                "Approve",
                ConfirmColor::Success,
            ),
        )
        .await?;

        let profile = self
            .store
            .set_profile_status(profile_id, ApprovalStatus::Approved)
            .await?;
        info!(profile_id = %profile.id, actor = %actor.id, "profile approved");
        Ok(profile)
    }

    pub async fn departments(&self) -> Result<Vec<Department>, EngineError> {
        Ok(self.store.list_departments().await?)
    }

    pub async fn profiles(
        &self,
        actor: &Actor,
        department: Option<i32>,
    ) -> Result<Vec<Profile>, EngineError> {
        actor.require(Capability::ManageProfiles)?;
        let profiles = self.store.list_profiles().await?;
        Ok(match department.filter(|id| *id != ALL_DEPARTMENTS) {
            Some(id) => profiles
                .into_iter()
                .filter(|profile| profile.department_id == Some(id))
                .collect(),
            None => profiles,
        })
    }
}

fn transition_title(action: JobAction) -> &'static str {
    match action {
        JobAction::Start => "Start job",
        JobAction::Submit => "Submit for review",
        JobAction::CancelSubmission => "Cancel submission",
        JobAction::Reject => "Reject submission",
        JobAction::Approve => "Approve job",
        JobAction::Cancel => "Cancel job",
    }
}

//! Task editor modal: a three-state machine plus the dirty check that gates
//! saving in display mode.
//!
//! ```text
//!            open_create(status)            open_display(task_id)
//!   Closed ───────────────────▶ Add      Closed ───────────────────▶ Display
//!     ▲                          │          ▲                          │
//!     └──────── close(changed) ──┘          └──────── close(changed) ──┘
//! ```
//!
//! There is no Add → Display edge: the modal closes fully between sessions
//! so no form state leaks from a create into an edit.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{Task, TaskForm, TaskPriority, TaskStatus};

// ── State machine ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    /// Creating a task that will land in the `status` column.
    Add { status: TaskStatus },
    Display { task_id: Uuid },
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, ModalState::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModalError {
    #[error("task modal is already open ({0:?})")]
    AlreadyOpen(ModalState),
    #[error("task modal is not open")]
    NotOpen,
    #[error("task modal is not in create mode")]
    NotCreating,
}

/// Tells the parent whether its task list needs a refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    pub refetch: bool,
}

pub struct TaskModal {
    state: watch::Sender<ModalState>,
}

impl Default for TaskModal {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskModal {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ModalState::Closed);
        TaskModal { state }
    }

    pub fn state(&self) -> ModalState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ModalState> {
        self.state.subscribe()
    }

    fn open(&self, next: ModalState) -> Result<(), ModalError> {
        let current = self.state();
        if current.is_open() {
            return Err(ModalError::AlreadyOpen(current));
        }
        debug!(state = ?next, "task modal opened");
        self.state.send_replace(next);
        Ok(())
    }

    pub fn open_create(&self, status: TaskStatus) -> Result<(), ModalError> {
        self.open(ModalState::Add { status })
    }

    pub fn open_display(&self, task_id: Uuid) -> Result<(), ModalError> {
        self.open(ModalState::Display { task_id })
    }

    pub fn close(&self, changed: bool) -> Result<CloseOutcome, ModalError> {
        if !self.state().is_open() {
            return Err(ModalError::NotOpen);
        }
        self.state.send_replace(ModalState::Closed);
        Ok(CloseOutcome { refetch: changed })
    }

    /// Submit the create form. The column the modal was opened for wins
    /// over whatever status the form carries. Closes the modal on success;
    /// on failure the modal stays open with the form intact.
    pub async fn submit_create(
        &self,
        api: &ApiClient,
        project_id: Uuid,
        mut form: TaskForm,
    ) -> Result<(Value, CloseOutcome), ClientError> {
        let ModalState::Add { status } = self.state() else {
            return Err(ModalError::NotCreating.into());
        };
        form.status = status;
        let created = api.tasks().create(project_id, &form).await?;
        info!(%project_id, ?status, "task created");
        let outcome = self.close(true)?;
        Ok((created, outcome))
    }
}

// ── Dirty check ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Status,
    Priority,
    AssignedTo,
    DueDate,
}

/// A task form in normalized shape, compared field by field.
///
/// Normalization rules:
/// - a missing description and an empty one are the same;
/// - unassigned is a single state whatever the source said;
/// - due dates are compared as calendar dates, time of day dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

pub fn normalize_text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

pub fn normalize_due(value: Option<DateTime<Utc>>) -> Option<NaiveDate> {
    value.map(|dt| dt.date_naive())
}

impl TaskDraft {
    pub fn from_form(form: &TaskForm) -> Self {
        TaskDraft {
            title: form.title.clone(),
            description: normalize_text(form.description.as_deref()),
            status: form.status,
            priority: form.priority,
            assigned_to: form.assigned_to,
            due_date: form.due_date,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            description: normalize_text(task.description.as_deref()),
            status: task.status,
            priority: task.priority,
            assigned_to: task.assigned_to.as_ref().map(|m| m.id),
            due_date: normalize_due(task.due_date),
        }
    }

    pub fn diff(&self, other: &TaskDraft) -> Vec<TaskField> {
        let mut changed = Vec::new();
        if self.title != other.title {
            changed.push(TaskField::Title);
        }
        if self.description != other.description {
            changed.push(TaskField::Description);
        }
        if self.status != other.status {
            changed.push(TaskField::Status);
        }
        if self.priority != other.priority {
            changed.push(TaskField::Priority);
        }
        if self.assigned_to != other.assigned_to {
            changed.push(TaskField::AssignedTo);
        }
        if self.due_date != other.due_date {
            changed.push(TaskField::DueDate);
        }
        changed
    }
}

// ── Display-mode editor ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Nothing differed from the snapshot; no request was made.
    Unchanged,
    Saved(Value),
}

/// Live form plus the snapshot it is compared against.
pub struct TaskEditor {
    api: ApiClient,
    project_id: Uuid,
    task: Task,
    snapshot: TaskDraft,
    form: TaskForm,
}

impl TaskEditor {
    /// Fetch the task and snapshot it.
    pub async fn open(api: ApiClient, project_id: Uuid, task_id: Uuid) -> Result<Self, ClientError> {
        let task = api.tasks().get(project_id, task_id).await?;
        Ok(Self::from_task(api, task))
    }

    pub fn from_task(api: ApiClient, task: Task) -> Self {
        TaskEditor {
            api,
            project_id: task.project_id,
            snapshot: TaskDraft::from_task(&task),
            form: TaskForm::from(&task),
            task,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    pub fn edit(&mut self, f: impl FnOnce(&mut TaskForm)) {
        f(&mut self.form);
    }

    pub fn changes(&self) -> Vec<TaskField> {
        self.snapshot.diff(&TaskDraft::from_form(&self.form))
    }

    /// Drives the "unsaved changes" indicator.
    pub fn is_dirty(&self) -> bool {
        self.snapshot != TaskDraft::from_form(&self.form)
    }

    /// Save is offered exactly when the form differs from the snapshot.
    /// Validation happens on submit.
    pub fn can_save(&self) -> bool {
        self.is_dirty()
    }

    pub async fn save(&mut self) -> Result<SaveOutcome, ClientError> {
        if !self.is_dirty() {
            return Ok(SaveOutcome::Unchanged);
        }
        let saved = self
            .api
            .tasks()
            .update(self.project_id, self.task.id, &self.form)
            .await?;
        info!(task_id = %self.task.id, changed = ?self.changes(), "task updated");
        self.snapshot = TaskDraft::from_form(&self.form);
        Ok(SaveOutcome::Saved(saved))
    }

    pub async fn delete(self) -> Result<Value, ClientError> {
        let deleted = self.api.tasks().delete(self.project_id, self.task.id).await?;
        info!(task_id = %self.task.id, "task deleted");
        Ok(deleted)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemberRole, ProjectMember};
    use crate::session::Session;
    use chrono::TimeZone;

    fn member() -> ProjectMember {
        ProjectMember {
            id: Uuid::from_bytes([0x22; 16]),
            user_id: Uuid::from_bytes([0x33; 16]),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: MemberRole::Editor,
        }
    }

    fn task() -> Task {
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        Task {
            id: Uuid::from_bytes([0x11; 16]),
            project_id: Uuid::nil(),
            task_number: 3,
            title: "Fix the thing".into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::High,
            assigned_to: None,
            due_date: Some(Utc.with_ymd_and_hms(2026, 2, 11, 17, 45, 0).unwrap()),
            created_by: None,
            updated_by: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn editor() -> TaskEditor {
        let api = ApiClient::with_base("http://127.0.0.1:9/", Session::new()).unwrap();
        TaskEditor::from_task(api, task())
    }

    #[test]
    fn open_close_cycle() {
        let modal = TaskModal::new();
        modal.open_create(TaskStatus::InProgress).unwrap();
        assert_eq!(modal.state(), ModalState::Add { status: TaskStatus::InProgress });

        let outcome = modal.close(false).unwrap();
        assert!(!outcome.refetch);
        assert_eq!(modal.state(), ModalState::Closed);

        let id = Uuid::new_v4();
        modal.open_display(id).unwrap();
        assert_eq!(modal.state(), ModalState::Display { task_id: id });
        assert!(modal.close(true).unwrap().refetch);
    }

    #[test]
    fn cannot_switch_add_to_display_without_closing() {
        let modal = TaskModal::new();
        modal.open_create(TaskStatus::Todo).unwrap();
        let err = modal.open_display(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, ModalError::AlreadyOpen(ModalState::Add { status: TaskStatus::Todo }));
        // still in add mode
        assert_eq!(modal.state(), ModalState::Add { status: TaskStatus::Todo });
    }

    #[test]
    fn closing_a_closed_modal_is_an_error() {
        let modal = TaskModal::new();
        assert_eq!(modal.close(true).unwrap_err(), ModalError::NotOpen);
    }

    #[test]
    fn fresh_editor_is_clean() {
        let ed = editor();
        assert!(!ed.is_dirty());
        assert!(!ed.can_save());
        assert!(ed.changes().is_empty());
    }

    #[test]
    fn empty_description_matches_missing() {
        let mut ed = editor();
        ed.edit(|f| f.description = Some(String::new()));
        assert!(!ed.is_dirty());
    }

    #[test]
    fn due_date_compares_date_only() {
        // snapshot came from 2026-02-11T17:45Z; the form holds the bare date
        let ed = editor();
        assert_eq!(ed.form().due_date, NaiveDate::from_ymd_opt(2026, 2, 11));
        assert!(!ed.is_dirty());

        let mut ed = editor();
        ed.edit(|f| f.due_date = NaiveDate::from_ymd_opt(2026, 2, 12));
        assert_eq!(ed.changes(), vec![TaskField::DueDate]);
    }

    #[test]
    fn assignee_change_is_dirty_and_reverting_cleans() {
        let mut ed = editor();
        ed.edit(|f| f.assigned_to = Some(member().id));
        assert!(ed.can_save());
        assert_eq!(ed.changes(), vec![TaskField::AssignedTo]);

        ed.edit(|f| f.assigned_to = None);
        assert!(!ed.is_dirty());
    }

    #[tokio::test]
    async fn blank_title_is_rejected_on_submit() {
        let mut ed = editor();
        ed.edit(|f| f.title = "  ".into());
        assert!(ed.is_dirty());
        assert!(ed.can_save());

        // caught before the request, so the closed port is never dialled
        let err = ed.save().await.unwrap_err();
        assert_eq!(err.to_string(), "Task title is required");
        assert!(ed.is_dirty());
    }

    #[test]
    fn draft_diff_lists_every_changed_field() {
        let a = TaskDraft::from_task(&task());
        let mut b = a.clone();
        b.title = "Other".into();
        b.status = TaskStatus::Completed;
        b.priority = TaskPriority::Low;
        assert_eq!(
            a.diff(&b),
            vec![TaskField::Title, TaskField::Status, TaskField::Priority]
        );
    }

    #[tokio::test]
    async fn save_without_changes_makes_no_request() {
        // the base points at a closed port; any request would fail
        let mut ed = editor();
        assert_eq!(ed.save().await.unwrap(), SaveOutcome::Unchanged);
    }
}
